//! smacross: SMA-crossing backtester for index and fund series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! file-based implementations in [`adapters`], and the command line in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
