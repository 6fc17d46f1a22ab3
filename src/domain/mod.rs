//! Core domain types and logic.

pub mod series;
pub mod sma;
pub mod position;
pub mod contribution;
pub mod backtest;
pub mod baseline;
pub mod sweep;
pub mod metrics;
pub mod config_validation;
pub mod error;
