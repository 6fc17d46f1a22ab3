//! Parameter sweep over SMA windows.
//!
//! Each candidate is an independent, pure backtest run, so candidates are
//! evaluated in parallel on a rayon pool without any shared mutable state.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

use super::backtest::{run_backtest, BacktestConfig};
use super::error::SmacrossError;
use super::series::TimeSeries;
use super::sma::parse_window;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub final_values: BTreeMap<usize, f64>,
    pub best_window: usize,
    pub best_value: f64,
}

/// Parse a window list: `start..end:step` (end exclusive, step defaults to 1)
/// or a comma-separated list such as `50,100,200`.
pub fn parse_windows(spec: &str) -> Result<Vec<usize>, SmacrossError> {
    let spec = spec.trim();
    let invalid = || SmacrossError::InvalidWindow {
        window: spec.to_string(),
    };

    let windows: Vec<usize> = if let Some((start, rest)) = spec.split_once("..") {
        let (end, step) = match rest.split_once(':') {
            Some((end, step)) => (end, parse_window(step)?),
            None => (rest, 1),
        };
        if step == 0 {
            return Err(invalid());
        }
        let start = parse_window(start)?;
        let end = parse_window(end)?;
        (start..end).step_by(step).collect()
    } else {
        spec.split(',')
            .map(parse_window)
            .collect::<Result<Vec<_>, _>>()?
    };

    if windows.is_empty() {
        return Err(invalid());
    }
    Ok(windows)
}

/// Run one backtest per window and pick the window with the highest final value.
///
/// Ties go to the smallest window. `jobs == 0` uses rayon's default pool size.
pub fn run_sweep(
    signal: &TimeSeries,
    tradable: &TimeSeries,
    base: &BacktestConfig,
    windows: &[usize],
    jobs: usize,
) -> Result<SweepResult, SmacrossError> {
    if windows.is_empty() {
        return Err(SmacrossError::InvalidWindow {
            window: String::new(),
        });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| SmacrossError::Io(std::io::Error::other(e)))?;

    let outcomes: Vec<(usize, f64)> = pool.install(|| {
        windows
            .par_iter()
            .map(|&window| {
                run_backtest(signal, tradable, &base.with_window(window))
                    .map(|result| (window, result.final_value))
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    let final_values: BTreeMap<usize, f64> = outcomes.into_iter().collect();

    let mut best: Option<(usize, f64)> = None;
    for (&window, &value) in &final_values {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((window, value)),
        }
    }
    let Some((best_window, best_value)) = best else {
        return Err(SmacrossError::InvalidWindow {
            window: String::new(),
        });
    };

    info!(
        candidates = final_values.len(),
        best_window, best_value, "sweep complete"
    );

    Ok(SweepResult {
        final_values,
        best_window,
        best_value,
    })
}
