//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::metrics::Metrics;
use crate::domain::sweep::SweepResult;
use std::io::Write;

/// Benchmark figures shown next to a strategy result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub final_value: f64,
    pub invested: f64,
}

/// Port for writing human-readable run summaries.
pub trait ReportPort {
    fn write_backtest(
        &self,
        out: &mut dyn Write,
        result: &BacktestResult,
        metrics: &Metrics,
        baseline: &Baseline,
    ) -> Result<(), SmacrossError>;

    fn write_sweep(
        &self,
        out: &mut dyn Write,
        result: &SweepResult,
        baseline: &Baseline,
    ) -> Result<(), SmacrossError>;
}
