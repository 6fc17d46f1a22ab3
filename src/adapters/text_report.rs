//! Plain-text report adapter implementing ReportPort.

use std::io::Write;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::metrics::Metrics;
use crate::domain::sweep::SweepResult;
use crate::ports::report_port::{Baseline, ReportPort};

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReport {
    /// Append the full trade log after the summary.
    pub show_trades: bool,
}

impl TextReport {
    pub fn new(show_trades: bool) -> Self {
        Self { show_trades }
    }
}

fn pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn relative(value: f64, baseline: f64) -> String {
    if baseline > 0.0 {
        pct(value / baseline - 1.0)
    } else {
        "n/a".to_string()
    }
}

impl ReportPort for TextReport {
    fn write_backtest(
        &self,
        out: &mut dyn Write,
        result: &BacktestResult,
        metrics: &Metrics,
        baseline: &Baseline,
    ) -> Result<(), SmacrossError> {
        writeln!(
            out,
            "=== SMA({}) backtest {} .. {} ===",
            result.window, result.start_date, result.end_date
        )?;
        writeln!(out, "Final value:      {:.2}", result.final_value)?;
        writeln!(out, "Invested:         {:.2}", result.invested)?;
        writeln!(out, "Final position:   {}", result.final_state)?;
        writeln!(out, "Total return:     {}", pct(metrics.total_return))?;
        writeln!(out, "Annual return:    {}", pct(metrics.annualized_return))?;
        match (metrics.max_drawdown, metrics.max_drawdown_duration) {
            (Some(dd), Some(duration)) => {
                writeln!(out, "Max drawdown:     -{:.1}%", dd * 100.0)?;
                writeln!(out, "Drawdown length:  {} points", duration)?;
            }
            // Nothing recorded to measure.
            _ => {
                writeln!(out, "Max drawdown:     n/a")?;
                writeln!(out, "Drawdown length:  n/a")?;
            }
        }
        writeln!(
            out,
            "Trades:           {} ({} sells, {} buys)",
            metrics.buys + metrics.sells,
            metrics.sells,
            metrics.buys
        )?;
        writeln!(out, "Evaluated days:   {}", result.steps)?;
        writeln!(out)?;
        writeln!(out, "Buy & hold:       {:.2}", baseline.final_value)?;
        if baseline.invested != result.invested {
            writeln!(out, "B&H invested:     {:.2}", baseline.invested)?;
        }
        writeln!(
            out,
            "vs. buy & hold:   {}",
            relative(result.final_value, baseline.final_value)
        )?;

        if self.show_trades && !result.trades.is_empty() {
            writeln!(out)?;
            writeln!(
                out,
                "{:<12} {:<5} {:>12} {:>12} {:>12} {:>14}",
                "Date", "Side", "Price", "Signal", "SMA", "Value"
            )?;
            for trade in &result.trades {
                writeln!(
                    out,
                    "{:<12} {:<5} {:>12.4} {:>12.4} {:>12.4} {:>14.2}",
                    trade.date.to_string(),
                    trade.side.to_string(),
                    trade.price,
                    trade.signal,
                    trade.sma,
                    trade.value
                )?;
            }
        }
        Ok(())
    }

    fn write_sweep(
        &self,
        out: &mut dyn Write,
        result: &SweepResult,
        baseline: &Baseline,
    ) -> Result<(), SmacrossError> {
        writeln!(out, "{:>8} {:>14} {:>10}", "Window", "Final value", "vs. B&H")?;
        for (window, value) in &result.final_values {
            let marker = if *window == result.best_window { " *" } else { "" };
            writeln!(
                out,
                "{:>8} {:>14.2} {:>10}{}",
                window,
                value,
                relative(*value, baseline.final_value),
                marker
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Best window: SMA({}) -> {:.2}",
            result.best_window, result.best_value
        )?;
        writeln!(out, "Buy & hold:  {:.2}", baseline.final_value)?;
        Ok(())
    }
}
