//! SMA-crossing backtest engine.
//!
//! The signal series drives the decision (value vs. its own trailing SMA),
//! the tradable series supplies the price that is bought and sold. Both may
//! be the same series. The strategy starts fully invested and flips between
//! holding and cash on threshold crossings:
//!
//! - holding and `signal <= sell_threshold * sma` → sell everything
//! - divested and `signal > buy_threshold * sma` → buy with all cash
//!
//! Decisions at a date only use data available at that date.

use chrono::NaiveDate;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::debug;

use super::contribution::{Contribution, Interval};
use super::error::SmacrossError;
use super::position::PositionState;
use super::series::TimeSeries;
use super::sma::calculate_sma;

/// Which evaluation points end up in the value trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordMode {
    None,
    Every,
    #[default]
    Monthly,
}

impl FromStr for RecordMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(RecordMode::None),
            "every" | "daily" | "all" => Ok(RecordMode::Every),
            "monthly" => Ok(RecordMode::Monthly),
            other => Err(format!(
                "unknown record mode '{}' (expected none, every or monthly)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub window: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sell_threshold: f64,
    pub buy_threshold: f64,
    pub initial_capital: f64,
    pub contribution: Option<Contribution>,
    pub record: RecordMode,
}

impl BacktestConfig {
    pub fn with_window(&self, window: usize) -> Self {
        BacktestConfig {
            window,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// A buy or sell transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub side: Side,
    /// Tradable price the conversion happened at.
    pub price: f64,
    pub signal: f64,
    pub sma: f64,
    /// Portfolio value right after the conversion.
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub window: usize,
    /// Resolved (clamped) bounds actually simulated.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub final_value: f64,
    pub final_state: PositionState,
    /// Initial capital plus every contribution paid in.
    pub invested: f64,
    pub trades: Vec<Trade>,
    pub trajectory: Vec<ValuePoint>,
    /// Number of evaluated dates (SMA and signal defined).
    pub steps: usize,
}

/// The date span a backtest covers, after closest-preceding resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Indices into the signal series.
    pub signal_range: Range<usize>,
    /// Tradable points inside the span that carry a usable price.
    pub tradable: TimeSeries,
}

impl BacktestSpan {
    pub fn resolve(
        signal: &TimeSeries,
        tradable: &TimeSeries,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, SmacrossError> {
        let start = signal
            .closest_preceding(start_date)
            .ok_or_else(|| SmacrossError::insufficient("signal", 0, 1))?;
        let end = signal
            .closest_preceding(end_date)
            .ok_or_else(|| SmacrossError::insufficient("signal", 0, 1))?;
        if start > end {
            return Err(SmacrossError::DateOutOfRange {
                start: start_date,
                end: end_date,
            });
        }

        let tradable_end = tradable
            .closest_preceding(end_date)
            .ok_or_else(|| SmacrossError::insufficient("tradable", 0, 1))?;
        let clipped = tradable.clip(start, tradable_end).priced();
        if clipped.is_empty() {
            return Err(SmacrossError::insufficient("tradable", 0, 1));
        }

        Ok(BacktestSpan {
            start,
            end,
            signal_range: signal.range_indices(start, end),
            tradable: clipped,
        })
    }

    pub fn first_price(&self) -> Option<f64> {
        self.tradable.points().first().and_then(|p| p.price())
    }

    pub fn last_price(&self) -> Option<f64> {
        self.tradable.points().last().and_then(|p| p.price())
    }
}

/// Run the SMA-crossing strategy over `[start_date, end_date]`.
pub fn run_backtest(
    signal: &TimeSeries,
    tradable: &TimeSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, SmacrossError> {
    if signal.is_empty() {
        return Err(SmacrossError::insufficient("signal", 0, 1));
    }
    if tradable.is_empty() {
        return Err(SmacrossError::insufficient("tradable", 0, 1));
    }
    if config.window > signal.len() {
        return Err(SmacrossError::insufficient(
            "signal",
            signal.len(),
            config.window,
        ));
    }

    // Computed on the whole series so history before the start warms it up.
    let sma = calculate_sma(signal, config.window);
    let span = BacktestSpan::resolve(signal, tradable, config.start_date, config.end_date)?;
    let (Some(first_price), Some(last_price)) = (span.first_price(), span.last_price()) else {
        return Err(SmacrossError::insufficient("tradable", 0, 1));
    };

    let mut state = PositionState::invest(config.initial_capital, first_price);
    let mut invested = config.initial_capital;
    let mut trades = Vec::new();
    let mut trajectory = Vec::new();
    let mut steps = 0usize;

    let mut last_evaluated = span.start;
    let mut last_recorded = span.start;
    let mut last_step: Option<ValuePoint> = None;
    if config.record != RecordMode::None {
        trajectory.push(ValuePoint {
            date: span.start,
            value: config.initial_capital,
        });
    }

    let points = signal.points();
    for i in span.signal_range.start + 1..span.signal_range.end {
        let date = points[i].date;
        let (Some(value), Some(avg)) = (points[i].value, sma.get(i)) else {
            continue;
        };
        let Some(price) = span.tradable.nearest(date).and_then(|p| p.price()) else {
            continue;
        };
        steps += 1;

        let side = if state.is_holding() && value <= config.sell_threshold * avg {
            state = state.sell(price);
            Some(Side::Sell)
        } else if !state.is_holding() && value > config.buy_threshold * avg {
            state = state.buy(price);
            Some(Side::Buy)
        } else {
            None
        };

        if let Some(side) = side {
            let trade = Trade {
                date,
                side,
                price,
                signal: value,
                sma: avg,
                value: state.value(price),
            };
            debug!(
                date = %trade.date,
                side = %trade.side,
                price = trade.price,
                signal = trade.signal,
                sma = trade.sma,
                value = trade.value,
                "transition"
            );
            trades.push(trade);
        }

        if let Some(contribution) = config.contribution {
            if contribution.is_due(last_evaluated, date) {
                state = state.contribute(contribution.amount, price);
                invested += contribution.amount;
            }
        }

        let record = match config.record {
            RecordMode::None => false,
            RecordMode::Every => true,
            RecordMode::Monthly => Interval::Monthly.starts_new_period(last_recorded, date),
        };
        let point = ValuePoint {
            date,
            value: state.value(price),
        };
        if record {
            trajectory.push(point);
            last_recorded = date;
        }

        last_step = Some(point);
        last_evaluated = date;
    }

    // A sampled trajectory still ends on the last evaluated step.
    if config.record != RecordMode::None {
        if let Some(point) = last_step {
            if trajectory.last().map(|p| p.date) != Some(point.date) {
                trajectory.push(point);
            }
        }
    }

    let final_value = state.value(last_price);
    debug!(
        window = config.window,
        steps,
        trades = trades.len(),
        final_value,
        "backtest complete"
    );

    Ok(BacktestResult {
        window: config.window,
        start_date: span.start,
        end_date: span.end,
        final_value,
        final_state: state,
        invested,
        trades,
        trajectory,
        steps,
    })
}
