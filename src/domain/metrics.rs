//! Performance summary of a backtest run.

use super::backtest::{BacktestResult, Side, ValuePoint};

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// final_value / invested - 1
    pub total_return: f64,
    pub annualized_return: f64,
    /// Largest peak-to-trough decline of the trajectory, as a fraction.
    /// `None` when no trajectory was recorded.
    pub max_drawdown: Option<f64>,
    /// Longest run of trajectory points spent below a previous peak.
    pub max_drawdown_duration: Option<i64>,
    pub buys: usize,
    pub sells: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let total_return = if result.invested > 0.0 {
            result.final_value / result.invested - 1.0
        } else {
            0.0
        };

        let days = (result.end_date - result.start_date).num_days() as f64;
        let years = days / DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = match compute_drawdown(&result.trajectory) {
            Some((dd, duration)) => (Some(dd), Some(duration)),
            None => (None, None),
        };

        let buys = result.trades.iter().filter(|t| t.side == Side::Buy).count();
        let sells = result.trades.len() - buys;

        Metrics {
            total_return,
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            buys,
            sells,
        }
    }
}

fn compute_drawdown(trajectory: &[ValuePoint]) -> Option<(f64, i64)> {
    let first = trajectory.first()?;

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in trajectory {
        if point.value >= peak {
            peak = point.value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    Some((max_dd, max_dd_duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::Trade;
    use crate::domain::position::PositionState;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn point(date: NaiveDate, value: f64) -> ValuePoint {
        ValuePoint { date, value }
    }

    fn result_with(trajectory: Vec<ValuePoint>, final_value: f64) -> BacktestResult {
        BacktestResult {
            window: 200,
            start_date: d(2020, 1, 1),
            end_date: d(2022, 1, 1),
            final_value,
            final_state: PositionState::Divested { cash: final_value },
            invested: 10_000.0,
            trades: vec![],
            trajectory,
            steps: 0,
        }
    }

    #[test]
    fn total_and_annualized_return() {
        let m = Metrics::compute(&result_with(vec![], 12_100.0));
        assert!((m.total_return - 0.21).abs() < 1e-12);
        // 731 days ≈ 2.0014 years → about 10% a year
        assert!((m.annualized_return - 0.1).abs() < 1e-3);
    }

    #[test]
    fn drawdown_from_peak() {
        let traj = vec![
            point(d(2020, 1, 1), 100.0),
            point(d(2020, 2, 1), 120.0),
            point(d(2020, 3, 1), 90.0),
            point(d(2020, 4, 1), 96.0),
            point(d(2020, 5, 1), 130.0),
        ];
        let (dd, duration) = compute_drawdown(&traj).unwrap();
        assert!((dd - 0.25).abs() < 1e-12);
        assert_eq!(duration, 2);
    }

    #[test]
    fn drawdown_empty() {
        assert_eq!(compute_drawdown(&[]), None);
    }

    #[test]
    fn unrecorded_trajectory_has_no_drawdown() {
        let m = Metrics::compute(&result_with(vec![], 9_000.0));
        assert_eq!(m.max_drawdown, None);
        assert_eq!(m.max_drawdown_duration, None);

        let flat = vec![point(d(2020, 1, 1), 100.0), point(d(2021, 1, 1), 100.0)];
        let m = Metrics::compute(&result_with(flat, 10_000.0));
        assert_eq!(m.max_drawdown, Some(0.0));
        assert_eq!(m.max_drawdown_duration, Some(0));
    }

    #[test]
    fn counts_trade_sides() {
        let trade = |side| Trade {
            date: d(2020, 6, 1),
            side,
            price: 1.0,
            signal: 1.0,
            sma: 1.0,
            value: 1.0,
        };
        let mut result = result_with(vec![], 10_000.0);
        result.trades = vec![trade(Side::Sell), trade(Side::Buy), trade(Side::Sell)];
        let m = Metrics::compute(&result);
        assert_eq!(m.sells, 2);
        assert_eq!(m.buys, 1);
    }

    #[test]
    fn total_loss_has_no_annualized_return() {
        let m = Metrics::compute(&result_with(vec![], 0.0));
        assert!((m.total_return + 1.0).abs() < f64::EPSILON);
        assert_eq!(m.annualized_return, 0.0);
    }
}
