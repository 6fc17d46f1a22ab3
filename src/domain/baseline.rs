//! Buy-and-hold benchmark.

use chrono::NaiveDate;

use super::backtest::BacktestSpan;
use super::contribution::Contribution;
use super::error::SmacrossError;
use super::position::PositionState;
use super::series::TimeSeries;

/// initial_capital / first_price * last_price over an already clipped series.
pub fn buy_and_hold(tradable: &TimeSeries, initial_capital: f64) -> Result<f64, SmacrossError> {
    let priced = tradable.priced();
    let points = priced.points();
    let (Some(first), Some(last)) = (
        points.first().and_then(|p| p.price()),
        points.last().and_then(|p| p.price()),
    ) else {
        return Err(SmacrossError::insufficient("tradable", 0, 1));
    };
    Ok(initial_capital / first * last)
}

/// Buy-and-hold that also buys units with every scheduled contribution.
///
/// Returns the final value and the total amount paid in.
pub fn buy_and_hold_plan(
    tradable: &TimeSeries,
    initial_capital: f64,
    contribution: Option<Contribution>,
) -> Result<(f64, f64), SmacrossError> {
    let priced = tradable.priced();
    let points = priced.points();
    let Some((first, rest)) = points.split_first() else {
        return Err(SmacrossError::insufficient("tradable", 0, 1));
    };
    let Some(first_price) = first.price() else {
        return Err(SmacrossError::insufficient("tradable", 0, 1));
    };

    let mut state = PositionState::invest(initial_capital, first_price);
    let mut invested = initial_capital;
    let mut last_price = first_price;
    let mut previous: NaiveDate = first.date;

    for point in rest {
        let Some(price) = point.price() else {
            continue;
        };
        if let Some(c) = contribution {
            if c.is_due(previous, point.date) {
                state = state.contribute(c.amount, price);
                invested += c.amount;
            }
        }
        previous = point.date;
        last_price = price;
    }

    Ok((state.value(last_price), invested))
}

/// Buy-and-hold over the same clipped span a backtest would use.
pub fn buy_and_hold_for_span(span: &BacktestSpan, initial_capital: f64) -> Result<f64, SmacrossError> {
    buy_and_hold(&span.tradable, initial_capital)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contribution::Interval;
    use crate::domain::series::SeriesPoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn buy_and_hold_basic() {
        let series = TimeSeries::from_values(&[d(2024, 1, 1), d(2024, 6, 1)], &[50.0, 75.0]);
        let value = buy_and_hold(&series, 10_000.0).unwrap();
        assert!((value - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn buy_and_hold_skips_missing_edges() {
        let series = TimeSeries::new(vec![
            SeriesPoint::missing(d(2024, 1, 1)),
            SeriesPoint::new(d(2024, 1, 2), 20.0),
            SeriesPoint::new(d(2024, 1, 3), 30.0),
            SeriesPoint::missing(d(2024, 1, 4)),
        ]);
        let value = buy_and_hold(&series, 1_000.0).unwrap();
        assert!((value - 1_500.0).abs() < 1e-9);
    }

    #[test]
    fn buy_and_hold_empty() {
        assert!(matches!(
            buy_and_hold(&TimeSeries::default(), 1_000.0),
            Err(SmacrossError::InsufficientData { .. })
        ));
    }

    #[test]
    fn plan_without_contribution_matches_lump_sum() {
        let series = TimeSeries::from_values(
            &[d(2024, 1, 1), d(2024, 2, 1), d(2024, 3, 1)],
            &[40.0, 20.0, 60.0],
        );
        let (value, invested) = buy_and_hold_plan(&series, 4_000.0, None).unwrap();
        assert!((value - buy_and_hold(&series, 4_000.0).unwrap()).abs() < 1e-9);
        assert!((invested - 4_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn plan_with_monthly_contribution() {
        let series = TimeSeries::from_values(
            &[d(2024, 1, 10), d(2024, 1, 20), d(2024, 2, 10), d(2024, 3, 10)],
            &[100.0, 100.0, 50.0, 100.0],
        );
        let contribution = Contribution {
            amount: 500.0,
            interval: Interval::Monthly,
        };
        let (value, invested) = buy_and_hold_plan(&series, 1_000.0, Some(contribution)).unwrap();
        // 10 units + 10 (Feb @50) + 5 (Mar @100) = 25 units @100
        assert!((value - 2_500.0).abs() < 1e-9);
        assert!((invested - 2_000.0).abs() < f64::EPSILON);
    }
}
