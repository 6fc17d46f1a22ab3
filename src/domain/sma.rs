//! Simple moving average and distance-from-average.
//!
//! SMA(n)[i] = sum(V[i-j] for j in 0..n) / n
//! Warmup: first (n-1) points are undefined, as is any window with a gap.
//! SMA(0) is the raw value itself (no smoothing).

use crate::domain::error::SmacrossError;
use crate::domain::series::TimeSeries;
use chrono::NaiveDate;
use std::fmt;

/// Smoothed values aligned index-for-index with the source series.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaSeries {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl SmaSeries {
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl fmt::Display for SmaSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMA({})", self.window)
    }
}

/// Parse an SMA lookback; negative or non-integer input is rejected.
pub fn parse_window(text: &str) -> Result<usize, SmacrossError> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| SmacrossError::InvalidWindow {
            window: text.trim().to_string(),
        })
}

pub fn calculate_sma(series: &TimeSeries, window: usize) -> SmaSeries {
    let raw: Vec<Option<f64>> = series.values().collect();

    if window == 0 {
        return SmaSeries {
            window,
            values: raw,
        };
    }

    let values = (0..raw.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &raw[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / window as f64)
        })
        .collect();

    SmaSeries { window, values }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistancePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub sma: Option<f64>,
    pub pct_distance: Option<f64>,
}

/// Percentage distance of each value from its SMA: (V - SMA) / SMA * 100.
pub fn distance_from_sma(series: &TimeSeries, window: usize) -> Vec<DistancePoint> {
    distance_against_sma(series, series, window)
}

/// Distance of each `measured` value from the SMA of `base` on the same date,
/// e.g. the daily high against the SMA of the close. Dates missing from
/// `base` have no SMA.
pub fn distance_against_sma(
    measured: &TimeSeries,
    base: &TimeSeries,
    window: usize,
) -> Vec<DistancePoint> {
    let sma = calculate_sma(base, window);
    measured
        .points()
        .iter()
        .map(|point| {
            let avg = base.index_of(point.date).and_then(|i| sma.get(i));
            let pct_distance = match (point.value, avg) {
                (Some(v), Some(a)) if a != 0.0 => Some((v - a) / a * 100.0),
                _ => None,
            };
            DistancePoint {
                date: point.date,
                value: point.value,
                sma: avg,
                pct_distance,
            }
        })
        .collect()
}
