#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::backtest::{BacktestConfig, RecordMode};
use smacross::domain::error::SmacrossError;
use smacross::domain::series::TimeSeries;
use smacross::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub data: HashMap<String, TimeSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, source: &str, series: TimeSeries) -> Self {
        self.data.insert(source.to_string(), series);
        self
    }

    pub fn with_error(mut self, source: &str, reason: &str) -> Self {
        self.errors.insert(source.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self, source: &str) -> Result<TimeSeries, SmacrossError> {
        if let Some(reason) = self.errors.get(source) {
            return Err(SmacrossError::Data {
                source_name: source.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(source).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One point per calendar day starting at `start`.
pub fn daily_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
    let dates: Vec<NaiveDate> = (0..values.len())
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    TimeSeries::from_values(&dates, values)
}

pub fn sample_config(window: usize) -> BacktestConfig {
    BacktestConfig {
        window,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        sell_threshold: 0.97,
        buy_threshold: 1.01,
        initial_capital: 10_000.0,
        contribution: None,
        record: RecordMode::Every,
    }
}

/// Write a `Date,Value` CSV of daily points into `dir`.
pub fn write_csv(dir: &Path, name: &str, start: NaiveDate, values: &[f64]) -> PathBuf {
    let mut body = String::from("Date,Value\n");
    for (i, v) in values.iter().enumerate() {
        let day = start + chrono::Duration::days(i as i64);
        writeln!(body, "{},{}", day, v).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

pub fn write_ini(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("smacross.ini");
    std::fs::write(&path, content).unwrap();
    path
}
