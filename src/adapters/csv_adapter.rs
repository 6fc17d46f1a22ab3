//! CSV file data adapter.
//!
//! Reads `Date,Value`-style exports. Columns are located by header name, so
//! extra columns (Open/High/Low/...) are ignored. Malformed numbers become
//! missing values; rows with an unreadable date are dropped.

use crate::domain::backtest::ValuePoint;
use crate::domain::error::SmacrossError;
use crate::domain::series::{SeriesPoint, TimeSeries};
use crate::domain::sma::DistancePoint;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    date_column: String,
    value_column: String,
    delimiter: u8,
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new("Date", "Value")
    }
}

impl CsvAdapter {
    pub fn new(date_column: &str, value_column: &str) -> Self {
        Self {
            date_column: date_column.to_string(),
            value_column: value_column.to_string(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Same file layout, different value column.
    pub fn with_value_column(mut self, value_column: &str) -> Self {
        self.value_column = value_column.to_string();
        self
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let date_column = config
            .get_string("data", "date_column")
            .unwrap_or_else(|| "Date".to_string());
        let value_column = config
            .get_string("data", "value_column")
            .unwrap_or_else(|| "Value".to_string());
        let delimiter = config
            .get_string("data", "delimiter")
            .and_then(|d| d.trim().bytes().next())
            .unwrap_or(b',');
        Self::new(&date_column, &value_column).with_delimiter(delimiter)
    }

    pub fn parse_date(text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .map(|dt| dt.date())
            })
            // Timestamps with an offset suffix, e.g. "2024-01-02 00:00:00-05:00".
            .or_else(|| {
                text.get(..10)
                    .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            })
    }

    pub fn parse_value(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn column_index(
        headers: &csv::StringRecord,
        name: &str,
        source_name: &str,
    ) -> Result<usize, SmacrossError> {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| SmacrossError::Data {
                source_name: source_name.to_string(),
                reason: format!("missing {} column", name),
            })
    }

    pub fn read_series<R: Read>(
        &self,
        reader: R,
        source_name: &str,
    ) -> Result<TimeSeries, SmacrossError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| SmacrossError::Data {
            source_name: source_name.to_string(),
            reason: format!("CSV header error: {}", e),
        })?;
        let date_idx = Self::column_index(headers, &self.date_column, source_name)?;
        let value_idx = Self::column_index(headers, &self.value_column, source_name)?;

        let mut points = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::Data {
                source_name: source_name.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let Some(date) = record.get(date_idx).and_then(Self::parse_date) else {
                skipped += 1;
                continue;
            };
            let value = record.get(value_idx).and_then(Self::parse_value);
            points.push(SeriesPoint { date, value });
        }

        if skipped > 0 {
            warn!(source = source_name, skipped, "dropped rows with unreadable dates");
        }

        let series = TimeSeries::new(points);
        debug!(source = source_name, points = series.len(), "series loaded");
        Ok(series)
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self, source: &str) -> Result<TimeSeries, SmacrossError> {
        let file = File::open(source).map_err(|e| SmacrossError::Data {
            source_name: source.to_string(),
            reason: format!("failed to open: {}", e),
        })?;
        self.read_series(file, source)
    }
}

fn csv_write_error(path: &Path, e: csv::Error) -> SmacrossError {
    SmacrossError::Data {
        source_name: path.display().to_string(),
        reason: format!("CSV write error: {}", e),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

pub fn write_trajectory<W: Write>(writer: W, points: &[ValuePoint]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "value"])?;
    for point in points {
        wtr.write_record([point.date.to_string(), format!("{:.2}", point.value)])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_distance<W: Write>(writer: W, points: &[DistancePoint]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "value", "sma", "pct_distance"])?;
    for point in points {
        wtr.write_record([
            point.date.to_string(),
            format_optional(point.value),
            format_optional(point.sma),
            format_optional(point.pct_distance),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_trajectory_file(path: &Path, points: &[ValuePoint]) -> Result<(), SmacrossError> {
    let file = File::create(path)?;
    write_trajectory(file, points).map_err(|e| csv_write_error(path, e))
}

pub fn write_distance_file(path: &Path, points: &[DistancePoint]) -> Result<(), SmacrossError> {
    let file = File::create(path)?;
    write_distance(file, points).map_err(|e| csv_write_error(path, e))
}
