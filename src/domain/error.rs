//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid SMA window {window}: must be a non-negative integer")]
    InvalidWindow { window: String },

    #[error("data error in {source_name}: {reason}")]
    Data { source_name: String, reason: String },

    #[error("insufficient data in {series} series: have {points} points, need {minimum}")]
    InsufficientData {
        series: String,
        points: usize,
        minimum: usize,
    },

    #[error("date range {start} to {end} selects no data")]
    DateOutOfRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmacrossError {
    pub(crate) fn insufficient(series: &str, points: usize, minimum: usize) -> Self {
        SmacrossError::InsufficientData {
            series: series.to_string(),
            points,
            minimum,
        }
    }
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. }
            | SmacrossError::InvalidWindow { .. } => 2,
            SmacrossError::Data { .. } => 3,
            SmacrossError::InsufficientData { .. } | SmacrossError::DateOutOfRange { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = SmacrossError::insufficient("signal", 3, 200);
        assert_eq!(
            err.to_string(),
            "insufficient data in signal series: have 3 points, need 200"
        );
    }

    #[test]
    fn date_out_of_range_message() {
        let err = SmacrossError::DateOutOfRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.to_string(), "date range 2024-03-01 to 2024-01-01 selects no data");
    }

    #[test]
    fn exit_codes_group_by_kind() {
        use std::process::ExitCode;

        let debug = |c: ExitCode| format!("{c:?}");

        let window = SmacrossError::InvalidWindow {
            window: "-5".into(),
        };
        assert_eq!(debug(ExitCode::from(&window)), debug(ExitCode::from(2)));

        let data = SmacrossError::Data {
            source_name: "msci.csv".into(),
            reason: "missing Date column".into(),
        };
        assert_eq!(debug(ExitCode::from(&data)), debug(ExitCode::from(3)));

        let insufficient = SmacrossError::insufficient("tradable", 0, 1);
        assert_eq!(debug(ExitCode::from(&insufficient)), debug(ExitCode::from(5)));
    }
}
