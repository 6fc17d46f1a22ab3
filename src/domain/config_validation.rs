//! Configuration validation.
//!
//! Validates all config fields before a run so bad input fails fast with the
//! offending section and key.

use crate::domain::backtest::RecordMode;
use crate::domain::contribution::Interval;
use crate::domain::error::SmacrossError;
use crate::domain::sma::parse_window;
use crate::domain::sweep::parse_windows;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_WINDOW: usize = 200;
pub const DEFAULT_SELL_THRESHOLD: f64 = 0.97;
pub const DEFAULT_BUY_THRESHOLD: f64 = 1.01;
pub const DEFAULT_SWEEP_WINDOWS: &str = "50..250:5";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    config.require_string("data", "signal")?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_record_mode(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_window(config)?;
    validate_threshold(config, "sell_threshold", DEFAULT_SELL_THRESHOLD)?;
    validate_threshold(config, "buy_threshold", DEFAULT_BUY_THRESHOLD)?;
    validate_contribution(config)?;
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if let Some(spec) = config.get_string("sweep", "windows") {
        parse_windows(&spec)?;
    }
    if config.try_get_int("sweep", "jobs", 0)? < 0 {
        return Err(SmacrossError::ConfigInvalid {
            section: "sweep".to_string(),
            key: "jobs".to_string(),
            reason: "jobs must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let value = config.try_get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if value <= 0.0 || !value.is_finite() {
        return Err(SmacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(SmacrossError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmacrossError> {
    match value {
        None => Err(SmacrossError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_record_mode(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if let Some(mode) = config.get_string("backtest", "record") {
        mode.parse::<RecordMode>()
            .map_err(|reason| SmacrossError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "record".to_string(),
                reason,
            })?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    if let Some(window) = config.get_string("strategy", "window") {
        parse_window(&window)?;
    }
    Ok(())
}

fn validate_threshold(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), SmacrossError> {
    let value = config.try_get_double("strategy", key, default)?;
    if value <= 0.0 || !value.is_finite() {
        return Err(SmacrossError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive multiplier", key),
        });
    }
    Ok(())
}

fn validate_contribution(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let amount = config.try_get_double("contribution", "amount", 0.0)?;
    if amount < 0.0 || !amount.is_finite() {
        return Err(SmacrossError::ConfigInvalid {
            section: "contribution".to_string(),
            key: "amount".to_string(),
            reason: "amount must be non-negative".to_string(),
        });
    }
    if let Some(interval) = config.get_string("contribution", "interval") {
        interval
            .parse::<Interval>()
            .map_err(|reason| SmacrossError::ConfigInvalid {
                section: "contribution".to_string(),
                key: "interval".to_string(),
                reason,
            })?;
    }
    Ok(())
}
