//! Configuration access port trait.

use std::str::FromStr;

use crate::domain::error::SmacrossError;

/// Typed lookups of `[section] key` values with caller-supplied defaults.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Like `get_string`, but an absent key is a `ConfigMissing` error.
    fn require_string(&self, section: &str, key: &str) -> Result<String, SmacrossError> {
        self.get_string(section, key)
            .ok_or_else(|| SmacrossError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Like `get_int`, but a value that is present and not an integer is a
    /// `ConfigInvalid` error instead of the default.
    fn try_get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SmacrossError> {
        parse_present(self.get_string(section, key), section, key, "an integer", default)
    }

    /// Like `get_double`, but a value that is present and not a number is a
    /// `ConfigInvalid` error instead of the default.
    fn try_get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SmacrossError> {
        parse_present(self.get_string(section, key), section, key, "a number", default)
    }
}

fn parse_present<T: FromStr>(
    value: Option<String>,
    section: &str,
    key: &str,
    expected: &str,
    default: T,
) -> Result<T, SmacrossError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| SmacrossError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected {expected}, got '{raw}'"),
        }),
    }
}
