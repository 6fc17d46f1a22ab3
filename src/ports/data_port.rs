//! Data access port trait.

use crate::domain::error::SmacrossError;
use crate::domain::series::TimeSeries;

/// Supplies ordered time series to the engine.
pub trait DataPort {
    /// Load the series identified by `source` (a file path for the CSV adapter).
    fn load_series(&self, source: &str) -> Result<TimeSeries, SmacrossError>;
}
