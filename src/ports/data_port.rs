//! Data access port trait.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::TimestampedSeries;

pub trait DataPort {
    /// Load the full chronological bar series for `symbol`.
    fn load_series(&self, symbol: &str) -> Result<TimestampedSeries, BacktestError>;
}
