//! Configuration access port trait.
//!
//! Missing keys read as `None`. A key that is present but does not parse is
//! a `ConfigInvalid` error rather than a silent fallback to a default.

use crate::domain::error::BacktestError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, BacktestError> {
        self.get_string(section, key)
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| {
                    BacktestError::config_invalid(section, key, format!("'{raw}' is not an integer"))
                })
            })
            .transpose()
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, BacktestError> {
        self.get_string(section, key)
            .map(|raw| match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(BacktestError::config_invalid(
                    section,
                    key,
                    format!("'{raw}' is not a number"),
                )),
            })
            .transpose()
    }

    fn get_int_or(&self, section: &str, key: &str, default: i64) -> Result<i64, BacktestError> {
        Ok(self.get_int(section, key)?.unwrap_or(default))
    }

    fn get_double_or(&self, section: &str, key: &str, default: f64) -> Result<f64, BacktestError> {
        Ok(self.get_double(section, key)?.unwrap_or(default))
    }
}
