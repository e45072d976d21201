//! Configuration validation.
//!
//! Validates every config field before a backtest runs and reports the
//! first violation.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::BarField;
use crate::domain::strategies::{
    DEFAULT_LONG_WINDOW, DEFAULT_LOT_SIZE, DEFAULT_SHORT_WINDOW, StrategyKind,
};
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_cash(config)?;
    validate_periods_per_year(config)?;
    validate_risk_free_rate(config)?;
    validate_symbol(config)?;
    validate_price_field(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let kind = match config.get_string("strategy", "kind") {
        Some(k) => StrategyKind::parse(&k)?,
        None => StrategyKind::MovingAverageCrossover,
    };
    validate_lot_size(config)?;
    if kind == StrategyKind::MovingAverageCrossover {
        validate_windows(config)?;
    }
    Ok(())
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_double("backtest", "initial_cash")? {
        if value < 0.0 {
            return Err(BacktestError::config_invalid(
                "backtest",
                "initial_cash",
                "initial_cash must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_int("backtest", "periods_per_year")? {
        if value <= 0 || value > i64::from(u32::MAX) {
            return Err(BacktestError::config_invalid(
                "backtest",
                "periods_per_year",
                "periods_per_year must be a positive integer",
            ));
        }
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(value) = config.get_double("backtest", "risk_free_rate")? {
        if value <= -1.0 || value >= 1.0 {
            return Err(BacktestError::config_invalid(
                "backtest",
                "risk_free_rate",
                "risk_free_rate is a per-period rate and must be between -1 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if s.trim().is_empty() => Err(BacktestError::config_invalid(
            "backtest",
            "symbol",
            "symbol must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_price_field(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    if let Some(raw) = config.get_string("backtest", "price_field") {
        raw.parse::<BarField>().map_err(|_| {
            BacktestError::config_invalid(
                "backtest",
                "price_field",
                format!("'{raw}' is not one of open, high, low, close"),
            )
        })?;
    }
    Ok(())
}

fn validate_lot_size(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_int_or("strategy", "lot_size", DEFAULT_LOT_SIZE)?;
    if value <= 0 {
        return Err(BacktestError::config_invalid(
            "strategy",
            "lot_size",
            "lot_size must be positive",
        ));
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let short = config.get_int_or("strategy", "short_window", DEFAULT_SHORT_WINDOW)?;
    let long = config.get_int_or("strategy", "long_window", DEFAULT_LONG_WINDOW)?;
    if short <= 0 {
        return Err(BacktestError::config_invalid(
            "strategy",
            "short_window",
            "short_window must be positive",
        ));
    }
    if long <= 0 {
        return Err(BacktestError::config_invalid(
            "strategy",
            "long_window",
            "long_window must be positive",
        ));
    }
    if short > long {
        return Err(BacktestError::config_invalid(
            "strategy",
            "short_window",
            "short_window must not exceed long_window",
        ));
    }
    Ok(())
}
