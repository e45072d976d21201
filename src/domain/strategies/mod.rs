//! Strategy variants and the config-driven factory.

pub mod buy_and_hold;
pub mod moving_average;

pub use buy_and_hold::BuyAndHold;
pub use moving_average::MovingAverageCrossover;

use crate::domain::error::BacktestError;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SHORT_WINDOW: i64 = 5;
pub const DEFAULT_LONG_WINDOW: i64 = 20;
pub const DEFAULT_LOT_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    MovingAverageCrossover,
    BuyAndHold,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Result<Self, BacktestError> {
        match value.trim().to_lowercase().as_str() {
            "ma_crossover" | "moving_average" => Ok(StrategyKind::MovingAverageCrossover),
            "buy_and_hold" => Ok(StrategyKind::BuyAndHold),
            other => Err(BacktestError::config_invalid(
                "strategy",
                "kind",
                format!("unknown strategy '{other}' (expected ma_crossover or buy_and_hold)"),
            )),
        }
    }
}

/// Build the strategy described by the `[strategy]` section, trading `symbol`.
pub fn build_strategy(
    config: &dyn ConfigPort,
    symbol: &str,
) -> Result<Box<dyn Strategy>, BacktestError> {
    let kind = match config.get_string("strategy", "kind") {
        Some(k) => StrategyKind::parse(&k)?,
        None => StrategyKind::MovingAverageCrossover,
    };
    let lot_size = config.get_int_or("strategy", "lot_size", DEFAULT_LOT_SIZE)?;

    Ok(match kind {
        StrategyKind::MovingAverageCrossover => Box::new(MovingAverageCrossover::new(
            symbol,
            config.get_int_or("strategy", "short_window", DEFAULT_SHORT_WINDOW)?,
            config.get_int_or("strategy", "long_window", DEFAULT_LONG_WINDOW)?,
            lot_size,
        )?),
        StrategyKind::BuyAndHold => Box::new(BuyAndHold::new(symbol, lot_size)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn default_is_moving_average() {
        let config = FileConfigAdapter::from_string("[strategy]\n").unwrap();
        let strategy = build_strategy(&config, "SPY").unwrap();
        assert_eq!(strategy.name(), "Moving Average Crossover");
    }

    #[test]
    fn buy_and_hold_kind() {
        let config = FileConfigAdapter::from_string("[strategy]\nkind = buy_and_hold\n").unwrap();
        let strategy = build_strategy(&config, "SPY").unwrap();
        assert_eq!(strategy.name(), "Buy and Hold");
    }

    #[test]
    fn unknown_kind_rejected() {
        let config = FileConfigAdapter::from_string("[strategy]\nkind = martingale\n").unwrap();
        assert!(matches!(
            build_strategy(&config, "SPY"),
            Err(BacktestError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn inverted_windows_rejected() {
        let config =
            FileConfigAdapter::from_string("[strategy]\nshort_window = 30\nlong_window = 10\n")
                .unwrap();
        assert!(matches!(
            build_strategy(&config, "SPY"),
            Err(BacktestError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn non_numeric_window_rejected() {
        let config = FileConfigAdapter::from_string("[strategy]\nshort_window = five\n").unwrap();
        assert!(matches!(
            build_strategy(&config, "SPY"),
            Err(BacktestError::ConfigInvalid { .. })
        ));
    }
}
