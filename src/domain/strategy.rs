//! Strategy contract and order submission helpers.
//!
//! A strategy sees one bar at a time, in chronological order, and trades
//! synchronously against the ledger it is handed. It never marks the ledger
//! to market; the replay engine does that right after each `on_data`.

use chrono::NaiveDate;

use super::error::BacktestError;
use super::ledger::Ledger;
use super::ohlcv::PriceBar;

pub trait Strategy {
    fn name(&self) -> &str;

    /// Called once before the first bar.
    fn on_start(&mut self) {}

    /// Called once per bar. Fatal ledger errors propagate and abort the run.
    fn on_data(
        &mut self,
        date: NaiveDate,
        bar: &PriceBar,
        ledger: &mut Ledger,
    ) -> Result<(), BacktestError>;

    /// Called once after the last bar with the final ledger.
    fn on_end(&mut self, _ledger: &Ledger) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Filled,
    Skipped(BacktestError),
}

impl OrderOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, OrderOutcome::Filled)
    }
}

/// Buy through the ledger, turning a policy-level rejection into a logged skip.
pub fn try_buy(
    ledger: &mut Ledger,
    date: NaiveDate,
    symbol: &str,
    quantity: i64,
    price: f64,
) -> Result<OrderOutcome, BacktestError> {
    settle(ledger.buy(symbol, quantity, price), date, "buy")
}

/// Sell through the ledger, turning a policy-level rejection into a logged skip.
pub fn try_sell(
    ledger: &mut Ledger,
    date: NaiveDate,
    symbol: &str,
    quantity: i64,
    price: f64,
) -> Result<OrderOutcome, BacktestError> {
    settle(ledger.sell(symbol, quantity, price), date, "sell")
}

fn settle(
    result: Result<(), BacktestError>,
    date: NaiveDate,
    side: &'static str,
) -> Result<OrderOutcome, BacktestError> {
    match result {
        Ok(()) => {
            tracing::info!(%date, side, "signal executed");
            Ok(OrderOutcome::Filled)
        }
        Err(e) if e.is_recoverable() => {
            tracing::warn!(%date, side, reason = %e, "signal skipped");
            Ok(OrderOutcome::Skipped(e))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn try_buy_fills_when_affordable() {
        let mut ledger = Ledger::new(1000.0).unwrap();
        let outcome = try_buy(&mut ledger, date(), "SPY", 5, 100.0).unwrap();
        assert!(outcome.is_filled());
        assert_eq!(ledger.position("SPY"), 5);
    }

    #[test]
    fn try_buy_skips_when_unaffordable() {
        let mut ledger = Ledger::new(100.0).unwrap();
        let outcome = try_buy(&mut ledger, date(), "SPY", 5, 100.0).unwrap();
        assert!(matches!(
            outcome,
            OrderOutcome::Skipped(BacktestError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.position("SPY"), 0);
    }

    #[test]
    fn try_sell_skips_without_shares() {
        let mut ledger = Ledger::new(100.0).unwrap();
        let outcome = try_sell(&mut ledger, date(), "SPY", 1, 100.0).unwrap();
        assert!(!outcome.is_filled());
    }

    #[test]
    fn invalid_order_is_fatal() {
        let mut ledger = Ledger::new(100.0).unwrap();
        assert!(matches!(
            try_buy(&mut ledger, date(), "SPY", 0, 100.0),
            Err(BacktestError::InvalidOrder { .. })
        ));
        assert!(try_sell(&mut ledger, date(), "SPY", 1, -1.0).is_err());
    }
}
