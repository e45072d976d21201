//! Buy one lot on the first affordable bar, then hold to the end.

use chrono::NaiveDate;

use crate::domain::error::BacktestError;
use crate::domain::ledger::Ledger;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::{Strategy, try_buy};

#[derive(Debug, Clone)]
pub struct BuyAndHold {
    symbol: String,
    lot_size: i64,
    entered: bool,
}

impl BuyAndHold {
    pub fn new(symbol: &str, lot_size: i64) -> Result<Self, BacktestError> {
        if lot_size <= 0 {
            return Err(BacktestError::InvalidConfiguration {
                reason: format!("lot size must be positive, got {lot_size}"),
            });
        }
        if symbol.trim().is_empty() {
            return Err(BacktestError::InvalidConfiguration {
                reason: "strategy symbol must not be empty".into(),
            });
        }
        Ok(Self {
            symbol: symbol.to_string(),
            lot_size,
            entered: false,
        })
    }

    pub fn entered(&self) -> bool {
        self.entered
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "Buy and Hold"
    }

    fn on_data(
        &mut self,
        date: NaiveDate,
        bar: &PriceBar,
        ledger: &mut Ledger,
    ) -> Result<(), BacktestError> {
        if self.entered {
            return Ok(());
        }
        self.entered = try_buy(ledger, date, &self.symbol, self.lot_size, bar.close)?.is_filled();
        Ok(())
    }
}
