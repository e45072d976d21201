//! Cash/position ledger with solvency checks and mark-to-market valuation.
//!
//! The ledger is the only owner of cash, positions and the performance
//! series. Strategies mutate it through `buy`/`sell`; the replay engine
//! drives `mark_to_market` once per bar.

use std::collections::HashMap;

use super::error::BacktestError;
use super::performance::PerformanceSeries;
use super::position::Position;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    cash: f64,
    initial_cash: f64,
    positions: HashMap<String, Position>,
    performance: PerformanceSeries,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Result<Self, BacktestError> {
        let mut ledger = Ledger::default();
        ledger.set_initial_cash(initial_cash)?;
        Ok(ledger)
    }

    /// Reset the ledger to `amount` of cash with no positions and no history.
    pub fn set_initial_cash(&mut self, amount: f64) -> Result<(), BacktestError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(BacktestError::InvalidConfiguration {
                reason: format!("initial cash must be a non-negative number, got {amount}"),
            });
        }
        self.cash = amount;
        self.initial_cash = amount;
        self.positions.clear();
        self.performance.clear();
        Ok(())
    }

    pub fn buy(&mut self, symbol: &str, quantity: i64, price: f64) -> Result<(), BacktestError> {
        validate_order(symbol, quantity, price)?;

        let cost = quantity as f64 * price;
        if cost > self.cash {
            return Err(BacktestError::InsufficientFunds {
                symbol: symbol.to_string(),
                required: cost,
                available: self.cash,
            });
        }

        self.positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol))
            .add(quantity, price)?;
        self.cash -= cost;

        tracing::debug!(symbol, quantity, price, cash = self.cash, "bought");
        Ok(())
    }

    pub fn sell(&mut self, symbol: &str, quantity: i64, price: f64) -> Result<(), BacktestError> {
        validate_order(symbol, quantity, price)?;

        let held = self.position(symbol);
        if held < quantity {
            return Err(BacktestError::InsufficientPosition {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        self.cash += quantity as f64 * price;
        if let Some(pos) = self.positions.get_mut(symbol) {
            pos.reduce(quantity);
            if pos.is_flat() {
                self.positions.remove(symbol);
            }
        }

        tracing::debug!(symbol, quantity, price, cash = self.cash, "sold");
        Ok(())
    }

    /// Value cash plus every holding at `prices`, append the total to the
    /// equity curve and return it.
    ///
    /// A held symbol missing from `prices` contributes 0 for this mark and
    /// is reported as a warning.
    pub fn mark_to_market(&mut self, prices: &HashMap<String, f64>) -> f64 {
        let mut total = self.cash;
        for pos in self.positions.values() {
            match prices.get(&pos.symbol) {
                Some(&price) => total += pos.market_value(price),
                None => {
                    tracing::warn!(symbol = %pos.symbol, "no current price, position valued at 0");
                }
            }
        }
        self.performance.append(total);
        total
    }

    /// The most recent mark, or cash alone before the first one.
    pub fn net_worth(&self) -> f64 {
        self.performance.latest().unwrap_or(self.cash)
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Shares held in `symbol`, 0 when flat.
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    pub fn avg_cost_basis(&self, symbol: &str) -> Option<f64> {
        self.positions.get(symbol).map(|p| p.avg_cost)
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Whether buying `quantity` at `price` fits in current cash.
    pub fn can_afford(&self, quantity: i64, price: f64) -> bool {
        quantity as f64 * price <= self.cash
    }

    pub fn performance(&self) -> &PerformanceSeries {
        &self.performance
    }

    pub fn equity_curve(&self) -> &[f64] {
        self.performance.equity_curve()
    }

    pub fn returns(&self) -> &[f64] {
        self.performance.returns()
    }
}

fn validate_order(symbol: &str, quantity: i64, price: f64) -> Result<(), BacktestError> {
    if symbol.trim().is_empty() {
        return Err(BacktestError::InvalidOrder {
            reason: "symbol must not be empty".into(),
        });
    }
    if quantity <= 0 {
        return Err(BacktestError::InvalidOrder {
            reason: format!("quantity must be positive, got {quantity}"),
        });
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(BacktestError::InvalidOrder {
            reason: format!("price must be positive, got {price}"),
        });
    }
    Ok(())
}
