//! Per-symbol holding with a quantity-weighted average cost basis.

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub avg_cost: f64,
}

impl Position {
    pub fn new(symbol: &str) -> Self {
        Position {
            symbol: symbol.to_string(),
            quantity: 0,
            avg_cost: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn cost_value(&self) -> f64 {
        self.quantity as f64 * self.avg_cost
    }

    /// (old_basis * old_qty + qty * price) / (old_qty + qty)
    ///
    /// A share count that would overflow is rejected and leaves the
    /// position unchanged.
    pub fn add(&mut self, quantity: i64, price: f64) -> Result<(), BacktestError> {
        let new_quantity =
            self.quantity
                .checked_add(quantity)
                .ok_or_else(|| BacktestError::InvalidOrder {
                    reason: format!(
                        "buying {quantity} more {} would overflow the share count of {}",
                        self.symbol, self.quantity
                    ),
                })?;
        self.avg_cost = (self.cost_value() + quantity as f64 * price) / new_quantity as f64;
        self.quantity = new_quantity;
        Ok(())
    }

    /// Removing shares leaves the basis of the remainder untouched.
    pub fn reduce(&mut self, quantity: i64) {
        self.quantity -= quantity;
    }
}
