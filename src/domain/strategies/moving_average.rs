//! Moving average crossover.
//!
//! Keeps the last `long_window` closes. Once the window is full:
//! SMA(short) > SMA(long) attempts a buy of one lot, SMA(short) < SMA(long)
//! attempts a sell of one lot, equality does nothing.

use chrono::NaiveDate;
use std::collections::VecDeque;

use crate::domain::error::BacktestError;
use crate::domain::ledger::Ledger;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::{Strategy, try_buy, try_sell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalStats {
    pub executed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct MovingAverageCrossover {
    symbol: String,
    short_window: usize,
    long_window: usize,
    lot_size: i64,
    prices: VecDeque<f64>,
    last_signal: Option<Signal>,
    stats: SignalStats,
}

impl MovingAverageCrossover {
    pub fn new(
        symbol: &str,
        short_window: i64,
        long_window: i64,
        lot_size: i64,
    ) -> Result<Self, BacktestError> {
        if short_window <= 0 || long_window <= 0 || short_window > long_window {
            return Err(BacktestError::InvalidConfiguration {
                reason: format!(
                    "invalid moving average windows: short={short_window}, long={long_window}"
                ),
            });
        }
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
        let long_window = long_window as usize;
        Ok(Self {
            symbol: symbol.to_string(),
            short_window: short_window as usize,
            long_window,
            lot_size,
            prices: VecDeque::with_capacity(long_window + 1),
            last_signal: None,
            stats: SignalStats::default(),
        })
    }

    pub fn last_signal(&self) -> Option<Signal> {
        self.last_signal
    }

    pub fn stats(&self) -> &SignalStats {
        &self.stats
    }

    /// (short SMA, long SMA) once the buffer holds `long_window` closes.
    pub fn moving_averages(&self) -> Option<(f64, f64)> {
        if self.prices.len() < self.long_window {
            return None;
        }
        Some((
            self.tail_mean(self.short_window),
            self.tail_mean(self.long_window),
        ))
    }

    fn tail_mean(&self, window: usize) -> f64 {
        self.prices.iter().rev().take(window).sum::<f64>() / window as f64
    }

    fn push_close(&mut self, close: f64) {
        self.prices.push_back(close);
        if self.prices.len() > self.long_window {
            self.prices.pop_front();
        }
    }
}

fn classify(short_ma: f64, long_ma: f64) -> Signal {
    if short_ma > long_ma {
        Signal::Buy
    } else if short_ma < long_ma {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &str {
        "Moving Average Crossover"
    }

    fn on_start(&mut self) {
        tracing::info!(
            symbol = %self.symbol,
            short = self.short_window,
            long = self.long_window,
            lot = self.lot_size,
            "starting moving average crossover"
        );
    }

    fn on_data(
        &mut self,
        date: NaiveDate,
        bar: &PriceBar,
        ledger: &mut Ledger,
    ) -> Result<(), BacktestError> {
        self.push_close(bar.close);

        let Some((short_ma, long_ma)) = self.moving_averages() else {
            return Ok(());
        };
        tracing::debug!(%date, short_ma, long_ma, "moving averages");

        let signal = classify(short_ma, long_ma);
        self.last_signal = Some(signal);

        if signal == Signal::Buy && !ledger.can_afford(self.lot_size, bar.close) {
            tracing::warn!(
                %date,
                symbol = %self.symbol,
                quantity = self.lot_size,
                price = bar.close,
                cash = ledger.cash(),
                "buy signal skipped: lot costs more than available cash"
            );
            self.stats.skipped += 1;
            return Ok(());
        }

        let outcome = match signal {
            Signal::Buy => try_buy(ledger, date, &self.symbol, self.lot_size, bar.close)?,
            Signal::Sell => try_sell(ledger, date, &self.symbol, self.lot_size, bar.close)?,
            Signal::Hold => return Ok(()),
        };

        if outcome.is_filled() {
            self.stats.executed += 1;
        } else {
            self.stats.skipped += 1;
        }
        Ok(())
    }

    fn on_end(&mut self, ledger: &Ledger) {
        tracing::info!(
            symbol = %self.symbol,
            held = ledger.position(&self.symbol),
            cash = ledger.cash(),
            executed = self.stats.executed,
            skipped = self.stats.skipped,
            "moving average crossover finished"
        );
    }
}
