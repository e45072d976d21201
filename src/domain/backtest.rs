//! Replay engine and event loop.
//!
//! BacktestConfig holds the run parameters; ReplayEngine walks the bar
//! series once, strictly in order: strategy first, then mark-to-market.

use std::collections::HashMap;
use std::fmt;

use super::error::BacktestError;
use super::ledger::Ledger;
use super::metrics::DEFAULT_PERIODS_PER_YEAR;
use super::ohlcv::{BarField, TimestampedSeries};
use super::strategy::Strategy;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;
pub const DEFAULT_SYMBOL: &str = "SPY";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub symbol: String,
    pub price_field: BarField,
    pub periods_per_year: u32,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            symbol: DEFAULT_SYMBOL.to_string(),
            price_field: BarField::Close,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    Running,
    Finished,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::NotStarted => "not started",
            EngineState::Running => "running",
            EngineState::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub bars_processed: usize,
    pub final_equity: f64,
}

/// Single-use driver of one backtest run.
#[derive(Debug)]
pub struct ReplayEngine {
    symbol: String,
    price_field: BarField,
    state: EngineState,
}

impl ReplayEngine {
    /// Held shares of `symbol` are valued at `price_field` of each bar.
    pub fn new(symbol: &str, price_field: BarField) -> Self {
        ReplayEngine {
            symbol: symbol.to_string(),
            price_field,
            state: EngineState::NotStarted,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn run(
        &mut self,
        series: &TimestampedSeries,
        strategy: &mut dyn Strategy,
        ledger: &mut Ledger,
    ) -> Result<RunSummary, BacktestError> {
        if self.state != EngineState::NotStarted {
            return Err(BacktestError::EngineState {
                state: self.state.to_string(),
            });
        }

        tracing::info!(strategy = strategy.name(), bars = series.len(), "backtest started");
        self.state = EngineState::Running;
        strategy.on_start();

        let mut snapshot = HashMap::with_capacity(1);
        let mut bars_processed = 0;
        for (date, bar) in series.iter() {
            strategy.on_data(date, bar, ledger)?;

            let price = bar.market_data().get(self.price_field);
            snapshot.insert(self.symbol.clone(), price);
            let equity = ledger.mark_to_market(&snapshot);
            tracing::debug!(%date, equity, "marked to market");
            bars_processed += 1;
        }

        self.state = EngineState::Finished;
        strategy.on_end(ledger);

        let summary = RunSummary {
            bars_processed,
            final_equity: ledger.net_worth(),
        };
        tracing::info!(
            bars = summary.bars_processed,
            final_equity = summary.final_equity,
            "backtest completed"
        );
        Ok(summary)
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: Ledger,
    pub summary: RunSummary,
}

/// Fresh ledger, fresh engine, one full replay.
pub fn run_backtest(
    config: &BacktestConfig,
    series: &TimestampedSeries,
    strategy: &mut dyn Strategy,
) -> Result<BacktestResult, BacktestError> {
    let mut ledger = Ledger::new(config.initial_cash)?;
    let mut engine = ReplayEngine::new(&config.symbol, config.price_field);
    let summary = engine.run(series, strategy, &mut ledger)?;
    Ok(BacktestResult { ledger, summary })
}
