//! Core domain types and logic.

pub mod ohlcv;
pub mod position;
pub mod performance;
pub mod ledger;
pub mod strategy;
pub mod strategies;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
