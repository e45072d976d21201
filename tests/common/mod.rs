#![allow(dead_code)]

use backtester::domain::error::BacktestError;
pub use backtester::domain::ohlcv::{PriceBar, TimestampedSeries};
use backtester::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, TimestampedSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: TimestampedSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_series(&self, symbol: &str) -> Result<TimestampedSeries, BacktestError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(BacktestError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(close: f64) -> PriceBar {
    PriceBar {
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000,
    }
}

/// One bar per day from 2024-01-01, open equal to close.
pub fn series_from_closes(closes: &[f64]) -> TimestampedSeries {
    let start = date(2024, 1, 1);
    TimestampedSeries::from_bars(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| (start + chrono::Duration::days(i as i64), make_bar(c))),
    )
}

pub fn csv_from_closes(closes: &[f64]) -> String {
    let start = date(2024, 1, 1);
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let d = start + chrono::Duration::days(i as i64);
        out.push_str(&format!(
            "{},{},{},{},{},1000\n",
            d.format("%Y-%m-%d"),
            c,
            c * 1.01,
            c * 0.99,
            c
        ));
    }
    out
}
