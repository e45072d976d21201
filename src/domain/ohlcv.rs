//! Price bars, the chronological bar series and the market-data projection.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::BacktestError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Projection used for valuation. Volume is not a price and is left out.
    pub fn market_data(&self) -> MarketData {
        MarketData {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }

    /// Every price field can value a position: all positive and finite,
    /// and the high is not below the low.
    pub fn is_valid(&self) -> bool {
        let positive = |p: f64| p.is_finite() && p > 0.0;
        positive(self.open)
            && positive(self.high)
            && positive(self.low)
            && positive(self.close)
            && self.high >= self.low
    }
}

/// Price fields of the market-data projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BarField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BarField::Open => "Open",
            BarField::High => "High",
            BarField::Low => "Low",
            BarField::Close => "Close",
        };
        f.write_str(name)
    }
}

impl FromStr for BarField {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(BarField::Open),
            "high" => Ok(BarField::High),
            "low" => Ok(BarField::Low),
            "close" => Ok(BarField::Close),
            other => Err(BacktestError::InvalidConfiguration {
                reason: format!("unknown price field '{other}' (expected open, high, low or close)"),
            }),
        }
    }
}

/// The Open/High/Low/Close view of a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketData {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl MarketData {
    pub fn get(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
        }
    }
}

/// Bars keyed by date, strictly increasing, one bar per date.
///
/// Ordering comes from the parsed `NaiveDate`, never from the raw text the
/// loader read, so any input format sorts chronologically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampedSeries {
    bars: Vec<(NaiveDate, PriceBar)>,
}

impl TimestampedSeries {
    /// Build a series from bars in any order. A repeated date keeps the
    /// bar that came last in the input.
    pub fn from_bars<I>(bars: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, PriceBar)>,
    {
        let mut by_date = BTreeMap::new();
        for (date, bar) in bars {
            if by_date.insert(date, bar).is_some() {
                tracing::warn!(%date, "duplicate timestamp, keeping the later bar");
            }
        }
        Self {
            bars: by_date.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &PriceBar)> + '_ {
        self.bars.iter().map(|(date, bar)| (*date, bar))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|(d, _)| *d)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|(_, b)| b.close).collect()
    }
}
