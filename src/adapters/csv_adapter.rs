//! CSV file data adapter.
//!
//! Expected columns: `timestamp,open,high,low,close,volume` with a header
//! row. Malformed rows are skipped with a warning; an unreadable file is an
//! error.

use crate::domain::error::BacktestError;
use crate::domain::ohlcv::{PriceBar, TimestampedSeries};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One CSV file holding the bars of the traded symbol.
pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DataPort for CsvAdapter {
    fn load_series(&self, symbol: &str) -> Result<TimestampedSeries, BacktestError> {
        let path = &self.path;
        let file = File::open(path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let series = parse_series(file)?;
        tracing::info!(
            symbol,
            path = %path.display(),
            bars = series.len(),
            "loaded price series"
        );
        Ok(series)
    }
}

/// Parse CSV bars from any reader into a chronological series.
pub fn parse_series<R: Read>(reader: R) -> Result<TimestampedSeries, BacktestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                return Err(BacktestError::Data {
                    reason: format!("CSV read error: {e}"),
                });
            }
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping malformed row");
                continue;
            }
        };

        match parse_record(&record) {
            Ok(entry) => bars.push(entry),
            Err(reason) => {
                tracing::warn!(line, %reason, "skipping malformed row");
            }
        }
    }

    Ok(TimestampedSeries::from_bars(bars))
}

fn parse_record(record: &csv::StringRecord) -> Result<(NaiveDate, PriceBar), String> {
    let field = |i: usize, name: &str| -> Result<&str, String> {
        match record.get(i) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(format!("missing {name} column")),
        }
    };
    let price = |i: usize, name: &str| -> Result<f64, String> {
        let raw = field(i, name)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(format!("invalid {name} value '{raw}'")),
        }
    };

    let date = parse_timestamp(field(0, "timestamp")?)?;
    let bar = PriceBar {
        open: price(1, "open")?,
        high: price(2, "high")?,
        low: price(3, "low")?,
        close: price(4, "close")?,
        volume: {
            let raw = field(5, "volume")?;
            raw.parse::<u64>()
                .map_err(|_| format!("invalid volume value '{raw}'"))?
        },
    };
    if !bar.is_valid() {
        return Err(format!(
            "prices must be positive with high >= low, got open={} high={} low={} close={}",
            bar.open, bar.high, bar.low, bar.close
        ));
    }
    Ok((date, bar))
}

/// `YYYY-MM-DD`, optionally followed by a time of day that is dropped.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Ok(date);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| format!("invalid timestamp '{raw}' (expected YYYY-MM-DD)"))
}
