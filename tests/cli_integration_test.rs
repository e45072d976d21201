//! CLI integration tests for the run and validate orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, build_strategy)
//! - Data file resolution
//! - Full pipeline with MockDataPort
//! - End-to-end with real INI and CSV files on disk

mod common;

use approx::assert_relative_eq;
use backtester::adapters::csv_adapter::CsvAdapter;
use backtester::adapters::file_config_adapter::FileConfigAdapter;
use backtester::cli;
use backtester::domain::backtest::BacktestConfig;
use backtester::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use backtester::domain::error::BacktestError;
use backtester::domain::ohlcv::BarField;
use backtester::domain::strategies::{build_strategy, BuyAndHold, MovingAverageCrossover};
use common::*;
use std::io::Write;
use std::path::PathBuf;

fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
initial_cash = 1000.0
periods_per_year = 252
risk_free_rate = 0.0
symbol = X
data_file = data/x.csv
price_field = close

[strategy]
kind = ma_crossover
short_window = 2
long_window = 3
lot_size = 10
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_backtest_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();

        assert_relative_eq!(config.initial_cash, 1000.0);
        assert_eq!(config.periods_per_year, 252);
        assert_relative_eq!(config.risk_free_rate, 0.0);
        assert_eq!(config.symbol, "X");
        assert_eq!(config.price_field, BarField::Close);
    }

    #[test]
    fn build_backtest_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        assert_eq!(config, BacktestConfig::default());
    }

    #[test]
    fn build_backtest_config_invalid_number() {
        let adapter = FileConfigAdapter::from_string("[backtest]\ninitial_cash = plenty\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "initial_cash"));
    }

    #[test]
    fn build_backtest_config_invalid_price_field() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nprice_field = vwap\n").unwrap();
        let err = cli::build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "price_field"));
    }

    #[test]
    fn valid_ini_passes_both_validators() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert!(validate_backtest_config(&adapter).is_ok());
        assert!(validate_strategy_config(&adapter).is_ok());
    }

    #[test]
    fn data_file_from_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(
            cli::resolve_data_path(None, &adapter).unwrap(),
            PathBuf::from("data/x.csv")
        );
    }
}

mod strategy_building {
    use super::*;

    #[test]
    fn build_strategy_from_ini() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let strategy = build_strategy(&adapter, "X").unwrap();
        assert_eq!(strategy.name(), "Moving Average Crossover");
    }

    #[test]
    fn build_strategy_rejects_inverted_windows() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nshort_window = 9\nlong_window = 3\n")
                .unwrap();
        assert!(matches!(
            build_strategy(&adapter, "X"),
            Err(BacktestError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn build_strategy_buy_and_hold() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nkind = buy_and_hold\nlot_size = 3\n")
                .unwrap();
        assert_eq!(build_strategy(&adapter, "X").unwrap().name(), "Buy and Hold");
    }
}

mod pipeline_mock {
    use super::*;

    fn bt_config() -> BacktestConfig {
        BacktestConfig {
            initial_cash: 1000.0,
            symbol: "X".to_string(),
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn pipeline_runs_and_reports() {
        let port = MockDataPort::new()
            .with_series("X", series_from_closes(&[10.0, 10.0, 10.0, 12.0, 8.0]));
        let mut strategy = MovingAverageCrossover::new("X", 2, 3, 10).unwrap();
        let config = bt_config();

        let out = cli::execute_pipeline(&port, &config, &mut strategy).unwrap();

        assert_eq!(out.result.summary.bars_processed, 5);
        assert_eq!(out.metrics.periods, 5);
        assert_relative_eq!(out.metrics.total_return, -0.04, epsilon = 1e-12);

        let report = cli::format_report(&config, &out.series, &out.result, &out.metrics);
        assert!(report.contains("=== Backtest Results ==="));
        assert!(report.contains("2024-01-01 to 2024-01-05"));
        assert!(report.contains("X:  10 shares @ 12.00 avg cost"));
        assert!(report.contains("Total Return:     -4.00%"));
        assert!(report.contains("Max Drawdown:     -4.0%"));
    }

    #[test]
    fn pipeline_report_without_holdings() {
        let port = MockDataPort::new().with_series("X", series_from_closes(&[10.0, 11.0]));
        let mut strategy = BuyAndHold::new("X", 1000).unwrap();
        let config = bt_config();

        let out = cli::execute_pipeline(&port, &config, &mut strategy).unwrap();
        let report = cli::format_report(&config, &out.series, &out.result, &out.metrics);
        assert!(report.contains("(none)"));
        assert!(report.contains("Final Equity:     1000.00"));
    }

    #[test]
    fn pipeline_data_error_propagates() {
        let port = MockDataPort::new().with_error("X", "disk on fire");
        let mut strategy = BuyAndHold::new("X", 1).unwrap();
        let err = cli::execute_pipeline(&port, &bt_config(), &mut strategy).unwrap_err();
        assert!(matches!(err, BacktestError::Data { reason } if reason == "disk on fire"));
    }

    #[test]
    fn pipeline_empty_series_is_data_error() {
        let port = MockDataPort::new();
        let mut strategy = BuyAndHold::new("X", 1).unwrap();
        let err = cli::execute_pipeline(&port, &bt_config(), &mut strategy).unwrap_err();
        assert!(matches!(err, BacktestError::Data { .. }));
    }

    #[test]
    fn pipeline_single_bar_cannot_produce_metrics() {
        let port = MockDataPort::new().with_series("X", series_from_closes(&[10.0]));
        let mut strategy = BuyAndHold::new("X", 1).unwrap();
        let err = cli::execute_pipeline(&port, &bt_config(), &mut strategy).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientData { actual: 1, .. }));
    }
}

mod end_to_end {
    use super::*;

    #[test]
    fn e2e_ini_and_csv_on_disk() {
        let csv = write_temp_file(&csv_from_closes(&[10.0, 10.0, 10.0, 12.0, 8.0, 6.0]));
        let ini = write_temp_file(VALID_INI);

        let adapter = FileConfigAdapter::from_file(ini.path()).unwrap();
        validate_backtest_config(&adapter).unwrap();
        validate_strategy_config(&adapter).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        let mut strategy = build_strategy(&adapter, &config.symbol).unwrap();

        let data_path = cli::resolve_data_path(Some(csv.path()), &adapter).unwrap();
        let port = CsvAdapter::new(data_path);
        let out = cli::execute_pipeline(&port, &config, strategy.as_mut()).unwrap();

        assert_eq!(out.series.len(), 6);
        assert_relative_eq!(out.result.summary.final_equity, 940.0);
        assert!(out.result.ledger.positions().is_empty());
        assert_relative_eq!(out.metrics.max_drawdown, 0.06, epsilon = 1e-12);
    }

    #[test]
    fn e2e_negative_low_row_never_prices_the_run() {
        let csv = write_temp_file(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01,10,10.5,9.5,10,1000\n\
             2024-01-02,10,10.5,-50,10,1000\n\
             2024-01-03,10,11.5,10.5,11,1000\n",
        );
        let config = BacktestConfig {
            initial_cash: 100.0,
            symbol: "X".to_string(),
            price_field: BarField::Low,
            ..BacktestConfig::default()
        };
        let mut strategy = BuyAndHold::new("X", 10).unwrap();

        let port = CsvAdapter::new(csv.path().to_path_buf());
        let out = cli::execute_pipeline(&port, &config, &mut strategy).unwrap();

        assert_eq!(out.series.len(), 2);
        let curve = out.result.ledger.equity_curve();
        assert!(curve.iter().all(|&v| v > 0.0));
        // bought 10 at close 10, marked at lows 9.5 and 10.5
        assert_relative_eq!(curve[0], 95.0);
        assert_relative_eq!(curve[1], 105.0);
    }

    #[test]
    fn e2e_missing_csv_is_data_error() {
        let ini = write_temp_file(VALID_INI);
        let adapter = FileConfigAdapter::from_file(ini.path()).unwrap();
        let config = cli::build_backtest_config(&adapter).unwrap();
        let mut strategy = build_strategy(&adapter, &config.symbol).unwrap();

        let port = CsvAdapter::new(PathBuf::from("/nonexistent/prices.csv"));
        let err = cli::execute_pipeline(&port, &config, strategy.as_mut()).unwrap_err();
        assert!(matches!(err, BacktestError::Data { .. }));
    }

    #[test]
    fn e2e_missing_config_file() {
        assert!(cli::load_config(std::path::Path::new("/nonexistent/bt.ini")).is_err());
    }
}
