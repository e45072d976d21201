//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::backtest::{DEFAULT_INITIAL_CASH, DEFAULT_SYMBOL};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::BacktestError;
use crate::domain::metrics::{MetricsReport, DEFAULT_PERIODS_PER_YEAR};
use crate::domain::ohlcv::{BarField, TimestampedSeries};
use crate::domain::strategies::build_strategy;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "backtester", about = "Single-symbol strategy backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [backtest] data_file
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Traded symbol, overrides [backtest] symbol
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr subscriber. Safe to call more than once.
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            symbol,
        } => run_backtest(&config, data.as_deref(), symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: &BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn run_backtest(config_path: &Path, data_override: Option<&Path>, symbol: Option<&str>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    // Stage 2: Build run parameters and strategy
    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Some(symbol) = symbol {
        if symbol.trim().is_empty() {
            return fail(&BacktestError::InvalidConfiguration {
                reason: "--symbol must not be empty".into(),
            });
        }
        bt_config.symbol = symbol.to_string();
    }

    let mut strategy = match build_strategy(&adapter, &bt_config.symbol) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!("Strategy: {}", strategy.name());

    // Stage 3: Resolve data source
    let data_path = match resolve_data_path(data_override, &adapter) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let data_port = CsvAdapter::new(data_path);

    run_backtest_pipeline(&data_port, &bt_config, strategy.as_mut())
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let periods = adapter.get_int_or(
        "backtest",
        "periods_per_year",
        i64::from(DEFAULT_PERIODS_PER_YEAR),
    )?;
    let periods_per_year = u32::try_from(periods)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| {
            BacktestError::config_invalid(
                "backtest",
                "periods_per_year",
                "periods_per_year must be a positive integer",
            )
        })?;

    let price_field = match adapter.get_string("backtest", "price_field") {
        Some(raw) => raw.parse::<BarField>().map_err(|_| {
            BacktestError::config_invalid(
                "backtest",
                "price_field",
                format!("'{raw}' is not one of open, high, low, close"),
            )
        })?,
        None => BarField::default(),
    };

    Ok(BacktestConfig {
        initial_cash: adapter.get_double_or("backtest", "initial_cash", DEFAULT_INITIAL_CASH)?,
        symbol: adapter
            .get_string("backtest", "symbol")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
        price_field,
        periods_per_year,
        risk_free_rate: adapter.get_double_or("backtest", "risk_free_rate", 0.0)?,
    })
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, BacktestError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    adapter
        .get_string("backtest", "data_file")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: "backtest".into(),
            key: "data_file".into(),
        })
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub series: TimestampedSeries,
    pub result: BacktestResult,
    pub metrics: MetricsReport,
}

pub fn execute_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    strategy: &mut dyn Strategy,
) -> Result<PipelineOutput, BacktestError> {
    // Stage 4: Load bars
    let series = data_port.load_series(&bt_config.symbol)?;
    if series.is_empty() {
        return Err(BacktestError::Data {
            reason: format!("no usable price bars for {}", bt_config.symbol),
        });
    }

    // Stage 5: Replay
    eprintln!(
        "Running backtest: {} bars of {}",
        series.len(),
        bt_config.symbol
    );
    let result = backtest_engine::run_backtest(bt_config, &series, strategy)?;

    // Stage 6: Metrics
    let metrics = MetricsReport::compute(
        result.ledger.performance(),
        bt_config.risk_free_rate,
        bt_config.periods_per_year,
    )?;

    Ok(PipelineOutput {
        series,
        result,
        metrics,
    })
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    strategy: &mut dyn Strategy,
) -> ExitCode {
    match execute_pipeline(data_port, bt_config, strategy) {
        Ok(out) => {
            eprint!(
                "{}",
                format_report(bt_config, &out.series, &out.result, &out.metrics)
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Console summary of a finished run.
pub fn format_report(
    bt_config: &BacktestConfig,
    series: &TimestampedSeries,
    result: &BacktestResult,
    metrics: &MetricsReport,
) -> String {
    let ledger = &result.ledger;
    let mut out = String::new();

    let _ = writeln!(out, "\n=== Backtest Results ===");
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        let _ = writeln!(out, "Period:           {first} to {last}");
    }
    let _ = writeln!(out, "Bars Processed:   {}", result.summary.bars_processed);
    let _ = writeln!(out, "Initial Cash:     {:.2}", ledger.initial_cash());
    let _ = writeln!(out, "Final Equity:     {:.2}", result.summary.final_equity);
    let _ = writeln!(out, "Cash:             {:.2}", ledger.cash());

    let _ = writeln!(out, "\n=== Holdings ===");
    if ledger.positions().is_empty() {
        let _ = writeln!(out, "  (none)");
    } else {
        let mut held: Vec<_> = ledger.positions().values().collect();
        held.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        for pos in held {
            let _ = writeln!(
                out,
                "  {}:  {} shares @ {:.2} avg cost",
                pos.symbol, pos.quantity, pos.avg_cost
            );
        }
    }

    let _ = writeln!(out, "\n=== Metrics ({} periods/year) ===", bt_config.periods_per_year);
    let _ = writeln!(out, "Total Return:     {:.2}%", metrics.total_return * 100.0);
    let _ = writeln!(out, "Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    let _ = writeln!(out, "Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    let _ = writeln!(out, "Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    let _ = writeln!(out, "Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    let _ = writeln!(out, "Calmar Ratio:     {:.2}", metrics.calmar_ratio);
    let _ = writeln!(out, "Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    let _ = writeln!(out, "Profit Factor:    {:.2}", metrics.profit_factor);
    let _ = writeln!(out, "Avg Return:       {:.4}%", metrics.average_trade_return * 100.0);
    let _ = writeln!(out, "Expectancy:       {:.4}%", metrics.expectancy * 100.0);
    out
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(&e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(&e);
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let strategy = match build_strategy(&adapter, &bt_config.symbol) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("\nBacktest:");
    eprintln!("  symbol:           {}", bt_config.symbol);
    eprintln!("  initial_cash:     {:.2}", bt_config.initial_cash);
    eprintln!("  price_field:      {}", bt_config.price_field);
    eprintln!("  periods_per_year: {}", bt_config.periods_per_year);
    eprintln!("  risk_free_rate:   {}", bt_config.risk_free_rate);
    eprintln!("\nStrategy: {}", strategy.name());

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
