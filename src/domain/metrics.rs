//! Performance metrics over a finished return series or equity curve.
//!
//! Every function is pure. Ratios whose denominator is a zero spread
//! (standard deviation, downside deviation, drawdown, gross loss) are
//! reported as 0 rather than infinity.

use super::error::BacktestError;
use super::performance::PerformanceSeries;

pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

fn require_returns(returns: &[f64]) -> Result<(), BacktestError> {
    if returns.is_empty() {
        return Err(BacktestError::EmptyInput { what: "return series" });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// (mean - rf) / population std dev; 0 when the std dev is 0.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    let n = returns.len() as f64;
    let mean = mean(returns);
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    Ok(if stddev == 0.0 {
        0.0
    } else {
        (mean - risk_free_rate) / stddev
    })
}

/// Like Sharpe, but only returns below `risk_free_rate` count towards the
/// deviation. The squared shortfalls are still divided by the full N.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    let n = returns.len() as f64;
    let mean = mean(returns);
    let downside = returns
        .iter()
        .filter(|&&r| r < risk_free_rate)
        .map(|r| (r - risk_free_rate).powi(2))
        .sum::<f64>()
        / n;
    let downside_dev = downside.sqrt();
    Ok(if downside_dev == 0.0 {
        0.0
    } else {
        (mean - risk_free_rate) / downside_dev
    })
}

/// Largest peak-to-trough decline as a fraction of the running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> Result<f64, BacktestError> {
    let Some(&first) = equity_curve.first() else {
        return Err(BacktestError::EmptyInput { what: "equity curve" });
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity_curve {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    Ok(max_dd)
}

/// (last - first) / first
pub fn total_return(equity_curve: &[f64]) -> Result<f64, BacktestError> {
    if equity_curve.len() < 2 {
        return Err(BacktestError::InsufficientData {
            what: "equity curve",
            minimum: 2,
            actual: equity_curve.len(),
        });
    }
    let first = equity_curve[0];
    let last = equity_curve[equity_curve.len() - 1];
    if first == 0.0 {
        return Err(BacktestError::DivisionByZero { metric: "total return" });
    }
    Ok((last - first) / first)
}

/// (1 + total return)^(periods_per_year / N) - 1, with N the curve length.
pub fn annualized_return(equity_curve: &[f64], periods_per_year: u32) -> Result<f64, BacktestError> {
    if periods_per_year == 0 {
        return Err(BacktestError::InvalidConfiguration {
            reason: "periods per year must be positive".into(),
        });
    }
    let total = total_return(equity_curve)?;
    let years = equity_curve.len() as f64 / f64::from(periods_per_year);
    Ok((1.0 + total).powf(1.0 / years) - 1.0)
}

/// Annualized return over max drawdown; 0 without a drawdown.
pub fn calmar_ratio(equity_curve: &[f64], periods_per_year: u32) -> Result<f64, BacktestError> {
    let annualized = annualized_return(equity_curve, periods_per_year)?;
    let dd = max_drawdown(equity_curve)?;
    Ok(if dd == 0.0 { 0.0 } else { annualized / dd })
}

/// Fraction of strictly positive returns.
pub fn win_rate(returns: &[f64]) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    let wins = returns.iter().filter(|&&r| r > 0.0).count();
    Ok(wins as f64 / returns.len() as f64)
}

/// Sum of gains over the absolute sum of losses; 0 when nothing was lost.
pub fn profit_factor(returns: &[f64]) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    let (gross_profit, gross_loss) = returns.iter().fold((0.0, 0.0), |(gain, loss), &r| {
        if r > 0.0 {
            (gain + r, loss)
        } else {
            (gain, loss + r.abs())
        }
    });
    Ok(if gross_loss == 0.0 {
        0.0
    } else {
        gross_profit / gross_loss
    })
}

pub fn average_trade_return(returns: &[f64]) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    Ok(mean(returns))
}

/// win_rate * avg_win + (1 - win_rate) * avg_loss
///
/// `avg_loss` is negative. Flat periods count towards the loss rate but not
/// towards the average loss.
pub fn expectancy(returns: &[f64]) -> Result<f64, BacktestError> {
    require_returns(returns)?;
    let mut wins = 0.0;
    let mut losses = 0.0;
    let mut win_count = 0usize;
    let mut loss_count = 0usize;
    for &r in returns {
        if r > 0.0 {
            wins += r;
            win_count += 1;
        } else if r < 0.0 {
            losses += r;
            loss_count += 1;
        }
    }
    let avg_win = if win_count > 0 { wins / win_count as f64 } else { 0.0 };
    let avg_loss = if loss_count > 0 { losses / loss_count as f64 } else { 0.0 };
    let win_rate = win_count as f64 / returns.len() as f64;
    Ok(win_rate * avg_win + (1.0 - win_rate) * avg_loss)
}

/// Return over every window of `window_size` consecutive equity points.
///
/// Every window must start on a non-zero equity value; a zero start is
/// `DivisionByZero` up front rather than a NaN or infinite window.
///
/// The iterator is `Clone`, so a clone taken before consumption replays
/// the same sequence.
#[derive(Debug, Clone)]
pub struct RollingReturns<'a> {
    curve: &'a [f64],
    window: usize,
    start: usize,
}

impl Iterator for RollingReturns<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let end = self.start + self.window - 1;
        if end >= self.curve.len() {
            return None;
        }
        let first = self.curve[self.start];
        let last = self.curve[end];
        self.start += 1;
        Some((last - first) / first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.curve.len() + 1).saturating_sub(self.start + self.window);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingReturns<'_> {}

pub fn rolling_returns(
    equity_curve: &[f64],
    window_size: usize,
) -> Result<RollingReturns<'_>, BacktestError> {
    if window_size == 0 || window_size > equity_curve.len() {
        return Err(BacktestError::InvalidWindow {
            window: window_size,
            len: equity_curve.len(),
        });
    }
    let last_start = equity_curve.len() - window_size;
    if equity_curve[..=last_start].contains(&0.0) {
        return Err(BacktestError::DivisionByZero {
            metric: "rolling return",
        });
    }
    Ok(RollingReturns {
        curve: equity_curve,
        window: window_size,
        start: 0,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub calmar_ratio: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_trade_return: f64,
    pub expectancy: f64,
    pub periods: usize,
}

impl MetricsReport {
    pub fn compute(
        series: &PerformanceSeries,
        risk_free_rate: f64,
        periods_per_year: u32,
    ) -> Result<Self, BacktestError> {
        let curve = series.equity_curve();
        let returns = series.returns();

        Ok(MetricsReport {
            total_return: total_return(curve)?,
            annualized_return: annualized_return(curve, periods_per_year)?,
            sharpe_ratio: sharpe_ratio(returns, risk_free_rate)?,
            sortino_ratio: sortino_ratio(returns, risk_free_rate)?,
            max_drawdown: max_drawdown(curve)?,
            calmar_ratio: calmar_ratio(curve, periods_per_year)?,
            win_rate: win_rate(returns)?,
            profit_factor: profit_factor(returns)?,
            average_trade_return: average_trade_return(returns)?,
            expectancy: expectancy(returns)?,
            periods: curve.len(),
        })
    }
}
