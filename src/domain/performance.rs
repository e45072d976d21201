//! Append-only equity curve and per-period return series.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSeries {
    equity_curve: Vec<f64>,
    returns: Vec<f64>,
}

impl PerformanceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one equity point. From the second point on, also appends the
    /// period return and hands it back.
    ///
    /// A zero previous value has no defined return; 0.0 is recorded instead
    /// so `returns.len() == equity_curve.len() - 1` keeps holding.
    pub fn append(&mut self, equity: f64) -> Option<f64> {
        let previous = self.equity_curve.last().copied();
        self.equity_curve.push(equity);

        let previous = previous?;
        let period_return = if previous != 0.0 {
            (equity - previous) / previous
        } else {
            tracing::warn!(equity, "previous equity is zero, recording a 0 return");
            0.0
        };
        self.returns.push(period_return);
        Some(period_return)
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.equity_curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.equity_curve.last().copied()
    }

    pub fn clear(&mut self) {
        self.equity_curve.clear();
        self.returns.clear();
    }
}
