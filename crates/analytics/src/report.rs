use core_types::{EquityPoint, Period};
use serde::{Deserialize, Serialize};

/// Everything the dashboard shows about performance for one render.
///
/// Metrics that could not be computed are `None` and must be displayed as "n/a".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub period: Period,
    /// Return over the selected period.
    pub period_return: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,

    pub start_balance: Option<f64>,
    pub end_balance: Option<f64>,

    /// Plot-ready curve, ascending by date.
    pub equity_curve: Vec<EquityPoint>,
}

impl PerformanceReport {
    /// An empty report for `period`: no curve and no metrics.
    pub fn new(period: Period) -> Self {
        Self {
            period,
            period_return: None,
            max_drawdown: None,
            sharpe_ratio: None,
            start_balance: None,
            end_balance: None,
            equity_curve: Vec::new(),
        }
    }

    /// The `n` most recent curve points.
    pub fn recent_points(&self, n: usize) -> &[EquityPoint] {
        let start = self.equity_curve.len().saturating_sub(n);
        &self.equity_curve[start..]
    }
}
