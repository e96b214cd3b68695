use crate::error::AnalyticsError;
use crate::merge::merge_live;
use crate::metrics::{max_drawdown, period_return, sharpe_ratio, DEFAULT_RISK_FREE_ANNUAL};
use crate::report::PerformanceReport;
use core_types::{EquitySeries, LiveAggregate, MergeMode, Period};

/// A stateless calculator for deriving performance metrics from an equity series.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine {
    risk_free_annual: f64,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_ANNUAL)
    }
}

impl AnalyticsEngine {
    pub fn new(risk_free_annual: f64) -> Self {
        Self { risk_free_annual }
    }

    pub fn risk_free_annual(&self) -> f64 {
        self.risk_free_annual
    }

    /// Computes the report for an already merged series.
    pub fn calculate(&self, series: &EquitySeries, period: Period) -> PerformanceReport {
        let mut report = PerformanceReport::new(period);
        if series.is_empty() {
            return report;
        }

        report.period_return = period_return(series, period);
        report.max_drawdown = max_drawdown(series);
        report.sharpe_ratio = sharpe_ratio(series, self.risk_free_annual);
        report.start_balance = series.first().map(|p| p.balance);
        report.end_balance = series.last_balance();
        report.equity_curve = series.to_points();

        report
    }

    /// The main entry point: joins the live aggregate onto the history, then
    /// computes the report over the merged series.
    pub fn run(
        &self,
        history: &EquitySeries,
        live: &LiveAggregate,
        mode: MergeMode,
        period: Period,
    ) -> Result<PerformanceReport, AnalyticsError> {
        let merged = merge_live(history, live, mode)?;
        let report = self.calculate(&merged, period);

        tracing::info!(
            period = %period,
            points = merged.len(),
            period_return = ?report.period_return,
            max_drawdown = ?report.max_drawdown,
            sharpe_ratio = ?report.sharpe_ratio,
            "Performance metrics calculated."
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use core_types::EquityPoint;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn single_live_point_reports_zero_drawdown_and_no_return() {
        let engine = AnalyticsEngine::default();
        let live = LiveAggregate::new(today(), 8_000.0);

        let report = engine
            .run(&EquitySeries::new(), &live, MergeMode::Proportional, Period::Overall)
            .unwrap();

        assert_eq!(report.period_return, None);
        assert_eq!(report.max_drawdown, Some(0.0));
        assert_eq!(report.sharpe_ratio, None);
        assert_eq!(report.equity_curve, vec![EquityPoint::new(today(), 8_000.0)]);
        assert_eq!(report.end_balance, Some(8_000.0));
    }

    #[test]
    fn empty_input_gives_an_empty_report() {
        let report = AnalyticsEngine::default().calculate(&EquitySeries::new(), Period::Days30);
        assert_eq!(report, PerformanceReport::new(Period::Days30));
    }

    #[test]
    fn proportional_run_is_scale_free() {
        let start = today() - Duration::days(40);
        let history = EquitySeries::try_from_points((0..40).map(|i| {
            let wobble = if i % 3 == 0 { -15.0 } else { 20.0 };
            EquityPoint::new(start + Duration::days(i), 10_000.0 + 10.0 * i as f64 + wobble)
        }))
        .unwrap();
        let last = history.last_balance().unwrap();
        let engine = AnalyticsEngine::new(0.01);

        let scaled = engine
            .run(&history, &LiveAggregate::new(today(), last * 3.0), MergeMode::Proportional, Period::Days30)
            .unwrap();
        let overlay = engine
            .run(&history, &LiveAggregate::new(today(), last), MergeMode::Overlay, Period::Days30)
            .unwrap();

        let close = |a: Option<f64>, b: Option<f64>| (a.unwrap() - b.unwrap()).abs() < 1e-9;
        assert!(close(scaled.period_return, overlay.period_return));
        assert!(close(scaled.max_drawdown, overlay.max_drawdown));
        assert!(close(scaled.sharpe_ratio, overlay.sharpe_ratio));
        assert_eq!(scaled.equity_curve.len(), 41);
        assert_eq!(scaled.recent_points(2).len(), 2);
        assert_eq!(scaled.recent_points(100).len(), 41);
    }
}
