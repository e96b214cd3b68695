use analytics::{AnalyticsEngine, PerformanceReport};
use api_client::{AccountValuator, ValuationError};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use configuration::settings::Settings;
use core_types::{Credentials, EquitySeries, MergeMode, Period};
use history::HistoryStore;
use investors::{AccountStatus, DirectoryValuation, InvestorDirectory};
use serde::Serialize;
use std::time::Duration;

/// Everything one render of the dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total_real: f64,
    pub total_virtual: f64,
    pub total_aum: f64,
    pub performance: PerformanceReport,
    pub valuation: DirectoryValuation,
}

/// Loads the equity history, falling back to a fresh synthetic series when
/// the store cannot be used. Never fails: the dashboard always has a curve.
pub fn load_history(store: &HistoryStore) -> EquitySeries {
    match store.load() {
        Ok(report) => report.series,
        Err(e) => {
            tracing::error!(error = %e, "Equity history unavailable, regenerating a synthetic one.");
            store.recover()
        }
    }
}

/// Stands in for the exchange client when it could not be built, so every
/// real account shows up as errored while the rest of the dashboard renders.
pub struct UnavailableExchange {
    reason: String,
}

impl UnavailableExchange {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl AccountValuator for UnavailableExchange {
    async fn account_value_usd(&self, _: &Credentials) -> Result<f64, ValuationError> {
        Err(ValuationError::ClientUnavailable(self.reason.clone()))
    }
}

/// Values the directory and computes the performance report for one render.
pub async fn build_dashboard(
    history: &EquitySeries,
    directory: &mut InvestorDirectory,
    valuator: &dyn AccountValuator,
    engine: &AnalyticsEngine,
    timeout: Duration,
    mode: MergeMode,
    period: Period,
    today: NaiveDate,
) -> anyhow::Result<Dashboard> {
    let valuation = directory.value_all(valuator, timeout, Utc::now()).await;
    let live = valuation.live_aggregate(today);
    let performance = engine.run(history, &live, mode, period)?;

    Ok(Dashboard {
        total_real: valuation.total_real,
        total_virtual: valuation.total_virtual,
        total_aum: valuation.total_aum(),
        performance,
        valuation,
    })
}

/// The tables printed for a dashboard, in display order.
pub fn render(dashboard: &Dashboard, controller: bool, settings: &Settings, curve_rows: usize) -> String {
    let mut out = String::new();

    out.push_str("Assets Under Management\n");
    let mut aum = styled_table();
    if controller {
        aum.set_header(vec!["Total AUM", "Real", "Virtual"]);
        aum.add_row(vec![
            usd(dashboard.total_aum),
            usd(dashboard.total_real),
            usd(dashboard.total_virtual),
        ]);
    } else {
        aum.set_header(vec!["Total AUM"]);
        aum.add_row(vec![usd(dashboard.total_aum)]);
    }
    out.push_str(&format!("{aum}\n\n"));

    let performance = &dashboard.performance;
    out.push_str("Performance Analytics\n");
    let mut metrics = styled_table();
    metrics.set_header(vec![
        format!("{} Return", performance.period),
        "Max Drawdown".to_string(),
        "Sharpe Ratio".to_string(),
    ]);
    metrics.add_row(vec![
        percent(performance.period_return),
        percent(performance.max_drawdown),
        ratio(performance.sharpe_ratio),
    ]);
    out.push_str(&format!("{metrics}\n"));
    out.push_str(&format!(
        "Sharpe uses a {:.2} % annual risk-free rate.\n\n",
        settings.analytics.risk_free_annual * 100.0
    ));

    out.push_str("Equity Curve\n");
    let mut curve = styled_table();
    curve.set_header(vec!["Date", "Portfolio Value (USD)"]);
    for point in performance.recent_points(curve_rows) {
        curve.add_row(vec![
            Cell::new(point.date),
            Cell::new(usd(point.balance)).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&format!("{curve}\n"));
    if performance.equity_curve.len() > curve_rows {
        out.push_str(&format!(
            "({} earlier points not shown)\n",
            performance.equity_curve.len() - curve_rows
        ));
    }
    out.push('\n');

    out.push_str("LP Accounts\n");
    out.push_str(&format!("{}\n", accounts_table(&dashboard.valuation, controller)));

    out
}

fn accounts_table(valuation: &DirectoryValuation, controller: bool) -> Table {
    let mut table = styled_table();
    if controller {
        table.set_header(vec!["Investor", "Type", "Balance (USD)", "Status"]);
    } else {
        table.set_header(vec!["Investor", "Balance (USD)", "Status"]);
    }

    for account in &valuation.accounts {
        let status = match (account.status(), controller) {
            (AccountStatus::Active, _) => "Active".to_string(),
            (AccountStatus::Inactive, _) => "Inactive".to_string(),
            (AccountStatus::Error, true) => {
                format!("Error: {}", account.error.as_deref().unwrap_or_default())
            }
            (AccountStatus::Error, false) => "Error".to_string(),
        };
        let balance = Cell::new(usd(account.balance)).set_alignment(CellAlignment::Right);

        if controller {
            table.add_row(vec![
                Cell::new(&account.name),
                Cell::new(account.kind),
                balance,
                Cell::new(status),
            ]);
        } else {
            table.add_row(vec![Cell::new(&account.name), balance, Cell::new(status)]);
        }
    }

    table
}

fn styled_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

/// `$1,234,567` style, rounded to whole dollars.
pub fn usd(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// A fraction as a percentage with two decimals, or "n/a".
pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2} %", v * 100.0),
        None => "n/a".to_string(),
    }
}

pub fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Investor;
    use tempfile::TempDir;

    struct OfflineExchange;

    #[async_trait]
    impl AccountValuator for OfflineExchange {
        async fn account_value_usd(&self, _: &Credentials) -> Result<f64, ValuationError> {
            Err(ValuationError::InvalidData("offline".to_string()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    async fn dashboard_for(investors: Vec<Investor>, dir: &TempDir) -> Dashboard {
        dashboard_with(&OfflineExchange, investors, dir).await
    }

    async fn dashboard_with(
        valuator: &dyn AccountValuator,
        investors: Vec<Investor>,
        dir: &TempDir,
    ) -> Dashboard {
        let mut directory = InvestorDirectory::open(dir.path().join("investors.json")).unwrap();
        for investor in investors {
            directory.add(investor).unwrap();
        }
        build_dashboard(
            &EquitySeries::new(),
            &mut directory,
            valuator,
            &AnalyticsEngine::default(),
            Duration::from_secs(1),
            MergeMode::Proportional,
            Period::Overall,
            today(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn virtual_only_portfolio_end_to_end() {
        let dir = TempDir::new().unwrap();
        let dashboard = dashboard_for(
            vec![
                Investor::new_virtual("LP-1", 5_000.0),
                Investor::new_virtual("LP-2", 3_000.0),
            ],
            &dir,
        )
        .await;

        assert_eq!(dashboard.total_real, 0.0);
        assert_eq!(dashboard.total_virtual, 8_000.0);
        assert_eq!(dashboard.total_aum, 8_000.0);
        assert_eq!(dashboard.performance.equity_curve.len(), 1);
        assert_eq!(dashboard.performance.period_return, None);
        assert_eq!(dashboard.performance.max_drawdown, Some(0.0));

        let text = render(&dashboard, false, &Settings::default(), 10);
        assert!(text.contains("$8,000"));
        assert!(text.contains("Overall Return"));
        assert!(text.contains("n/a"));
        assert!(!text.contains("Virtual"));
    }

    #[tokio::test]
    async fn failed_account_still_renders() {
        let dir = TempDir::new().unwrap();
        let dashboard = dashboard_for(
            vec![
                Investor::new_real("Live", Credentials::new("k", "s")),
                Investor::new_virtual("Manual", 1_000.0),
            ],
            &dir,
        )
        .await;

        assert_eq!(dashboard.total_aum, 1_000.0);
        let text = render(&dashboard, true, &Settings::default(), 10);
        assert!(text.contains("Error: Invalid data format from API: offline"));
        assert!(text.contains("Virtual"));
    }

    #[tokio::test]
    async fn missing_exchange_client_marks_real_accounts_errored() {
        let dir = TempDir::new().unwrap();
        let exchange = UnavailableExchange::new("TLS backend failed to initialise");
        let dashboard = dashboard_with(
            &exchange,
            vec![
                Investor::new_real("Live", Credentials::new("k", "s")),
                Investor::new_virtual("Manual", 2_500.0),
            ],
            &dir,
        )
        .await;

        assert_eq!(dashboard.total_real, 0.0);
        assert_eq!(dashboard.total_aum, 2_500.0);
        assert_eq!(dashboard.valuation.accounts[0].status(), AccountStatus::Error);
        assert!(dashboard.valuation.accounts[0]
            .error
            .as_deref()
            .unwrap()
            .contains("TLS backend failed to initialise"));
        assert_eq!(dashboard.valuation.accounts[1].status(), AccountStatus::Active);
    }

    #[test]
    fn formats_money_and_metrics() {
        assert_eq!(usd(0.0), "$0");
        assert_eq!(usd(999.4), "$999");
        assert_eq!(usd(1_234_567.8), "$1,234,568");
        assert_eq!(usd(-12_000.0), "-$12,000");
        assert_eq!(percent(Some(0.123456)), "12.35 %");
        assert_eq!(percent(Some(-0.045)), "-4.50 %");
        assert_eq!(percent(None), "n/a");
        assert_eq!(ratio(Some(2.345)), "2.35");
        assert_eq!(ratio(None), "n/a");
    }
}
