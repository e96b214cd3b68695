use core_types::{MergeMode, Period};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageConfig,
    pub bootstrap: BootstrapConfig,
    pub analytics: AnalyticsConfig,
    pub exchange: ExchangeConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// Where the investor directory and the equity history live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub investors_file: String,
    pub history_file: String,
}

impl StorageConfig {
    pub fn investors_path(&self) -> PathBuf {
        self.data_dir.join(&self.investors_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            investors_file: "investors.json".to_string(),
            history_file: "history.csv".to_string(),
        }
    }
}

/// Parameters of the synthetic history generated when no history file exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Balance of the first generated day.
    pub initial_capital: f64,
    /// Number of days before today the series starts at.
    pub days: u32,
    /// Target compounded growth per 365 days. 1.0 doubles the capital every year.
    pub annual_growth: f64,
    /// Standard deviation of the multiplicative daily noise around 1.0.
    pub daily_noise: f64,
    /// Largest drawdown from the running peak the generated curve may show (0.045 = 4.5%).
    pub max_drawdown: f64,
    /// Fixed RNG seed. Unset means every bootstrap draws a different curve.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            days: 730,
            annual_growth: 1.0,
            daily_noise: 0.002,
            max_drawdown: 0.045,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Annual risk-free rate subtracted (pro rata per trading day) in the Sharpe ratio.
    pub risk_free_annual: f64,
    pub merge_mode: MergeMode,
    pub default_period: Period,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_free_annual: 0.01,
            merge_mode: MergeMode::Proportional,
            default_period: Period::Days30,
        }
    }
}

/// Connection settings for the exchange REST API used to value real accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Upper bound for valuing a single account, all requests included.
    pub timeout_secs: u64,
    pub recv_window_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 10,
            recv_window_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Password unlocking controller mode.
    pub admin_password: String,
    /// How many of the most recent equity points the report prints.
    pub curve_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            admin_password: "changeme".to_string(),
            curve_rows: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs go to a daily rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
