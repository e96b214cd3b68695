use crate::error::ConfigError;
use crate::settings::Settings;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalyticsConfig, BootstrapConfig, DashboardConfig, ExchangeConfig, LoggingConfig,
    StorageConfig,
};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aumdesk.toml";

/// Longest synthetic history the bootstrap will generate, about a century.
pub const MAX_BOOTSTRAP_DAYS: u32 = 36_500;

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. built-in defaults,
/// 2. the TOML file at `path` (required) or `aumdesk.toml` (optional),
/// 3. environment variables such as `AUMDESK__EXCHANGE__TIMEOUT_SECS`.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(config::Config::try_from(&Settings::default())?)
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("AUMDESK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

/// Rejects settings the analytics and bootstrap code cannot work with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let bootstrap = &settings.bootstrap;
    if !(bootstrap.initial_capital.is_finite() && bootstrap.initial_capital > 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap.initial_capital must be positive, got {}",
            bootstrap.initial_capital
        )));
    }
    if bootstrap.days == 0 || bootstrap.days > MAX_BOOTSTRAP_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap.days must lie in 1..={}, got {}",
            MAX_BOOTSTRAP_DAYS, bootstrap.days
        )));
    }
    if !(bootstrap.annual_growth.is_finite() && bootstrap.annual_growth > -1.0) {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap.annual_growth must be greater than -1.0, got {}",
            bootstrap.annual_growth
        )));
    }
    if !(bootstrap.daily_noise.is_finite() && bootstrap.daily_noise >= 0.0) {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap.daily_noise must be non-negative, got {}",
            bootstrap.daily_noise
        )));
    }
    if !(bootstrap.max_drawdown > 0.0 && bootstrap.max_drawdown < 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "bootstrap.max_drawdown must lie in (0, 1), got {}",
            bootstrap.max_drawdown
        )));
    }
    if !settings.analytics.risk_free_annual.is_finite() {
        return Err(ConfigError::ValidationError(
            "analytics.risk_free_annual must be a finite number".to_string(),
        ));
    }
    if settings.exchange.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "exchange.timeout_secs must be at least 1".to_string(),
        ));
    }
    if settings.storage.investors_file.is_empty() || settings.storage.history_file.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage file names must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{MergeMode, Period};
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::default();
        assert!(validate(&settings).is_ok());
        assert_eq!(settings.bootstrap.initial_capital, 10_000.0);
        assert_eq!(settings.analytics.risk_free_annual, 0.01);
        assert_eq!(
            settings.storage.history_path(),
            Path::new("data").join("history.csv")
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
data_dir = "/srv/lp"

[bootstrap]
seed = 42

[analytics]
merge_mode = "overlay"
default_period = "overall"
"#
        )
        .unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.storage.investors_path(), Path::new("/srv/lp/investors.json"));
        assert_eq!(settings.bootstrap.seed, Some(42));
        assert_eq!(settings.bootstrap.days, 730);
        assert_eq!(settings.analytics.merge_mode, MergeMode::Overlay);
        assert_eq!(settings.analytics.default_period, Period::Overall);
    }

    #[test]
    fn rejects_out_of_range_drawdown_clamp() {
        let mut settings = Settings::default();
        settings.bootstrap.max_drawdown = 1.5;
        assert!(matches!(
            validate(&settings),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn bootstrap_span_is_bounded() {
        let mut settings = Settings::default();
        settings.bootstrap.days = MAX_BOOTSTRAP_DAYS;
        assert!(validate(&settings).is_ok());

        settings.bootstrap.days = 200_000_000;
        assert!(matches!(
            validate(&settings),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
