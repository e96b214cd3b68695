//! # Performance Analytics Engine
//!
//! Pure calculations over an [`EquitySeries`](core_types::EquitySeries):
//! joining today's live aggregate onto the stored history, and deriving the
//! windowed return, maximum drawdown and Sharpe ratio the dashboard reports.
//!
//! ## Undefined metrics
//!
//! A metric whose preconditions are not met (too few points, zero variance,
//! a zero base balance) is `None`. Callers render that as "n/a"; nothing in
//! this crate substitutes a number for it.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use merge::merge_live;
pub use metrics::{
    daily_returns, max_drawdown, period_return, sharpe_ratio, window_return,
    DEFAULT_RISK_FREE_ANNUAL, TRADING_DAYS_PER_YEAR,
};
pub use report::PerformanceReport;
