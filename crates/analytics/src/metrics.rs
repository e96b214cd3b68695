use core_types::{EquitySeries, Period};

/// Trading days used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate assumed when none is configured.
pub const DEFAULT_RISK_FREE_ANNUAL: f64 = 0.01;

/// Return over the last `days` steps of the series: `last / series[len - 1 - days] - 1`.
///
/// `None` if the series has fewer than `days + 1` points or the base balance is zero.
pub fn window_return(series: &EquitySeries, days: usize) -> Option<f64> {
    let balances = series.balances();
    if balances.len() < days.checked_add(1)? {
        return None;
    }

    let last = *balances.last()?;
    let base = balances[balances.len() - 1 - days];
    if base <= 0.0 {
        return None;
    }

    Some(last / base - 1.0)
}

/// [`window_return`] over the look-back the period selects for this series.
pub fn period_return(series: &EquitySeries, period: Period) -> Option<f64> {
    let days = period.lookback(series.len())?;
    window_return(series, days)
}

/// Deepest decline from a running peak, as a non-positive fraction.
///
/// A single point has no drawdown (0.0); an empty series has none defined.
/// Leading zero balances do not establish a peak and count as no drawdown.
pub fn max_drawdown(series: &EquitySeries) -> Option<f64> {
    if series.is_empty() {
        return None;
    }

    let mut running_max = f64::MIN;
    let mut worst = 0.0_f64;

    for balance in series.balances() {
        running_max = running_max.max(balance);
        if running_max > 0.0 {
            worst = worst.min((balance - running_max) / running_max);
        }
    }

    Some(worst)
}

/// Simple returns between consecutive points: `b[t] / b[t-1] - 1`.
///
/// A zero base balance yields a non-finite return.
pub fn daily_returns(series: &EquitySeries) -> Vec<f64> {
    series
        .balances()
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Annualized Sharpe ratio of the daily returns.
///
/// Each return has `risk_free_annual / 252` subtracted; the result is
/// `sqrt(252) * mean(excess) / stddev(excess)` with the sample standard deviation.
/// `None` with fewer than two returns, a non-finite return, or a flat series.
pub fn sharpe_ratio(series: &EquitySeries, risk_free_annual: f64) -> Option<f64> {
    let returns = daily_returns(series);
    if returns.len() < 2 || returns.iter().any(|r| !r.is_finite()) {
        return None;
    }

    let daily_risk_free = risk_free_annual / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_risk_free).collect();

    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // Rounding leaves a residue of ~1e-19 on identical returns; that is still zero variance.
    if !std_dev.is_finite() || std_dev <= 1e-12 * mean.abs().max(1.0) {
        return None;
    }

    Some(TRADING_DAYS_PER_YEAR.sqrt() * mean / std_dev)
}
