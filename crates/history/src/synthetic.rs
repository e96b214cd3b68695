use chrono::{Duration, NaiveDate};
use configuration::BootstrapConfig;
use core_types::{CoreError, EquitySeries};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Generates a synthetic daily equity curve ending on `end`.
///
/// The curve starts `config.days` days before `end` at `config.initial_capital`
/// and compounds towards `(1 + annual_growth)` per 365 days, multiplied by the
/// running product of Gaussian daily noise around 1.0. Every day that sits more
/// than `config.max_drawdown` below its running peak is pulled back up to
/// exactly that depth, so the result never draws down further than the limit.
///
/// With `config.seed` set the output is reproducible; otherwise the generator
/// is seeded from OS entropy.
pub fn generate(config: &BootstrapConfig, end: NaiveDate) -> Result<EquitySeries, CoreError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let days = i64::from(config.days);
    let start = end.checked_sub_signed(Duration::days(days)).ok_or_else(|| {
        CoreError::InvalidInput(
            "bootstrap.days".to_string(),
            format!("{} days before {} is out of the calendar range", days, end),
        )
    })?;
    let growth_base = 1.0 + config.annual_growth;
    let noise = Normal::new(1.0, config.daily_noise).map_err(|e| {
        CoreError::InvalidInput("bootstrap.daily_noise".to_string(), e.to_string())
    })?;

    let mut raw = Vec::with_capacity(config.days as usize + 1);
    let mut cumulative_noise = 1.0;
    for i in 0..=days {
        cumulative_noise *= noise.sample(&mut rng).max(0.0);
        let growth = growth_base.powf(i as f64 / 365.0);
        raw.push(config.initial_capital * growth * cumulative_noise);
    }

    let floor = 1.0 - config.max_drawdown;
    let mut peak = f64::MIN;
    let mut series = EquitySeries::new();
    for (i, equity) in raw.into_iter().enumerate() {
        peak = peak.max(equity);
        let drawdown = if peak > 0.0 { (equity - peak) / peak } else { 0.0 };
        let balance = if drawdown < -config.max_drawdown {
            peak * floor
        } else {
            equity
        };
        series.insert(start + Duration::days(i as i64), balance)?;
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn seeded(seed: u64) -> BootstrapConfig {
        BootstrapConfig {
            seed: Some(seed),
            ..BootstrapConfig::default()
        }
    }

    fn worst_drawdown(series: &EquitySeries) -> f64 {
        let mut peak = f64::MIN;
        let mut worst: f64 = 0.0;
        for balance in series.balances() {
            peak = peak.max(balance);
            worst = worst.min((balance - peak) / peak);
        }
        worst
    }

    #[test]
    fn spans_the_configured_days_ending_today() {
        let series = generate(&seeded(7), end()).unwrap();

        assert_eq!(series.len(), 731);
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2024, 10, 17).unwrap());
        assert_eq!(series.last().unwrap().date, end());
        assert!(series.balances().iter().all(|b| *b > 0.0));
    }

    #[test]
    fn drawdown_never_exceeds_the_clamp() {
        for seed in 0..20 {
            let series = generate(&seeded(seed), end()).unwrap();
            assert!(worst_drawdown(&series) >= -0.045 - 1e-12, "seed {seed}");
        }

        // Heavy noise forces the clamp to do real work.
        let noisy = BootstrapConfig {
            daily_noise: 0.05,
            ..seeded(3)
        };
        let series = generate(&noisy, end()).unwrap();
        assert!(worst_drawdown(&series) >= -0.045 - 1e-12);
    }

    #[test]
    fn grows_roughly_one_hundred_percent_a_year() {
        let series = generate(&seeded(11), end()).unwrap();
        let total = series.last_balance().unwrap() / series.first().unwrap().balance;

        // Two years at 100% p.a. is 4x; the noise moves it only a little.
        assert!(total > 3.0 && total < 5.5, "total growth {total}");
    }

    #[test]
    fn span_beyond_the_calendar_is_rejected() {
        let config = BootstrapConfig {
            days: 200_000_000,
            ..seeded(1)
        };

        assert!(matches!(
            generate(&config, end()),
            Err(CoreError::InvalidInput(field, _)) if field == "bootstrap.days"
        ));
    }

    #[test]
    fn same_seed_same_curve() {
        let a = generate(&seeded(99), end()).unwrap();
        let b = generate(&seeded(99), end()).unwrap();
        let c = generate(&seeded(100), end()).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn noiseless_curve_is_pure_compounding() {
        let config = BootstrapConfig {
            daily_noise: 0.0,
            days: 365,
            ..seeded(1)
        };
        let series = generate(&config, end()).unwrap();

        assert_eq!(series.first().unwrap().balance, 10_000.0);
        assert!((series.last_balance().unwrap() - 20_000.0).abs() < 1e-6);
    }
}
