use crate::error::AnalyticsError;
use core_types::{EquitySeries, LiveAggregate, MergeMode};

/// Joins today's live aggregate onto the stored history.
///
/// * `Proportional` rescales the whole history by `live / last` so the curve runs
///   into the live value without a jump, then sets today's point to the live value.
/// * `Overlay` leaves the history untouched and sets today's point to the live value,
///   jumps included.
///
/// A live balance that is zero, negative or not finite carries no information:
/// in both modes the history is returned as stored and today is left out.
/// A history that is empty or ends at zero cannot be rescaled and is kept as is.
pub fn merge_live(
    series: &EquitySeries,
    live: &LiveAggregate,
    mode: MergeMode,
) -> Result<EquitySeries, AnalyticsError> {
    if !(live.balance.is_finite() && live.balance > 0.0) {
        tracing::debug!(live = live.balance, "No usable live balance, history left as stored.");
        return Ok(series.clone());
    }

    let mut merged = match (mode, series.last_balance()) {
        (MergeMode::Proportional, Some(last)) if last > 0.0 => {
            let factor = live.balance / last;
            tracing::debug!(factor, "Rescaling history to the live balance.");
            series.scaled(factor)?
        }
        _ => series.clone(),
    };

    merged.insert(live.date, live.balance)?;
    Ok(merged)
}
