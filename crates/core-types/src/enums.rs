use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The performance window a report is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Days30,
    Days90,
    Days180,
    Overall,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Days30, Period::Days90, Period::Days180, Period::Overall];

    /// Resolves the period into a look-back (number of steps back from the last point)
    /// for a series of `len` points.
    ///
    /// `Overall` spans the whole series and therefore needs at least two points.
    pub fn lookback(&self, len: usize) -> Option<usize> {
        match self {
            Period::Days30 => Some(30),
            Period::Days90 => Some(90),
            Period::Days180 => Some(180),
            Period::Overall if len >= 2 => Some(len - 1),
            Period::Overall => None,
        }
    }

    /// The label shown on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Period::Days30 => "30 d",
            Period::Days90 => "90 d",
            Period::Days180 => "180 d",
            Period::Overall => "Overall",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "30" | "30d" => Ok(Period::Days30),
            "90" | "90d" => Ok(Period::Days90),
            "180" | "180d" => Ok(Period::Days180),
            "overall" | "all" => Ok(Period::Overall),
            _ => Err(CoreError::UnknownPeriod(s.to_string())),
        }
    }
}

/// How today's live aggregate is joined onto the stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Rescale the whole history so it ends at the live value.
    #[default]
    Proportional,
    /// Keep the history as stored and place the live value on top of it.
    Overlay,
}

impl FromStr for MergeMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proportional" | "scaled" => Ok(MergeMode::Proportional),
            "overlay" => Ok(MergeMode::Overlay),
            _ => Err(CoreError::InvalidInput("merge mode".to_string(), s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Real,
    Virtual,
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKind::Real => f.write_str("Real"),
            AccountKind::Virtual => f.write_str("Virtual"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashboard_labels_and_short_forms() {
        assert_eq!("30 d".parse::<Period>().unwrap(), Period::Days30);
        assert_eq!("90d".parse::<Period>().unwrap(), Period::Days90);
        assert_eq!("180".parse::<Period>().unwrap(), Period::Days180);
        assert_eq!("Overall".parse::<Period>().unwrap(), Period::Overall);
        assert!(matches!("7d".parse::<Period>(), Err(CoreError::UnknownPeriod(_))));
    }

    #[test]
    fn overall_lookback_needs_two_points() {
        assert_eq!(Period::Overall.lookback(0), None);
        assert_eq!(Period::Overall.lookback(1), None);
        assert_eq!(Period::Overall.lookback(2), Some(1));
        assert_eq!(Period::Overall.lookback(731), Some(730));
        assert_eq!(Period::Days90.lookback(5), Some(90));
    }
}
