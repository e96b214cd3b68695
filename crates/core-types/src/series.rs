use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single day's closing balance, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub balance: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, balance: f64) -> Self {
        Self { date, balance }
    }
}

/// The live, not-persisted value of every tracked account summed for `date` (today).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveAggregate {
    pub date: NaiveDate,
    pub balance: f64,
}

impl LiveAggregate {
    pub fn new(date: NaiveDate, balance: f64) -> Self {
        Self { date, balance }
    }
}

/// A date-indexed daily balance series.
///
/// Dates are unique and iterate in ascending order. Gaps between dates are allowed.
/// Every stored balance is finite and non-negative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquitySeries {
    points: BTreeMap<NaiveDate, f64>,
}

impl EquitySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from points in any order. A later point for a date already
    /// seen replaces the earlier one.
    pub fn try_from_points<I>(points: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = EquityPoint>,
    {
        let mut series = Self::new();
        for point in points {
            series.insert(point.date, point.balance)?;
        }
        Ok(series)
    }

    /// Inserts or overwrites the balance for `date`, returning the previous value.
    pub fn insert(&mut self, date: NaiveDate, balance: f64) -> Result<Option<f64>, CoreError> {
        validate_balance(balance)?;
        Ok(self.points.insert(date, balance))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.points.get(date).copied()
    }

    pub fn first(&self) -> Option<EquityPoint> {
        self.points
            .first_key_value()
            .map(|(date, balance)| EquityPoint::new(*date, *balance))
    }

    pub fn last(&self) -> Option<EquityPoint> {
        self.points
            .last_key_value()
            .map(|(date, balance)| EquityPoint::new(*date, *balance))
    }

    pub fn last_balance(&self) -> Option<f64> {
        self.points.values().next_back().copied()
    }

    /// Ascending iterator over the series.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = EquityPoint> + '_ {
        self.points
            .iter()
            .map(|(date, balance)| EquityPoint::new(*date, *balance))
    }

    /// Balances in date order, without their dates.
    pub fn balances(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    pub fn to_points(&self) -> Vec<EquityPoint> {
        self.iter().collect()
    }

    /// Returns a copy with every balance multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, CoreError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(CoreError::InvalidInput(
                "scale factor".to_string(),
                factor.to_string(),
            ));
        }
        Ok(Self {
            points: self
                .points
                .iter()
                .map(|(date, balance)| (*date, balance * factor))
                .collect(),
        })
    }
}

fn validate_balance(balance: f64) -> Result<(), CoreError> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(CoreError::InvalidInput(
            "balance".to_string(),
            balance.to_string(),
        ));
    }
    Ok(())
}
