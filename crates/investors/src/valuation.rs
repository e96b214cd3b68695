use crate::directory::InvestorDirectory;
use api_client::{AccountValuator, ValuationError};
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Account, AccountKind, LiveAggregate};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

/// Display status of one account after a valuation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountStatus {
    Active,
    Inactive,
    Error,
}

/// One row of the accounts table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub name: String,
    pub kind: AccountKind,
    /// What this account contributes to the AUM. Zero when its valuation failed.
    pub balance: f64,
    pub error: Option<String>,
}

impl AccountSnapshot {
    pub fn is_active(&self) -> bool {
        self.balance > 0.0
    }

    pub fn status(&self) -> AccountStatus {
        match (&self.error, self.is_active()) {
            (Some(_), _) => AccountStatus::Error,
            (None, true) => AccountStatus::Active,
            (None, false) => AccountStatus::Inactive,
        }
    }
}

/// The result of valuing every account in the directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryValuation {
    /// In directory order.
    pub accounts: Vec<AccountSnapshot>,
    pub total_real: f64,
    pub total_virtual: f64,
}

impl DirectoryValuation {
    pub fn total_aum(&self) -> f64 {
        self.total_real + self.total_virtual
    }

    pub fn failed(&self) -> impl Iterator<Item = &AccountSnapshot> {
        self.accounts.iter().filter(|a| a.error.is_some())
    }

    pub fn live_aggregate(&self, today: NaiveDate) -> LiveAggregate {
        LiveAggregate::new(today, self.total_aum())
    }
}

impl InvestorDirectory {
    /// Values every account.
    ///
    /// Virtual balances are taken as entered. Real accounts are valued
    /// concurrently, each bounded by `timeout`. A failed or timed-out account
    /// contributes 0, keeps its error on both its record and its snapshot, and
    /// does not affect any other account. Successful valuations refresh the
    /// record's cached balance and timestamp.
    pub async fn value_all(
        &mut self,
        valuator: &dyn AccountValuator,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> DirectoryValuation {
        let fetches = self.investors.iter().map(|investor| async move {
            let Account::Real(real) = &investor.account else {
                return None;
            };
            let outcome = match tokio::time::timeout(timeout, valuator.account_value_usd(&real.credentials)).await {
                Ok(Ok(value)) if value.is_finite() && value >= 0.0 => Ok(value),
                Ok(Ok(value)) => Err(ValuationError::InvalidData(format!(
                    "account value {} is not a non-negative number",
                    value
                ))),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ValuationError::Timeout(timeout)),
            };
            Some(outcome)
        });
        let outcomes = join_all(fetches).await;

        let mut valuation = DirectoryValuation {
            accounts: Vec::with_capacity(self.investors.len()),
            total_real: 0.0,
            total_virtual: 0.0,
        };

        for (investor, outcome) in self.investors.iter_mut().zip(outcomes) {
            let (balance, error) = match (&mut investor.account, outcome) {
                (Account::Virtual(account), _) => {
                    valuation.total_virtual += account.balance;
                    (account.balance, None)
                }
                (Account::Real(account), Some(Ok(value))) => {
                    account.last_known_balance = value;
                    account.last_update = Some(now);
                    account.last_error = None;
                    valuation.total_real += value;
                    (value, None)
                }
                (Account::Real(account), outcome) => {
                    let message = match outcome {
                        Some(Err(e)) => e.to_string(),
                        _ => "account was not valued".to_string(),
                    };
                    tracing::warn!(investor = %investor.name, error = %message, "Account valuation failed, counting it as 0.");
                    account.last_error = Some(message.clone());
                    (0.0, Some(message))
                }
            };

            valuation.accounts.push(AccountSnapshot {
                name: investor.name.clone(),
                kind: investor.kind(),
                balance,
                error,
            });
        }

        tracing::info!(
            accounts = valuation.accounts.len(),
            failed = valuation.failed().count(),
            total_real = valuation.total_real,
            total_virtual = valuation.total_virtual,
            "Investor directory valued."
        );

        valuation
    }
}
