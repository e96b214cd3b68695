use crate::enums::AccountKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A limited partner and the account backing their capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub name: String,
    #[serde(flatten)]
    pub account: Account,
}

impl Investor {
    pub fn new_virtual(name: impl Into<String>, balance: f64) -> Self {
        Self {
            name: name.into(),
            account: Account::Virtual(VirtualAccount { balance }),
        }
    }

    pub fn new_real(name: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            name: name.into(),
            account: Account::Real(RealAccount::new(credentials)),
        }
    }

    pub fn kind(&self) -> AccountKind {
        self.account.kind()
    }
}

/// Either a manually maintained balance or one read live from the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Account {
    Virtual(VirtualAccount),
    Real(RealAccount),
}

impl Account {
    pub fn kind(&self) -> AccountKind {
        match self {
            Account::Virtual(_) => AccountKind::Virtual,
            Account::Real(_) => AccountKind::Real,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualAccount {
    pub balance: f64,
}

/// An exchange-backed account. The balance fields cache the outcome of the last refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealAccount {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub last_known_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl RealAccount {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            last_known_balance: 0.0,
            last_update: None,
            last_error: None,
        }
    }
}

/// Exchange API credentials. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
