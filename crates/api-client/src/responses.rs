use rust_decimal::Decimal;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The response from a successful `GET /api/v3/account` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub balances: Vec<SpotBalance>,
    // There are more fields (permissions, commission rates), none of them needed for valuation.
}

/// A single asset's holding in a spot account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpotBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl SpotBalance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// The response from `GET /api/v3/ticker/price?symbol=...`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPriceResponse {
    pub symbol: String,
    pub price: Decimal,
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}
