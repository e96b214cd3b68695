use std::time::Duration;
use thiserror::Error;

/// Why a single account could not be valued.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("HTTP request to the exchange failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange rejected the request ({code}): {msg}")]
    Exchange { code: i64, msg: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Exchange client could not be created: {0}")]
    ClientUnavailable(String),

    #[error("Valuation did not finish within {0:?}")]
    Timeout(Duration),
}
