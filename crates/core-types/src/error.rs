use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Unknown performance period '{0}'. Expected one of: 30d, 90d, 180d, overall")]
    UnknownPeriod(String),
}
