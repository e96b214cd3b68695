use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to access the investor directory at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The investor directory is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An investor named '{0}' already exists")]
    DuplicateName(String),

    #[error("No investor named '{0}'")]
    NotFound(String),

    #[error("Investor name must not be empty")]
    EmptyName,

    #[error("Balance must be a finite, non-negative number, got {0}")]
    InvalidBalance(f64),
}
