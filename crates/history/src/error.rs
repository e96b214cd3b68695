use core_types::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    /// The history file exists but cannot be read at all.
    #[error("Equity history at {path} cannot be accessed: {source}")]
    DataCorrupt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write equity history to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode equity history as CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid equity series: {0}")]
    Series(#[from] CoreError),
}
