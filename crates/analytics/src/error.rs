use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Could not build the merged equity series: {0}")]
    InvalidSeries(#[from] CoreError),
}
