//! # Equity History Store
//!
//! Owns the persisted daily balance series: reading it back tolerantly, writing
//! it atomically, and generating a synthetic series the first time the
//! dashboard runs without one.
//!
//! Malformed rows never fail a load. They are dropped from the series and
//! returned next to it in a [`LoadReport`], so callers can show or assert on
//! exactly what was rejected.

pub mod error;
pub mod parse;
pub mod store;
pub mod synthetic;

pub use error::HistoryError;
pub use parse::{parse_history, LoadReport, MalformedRow, RowRejection};
pub use store::HistoryStore;
pub use synthetic::generate;
