//! The investor directory: who the limited partners are, how each one's capital
//! is held, and what all of it is worth right now.

pub mod directory;
pub mod error;
pub mod valuation;

pub use directory::InvestorDirectory;
pub use error::DirectoryError;
pub use valuation::{AccountSnapshot, AccountStatus, DirectoryValuation};
