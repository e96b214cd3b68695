pub mod enums;
pub mod error;
pub mod investor;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{AccountKind, MergeMode, Period};
pub use error::CoreError;
pub use investor::{Account, Credentials, Investor, RealAccount, VirtualAccount};
pub use series::{EquityPoint, EquitySeries, LiveAggregate};
