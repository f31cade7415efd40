pub mod amortization;
pub mod correction;
pub mod error;
pub mod returns;
pub mod time_value;
pub mod types;

#[cfg(feature = "strategies")]
pub mod strategies;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ProjectionError;
pub use types::*;

/// Standard result type for all projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
