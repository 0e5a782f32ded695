pub mod error;
pub mod input;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "irr")]
pub mod irr;

#[cfg(feature = "flip")]
pub mod flip;

#[cfg(feature = "multi_unit")]
pub mod multi_unit;

#[cfg(feature = "holding")]
pub mod holding;

#[cfg(feature = "config")]
pub mod config;

#[cfg(feature = "batch")]
pub mod batch;

pub use error::RealtyError;
pub use types::*;

/// Standard result type for all engine operations
pub type RealtyResult<T> = Result<T, RealtyError>;
