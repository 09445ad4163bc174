pub mod config;
pub mod error;
pub mod mortgage;
pub mod real_estate;
pub mod scenarios;
pub mod portfolio;
pub mod time_value;
pub mod types;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "register")]
pub mod register;

pub use error::RealtyError;
pub use types::*;

/// Standard result type for all realty operations
pub type RealtyResult<T> = Result<T, RealtyError>;
