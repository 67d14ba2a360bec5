//! Core types, validation and the driver contract

pub mod cache;
pub mod config;
pub mod currency;
pub mod driver;
pub mod error;
pub mod log;
pub mod rates;
pub mod validation;

// Re-export main types for cleaner imports
pub use cache::{CacheRepository, CacheStore};
pub use driver::ExchangeRateDriver;
pub use error::{CacheError, ExchangeRateError, RequestError};
pub use rates::{Rates, Target, TimeSeries};
