//! Exchange rate backends and the driver built on top of them.

pub mod backend;
pub mod manager;
pub mod request;
pub mod response;
pub mod shared;

pub use backend::Backend;
pub use manager::{DriverFactory, ExchangeRateManager};
pub use shared::SharedDriver;
