//! Error types for exchange rate operations.

use thiserror::Error;

/// Errors raised by drivers, validation and the driver selector.
///
/// Validation variants are always raised before any network or cache access.
#[derive(Error, Debug)]
pub enum ExchangeRateError {
    /// The currency code is not in the allow-list.
    #[error("{0} is not a valid currency code.")]
    InvalidCurrency(String),

    /// The date is not in the past, precedes the backend's earliest
    /// supported date, or a range starts after it ends.
    #[error("{0}")]
    InvalidDate(String),

    /// No driver constructor is registered under this name.
    #[error("Driver [{0}] not supported.")]
    UnsupportedDriver(String),

    /// The backend request failed or returned an unusable payload.
    #[error(transparent)]
    RequestFailure(#[from] RequestError),

    /// The cache store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Failures of the request sender.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid request URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to parse JSON response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Missing field '{0}' in response")]
    MissingField(String),

    #[error("No rate for {currency} in response")]
    MissingRate { currency: String },
}

/// Failures of a cache store implementation.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] fjall::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = ExchangeRateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ExchangeRateError::InvalidCurrency("INVALID".to_string());
        assert_eq!(error.to_string(), "INVALID is not a valid currency code.");

        let error = ExchangeRateError::UnsupportedDriver("unknown".to_string());
        assert_eq!(error.to_string(), "Driver [unknown] not supported.");

        let error = ExchangeRateError::from(RequestError::MissingRate {
            currency: "EUR".to_string(),
        });
        assert_eq!(error.to_string(), "No rate for EUR in response");
    }
}
