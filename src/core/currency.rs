//! Currency allow-list

use std::collections::HashSet;
use std::sync::LazyLock;

/// Currencies supported by the exchange rate backends.
pub const ALLOWABLE_CURRENCIES: &[&str] = &[
    "EUR", "CAD", "HKD", "ISK", "PHP", "DKK", "HUF", "CZK", "AUD", "RON", "SEK", "IDR", "INR",
    "BRL", "RUB", "HRK", "JPY", "THB", "CHF", "SGD", "PLN", "BGN", "TRY", "CNY", "NOK", "NZD",
    "ZAR", "USD", "MXN", "ILS", "GBP", "KRW", "MYR",
];

static ALLOWABLE_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ALLOWABLE_CURRENCIES.iter().copied().collect());

/// Returns true if the code is a supported currency. Codes are case sensitive.
pub fn is_allowable(code: &str) -> bool {
    ALLOWABLE_SET.contains(code)
}

/// Form-style rule for checking a user supplied currency field.
pub struct ValidCurrency;

impl ValidCurrency {
    pub fn passes(value: &str) -> bool {
        is_allowable(value)
    }

    pub fn message(attribute: &str) -> String {
        format!("The {attribute} must be a valid exchange rates currency.")
    }
}
