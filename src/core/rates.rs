//! Query targets and rate result types

use super::error::RequestError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The currency (or currencies) an exchange rate is quoted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Single(String),
    Many(Vec<String>),
}

impl Target {
    pub fn single(code: impl Into<String>) -> Self {
        Target::Single(code.into())
    }

    /// Builds a multi-currency target. Duplicate codes are dropped, the
    /// remaining order is kept for the request's symbol list.
    pub fn many<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in codes.into_iter().map(Into::into) {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Target::Many(unique)
    }

    /// All target codes; a single target is a one-element list.
    pub fn codes(&self) -> Vec<&str> {
        match self {
            Target::Single(code) => vec![code.as_str()],
            Target::Many(codes) => codes.iter().map(String::as_str).collect(),
        }
    }

    /// Comma separated symbols in the caller's order, as sent to the backend.
    pub fn symbols(&self) -> String {
        self.codes().join(",")
    }

    /// Order-independent segment used in cache keys.
    pub fn cache_segment(&self) -> String {
        let mut codes = self.codes();
        codes.sort_unstable();
        codes.join("_")
    }

    /// True when every target equals `from`, so no conversion is needed.
    pub fn is_same_currency(&self, from: &str) -> bool {
        let codes = self.codes();
        !codes.is_empty() && codes.iter().all(|code| *code == from)
    }

    /// The rates of a currency against itself.
    pub fn identity(&self) -> Rates {
        match self {
            Target::Single(_) => Rates::Single(1.0),
            Target::Many(codes) => Rates::Many(codes.iter().map(|c| (c.clone(), 1.0)).collect()),
        }
    }

    /// Picks the rates this target asks for out of a backend's rate mapping.
    ///
    /// A requested code that is missing from the mapping is an error.
    pub fn select(&self, mut rates: BTreeMap<String, f64>) -> Result<Rates, RequestError> {
        let missing = self
            .codes()
            .into_iter()
            .find(|code| !rates.contains_key(*code));
        if let Some(code) = missing {
            return Err(RequestError::MissingRate {
                currency: code.to_string(),
            });
        }

        match self {
            Target::Single(code) => rates
                .remove(code)
                .map(Rates::Single)
                .ok_or_else(|| RequestError::MissingRate {
                    currency: code.clone(),
                }),
            Target::Many(_) => Ok(Rates::Many(rates)),
        }
    }

    /// Reshapes a cached value to this target.
    ///
    /// A single code and a one-element set share a cache key, so either shape
    /// may have been stored. Returns `None` when a requested code is absent.
    pub fn conform(&self, rates: Rates) -> Option<Rates> {
        match (self, rates) {
            (Target::Single(_), Rates::Single(rate)) => Some(Rates::Single(rate)),
            (Target::Single(code), Rates::Many(mut rates)) => {
                rates.remove(code).map(Rates::Single)
            }
            (Target::Many(codes), Rates::Single(rate)) => match codes.as_slice() {
                [code] => Some(Rates::Many(BTreeMap::from([(code.clone(), rate)]))),
                _ => None,
            },
            (Target::Many(codes), Rates::Many(rates)) => codes
                .iter()
                .all(|code| rates.contains_key(code))
                .then_some(Rates::Many(rates)),
        }
    }
}

impl From<&str> for Target {
    fn from(code: &str) -> Self {
        Target::single(code)
    }
}

impl From<String> for Target {
    fn from(code: String) -> Self {
        Target::Single(code)
    }
}

impl From<&[&str]> for Target {
    fn from(codes: &[&str]) -> Self {
        Target::many(codes.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Target {
    fn from(codes: [&str; N]) -> Self {
        Target::many(codes)
    }
}

impl From<Vec<String>> for Target {
    fn from(codes: Vec<String>) -> Self {
        Target::many(codes)
    }
}

/// A single rate, or a mapping of currency code to rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rates {
    Single(f64),
    Many(BTreeMap<String, f64>),
}

impl Rates {
    pub fn as_single(&self) -> Option<f64> {
        match self {
            Rates::Single(rate) => Some(*rate),
            Rates::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Rates::Single(_) => None,
            Rates::Many(rates) => Some(rates),
        }
    }

    /// Multiplies every rate by `value`, keeping the same keys.
    pub fn scaled(&self, value: f64) -> Rates {
        match self {
            Rates::Single(rate) => Rates::Single(rate * value),
            Rates::Many(rates) => Rates::Many(
                rates
                    .iter()
                    .map(|(code, rate)| (code.clone(), rate * value))
                    .collect(),
            ),
        }
    }

    /// Decodes a cached value. A scalar stored as text (e.g. `"1.23"`) is
    /// coerced to a number; a mapping is returned unchanged.
    pub fn from_cached(value: Value) -> Result<Rates, serde_json::Error> {
        match value {
            Value::String(text) => text.trim().parse::<f64>().map(Rates::Single).map_err(|e| {
                <serde_json::Error as serde::de::Error>::custom(format!(
                    "invalid cached rate '{text}': {e}"
                ))
            }),
            other => serde_json::from_value(other),
        }
    }
}

/// Rates per calendar date, ascending by date.
pub type TimeSeries = BTreeMap<NaiveDate, Rates>;

/// Multiplies every entry of a series by `value`, preserving date order.
pub fn scale_series(series: &TimeSeries, value: f64) -> TimeSeries {
    series
        .iter()
        .map(|(date, rates)| (*date, rates.scaled(value)))
        .collect()
}
