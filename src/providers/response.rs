//! Normalized view over a backend's decoded JSON payload.

use super::backend::ResponseShape;
use crate::core::error::RequestError;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Response {
    raw: Value,
    shape: ResponseShape,
}

impl Response {
    pub fn new(raw: Value, shape: ResponseShape) -> Self {
        Self { raw, shape }
    }

    /// Nested lookup by dotted path, e.g. `response.rates`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.raw, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// Currency code → rate for a single date.
    pub fn rates(&self) -> Result<BTreeMap<String, f64>, RequestError> {
        let rates = self
            .get(self.shape.rates)
            .ok_or_else(|| RequestError::MissingField(self.shape.rates.to_string()))?;
        self.normalize_rates(rates, self.shape.rates)
    }

    /// Date → (currency code → rate) for a range query, ascending by date.
    pub fn time_series(&self) -> Result<BTreeMap<NaiveDate, BTreeMap<String, f64>>, RequestError> {
        let path = self.shape.time_series;
        let days = self
            .get(path)
            .and_then(Value::as_object)
            .ok_or_else(|| RequestError::MissingField(path.to_string()))?;

        days.iter()
            .map(|(day, rates)| {
                let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map_err(|_| RequestError::MissingField(format!("{path}.{day}")))?;
                let rates = self.normalize_rates(rates, &format!("{path}.{day}"))?;
                Ok::<_, RequestError>((date, rates))
            })
            .collect()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn normalize_rates(
        &self,
        rates: &Value,
        path: &str,
    ) -> Result<BTreeMap<String, f64>, RequestError> {
        let rates = rates
            .as_object()
            .ok_or_else(|| RequestError::MissingField(path.to_string()))?;

        rates
            .iter()
            .map(|(key, value)| {
                let rate = as_rate(value)
                    .ok_or_else(|| RequestError::MissingField(format!("{path}.{key}")))?;
                Ok::<_, RequestError>((self.currency_from_key(key).to_string(), rate))
            })
            .collect()
    }

    /// Strips the source currency from keys like `USDEUR`.
    fn currency_from_key<'a>(&self, key: &'a str) -> &'a str {
        if self.shape.source_prefixed_keys {
            key.get(3..).unwrap_or(key)
        } else {
            key
        }
    }
}

/// Rates are numbers, though some payloads quote them as strings.
fn as_rate(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
}
