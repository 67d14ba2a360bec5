//! The driver shared by every backend.
//!
//! The supported APIs follow the same structure, so one implementation covers
//! all of them: validate the input, try the cache, make one request, normalize
//! the payload with the backend's [`ResponseShape`](super::backend::ResponseShape),
//! then cache and return the result.

use super::backend::{Backend, BackendSpec, CurrenciesEndpoint, HistoricalEndpoint};
use super::request::{HttpRequestSender, RequestSender};
use crate::core::cache::CacheRepository;
use crate::core::config::DriverConfig;
use crate::core::driver::ExchangeRateDriver;
use crate::core::error::{CacheError, RequestError, Result};
use crate::core::rates::{Rates, Target, TimeSeries};
use crate::core::validation;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument};

const CURRENCIES_CACHE_KEY: &str = "currencies";

pub struct SharedDriver {
    backend: Backend,
    sender: Box<dyn RequestSender>,
    cache: CacheRepository,
    should_cache: AtomicBool,
    should_bust_cache: AtomicBool,
    today: Option<NaiveDate>,
}

impl SharedDriver {
    pub fn new(backend: Backend, sender: Box<dyn RequestSender>, cache: CacheRepository) -> Self {
        Self {
            backend,
            sender,
            cache,
            should_cache: AtomicBool::new(true),
            should_bust_cache: AtomicBool::new(false),
            today: None,
        }
    }

    /// Creates a driver that talks HTTP to the configured base URL.
    pub fn from_config(
        backend: Backend,
        config: DriverConfig,
        cache: CacheRepository,
    ) -> Result<Self, RequestError> {
        let sender = HttpRequestSender::new(backend.spec(), config)?;
        Ok(Self::new(backend, Box::new(sender), cache))
    }

    /// Pins the evaluation date used for validation and "today" cache keys.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn spec(&self) -> &'static BackendSpec {
        self.backend.spec()
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Returns the cached value unless a bust was requested, in which case
    /// the entry is removed and the flag cleared.
    async fn resolve_from_cache(&self, key: &str) -> Result<Option<Value>> {
        if self.should_bust_cache.swap(false, Ordering::SeqCst) {
            debug!(key, "Busting cached value");
            self.cache.forget(key).await?;
            return Ok(None);
        }
        Ok(self.cache.get(key).await?)
    }

    async fn store_in_cache<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        if self.should_cache.load(Ordering::SeqCst) {
            self.cache.store(key, value).await?;
        }
        Ok(())
    }

    async fn fetch_time_series(
        &self,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        let params = self.spec().params;
        let query = [
            (params.base, from.to_string()),
            (params.start_date, start.format("%Y-%m-%d").to_string()),
            (params.end_date, end.format("%Y-%m-%d").to_string()),
            (params.symbols, to.symbols()),
        ];

        let series = self
            .sender
            .make_request(self.spec().time_series, &query)
            .await?
            .time_series()?;

        let conversions = series
            .into_iter()
            .map(|(date, rates)| to.select(rates).map(|rates| (date, rates)))
            .collect::<Result<TimeSeries, _>>()?;
        Ok(conversions)
    }

    async fn fetch_currencies(&self) -> Result<Vec<String>> {
        let currencies = match self.spec().currencies {
            CurrenciesEndpoint::Latest => {
                let response = self.sender.make_request(self.spec().latest, &[]).await?;
                let base = response
                    .get("base")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RequestError::MissingField("base".to_string()))?
                    .to_string();

                let mut currencies = vec![base];
                for code in response.rates()?.into_keys() {
                    if !currencies.contains(&code) {
                        currencies.push(code);
                    }
                }
                currencies
            }
            CurrenciesEndpoint::ObjectKeys { path, field } => {
                let response = self.sender.make_request(path, &[]).await?;
                response
                    .get(field)
                    .and_then(Value::as_object)
                    .ok_or_else(|| RequestError::MissingField(field.to_string()))?
                    .keys()
                    .cloned()
                    .collect()
            }
            CurrenciesEndpoint::ArrayField {
                path,
                query,
                list,
                field,
            } => {
                let query: Vec<(&str, String)> = query
                    .iter()
                    .map(|(name, value)| (*name, value.to_string()))
                    .collect();
                let response = self.sender.make_request(path, &query).await?;
                response
                    .get(list)
                    .and_then(Value::as_array)
                    .ok_or_else(|| RequestError::MissingField(list.to_string()))?
                    .iter()
                    .filter_map(|item| item.get(field).and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            }
        };
        Ok(currencies)
    }
}

/// A rate of 1.0 for every weekday in the range. Weekends are left out as
/// there is no trading on them.
fn same_currency_series(to: &Target, start: NaiveDate, end: NaiveDate) -> TimeSeries {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .map(|date| (date, to.identity()))
        .collect()
}

/// Decodes a cached series, shaping each day to `to`. `None` when a day
/// lacks a requested code.
fn series_from_cached(value: Value, to: &Target) -> Result<Option<TimeSeries>, CacheError> {
    let days: BTreeMap<NaiveDate, Value> = serde_json::from_value(value)?;
    let mut series = TimeSeries::new();
    for (date, rates) in days {
        match to.conform(Rates::from_cached(rates)?) {
            Some(rates) => series.insert(date, rates),
            None => return Ok(None),
        };
    }
    Ok(Some(series))
}

#[async_trait]
impl ExchangeRateDriver for SharedDriver {
    #[instrument(skip(self), fields(backend = %self.backend))]
    async fn currencies(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.resolve_from_cache(CURRENCIES_CACHE_KEY).await? {
            return Ok(serde_json::from_value(cached).map_err(CacheError::from)?);
        }

        let currencies = self.fetch_currencies().await?;
        self.store_in_cache(CURRENCIES_CACHE_KEY, &currencies).await?;
        Ok(currencies)
    }

    #[instrument(skip(self), fields(backend = %self.backend))]
    async fn exchange_rate(
        &self,
        from: &str,
        to: &Target,
        date: Option<NaiveDate>,
    ) -> Result<Rates> {
        let today = self.today();
        if let Some(date) = date {
            validation::validate_date(date, today, self.backend.earliest_date())?;
        }
        validation::validate_currency_code(from)?;
        validation::validate_target(to)?;

        if to.is_same_currency(from) {
            return Ok(to.identity());
        }

        let cache_key = CacheRepository::build_key(from, to, date.unwrap_or(today), None);
        if let Some(cached) = self.resolve_from_cache(&cache_key).await? {
            let cached = Rates::from_cached(cached).map_err(CacheError::from)?;
            match to.conform(cached) {
                Some(rates) => return Ok(rates),
                None => debug!(key = %cache_key, "Cached rates do not cover the target"),
            }
        }

        let spec = self.spec();
        let mut query = vec![
            (spec.params.base, from.to_string()),
            (spec.params.symbols, to.symbols()),
        ];
        let path = match (date, spec.historical) {
            (None, _) => spec.latest.to_string(),
            (Some(date), HistoricalEndpoint::DatePath) => {
                format!("/{}", date.format("%Y-%m-%d"))
            }
            (Some(date), HistoricalEndpoint::DateParam { path, param }) => {
                query.push((param, date.format("%Y-%m-%d").to_string()));
                path.to_string()
            }
        };

        let rates = self.sender.make_request(&path, &query).await?.rates()?;
        let exchange_rate = to.select(rates)?;

        self.store_in_cache(&cache_key, &exchange_rate).await?;
        Ok(exchange_rate)
    }

    #[instrument(skip(self), fields(backend = %self.backend))]
    async fn exchange_rate_between_date_range(
        &self,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        validation::validate_currency_code(from)?;
        let earliest = self.backend.earliest_date();
        validation::validate_date_range(start, end, self.today(), earliest)?;
        validation::validate_target(to)?;

        let cache_key = CacheRepository::build_key(from, to, start, Some(end));
        if let Some(cached) = self.resolve_from_cache(&cache_key).await? {
            match series_from_cached(cached, to)? {
                Some(series) => return Ok(series),
                None => debug!(key = %cache_key, "Cached series does not cover the target"),
            }
        }

        let conversions = if to.is_same_currency(from) {
            same_currency_series(to, start, end)
        } else {
            self.fetch_time_series(from, to, start, end).await?
        };

        self.store_in_cache(&cache_key, &conversions).await?;
        Ok(conversions)
    }

    fn should_cache(&self, enabled: bool) -> &dyn ExchangeRateDriver {
        self.should_cache.store(enabled, Ordering::SeqCst);
        self
    }

    fn should_bust_cache(&self, bust: bool) -> &dyn ExchangeRateDriver {
        self.should_bust_cache.store(bust, Ordering::SeqCst);
        self
    }
}
