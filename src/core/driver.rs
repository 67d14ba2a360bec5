//! The contract every exchange rate driver implements.

use super::error::Result;
use super::rates::{Rates, Target, TimeSeries, scale_series};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait ExchangeRateDriver: Send + Sync {
    /// Currency codes the backend supports.
    async fn currencies(&self) -> Result<Vec<String>>;

    /// Rate from `from` to `to` on `date`, or today when no date is given.
    async fn exchange_rate(
        &self,
        from: &str,
        to: &Target,
        date: Option<NaiveDate>,
    ) -> Result<Rates>;

    /// Rates for every available day between `start` and `end` inclusive.
    async fn exchange_rate_between_date_range(
        &self,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries>;

    async fn convert(
        &self,
        value: f64,
        from: &str,
        to: &Target,
        date: Option<NaiveDate>,
    ) -> Result<Rates> {
        let rates = self.exchange_rate(from, to, date).await?;
        Ok(rates.scaled(value))
    }

    async fn convert_between_date_range(
        &self,
        value: f64,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        let series = self
            .exchange_rate_between_date_range(from, to, start, end)
            .await?;
        Ok(scale_series(&series, value))
    }

    /// Whether fetched values are written to the cache. Defaults to true.
    fn should_cache(&self, enabled: bool) -> &dyn ExchangeRateDriver;

    /// Drops the cached value on the next lookup and fetches a fresh one.
    ///
    /// The flag is consumed by that lookup. It is shared by every caller of
    /// the driver, so concurrent callers may consume each other's bust.
    fn should_bust_cache(&self, bust: bool) -> &dyn ExchangeRateDriver;
}
