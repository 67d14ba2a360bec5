//! Named driver registry and facade over the default driver.

use super::backend::Backend;
use super::shared::SharedDriver;
use crate::core::cache::{CacheRepository, CacheStore};
use crate::core::config::AppConfig;
use crate::core::driver::ExchangeRateDriver;
use crate::core::error::{ExchangeRateError, Result};
use crate::core::rates::{Rates, Target, TimeSeries};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Builds a driver from the application config and the shared cache.
pub type DriverFactory =
    Box<dyn Fn(&AppConfig, CacheRepository) -> Result<Arc<dyn ExchangeRateDriver>> + Send + Sync>;

pub struct ExchangeRateManager {
    config: AppConfig,
    cache: CacheRepository,
    factories: HashMap<String, DriverFactory>,
    drivers: Mutex<HashMap<String, Arc<dyn ExchangeRateDriver>>>,
}

impl ExchangeRateManager {
    /// Registers every built-in backend under its name.
    pub fn new(config: AppConfig, store: Arc<dyn CacheStore>) -> Self {
        let cache = CacheRepository::with_prefix(store, config.cache.prefix.clone());
        let mut manager = Self {
            config,
            cache,
            factories: HashMap::new(),
            drivers: Mutex::new(HashMap::new()),
        };

        for backend in Backend::ALL {
            manager.extend(backend.name(), move |config, cache| {
                let driver_config = config.driver_config(backend);
                let driver = SharedDriver::from_config(backend, driver_config, cache)?;
                Ok(Arc::new(driver) as Arc<dyn ExchangeRateDriver>)
            });
        }
        manager
    }

    /// Registers a driver constructor, replacing any existing one of that name.
    pub fn extend<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&AppConfig, CacheRepository) -> Result<Arc<dyn ExchangeRateDriver>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
        self.drivers.get_mut().remove(name);
        self
    }

    pub fn default_driver_name(&self) -> &str {
        &self.config.driver
    }

    /// Names of every registered driver, sorted.
    pub fn driver_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolves a driver by name, constructing it on first use.
    pub async fn driver(&self, name: &str) -> Result<Arc<dyn ExchangeRateDriver>> {
        let mut drivers = self.drivers.lock().await;
        if let Some(driver) = drivers.get(name) {
            return Ok(Arc::clone(driver));
        }

        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ExchangeRateError::UnsupportedDriver(name.to_string()))?;

        info!(driver = name, "Creating exchange rate driver");
        let driver = factory(&self.config, self.cache.clone())?;
        drivers.insert(name.to_string(), Arc::clone(&driver));
        Ok(driver)
    }

    pub async fn default_driver(&self) -> Result<Arc<dyn ExchangeRateDriver>> {
        debug!(driver = %self.config.driver, "Resolving default driver");
        self.driver(&self.config.driver).await
    }

    pub async fn currencies(&self) -> Result<Vec<String>> {
        self.default_driver().await?.currencies().await
    }

    pub async fn exchange_rate(
        &self,
        from: &str,
        to: &Target,
        date: Option<NaiveDate>,
    ) -> Result<Rates> {
        self.default_driver()
            .await?
            .exchange_rate(from, to, date)
            .await
    }

    pub async fn exchange_rate_between_date_range(
        &self,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        self.default_driver()
            .await?
            .exchange_rate_between_date_range(from, to, start, end)
            .await
    }

    pub async fn convert(
        &self,
        value: f64,
        from: &str,
        to: &Target,
        date: Option<NaiveDate>,
    ) -> Result<Rates> {
        self.default_driver()
            .await?
            .convert(value, from, to, date)
            .await
    }

    pub async fn convert_between_date_range(
        &self,
        value: f64,
        from: &str,
        to: &Target,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries> {
        self.default_driver()
            .await?
            .convert_between_date_range(value, from, to, start, end)
            .await
    }

    /// Sets the cache flag on the default driver and returns it.
    pub async fn should_cache(&self, enabled: bool) -> Result<Arc<dyn ExchangeRateDriver>> {
        let driver = self.default_driver().await?;
        driver.should_cache(enabled);
        Ok(driver)
    }

    /// Requests a one-shot cache bust on the default driver and returns it.
    pub async fn should_bust_cache(&self, bust: bool) -> Result<Arc<dyn ExchangeRateDriver>> {
        let driver = self.default_driver().await?;
        driver.should_bust_cache(bust);
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderConfig;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers every rate query with a constant.
    struct FixedDriver(f64);

    #[async_trait]
    impl ExchangeRateDriver for FixedDriver {
        async fn currencies(&self) -> Result<Vec<String>> {
            Ok(vec!["EUR".to_string()])
        }

        async fn exchange_rate(
            &self,
            _from: &str,
            to: &Target,
            _date: Option<NaiveDate>,
        ) -> Result<Rates> {
            Ok(to.identity().scaled(self.0))
        }

        async fn exchange_rate_between_date_range(
            &self,
            _from: &str,
            to: &Target,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<TimeSeries> {
            Ok(TimeSeries::from([(start, to.identity().scaled(self.0))]))
        }

        fn should_cache(&self, _enabled: bool) -> &dyn ExchangeRateDriver {
            self
        }

        fn should_bust_cache(&self, _bust: bool) -> &dyn ExchangeRateDriver {
            self
        }
    }

    fn manager(config: AppConfig) -> ExchangeRateManager {
        ExchangeRateManager::new(config, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_builtin_drivers_are_registered() {
        let manager = manager(AppConfig::default());
        assert_eq!(
            manager.driver_names(),
            vec![
                "currency-beacon",
                "exchange-rate-host",
                "exchange-rates-api-io",
                "exchange-rates-api-legacy",
                "exchange-rates-data-api",
            ]
        );
        for backend in Backend::ALL {
            assert!(manager.driver(backend.name()).await.is_ok());
        }
        assert_eq!(manager.default_driver_name(), "exchange-rates-api-io");
    }

    #[tokio::test]
    async fn test_unknown_driver_is_unsupported() {
        let manager = manager(AppConfig::default());
        let result = manager.driver("nonexistent").await;
        assert!(matches!(
            result,
            Err(ExchangeRateError::UnsupportedDriver(name)) if name == "nonexistent"
        ));
    }

    #[tokio::test]
    async fn test_unknown_default_driver_is_unsupported() {
        let config = AppConfig {
            driver: "bogus".to_string(),
            ..AppConfig::default()
        };
        let manager = manager(config);
        let result = manager.exchange_rate("EUR", &"GBP".into(), None).await;
        assert!(matches!(result, Err(ExchangeRateError::UnsupportedDriver(_))));
    }

    #[tokio::test]
    async fn test_drivers_are_memoized() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mut manager = manager(AppConfig::default());
        manager.extend("fixed", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FixedDriver(2.0)) as Arc<dyn ExchangeRateDriver>)
        });

        let first = manager.driver("fixed").await.unwrap();
        let second = manager.driver("fixed").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_facade_forwards_to_default_driver() {
        let config = AppConfig {
            driver: "fixed".to_string(),
            ..AppConfig::default()
        };
        let mut manager = manager(config);
        manager.extend("fixed", |_, _| {
            Ok(Arc::new(FixedDriver(2.0)) as Arc<dyn ExchangeRateDriver>)
        });

        let rate = manager.exchange_rate("EUR", &"GBP".into(), None).await.unwrap();
        assert_eq!(rate, Rates::Single(2.0));

        let converted = manager.convert(10.0, "EUR", &"GBP".into(), None).await.unwrap();
        assert_eq!(converted, Rates::Single(20.0));

        let day = NaiveDate::from_ymd_opt(2019, 11, 4).unwrap();
        let series = manager
            .convert_between_date_range(10.0, "EUR", &"GBP".into(), day, day)
            .await
            .unwrap();
        assert_eq!(series[&day], Rates::Single(20.0));

        assert_eq!(manager.currencies().await.unwrap(), vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_default_driver_uses_configured_provider() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2019-11-08"))
            .and(query_param("access_key", "secret"))
            .and(query_param("base", "GBP"))
            .and(query_param("symbols", "EUR"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"rates": {"EUR": 1.1606583254}, "base": "GBP"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let mut config = AppConfig {
            api_key: Some("secret".to_string()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "exchange-rates-api-io".to_string(),
            ProviderConfig {
                base_url: Some(mock_server.uri()),
                api_key: None,
            },
        );
        let manager = ExchangeRateManager::new(config, store.clone());
        let date = NaiveDate::from_ymd_opt(2019, 11, 8);

        let rate = manager.exchange_rate("GBP", &"EUR".into(), date).await.unwrap();
        assert_eq!(rate, Rates::Single(1.1606583254));

        // Served from the cache, so the mock still sees a single request
        let rate = manager.exchange_rate("GBP", &"EUR".into(), date).await.unwrap();
        assert_eq!(rate, Rates::Single(1.1606583254));
        assert!(store.has("xrates_GBP_EUR_2019-11-08").await.unwrap());
    }

    #[tokio::test]
    async fn test_bust_cache_through_facade() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/historical"))
            .and(query_param("date", "2019-11-08"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"quotes": {"GBPEUR": 1.16}}"#),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let mut config = AppConfig {
            driver: "exchange-rate-host".to_string(),
            ..AppConfig::default()
        };
        config.cache.prefix = "test_".to_string();
        config.providers.insert(
            "exchange-rate-host".to_string(),
            ProviderConfig {
                base_url: Some(mock_server.uri()),
                api_key: Some("key".to_string()),
            },
        );
        let store = Arc::new(MemoryStore::new());
        let manager = ExchangeRateManager::new(config, store.clone());
        let date = NaiveDate::from_ymd_opt(2019, 11, 8);

        manager.exchange_rate("GBP", &"EUR".into(), date).await.unwrap();
        manager
            .should_bust_cache(true)
            .await
            .unwrap()
            .exchange_rate("GBP", &"EUR".into(), date)
            .await
            .unwrap();

        assert!(store.has("test_GBP_EUR_2019-11-08").await.unwrap());
    }
}
