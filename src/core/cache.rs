//! Cache store abstraction and the key-prefixed repository drivers use.

use super::error::CacheError;
use super::rates::Target;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_CACHE_PREFIX: &str = "xrates_";

/// A key-value store without expiry. Implementations are shared across drivers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores the value until it is explicitly forgotten.
    async fn forever(&self, key: &str, value: Value) -> Result<(), CacheError>;

    /// Removes the entry if present; a missing key is not an error.
    async fn forget(&self, key: &str) -> Result<(), CacheError>;

    async fn has(&self, key: &str) -> Result<bool, CacheError>;
}

/// Namespaced access to a shared [`CacheStore`].
#[derive(Clone)]
pub struct CacheRepository {
    store: Arc<dyn CacheStore>,
    prefix: String,
}

impl CacheRepository {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_prefix(store, DEFAULT_CACHE_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Builds `{from}_{to}_{date}` with an optional `_{end_date}` suffix for
    /// range queries. Multi-currency targets are sorted before joining.
    pub fn build_key(
        from: &str,
        to: &Target,
        date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> String {
        let mut key = format!(
            "{}_{}_{}",
            from,
            to.cache_segment(),
            date.format("%Y-%m-%d")
        );
        if let Some(end_date) = end_date {
            key.push('_');
            key.push_str(&end_date.format("%Y-%m-%d").to_string());
        }
        key
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let value = self.store.get(&self.prefixed(key)).await?;
        if value.is_some() {
            debug!(key, "Cache HIT");
        } else {
            debug!(key, "Cache MISS");
        }
        Ok(value)
    }

    pub async fn store<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.store.forever(&self.prefixed(key), value).await?;
        debug!(key, "Cache PUT");
        Ok(())
    }

    pub async fn forget(&self, key: &str) -> Result<(), CacheError> {
        self.store.forget(&self.prefixed(key)).await?;
        debug!(key, "Cache FORGET");
        Ok(())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}
