use crate::core::cache::CacheStore;
use crate::core::error::CacheError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory cache store, lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let cache = self.inner.lock().await;
        Ok(cache.get(key).cloned())
    }

    async fn forever(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        debug!("MemoryStore PUT for key: {}", key);
        cache.insert(key.to_string(), value);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("MemoryStore REMOVE for key: {}", key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let cache = self.inner.lock().await;
        Ok(cache.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_get_put() {
        let store = MemoryStore::new();

        // Initially, store is empty
        assert!(store.get("key1").await.unwrap().is_none());
        assert!(store.is_empty().await);

        store.forever("key1", json!(123)).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some(json!(123)));
        assert!(store.get("key2").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStore::new();

        store.forever("key1", json!(1.1)).await.unwrap();
        store.forever("key1", json!({"EUR": 1.2})).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some(json!({"EUR": 1.2})));
    }

    #[tokio::test]
    async fn test_memory_store_forget() {
        let store = MemoryStore::new();

        store.forever("key1", json!(123)).await.unwrap();
        assert!(store.has("key1").await.unwrap());

        store.forget("key1").await.unwrap();
        assert!(!store.has("key1").await.unwrap());

        // Removing again is fine
        store.forget("key1").await.unwrap();
    }
}
