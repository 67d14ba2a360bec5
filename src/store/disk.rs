use crate::core::cache::CacheStore;
use crate::core::error::CacheError;
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const PARTITION_NAME: &str = "exchange_rates";

/// Persistent cache store backed by a fjall keyspace.
///
/// Values are stored as JSON and never expire.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(PARTITION_NAME, PartitionCreateOptions::default())?;
        debug!("Opened disk cache at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        match self.partition.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn forever(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.partition
            .insert(key.as_bytes(), serde_json::to_vec(&value)?)?;
        // Changes must survive the process exiting right after the call
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!("DiskStore PUT for key: {}", key);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        self.partition.remove(key.as_bytes())?;
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!("DiskStore REMOVE for key: {}", key);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.partition.contains_key(key.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_get_put() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        assert!(store.get("key1").await.unwrap().is_none());

        store.forever("key1", json!({"EUR": 1.16})).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some(json!({"EUR": 1.16})));
        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_forget() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        store.forever("key1", json!("0.86158")).await.unwrap();
        assert!(store.has("key1").await.unwrap());

        store.forget("key1").await.unwrap();
        assert!(!store.has("key1").await.unwrap());
        store.forget("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.forever("key1", json!(["EUR", "GBP"])).await.unwrap();
        }

        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Some(json!(["EUR", "GBP"])));
    }

    #[tokio::test]
    async fn test_disk_store_forget_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path()).unwrap();
            store.forever("key1", json!(1.16)).await.unwrap();
            store.forget("key1").await.unwrap();
        }

        let store = DiskStore::open(dir.path()).unwrap();
        assert!(!store.has("key1").await.unwrap());
    }
}
