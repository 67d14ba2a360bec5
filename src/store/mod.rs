pub mod disk;
pub mod memory;

use crate::core::cache::CacheStore;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the cache store selected by the configuration.
///
/// Persistent caches live in a `cache` directory under the data path.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>> {
    if !config.cache.persist {
        debug!("Using in-memory cache");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let cache_dir = config.default_data_path()?.join("cache");
    let store = DiskStore::open(&cache_dir)
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_memory_store_by_default() -> Result<()> {
        let store = open_store(&AppConfig::default())?;
        store.forever("key", json!(1.5)).await?;
        assert_eq!(store.get("key").await?, Some(json!(1.5)));
        Ok(())
    }

    #[tokio::test]
    async fn test_open_persistent_store_under_data_path() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut config = AppConfig::default();
        config.cache.persist = true;
        config.cache.data_path = Some(temp_dir.path().to_string_lossy().into_owned());

        let store = open_store(&config)?;
        store.forever("key", json!({"EUR": 1.16})).await?;

        assert!(temp_dir.path().join("cache").exists());
        assert!(store.has("key").await?);
        Ok(())
    }
}
