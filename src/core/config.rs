use super::cache::DEFAULT_CACHE_PREFIX;
use crate::providers::backend::Backend;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_driver() -> String {
    Backend::ExchangeRatesApiIo.name().to_string()
}

fn default_https() -> bool {
    true
}

fn default_cache_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}

/// Per-provider overrides, keyed by driver name in [`AppConfig::providers`].
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderConfig {
    /// Full base URL including protocol, e.g. `http://localhost:8080/v1`.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Persist cached rates on disk instead of in memory.
    #[serde(default)]
    pub persist: bool,
    pub data_path: Option<String>,
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            persist: false,
            data_path: None,
            prefix: default_cache_prefix(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Name of the default driver.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// API key shared by all providers unless overridden.
    pub api_key: Option<String>,
    /// Some backends reject https on free plans.
    #[serde(default = "default_https")]
    pub https: bool,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            driver: default_driver(),
            api_key: None,
            https: default_https(),
            cache: CacheConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Resolved settings for one driver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "xrates", "xrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.cache.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "xrates", "xrates")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Resolves the base URL and api key for a backend.
    pub fn driver_config(&self, backend: Backend) -> DriverConfig {
        let provider = self.providers.get(backend.name());
        let base_url = provider
            .and_then(|p| p.base_url.clone())
            .unwrap_or_else(|| {
                let protocol = if self.https { "https" } else { "http" };
                format!("{}://{}", protocol, backend.spec().host)
            });
        let api_key = provider
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone());

        DriverConfig { base_url, api_key }
    }
}
