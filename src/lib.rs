pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::ExchangeRateManager;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

/// A rate query issued from the command line.
#[derive(Debug, Clone)]
pub enum AppCommand {
    Currencies,
    Rate {
        from: String,
        to: Vec<String>,
        date: Option<NaiveDate>,
    },
    Convert {
        value: f64,
        from: String,
        to: Vec<String>,
        date: Option<NaiveDate>,
    },
    Range {
        from: String,
        to: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    },
    ConvertRange {
        value: f64,
        from: String,
        to: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Per-invocation overrides of the configured behaviour.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Driver to use instead of the configured default.
    pub driver: Option<String>,
    pub no_cache: bool,
    pub bust_cache: bool,
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    options: &RunOptions,
) -> Result<()> {
    info!("xrates starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = store::open_store(&config)?;
    let manager = ExchangeRateManager::new(config, store);

    let driver_name = options
        .driver
        .as_deref()
        .unwrap_or(manager.default_driver_name());
    let driver = manager.driver(driver_name).await?;
    driver
        .should_cache(!options.no_cache)
        .should_bust_cache(options.bust_cache);

    cli::rates::run(command, driver.as_ref()).await
}
