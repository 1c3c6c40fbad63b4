//! Command implementations for the Monet CLI

pub mod cache;
pub mod names;
pub mod scenario;

use std::path::Path;

use anyhow::Result;
use monet_runtime::{init_logging, Monetization, RuntimeConfig};

/// Load configuration, install logging and build a runtime from it
pub async fn open_runtime(config: Option<&Path>) -> Result<Monetization> {
    let config = RuntimeConfig::load(config).await?;
    init_logging(&config.logging);
    Ok(Monetization::from_settings(&config.cache).await?)
}
