//! Cache maintenance commands

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::open_runtime;

/// Implementation of the clear-cache command
pub async fn execute_clear_cache(config: &Path) -> Result<()> {
    let monetization = open_runtime(Some(config)).await?;

    let count = monetization.cache().keys().len();
    monetization.clear_cache().await?;
    info!("Cleared {} cached results", count);

    println!("Cleared {} cached results", count);
    Ok(())
}
