//! # Monet Runtime
//!
//! The runtime assembles the Monet crates into a single entry point:
//!
//! - **Monetization**: The reconciliation facade over the capability
//!   registry, the detection coordinator and the user's preferences
//! - **Config**: Runtime configuration loading and validation
//! - **Logging**: `tracing` subscriber initialisation
//!
//! ```rust,no_run
//! use monet_capability::plugin;
//! use monet_core::{DetectOptions, DetectionResult};
//! use monet_runtime::Monetization;
//!
//! # async fn run() -> monet_core::Result<()> {
//! let monetization = Monetization::new();
//! monetization
//!     .capabilities()
//!     .use_plugin(plugin::fixed("pay/card", DetectionResult::supported())?)?;
//! monetization.preferences().deny("wallet/*")?;
//!
//! for found in monetization.match_capabilities(DetectOptions::default()).await {
//!     println!("{}", found.capability);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod monetization;

pub use config::{CacheSettings, ConfigError, LoggingConfig, RuntimeConfig, StorageKind};
pub use logging::init_logging;
pub use monetization::Monetization;
