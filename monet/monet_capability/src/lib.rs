//! # Monet Capability
//!
//! This crate holds the site side of Monet: the capabilities a site declares,
//! their detection tests, and the coordination of detection runs.
//!
//! ## Core Components
//!
//! - **Registry**: The ordered set of capabilities with their tests, mutated
//!   through exclusive registration sessions
//! - **Detection**: Cache-checked detection of a single capability, with at
//!   most one test invocation in flight per name
//! - **Plugin**: `(name, test)` bundles shipped by third parties
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use monet_cache::ResultCache;
//! use monet_capability::{plugin, CapabilityRegistry, DetectionCoordinator};
//! use monet_core::{DetectOptions, DetectionResult};
//!
//! # async fn run() -> monet_core::Result<()> {
//! let registry = Arc::new(CapabilityRegistry::new());
//!
//! // Register a bundle of capabilities in one session
//! {
//!     let session = registry.acquire()?;
//!     session.use_plugin(plugin::fixed("pay/card", DetectionResult::supported())?)?;
//!     session.use_plugin(plugin::fixed("wallet/*", DetectionResult::unsupported())?)?;
//! }
//!
//! let coordinator = DetectionCoordinator::new(registry, Arc::new(ResultCache::disabled()));
//! let result = coordinator.detect("pay/card", DetectOptions::default()).await?;
//! assert!(result.is_supported);
//! # Ok(())
//! # }
//! ```

pub mod detection;
pub mod plugin;
pub mod registry;

// Re-export commonly used types
pub use detection::DetectionCoordinator;
pub use plugin::Plugin;
pub use registry::{CapabilityRegistry, RegistrySession};
pub use test::{DetectionTest, SharedTest};
