//! # Monet Core
//!
//! `monet_core` provides the fundamental building blocks for the Monet
//! monetization reconciliation system. This includes the capability name
//! type, the wildcard matching relation, detection result types and the
//! error hierarchy shared by every other crate in the workspace.
//!
//! ## Core Principles
//!
//! 1. **Capabilities are names**: A capability is identified solely by a
//!    string of the form `namespace/name`, where `name` may be the wildcard
//!    marker `*`. The grammar `^\w+/(\w+|\*)$` is enforced at every boundary.
//!
//! 2. **Wildcards match, they are not stored**: `foo/*` and `foo/bar` are
//!    distinct keys wherever capabilities are stored. The wildcard only takes
//!    effect through [`matches`], a closed single-level relation:
//!    ```text
//!    matches(ns/*, ns/x) = matches(ns/x, ns/*) = true
//!    matches(a/*, b/*)   = (a == b)
//!    ```
//!
//! 3. **Results are values**: A [`DetectionResult`] carries no identity. It is
//!    either freshly produced by a detection test or reconstructed from the
//!    result cache.
//!
//! ## Crate Structure
//!
//! - **capability**: The `Capability` name type and its validator
//! - **matching**: The wildcard matching relation
//! - **types**: Detection results, match entries and detection options
//! - **error**: Error types for all Monet components
//! - **utils**: Logging helpers

pub mod capability;
pub mod error;
pub mod matching;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use capability::{ensure_valid_capability, is_valid_capability, Capability};
pub use error::{CacheError, CapabilityError, Error, Result};
pub use matching::matches;
pub use types::{CapabilityMatch, DetectOptions, DetectionResult};
pub use utils::LogLevel;
