//! Data structures shared across the Monet crates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::Capability;

/// The outcome of a capability's detection test.
///
/// `details` is an opaque payload the test may attach (for example the
/// payment pointer a wallet reported). It is carried through the cache and
/// into the reconciled match list untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Whether the current user/environment supports the capability
    pub is_supported: bool,

    /// Optional detail payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl DetectionResult {
    /// A result reporting the capability as supported.
    pub fn supported() -> Self {
        Self {
            is_supported: true,
            details: None,
        }
    }

    /// A result reporting the capability as unsupported.
    pub fn unsupported() -> Self {
        Self {
            is_supported: false,
            details: None,
        }
    }

    /// Attach a detail payload to this result.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A capability that survived reconciliation, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityMatch {
    /// The matched capability
    pub capability: Capability,

    /// Details reported by the capability's detection test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Options for a detection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectOptions {
    /// Skip the cache lookup and always run the detection test
    #[serde(default)]
    pub bypass_cache: bool,
}

impl DetectOptions {
    /// Options that force a fresh detection.
    pub fn bypass_cache() -> Self {
        Self { bypass_cache: true }
    }
}
