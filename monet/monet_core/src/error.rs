//! Error types for the Monet system.
//!
//! The errors are organized by subsystem, with each subsystem having its own
//! error type. The root error type, `Error`, can wrap any of the
//! subsystem-specific errors, allowing for uniform error handling at the top
//! level.
//!
//! Every error type here is `Clone`: a single in-flight detection may be
//! awaited by several callers, and each of them receives the same outcome.

use thiserror::Error;

/// Root error type for the Monet system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Capability-related errors
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Result cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// A detection test failed to produce a result
    #[error("Detection failed: {0}")]
    Detection(String),

    /// A required parameter was omitted at a public entry point
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors related to capability names and the capability registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The name does not match `^\w+/(\w+|\*)$`
    #[error("Invalid capability format: {0:?}")]
    InvalidFormat(String),

    /// The operation referenced a capability that is not registered
    #[error("Unrecognized capability: {0}")]
    Unrecognized(String),

    /// `undefine` was called for a capability that is not registered
    #[error("Capability not defined: {0}")]
    NotDefined(String),

    /// The registry lock is already held by another session
    #[error("Already acquired")]
    AlreadyAcquired,
}

/// Errors raised by the result cache and its storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The storage backend failed to read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using the Monet error type.
pub type Result<T> = std::result::Result<T, Error>;
