//! # Monet Cache
//!
//! Persistence for detection results. A [`ResultCache`] memoizes the outcome
//! of each capability's detection test across process restarts, on top of any
//! [`StorageBackend`] providing flat key/value byte storage.
//!
//! The cache is best-effort: without a backend, or when disabled, every
//! operation is a no-op.

pub mod cache;
pub mod storage;

pub use cache::{CacheConfig, ResultCache};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
