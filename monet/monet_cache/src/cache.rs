//! Detection result cache.
//!
//! Results are stored under `<key_prefix><capability>` as `{"value": <result>}`.
//! The cache keeps a manifest of the keys it wrote, persisted next to the
//! entries, so that `clear()` removes exactly its own entries even after the
//! cache is reopened, without scanning keys that belong to anyone else.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use monet_core::{CacheError, DetectionResult, Result};

use crate::storage::{MemoryStorage, StorageBackend, StorageError};

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the cache is used at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Prefix prepended to every storage key the cache writes
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_enabled() -> bool {
    true
}

fn default_key_prefix() -> String {
    "monetization/".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            key_prefix: default_key_prefix(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    value: DetectionResult,
}

/// Persistent cache of detection results keyed by capability name.
///
/// Every operation is a no-op when the cache is disabled or has no backend.
/// Entries never expire; they live until deleted or cleared.
pub struct ResultCache {
    enabled: bool,
    key_prefix: String,
    backend: Option<Arc<dyn StorageBackend>>,

    /// Logical keys this cache has written
    manifest: Mutex<BTreeSet<String>>,

    /// Serializes manifest snapshots with their writes
    manifest_write: tokio::sync::Mutex<()>,

    /// Held shared by `set`/`delete` and exclusively by `clear`
    writers: tokio::sync::RwLock<()>,
}

impl ResultCache {
    /// Open a cache over `backend`, loading the persisted manifest.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration.
    /// * `backend` - The storage backend, or `None` when persistence is unavailable.
    ///
    /// # Returns
    ///
    /// * `Ok(ResultCache)` - The opened cache.
    /// * `Err` - If the persisted manifest could not be read or decoded.
    pub async fn open(
        config: CacheConfig,
        backend: Option<Arc<dyn StorageBackend>>,
    ) -> Result<Self> {
        let cache = Self {
            enabled: config.enabled,
            key_prefix: config.key_prefix,
            backend,
            manifest: Mutex::new(BTreeSet::new()),
            manifest_write: tokio::sync::Mutex::new(()),
            writers: tokio::sync::RwLock::new(()),
        };

        if let Some(backend) = cache.active_backend() {
            let keys = match backend.load(&cache.manifest_key()).await {
                Ok(bytes) => serde_json::from_slice::<BTreeSet<String>>(&bytes)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?,
                Err(StorageError::NotFound(_)) => BTreeSet::new(),
                Err(e) => return Err(CacheError::from(e).into()),
            };
            debug!("Loaded cache manifest with {} keys", keys.len());
            *cache.manifest.lock() = keys;
        }

        Ok(cache)
    }

    /// An enabled cache over a fresh in-process [`MemoryStorage`].
    ///
    /// The store starts empty, so there is no manifest to load.
    pub fn in_memory() -> Self {
        Self {
            enabled: true,
            key_prefix: default_key_prefix(),
            backend: Some(Arc::new(MemoryStorage::new())),
            manifest: Mutex::new(BTreeSet::new()),
            manifest_write: tokio::sync::Mutex::new(()),
            writers: tokio::sync::RwLock::new(()),
        }
    }

    /// A cache on which every operation is a no-op.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            key_prefix: default_key_prefix(),
            backend: None,
            manifest: Mutex::new(BTreeSet::new()),
            manifest_write: tokio::sync::Mutex::new(()),
            writers: tokio::sync::RwLock::new(()),
        }
    }

    /// Whether operations reach the backend.
    pub fn is_active(&self) -> bool {
        self.active_backend().is_some()
    }

    /// Keys currently recorded in the manifest.
    pub fn keys(&self) -> Vec<String> {
        self.manifest.lock().iter().cloned().collect()
    }

    /// Read a cached result.
    ///
    /// A missing entry is `Ok(None)`. An entry that cannot be decoded is an
    /// error, not a miss.
    pub async fn get(&self, key: &str) -> Result<Option<DetectionResult>> {
        let Some(backend) = self.active_backend() else {
            return Ok(None);
        };

        let bytes = match backend.load(&self.storage_key(key)).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(CacheError::from(e).into()),
        };

        let record: CacheRecord = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::Serialization(format!("entry {}: {}", key, e)))?;

        Ok(Some(record.value))
    }

    /// Write a result and record its key in the manifest.
    pub async fn set(&self, key: &str, value: &DetectionResult) -> Result<()> {
        let Some(backend) = self.active_backend() else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(&CacheRecord {
            value: value.clone(),
        })
        .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let _writing = self.writers.read().await;
        self.manifest.lock().insert(key.to_string());
        backend
            .store(&self.storage_key(key), &bytes)
            .await
            .map_err(CacheError::from)?;
        self.persist_manifest(backend).await
    }

    /// Remove an entry and drop it from the manifest.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let Some(backend) = self.active_backend() else {
            return Ok(());
        };

        let _writing = self.writers.read().await;
        self.manifest.lock().remove(key);
        backend
            .delete(&self.storage_key(key))
            .await
            .map_err(CacheError::from)?;
        self.persist_manifest(backend).await
    }

    /// Delete every manifested entry concurrently, then empty the manifest.
    ///
    /// Keys whose deletion failed stay in the manifest, and the first failure
    /// is returned after the remaining deletions have run. Writes issued
    /// while a clear runs wait for it to finish.
    pub async fn clear(&self) -> Result<()> {
        let Some(backend) = self.active_backend() else {
            return Ok(());
        };

        let _clearing = self.writers.write().await;
        let keys = self.keys();
        let outcomes = join_all(keys.iter().map(|key| {
            let storage_key = self.storage_key(key);
            async move { backend.delete(&storage_key).await }
        }))
        .await;

        let mut first_error = None;
        {
            let mut manifest = self.manifest.lock();
            for (key, outcome) in keys.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => {
                        manifest.remove(key);
                    }
                    Err(e) => {
                        warn!("Failed to delete cache entry {}: {}", key, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        self.persist_manifest(backend).await?;
        debug!("Cleared {} cache entries", keys.len());

        match first_error {
            Some(e) => Err(CacheError::from(e).into()),
            None => Ok(()),
        }
    }

    fn active_backend(&self) -> Option<&Arc<dyn StorageBackend>> {
        if self.enabled {
            self.backend.as_ref()
        } else {
            None
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    // `#` never appears in a capability name, so this cannot collide with an entry.
    fn manifest_key(&self) -> String {
        format!("{}#manifest", self.key_prefix)
    }

    async fn persist_manifest(&self, backend: &Arc<dyn StorageBackend>) -> Result<()> {
        let _guard = self.manifest_write.lock().await;
        let snapshot = self.keys();
        let bytes =
            serde_json::to_vec(&snapshot).map_err(|e| CacheError::Serialization(e.to_string()))?;
        backend
            .store(&self.manifest_key(), &bytes)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}
