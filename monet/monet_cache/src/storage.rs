use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use monet_core::CacheError;

/// Error type for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Other storage error: {0}")]
    Other(String),
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        CacheError::Storage(err.to_string())
    }
}

/// A flat key/value byte store.
///
/// No transactional guarantee is made across keys.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Store data with the given key
    async fn store(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Load data with the given key
    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete data with the given key. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// File-based storage backend, one file per key under `base_dir`.
pub struct FileStorage {
    /// Base directory for storage
    base_dir: PathBuf,

    /// Sequence number for temporary file names
    next_temp: AtomicU64,
}

impl FileStorage {
    /// Create a new file storage backend
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileStorage {
            base_dir: base_dir.into(),
            next_temp: AtomicU64::new(0),
        }
    }

    /// Get the full path for a key
    fn get_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(encode_file_name(key))
    }

    /// A fresh temporary path for one write of `key`.
    ///
    /// `~` is always percent-encoded in key file names, so a temporary file
    /// never shares its name with an entry or with another write.
    fn temp_path(&self, key: &str) -> PathBuf {
        let seq = self.next_temp.fetch_add(1, Ordering::Relaxed);
        self.base_dir
            .join(format!("{}~{}.tmp", encode_file_name(key), seq))
    }
}

/// Map a key onto a single portable file name.
///
/// Keys contain `/` and `*`, neither of which can appear in a file name on
/// every platform, so anything outside `[A-Za-z0-9_.-]` is percent-encoded.
fn encode_file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' => {
                name.push(byte as char)
            }
            _ => name.push_str(&format!("%{:02X}", byte)),
        }
    }
    name
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn store(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.get_path(key);

        tokio::fs::create_dir_all(&self.base_dir).await?;

        // Write atomically using a temporary file
        let temp_path = self.temp_path(key);
        let written = async {
            tokio::fs::write(&temp_path, data).await?;
            let file = tokio::fs::File::open(&temp_path).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.get_path(key);

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.get_path(key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

/// In-memory storage backend, mainly for tests and ephemeral sessions
pub struct MemoryStorage {
    data: tokio::sync::RwLock<std::collections::HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        MemoryStorage {
            data: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Number of stored keys, including keys written by other users of the store
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store holds no keys at all
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn store(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut map = self.data.write().await;
        map.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let map = self.data.read().await;

        match map.get(key) {
            Some(data) => Ok(data.clone()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.data.write().await;
        map.remove(key);
        Ok(())
    }
}
