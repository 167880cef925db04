//! Byte-level persistence behind the image cache.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use dashmap::DashMap;

/// Durable store failure. Never escapes [`super::ImageCache`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend refused or failed the operation.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Stored bytes failed their integrity check.
    #[error("cache entry corrupt: {0}")]
    Corrupt(String),

    /// Filesystem error under the store root.
    #[error("cache I/O error: {0}")]
    Io(String),
}

/// Key/value persistence that outlives the process.
///
/// Values are opaque bytes; callers own the encoding.
#[async_trait]
pub trait DurableStore: Send + Sync + fmt::Debug {
    /// Bytes stored under `key`, or `None` when nothing was written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces whatever `key` held.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Removing a key that was never written is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// `cacache`-backed store rooted at a directory it manages.
#[derive(Clone)]
pub struct CacacheStore {
    root: PathBuf,
}

impl fmt::Debug for CacacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacacheStore").field(&self.root).finish()
    }
}

impl CacacheStore {
    /// Store rooted at `root`. `cacache` creates the directory on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the content and index trees.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn map_cacache_error(key: &str, err: cacache::Error) -> StoreError {
    match err {
        cacache::Error::IntegrityError(err) => StoreError::Corrupt(format!(
            "integrity check failed for {key} ({err})"
        )),
        cacache::Error::SizeMismatch(wanted, actual) => StoreError::Corrupt(
            format!("size mismatch for {key}: wanted={wanted}, actual={actual}"),
        ),
        cacache::Error::IoError(_, msg) => StoreError::Io(msg),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl DurableStore for CacacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match cacache::read(&self.root, key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(err) => Err(map_cacache_error(key, err)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        cacache::write(&self.root, key, value)
            .await
            .map(|_| ())
            .map_err(|err| map_cacache_error(key, err))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let existing = cacache::metadata(&self.root, key)
            .await
            .map_err(|err| map_cacache_error(key, err))?;
        if existing.is_none() {
            return Ok(());
        }

        cacache::index::RemoveOpts::new()
            .remove_fully(true)
            .remove(&self.root, key)
            .await
            .map_err(|err| map_cacache_error(key, err))
    }
}

/// Process-local store for tests and cache-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
