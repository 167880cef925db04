//! Resolved image URLs, kept for the session and mirrored to disk.

use std::{collections::BTreeMap, fmt, sync::Arc};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::durable::{DurableStore, MemoryStore};
use crate::constants::IMAGE_CACHE_STORAGE_KEY;

/// Stable key for a resolved image URL.
///
/// Films use `title|year` (empty year when unknown), characters use
/// `character|name`. Keys are persisted, so the formats must not change.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageCacheKey(String);

impl ImageCacheKey {
    /// Key from a preformatted string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Poster key, `title|year`.
    pub fn film(title: &str, year: Option<&str>) -> Self {
        Self(format!("{title}|{}", year.unwrap_or_default()))
    }

    /// Portrait key, `character|name`.
    pub fn character(name: &str) -> Self {
        Self(format!("character|{name}"))
    }

    /// The persisted key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageCacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for ImageCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide map of resolved image URLs.
///
/// Memory is authoritative for the session. Every write re-serializes the
/// whole map under a single durable key; a failed write is logged and
/// dropped.
pub struct ImageCache {
    memory: DashMap<String, String>,
    store: Arc<dyn DurableStore>,
    storage_key: String,
    flush_lock: Mutex<()>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.memory.len())
            .field("store", &self.store)
            .field("storage_key", &self.storage_key)
            .finish()
    }
}

impl ImageCache {
    /// Empty cache over `store`. Use [`ImageCache::load`] to seed it.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            memory: DashMap::new(),
            store,
            storage_key: IMAGE_CACHE_STORAGE_KEY.to_string(),
            flush_lock: Mutex::new(()),
        }
    }

    /// Cache over a [`MemoryStore`]; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Stores the map under `storage_key` instead of
    /// [`IMAGE_CACHE_STORAGE_KEY`].
    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    /// Builds the cache and seeds memory from whatever the store holds.
    pub async fn load(store: Arc<dyn DurableStore>) -> Self {
        let cache = Self::new(store);
        cache.seed().await;
        cache
    }

    async fn seed(&self) {
        let persisted = self.read_durable().await;
        let count = persisted.len();
        for (key, url) in persisted {
            self.memory.entry(key).or_insert(url);
        }
        info!(entries = count, "image cache loaded");
    }

    /// Any failure reading or parsing the durable map counts as empty.
    async fn read_durable(&self) -> BTreeMap<String, String> {
        match self.store.get(&self.storage_key).await {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(error = %err, "discarding unreadable image cache");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                warn!(error = %err, "image cache store read failed");
                BTreeMap::new()
            }
        }
    }

    /// Memory first, then the durable map. A durable hit is promoted into
    /// memory so later reads skip the store.
    pub async fn get(&self, key: &ImageCacheKey) -> Option<String> {
        if let Some(url) = self.memory.get(key.as_str()) {
            return Some(url.value().clone());
        }

        let url = self.read_durable().await.remove(key.as_str())?;
        debug!(%key, "image cache durable hit");
        self.memory.insert(key.as_str().to_string(), url.clone());
        Some(url)
    }

    /// In-memory lookup only; never touches the store.
    pub fn peek(&self, key: &ImageCacheKey) -> Option<String> {
        self.memory.get(key.as_str()).map(|url| url.value().clone())
    }

    /// Records `url` and flushes the whole map to the store.
    pub async fn put(&self, key: ImageCacheKey, url: String) {
        self.memory.insert(key.0, url);
        self.flush().await;
    }

    /// In-memory insert without a flush. The next [`ImageCache::flush`],
    /// `put` or `put_many` persists it.
    pub fn stage(&self, key: ImageCacheKey, url: String) {
        self.memory.insert(key.0, url);
    }

    /// Merges every entry into the current map and flushes once.
    pub async fn put_many<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (ImageCacheKey, String)>,
    {
        let mut merged = 0usize;
        for (key, url) in entries {
            self.memory.insert(key.0, url);
            merged += 1;
        }
        if merged > 0 {
            debug!(merged, "image cache batch merge");
            self.flush().await;
        }
    }

    /// Sorted copy of every in-memory entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.memory
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of in-memory entries.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// `true` when memory holds no entries.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Drops every entry, in memory and in the store.
    pub async fn clear(&self) {
        let _guard = self.flush_lock.lock().await;
        self.memory.clear();
        if let Err(err) = self.store.remove(&self.storage_key).await {
            warn!(error = %err, "image cache store clear failed");
        }
    }

    /// Writes the whole map under the storage key.
    pub async fn flush(&self) {
        let _guard = self.flush_lock.lock().await;
        let snapshot = self.snapshot();
        let bytes = match serde_json::to_vec(&snapshot) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "image cache serialization failed");
                return;
            }
        };
        if let Err(err) = self.store.set(&self.storage_key, &bytes).await {
            warn!(error = %err, entries = snapshot.len(), "image cache write dropped");
        }
    }
}
