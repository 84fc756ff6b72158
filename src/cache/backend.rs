//! Cache Backend Module
//!
//! The narrow get/put/remove interface the access layer consumes, and its
//! implementation over the in-process [`MemoryCache`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, MemoryCache};
use crate::error::CacheError;

// == Cache Backend ==
/// Key to byte-payload store shared by every cache-aside path.
///
/// Implementations may fail at any time; callers go through
/// [`FailOpenCache`](super::FailOpenCache), which turns failures into misses.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the payload stored under `key`, `Ok(None)` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`. `ttl` of None means "backend default".
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Drops `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// == Shared Cache ==
/// Thread-safe handle to a [`MemoryCache`].
#[derive(Clone, Debug)]
pub struct SharedCache {
    inner: Arc<RwLock<MemoryCache>>,
}

impl SharedCache {
    pub fn new(cache: MemoryCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a handle from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(MemoryCache::new(
            config.cache_max_entries,
            config.cache_default_ttl,
        ))
    }

    /// Underlying lock, shared with the cleanup task.
    pub fn inner(&self) -> Arc<RwLock<MemoryCache>> {
        Arc::clone(&self.inner)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.read().await.contains(key)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}

#[async_trait]
impl CacheBackend for SharedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        // Write lock: lookups update LRU order and statistics
        let mut cache = self.inner.write().await;
        match cache.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::NotFound(_)) | Err(CacheError::Expired(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.inner.write().await.set(key.to_string(), value, ttl)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        match self.inner.write().await.delete(key) {
            Ok(()) | Err(CacheError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
