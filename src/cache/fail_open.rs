//! Fail-open cache access.
//!
//! The cache is best effort: a backend failure on any operation is logged,
//! counted and answered as if the key were absent. Callers then take the
//! authoritative path. Nothing here ever returns an error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::CacheBackend;

/// Wraps a [`CacheBackend`] with the log-and-continue policy.
pub struct FailOpenCache<C: ?Sized> {
    backend: Arc<C>,
    faults: AtomicU64,
}

impl<C: CacheBackend + ?Sized> FailOpenCache<C> {
    pub fn new(backend: Arc<C>) -> Self {
        Self {
            backend,
            faults: AtomicU64::new(0),
        }
    }

    /// Number of backend failures absorbed so far.
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Looks `key` up; a failure counts as a miss.
    pub async fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(key).await {
            Ok(Some(bytes)) => {
                debug!(key, "cache hit");
                Some(bytes)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Stores `value` under `key`. Returns whether the backend accepted it.
    pub async fn fill(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> bool {
        match self.backend.put(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "cache fill failed");
                false
            }
        }
    }

    /// Removes `key`. Returns whether the backend confirmed the removal.
    pub async fn evict(&self, key: &str) -> bool {
        match self.backend.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %e, "cache eviction failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, SharedCache};
    use crate::error::CacheError;
    use async_trait::async_trait;

    struct DownCache;

    #[async_trait]
    impl CacheBackend for DownCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable("down".to_string()))
        }

        async fn put(&self, _: &str, _: Vec<u8>, _: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("down".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_backend_failures_become_misses() {
        let cache = FailOpenCache::new(Arc::new(DownCache));

        assert_eq!(cache.lookup("k").await, None);
        assert!(!cache.fill("k", vec![1], None).await);
        assert!(!cache.evict("k").await);
        assert_eq!(cache.faults(), 3);
    }

    #[tokio::test]
    async fn test_healthy_backend_passes_through() {
        let backend = Arc::new(SharedCache::new(MemoryCache::new(10, 0)));
        let cache = FailOpenCache::new(backend);

        assert!(cache.fill("k", vec![1, 2], None).await);
        assert_eq!(cache.lookup("k").await, Some(vec![1, 2]));
        assert!(cache.evict("k").await);
        assert_eq!(cache.lookup("k").await, None);
        assert_eq!(cache.faults(), 0);
    }

    #[tokio::test]
    async fn test_works_behind_trait_object() {
        let backend: Arc<dyn CacheBackend> = Arc::new(SharedCache::new(MemoryCache::new(10, 0)));
        let cache = FailOpenCache::new(backend);

        assert!(cache.fill("k", vec![3], None).await);
        assert_eq!(cache.lookup("k").await, Some(vec![3]));
    }
}
