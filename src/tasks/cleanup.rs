//! TTL Cleanup Task
//!
//! Background task that periodically drops expired entries from the in-memory cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// Expired entries are already invisible to lookups; this only reclaims their
/// memory. The returned handle is aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::new(MemoryCache::new(1000, 300));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: SharedCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));
    let inner = cache.inner();

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = inner.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
