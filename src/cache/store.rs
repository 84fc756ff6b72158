//! Memory Cache Module
//!
//! In-process cache backend combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::CacheError;

// == Memory Cache ==
/// Byte-payload cache with LRU eviction and TTL support.
#[derive(Debug)]
pub struct MemoryCache {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL applied when a put carries no hint, None = never expire
    default_ttl: Option<Duration>,
    /// Running sum of payload sizes
    total_bytes: usize,
}

type Result<T> = std::result::Result<T, CacheError>;

impl MemoryCache {
    // == Constructor ==
    /// Creates a new MemoryCache.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl_secs` - Default TTL in seconds, 0 disables expiry
    pub fn new(max_entries: usize, default_ttl_secs: u64) -> Self {
        let default_ttl = (default_ttl_secs > 0).then(|| Duration::from_secs(default_ttl_secs));
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            total_bytes: 0,
        }
    }

    // == Set ==
    /// Stores a payload under `key`.
    ///
    /// An existing entry is overwritten and its TTL reset. At capacity the
    /// least recently used entry is evicted first.
    pub fn set(&mut self, key: String, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key must be 1..={} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted) => {
                    self.drop_entry(&evicted);
                    self.stats.record_eviction();
                }
                None => {
                    return Err(CacheError::CacheFull(
                        "Cache is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let entry = CacheEntry::new(value, ttl.or(self.default_ttl));
        self.total_bytes += entry.size();
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.total_bytes -= previous.size();
        }
        self.lru.touch(&key);
        self.refresh_totals();

        Ok(())
    }

    // == Get ==
    /// Returns a copy of the payload if present and not expired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
        };

        if expired {
            self.drop_entry(key);
            self.lru.remove(key);
            self.refresh_totals();
            self.stats.record_miss();
            return Err(CacheError::Expired(key.to_string()));
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Delete ==
    /// Removes an entry by key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.drop_entry(key) {
            self.lru.remove(key);
            self.stats.record_removal();
            self.refresh_totals();
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.drop_entry(key);
            self.lru.remove(key);
        }

        self.refresh_totals();
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_bytes -= entry.size();
                true
            }
            None => false,
        }
    }

    fn refresh_totals(&mut self) {
        self.stats.set_totals(self.entries.len(), self.total_bytes);
    }
}
