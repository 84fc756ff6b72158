//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and stored bytes of the in-memory backend.

use serde::Serialize;

// == Cache Stats ==
/// Counters maintained by [`MemoryCache`](super::MemoryCache).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped to make room under the LRU policy
    pub evictions: u64,
    /// Entries removed explicitly by callers
    pub removals: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Current sum of payload sizes
    pub total_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Refreshes the size gauges.
    pub fn set_totals(&mut self, entries: usize, bytes: usize) {
        self.total_entries = entries;
        self.total_bytes = bytes;
    }
}
