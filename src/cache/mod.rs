//! Cache Module
//!
//! The cache store collaborator interface, an in-memory implementation with
//! TTL expiration and LRU eviction, and the fail-open access wrapper.

mod backend;
mod entry;
mod fail_open;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use backend::{CacheBackend, SharedCache};
pub use entry::CacheEntry;
pub use fail_open::FailOpenCache;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::MemoryCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// Maximum allowed payload size in bytes
pub const MAX_VALUE_SIZE: usize = 8 * 1024 * 1024; // 8 MB
