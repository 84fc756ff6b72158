//! Configuration Module
//!
//! Handles loading and managing access layer configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default upper bound for a file to be kept in the cache (128 KiB).
pub const DEFAULT_MAX_CACHED_FILE_SIZE: u64 = 128 * 1024;

/// Default batch size above which `save` runs inside a transaction.
pub const DEFAULT_TRANSACTION_THRESHOLD: usize = 5;

/// Access layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory every file lookup is confined to
    pub root_directory: PathBuf,
    /// Compare modification times on every file cache hit
    pub recheck_last_modified: bool,
    /// Files larger than this many bytes are served but not cached
    pub max_cached_file_size: u64,
    /// Maximum number of entries the in-memory cache can hold
    pub cache_max_entries: usize,
    /// Default TTL in seconds for cache entries, 0 disables expiry
    pub cache_default_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// `save` opens a transaction when given more records than this
    pub transaction_threshold: usize,
    /// TTL hint for cached records, None = backend default
    pub record_cache_ttl: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ROOT_DIRECTORY` - File root (default: `.`)
    /// - `RECHECK_LAST_MODIFIED` - Staleness recheck on cache hits (default: true)
    /// - `MAX_CACHED_FILE_SIZE` - Largest cacheable file in bytes (default: 131072)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `TRANSACTION_THRESHOLD` - Batch size that triggers a transaction (default: 5)
    /// - `RECORD_CACHE_TTL` - TTL hint in seconds for cached records (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_directory: env::var("ROOT_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.root_directory),
            recheck_last_modified: parse_var("RECHECK_LAST_MODIFIED")
                .unwrap_or(defaults.recheck_last_modified),
            max_cached_file_size: parse_var("MAX_CACHED_FILE_SIZE")
                .unwrap_or(defaults.max_cached_file_size),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES").unwrap_or(defaults.cache_max_entries),
            cache_default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.cache_default_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            transaction_threshold: parse_var("TRANSACTION_THRESHOLD")
                .unwrap_or(defaults.transaction_threshold),
            record_cache_ttl: parse_var("RECORD_CACHE_TTL"),
        }
    }

    /// TTL hint for cached records as a Duration.
    pub fn record_ttl(&self) -> Option<Duration> {
        self.record_cache_ttl.map(Duration::from_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::from("."),
            recheck_last_modified: true,
            max_cached_file_size: DEFAULT_MAX_CACHED_FILE_SIZE,
            cache_max_entries: 1000,
            cache_default_ttl: 300,
            cleanup_interval: 1,
            transaction_threshold: DEFAULT_TRANSACTION_THRESHOLD,
            record_cache_ttl: None,
        }
    }
}
