//! Cache-aside read path over [`SafeFileAccessor`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheBackend, FailOpenCache};
use crate::config::{Config, DEFAULT_MAX_CACHED_FILE_SIZE};
use crate::error::Result;
use crate::file::{normalize_logical_path, FileInfo, SafeFileAccessor};

/// Namespace of file entries in the shared cache.
pub const FILE_CACHE_PREFIX: &str = "FileCache:";

// == File Cache ==
/// Serves file contents from the cache when they are still current.
///
/// TTL expiry in the backend bounds how long an entry can live; the
/// modification time comparison on every hit decides whether it is valid.
pub struct FileCache<C: ?Sized> {
    accessor: Arc<SafeFileAccessor>,
    cache: FailOpenCache<C>,
    recheck_last_modified: bool,
    max_cached_file_size: u64,
}

impl<C: CacheBackend + ?Sized> FileCache<C> {
    pub fn new(accessor: Arc<SafeFileAccessor>, cache: Arc<C>) -> Self {
        Self {
            accessor,
            cache: FailOpenCache::new(cache),
            recheck_last_modified: true,
            max_cached_file_size: DEFAULT_MAX_CACHED_FILE_SIZE,
        }
    }

    /// Builds the accessor for `config.root_directory` and applies the file settings.
    pub fn from_config(config: &Config, cache: Arc<C>) -> Result<Self> {
        let accessor = Arc::new(SafeFileAccessor::new(&config.root_directory)?);
        Ok(Self::new(accessor, cache)
            .with_recheck(config.recheck_last_modified)
            .with_max_cached_file_size(config.max_cached_file_size))
    }

    pub fn with_recheck(mut self, enabled: bool) -> Self {
        self.recheck_last_modified = enabled;
        self
    }

    pub fn with_max_cached_file_size(mut self, bytes: u64) -> Self {
        self.max_cached_file_size = bytes;
        self
    }

    pub fn accessor(&self) -> &SafeFileAccessor {
        &self.accessor
    }

    /// Backend failures absorbed so far.
    pub fn cache_faults(&self) -> u64 {
        self.cache.faults()
    }

    pub fn cache_key(path: &str) -> String {
        format!("{}{}", FILE_CACHE_PREFIX, normalize_logical_path(path))
    }

    // == Get Content ==
    /// Returns the contents of `path`.
    ///
    /// `cache_expiry` is passed to the backend as a TTL hint when the file is
    /// cached; None leaves the backend default in place.
    pub async fn get_content(&self, path: &str, cache_expiry: Option<Duration>) -> Result<Vec<u8>> {
        let key = Self::cache_key(path);

        if let Some(contents) = self.cached_contents(path, &key).await? {
            return Ok(contents);
        }

        let handle = self.accessor.resolve(path).await?;
        let contents = self.accessor.read_all(&handle).await?;
        let info = FileInfo::from_handle(&handle, Some(contents));

        if info.length <= self.max_cached_file_size {
            match info.to_bytes() {
                Ok(payload) => {
                    self.cache.fill(&key, payload, cache_expiry).await;
                }
                Err(e) => warn!(path, error = %e, "could not encode file for cache"),
            }
        } else {
            debug!(path, length = info.length, "file too large to cache");
        }

        Ok(info.contents.unwrap_or_default())
    }

    /// Valid cached contents for `key`, or None when the caller must read the file.
    async fn cached_contents(&self, path: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(payload) = self.cache.lookup(key).await else {
            return Ok(None);
        };

        let cached = match FileInfo::from_bytes(&payload) {
            Ok(FileInfo {
                contents: Some(contents),
                last_modified,
                ..
            }) => (contents, last_modified),
            Ok(_) => {
                self.cache.evict(key).await;
                return Ok(None);
            }
            Err(e) => {
                warn!(path, error = %e, "undecodable file cache entry, evicting");
                self.cache.evict(key).await;
                return Ok(None);
            }
        };

        let (contents, cached_modified) = cached;
        if self.recheck_last_modified {
            // Runs the safety checks again; a deleted file surfaces as NotFound
            let current = self.accessor.resolve(path).await?;
            if cached_modified < current.last_modified {
                debug!(path, "cached file is stale, evicting");
                self.cache.evict(key).await;
                return Ok(None);
            }
        }

        Ok(Some(contents))
    }

    /// Metadata of `path` straight from the filesystem.
    pub async fn get_file_info(&self, path: &str) -> Result<FileInfo> {
        self.accessor.file_info(path).await
    }

    /// Drops any cached copy of `path`.
    pub async fn invalidate(&self, path: &str) {
        self.cache.evict(&Self::cache_key(path)).await;
    }
}
