//! File Module
//!
//! Root-confined file lookup and the cache-aside content read path.

mod accessor;
mod cache;
mod info;

pub use accessor::{FileHandle, SafeFileAccessor};
pub use cache::{FileCache, FILE_CACHE_PREFIX};
pub use info::{normalize_logical_path, FileInfo};
