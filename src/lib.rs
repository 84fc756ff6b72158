//! Resource Cache - cache-aside access to files and database records
//!
//! Keeps a fast cache consistent with slower authoritative storage: files
//! under a fixed root, validated by modification time, and descriptor-driven
//! table rows, invalidated explicitly after writes.

pub mod cache;
pub mod config;
pub mod error;
pub mod file;
pub mod record;
pub mod tasks;

pub use cache::{CacheBackend, FailOpenCache, MemoryCache, SharedCache};
pub use config::Config;
pub use error::{CacheError, ResourceError, Result, StoreError};
pub use file::{FileCache, FileHandle, FileInfo, SafeFileAccessor};
pub use record::{
    ColumnType, Record, RecordDescriptor, RecordStore, RecordStoreService, Row, TransactionHandle,
    Value,
};
pub use tasks::spawn_cleanup_task;
