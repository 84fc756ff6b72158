//! Error types for the resource access layer
//!
//! Provides unified error handling using thiserror.

use std::io;

use thiserror::Error;

// == Resource Error Enum ==
/// Caller-visible failures of the file and record access paths.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// File or row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Permission problem or an attempt to leave the root directory
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Path exists but is a directory or another non-regular entry
    #[error("Not a regular file: {0}")]
    NotAFile(String),

    /// The record store failed unexpectedly
    #[error("Storage fault: {0}")]
    StorageFault(#[from] StoreError),

    /// Descriptor rejected at construction time
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Column type has no binder
    #[error("Unsupported column type: {0}")]
    UnsupportedType(String),

    /// Value does not match the declared column type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Statement parameters missing or out of range
    #[error("Binding error: {0}")]
    Binding(String),

    /// Cache payload could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unclassified I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ResourceError {
    // == From I/O ==
    /// Maps an I/O error raised while touching `path` onto the taxonomy.
    ///
    /// Missing entries become `NotFound`, permission problems `AccessDenied`;
    /// anything else stays an I/O error.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ResourceError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => ResourceError::AccessDenied(path.to_string()),
            _ => ResourceError::Io(err),
        }
    }
}

impl From<bincode::Error> for ResourceError {
    fn from(err: bincode::Error) -> Self {
        ResourceError::Codec(err.to_string())
    }
}

// == Cache Error Enum ==
/// Failures reported by a cache backend.
///
/// These never reach callers of the access layer; they are logged and the
/// lookup is treated as a miss.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key has expired
    #[error("Key expired: {0}")]
    Expired(String),

    /// Key or value rejected by the backend
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Backend cannot be reached
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

// == Store Error Enum ==
/// Failures reported by a record store driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection could not be obtained or was lost
    #[error("connection failed: {0}")]
    Connection(String),

    /// Statement was rejected or failed while executing
    #[error("statement failed: {0}")]
    Statement(String),

    /// Transaction could not be started, committed or rolled back
    #[error("transaction failed: {0}")]
    Transaction(String),
}

// == Result Type Alias ==
/// Convenience Result type for the access layer.
pub type Result<T> = std::result::Result<T, ResourceError>;
