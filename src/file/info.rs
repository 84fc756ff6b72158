//! File metadata snapshots and their cache payload form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::file::FileHandle;

// == File Info ==
/// What was known about a file at one observation point.
///
/// A fresh value is built on every lookup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub last_modified: DateTime<Utc>,
    pub length: u64,
    /// Present only when the content was actually read
    pub contents: Option<Vec<u8>>,
}

impl FileInfo {
    pub fn from_handle(handle: &FileHandle, contents: Option<Vec<u8>>) -> Self {
        Self {
            path: handle.path.clone(),
            name: handle.name.clone(),
            extension: handle.extension.clone(),
            last_modified: handle.last_modified,
            length: handle.length,
            contents,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// == Path Normalisation ==
/// Lexical normal form of a logical path used for cache keys.
///
/// Empty and `.` segments are dropped. `..` is kept verbatim: resolving it
/// lexically could disagree with the filesystem when symlinks are involved.
/// A path ending in `/` or `/.` keeps a trailing `/`, since it only resolves
/// to a directory and must not share a key with the file of the same name.
pub fn normalize_logical_path(path: &str) -> String {
    let mut normalized = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    let directory_only = path.contains('/') && matches!(path.rsplit('/').next(), Some("" | "."));
    if directory_only && !normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
