//! Root-confined file access.
//!
//! Every lookup joins the caller's path onto a fixed root, canonicalises the
//! result and refuses anything whose canonical form lies outside the root.
//! No `..` segment or symlink can reach a file above the root.

use std::ffi::OsString;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{trace, warn};

use crate::error::{ResourceError, Result};
use crate::file::FileInfo;

// == File Handle ==
/// A file that passed every safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Path as the caller supplied it
    pub path: String,
    /// Canonical absolute path, always under the root
    pub absolute: PathBuf,
    pub name: String,
    /// Text after the last `.` of the name, empty for none or a leading dot only
    pub extension: String,
    pub length: u64,
    pub last_modified: DateTime<Utc>,
}

// == Safe File Accessor ==
#[derive(Debug, Clone)]
pub struct SafeFileAccessor {
    /// Canonical root directory
    root: PathBuf,
}

impl SafeFileAccessor {
    /// Creates an accessor confined to `root`, which must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root).map_err(|e| {
            ResourceError::Configuration(format!(
                "root directory {} couldn't be found: {}",
                root.display(),
                e
            ))
        })?;
        if !canonical.is_dir() {
            return Err(ResourceError::Configuration(format!(
                "root directory {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root: canonical })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root + "/" + path`. Plain concatenation keeps an absolute `path`
    /// from replacing the root the way `Path::join` would.
    fn candidate(&self, path: &str) -> PathBuf {
        let mut joined = OsString::from(self.root.as_os_str());
        joined.push("/");
        joined.push(path);
        PathBuf::from(joined)
    }

    // == Resolve ==
    /// Resolves `path` under the root and runs the safety checks in order:
    /// existence, root confinement, readability (skipped for hidden files),
    /// regular file.
    pub async fn resolve(&self, path: &str) -> Result<FileHandle> {
        let candidate = self.candidate(path);

        fs::metadata(&candidate)
            .await
            .map_err(|e| ResourceError::from_io(e, path))?;

        let absolute = fs::canonicalize(&candidate)
            .await
            .map_err(|e| ResourceError::from_io(e, path))?;
        if !absolute.starts_with(&self.root) {
            warn!(path, resolved = %absolute.display(), "path escapes root directory");
            return Err(ResourceError::AccessDenied(path.to_string()));
        }

        let metadata = fs::metadata(&absolute)
            .await
            .map_err(|e| ResourceError::from_io(e, path))?;

        let name = candidate
            .file_name()
            .or_else(|| absolute.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !name.starts_with('.') && !is_readable(&absolute, &metadata).await {
            return Err(ResourceError::AccessDenied(path.to_string()));
        }
        if !metadata.is_file() {
            return Err(ResourceError::NotAFile(path.to_string()));
        }

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(ResourceError::Io)?;

        Ok(FileHandle {
            path: path.to_string(),
            absolute,
            extension: extension_of(&name),
            name,
            length: metadata.len(),
            last_modified,
        })
    }

    // == Read All ==
    /// Reads a resolved file completely.
    ///
    /// The file may have vanished or changed permissions since it was
    /// resolved; that surfaces as `NotFound` or `AccessDenied`.
    pub async fn read_all(&self, handle: &FileHandle) -> Result<Vec<u8>> {
        trace!(path = %handle.absolute.display(), "reading file");
        fs::read(&handle.absolute)
            .await
            .map_err(|e| ResourceError::from_io(e, &handle.path))
    }

    /// Opens a safety-checked file for streaming reads.
    pub async fn open(&self, path: &str) -> Result<fs::File> {
        let handle = self.resolve(path).await?;
        fs::File::open(&handle.absolute)
            .await
            .map_err(|e| ResourceError::from_io(e, path))
    }

    pub async fn content_length(&self, path: &str) -> Result<u64> {
        Ok(self.resolve(path).await?.length)
    }

    /// Metadata of a file, without its contents.
    pub async fn file_info(&self, path: &str) -> Result<FileInfo> {
        Ok(FileInfo::from_handle(&self.resolve(path).await?, None))
    }
}

async fn is_readable(path: &Path, metadata: &Metadata) -> bool {
    if metadata.is_file() {
        fs::File::open(path).await.is_ok()
    } else if metadata.is_dir() {
        fs::read_dir(path).await.is_ok()
    } else {
        // Opening a FIFO for reading would block until a writer shows up
        true
    }
}

fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(i) if i > 0 => name[i + 1..].to_string(),
        _ => String::new(),
    }
}
