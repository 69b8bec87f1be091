//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading Markdown sources from a local directory.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use crate::storage::{DocumentReader, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// Maps document keys to files below a source directory. A key of
/// `"domain/billing.md"` opens `{source_dir}/domain/billing.md`.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use mdserve_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("docs"));
/// let reader = storage.open_read("guide.md")?;
/// ```
#[derive(Debug, Clone)]
pub struct FsStorage {
    /// Root directory for document storage.
    source_dir: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `source_dir`.
    #[must_use]
    pub fn new(source_dir: PathBuf) -> Self {
        Self { source_dir }
    }

    /// Root directory documents are read from.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Validate that a key doesn't escape the source directory.
    ///
    /// Rejects keys containing parent directory components (`..`) or absolute
    /// roots to prevent path traversal (e.g., `../../../etc/passwd.md`).
    fn validate_key(key: &str) -> Result<(), StorageError> {
        let escapes = Path::new(key).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });

        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_key(key)
                .with_backend(BACKEND));
        }
        Ok(())
    }
}

impl Storage for FsStorage {
    fn open_read(&self, key: &str) -> Result<Option<DocumentReader>, StorageError> {
        Self::validate_key(key)?;
        let full_path = self.source_dir.join(key);

        match File::open(&full_path) {
            Ok(file) => {
                // Directories open fine on some platforms but fail on read.
                if file.metadata().is_ok_and(|m| m.is_dir()) {
                    return Ok(None);
                }
                Ok(Some(Box::new(file)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, path = %full_path.display(), "Document not found on disk");
                Ok(None)
            }
            Err(e) => Err(StorageError::io(e, Some(key)).with_backend(BACKEND)),
        }
    }
}
