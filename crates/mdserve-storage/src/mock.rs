//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::RwLock;

use crate::storage::{DocumentReader, Storage, StorageError, StorageErrorKind};

/// Mock storage for testing.
///
/// Stores document contents in memory and counts how often each key is opened.
/// Use the builder methods to configure the mock with test data, and the
/// mutating methods to change contents between requests.
///
/// # Example
///
/// ```ignore
/// use mdserve_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new().with_file("guide.md", "# User Guide\n\nContent.");
///
/// let bytes = storage.read("guide.md").unwrap();
/// assert_eq!(storage.read_count("guide.md"), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    contents: RwLock<HashMap<String, Vec<u8>>>,
    failing: RwLock<HashSet<String>>,
    reads: RwLock<HashMap<String, usize>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add content for a key.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.set_file(key, content);
        self
    }

    /// Make every open of `key` fail with an `Unavailable` error.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, key: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(key.into());
        self
    }

    /// Insert or replace content for a key.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_file(&self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.contents
            .write()
            .unwrap()
            .insert(key.into(), content.into());
    }

    /// Remove content for a key.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove_file(&self, key: &str) {
        self.contents.write().unwrap().remove(key);
    }

    /// Number of times `open_read` was called for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn read_count(&self, key: &str) -> usize {
        self.reads.read().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl Storage for MockStorage {
    fn open_read(&self, key: &str) -> Result<Option<DocumentReader>, StorageError> {
        *self
            .reads
            .write()
            .unwrap()
            .entry(key.to_owned())
            .or_default() += 1;

        if self.failing.read().unwrap().contains(key) {
            return Err(StorageError::new(StorageErrorKind::Unavailable)
                .with_key(key)
                .with_backend("Mock"));
        }

        Ok(self
            .contents
            .read()
            .unwrap()
            .get(key)
            .map(|bytes| Box::new(Cursor::new(bytes.clone())) as DocumentReader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_mock_storage_is_send_sync() {
        assert_send_sync::<MockStorage>();
    }

    #[test]
    fn test_new_empty() {
        let storage = MockStorage::new();

        assert!(storage.read("guide.md").unwrap().is_none());
    }

    #[test]
    fn test_with_file() {
        let storage = MockStorage::new().with_file("guide.md", "# Guide\n\nContent.");

        let bytes = storage.read("guide.md").unwrap().unwrap();

        assert_eq!(bytes, b"# Guide\n\nContent.");
    }

    #[test]
    fn test_set_file_replaces_content() {
        let storage = MockStorage::new().with_file("guide.md", "# Old");

        storage.set_file("guide.md", "# New");

        assert_eq!(storage.read("guide.md").unwrap().unwrap(), b"# New");
    }

    #[test]
    fn test_remove_file() {
        let storage = MockStorage::new().with_file("guide.md", "# Guide");

        storage.remove_file("guide.md");

        assert!(storage.read("guide.md").unwrap().is_none());
    }

    #[test]
    fn test_with_failure() {
        let storage = MockStorage::new()
            .with_file("guide.md", "# Guide")
            .with_failure("guide.md");

        let Err(err) = storage.open_read("guide.md") else {
            panic!("expected injected failure");
        };

        assert_eq!(err.kind, StorageErrorKind::Unavailable);
        assert_eq!(err.backend, Some("Mock"));
    }

    #[test]
    fn test_read_count() {
        let storage = MockStorage::new().with_file("guide.md", "# Guide");

        assert_eq!(storage.read_count("guide.md"), 0);
        let _ = storage.read("guide.md");
        let _ = storage.read("guide.md");
        let _ = storage.read("missing.md");

        assert_eq!(storage.read_count("guide.md"), 2);
        assert_eq!(storage.read_count("missing.md"), 1);
    }
}
