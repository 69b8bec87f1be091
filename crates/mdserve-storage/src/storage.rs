//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for opening document sources by key,
//! along with [`StorageError`] for unified error handling across backends.
//!
//! # Key Convention
//!
//! Keys are storage paths with the `.md` suffix already applied and no leading
//! slash:
//! - `"index.md"` - home page
//! - `"guide.md"` - standalone page
//! - `"domain/billing.md"` - nested page
//!
//! Keys are passed through unchanged from the HTTP layer. Backends are responsible
//! for rejecting keys they cannot safely map to their internal storage format.

use std::io::Read;

/// Readable byte stream returned by [`Storage::open_read`].
pub type DocumentReader = Box<dyn Read + Send>;

/// Failure categories reported by storage backends.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path or identifier.
    InvalidPath,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Document key context (if applicable).
    pub key: Option<String>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            key: None,
            backend: None,
            source: None,
        }
    }

    /// Attach document key context.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a storage error from an I/O error.
    ///
    /// Callers that treat a missing document as `Ok(None)` should check for
    /// [`std::io::ErrorKind::NotFound`] before converting.
    #[must_use]
    pub fn io(err: std::io::Error, key: Option<&str>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(k) = key {
            error = error.with_key(k);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (key: foo.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage abstraction for opening document sources.
///
/// Provides a unified interface for reading Markdown sources regardless of
/// backend. The three outcomes of [`open_read`](Self::open_read) map directly
/// onto HTTP responses:
///
/// - `Ok(Some(reader))` - the document exists and can be streamed
/// - `Ok(None)` - the document does not exist (404)
/// - `Err(_)` - the backend failed (500)
pub trait Storage: Send + Sync {
    /// Open a readable stream for the document stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - Document key (e.g., "guide.md", "domain/billing.md")
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be reached or the key
    /// cannot be opened for a reason other than "does not exist".
    fn open_read(&self, key: &str) -> Result<Option<DocumentReader>, StorageError>;

    /// Read the full document stored under `key`.
    ///
    /// Opens the document with [`open_read`](Self::open_read) and drains the
    /// stream. A failure while draining is reported as a storage error, since the
    /// partially read bytes are unusable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if opening or reading the stream fails.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(mut reader) = self.open_read(key)? else {
            return Ok(None);
        };

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::io(e, Some(key)))?;
        Ok(Some(bytes))
    }
}
