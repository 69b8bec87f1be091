//! Cache error types.

/// Error returned by cache transactions.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A thread panicked while holding a cache lock.
    #[error("cache state poisoned by a panicked writer")]
    Poisoned,
    /// `replace` was called with entries for different keys.
    #[error("cannot replace entry for {previous} with entry for {next}")]
    KeyMismatch {
        /// Key of the entry being replaced.
        previous: String,
        /// Key of the replacement entry.
        next: String,
    },
}

impl<T> From<std::sync::PoisonError<T>> for CacheError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poisoned
    }
}
