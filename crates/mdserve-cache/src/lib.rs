//! Transactional in-memory cache of rendered documents.
//!
//! [`DocumentCache`] maps document keys to the most recent [`CachedDocument`]
//! rendered for them. Every access goes through a [`Transaction`]:
//!
//! - Reads see a consistent snapshot taken on the first `get`
//! - Writes are buffered and applied atomically on commit
//! - Commits are serialized; readers never wait for a commit in progress
//!
//! The cache has no notion of freshness. Callers decide whether an entry is
//! still usable with [`CachedDocument::is_fresh`].
//!
//! The `mock` feature adds fault injection (`poison_state`, `poison_writer`)
//! for testing callers against a failing cache.
//!
//! # Example
//!
//! ```
//! use mdserve_cache::{CachedDocument, DocumentCache};
//!
//! let cache = DocumentCache::new();
//!
//! let mut tx = cache.begin();
//! let previous = tx.get("guide.md").unwrap();
//! assert!(previous.is_none());
//! tx.replace(previous, CachedDocument::new("guide.md", "<h1>Guide</h1>")).unwrap();
//! tx.commit().unwrap();
//!
//! let mut tx = cache.begin();
//! assert!(tx.get("guide.md").unwrap().is_some());
//! ```

mod document;
mod error;
mod store;

pub use document::CachedDocument;
pub use error::CacheError;
pub use store::{DocumentCache, Transaction};
