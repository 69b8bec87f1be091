//! Storage abstraction for mdserve document sources.
//!
//! This crate provides a [`Storage`] trait for abstracting how Markdown sources are
//! opened by key. The HTTP layer only needs one capability from a backend: open a
//! readable stream for a document key, or report that the key does not exist.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `open_read()` and a provided `read()` helper
//! - [`FsStorage`] implementation reading from a source directory
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use mdserve_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("docs"));
//! match storage.read("guide.md")? {
//!     Some(bytes) => println!("{} bytes", bytes.len()),
//!     None => println!("not found"),
//! }
//! ```

mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{DocumentReader, Storage, StorageError, StorageErrorKind};
