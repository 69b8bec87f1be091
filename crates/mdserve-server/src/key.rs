//! Request path to document key mapping.

/// Suffix appended to every document key.
const MARKDOWN_SUFFIX: &str = ".md";

/// Document name used for directory paths under [`IndexConvention::IndexFile`].
const INDEX_NAME: &str = "index";

/// How paths that name a directory map to a document key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexConvention {
    /// Append `.md` verbatim. The base path itself maps to the key `.md`.
    Literal,
    /// Empty remainders and paths ending in `/` map to `index.md`.
    #[default]
    IndexFile,
}

/// Derives document keys from request paths.
///
/// The request path is trusted as already validated by the HTTP layer: no
/// `..` normalization, separator collapsing or percent-decoding happens here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyResolver {
    base_path: String,
    convention: IndexConvention,
}

impl KeyResolver {
    /// Create a resolver stripping `base_path` from request paths.
    pub fn new(base_path: impl Into<String>, convention: IndexConvention) -> Self {
        Self {
            base_path: base_path.into(),
            convention,
        }
    }

    /// Configured base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Map a request path to a document key.
    ///
    /// ```
    /// use mdserve_server::{IndexConvention, KeyResolver};
    ///
    /// let resolver = KeyResolver::new("/docs", IndexConvention::IndexFile);
    /// assert_eq!(resolver.resolve("/docs/example"), "example.md");
    /// assert_eq!(resolver.resolve("/docs"), "index.md");
    /// ```
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        let remainder = path.strip_prefix(&self.base_path).unwrap_or(path);
        let remainder = remainder.strip_prefix('/').unwrap_or(remainder);

        let mut key = String::with_capacity(remainder.len() + INDEX_NAME.len() + 3);
        key.push_str(remainder);
        if self.convention == IndexConvention::IndexFile
            && (remainder.is_empty() || remainder.ends_with('/'))
        {
            key.push_str(INDEX_NAME);
        }
        key.push_str(MARKDOWN_SUFFIX);
        key
    }
}
