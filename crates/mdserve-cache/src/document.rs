//! Cached document entries.

use std::time::{Duration, Instant};

use bytes::Bytes;

/// One rendered page held by the cache.
///
/// Entries are immutable. A newer render for the same key produces a new
/// `CachedDocument` that supersedes this one through
/// [`Transaction::replace`](crate::Transaction::replace).
#[derive(Clone, Debug)]
pub struct CachedDocument {
    key: String,
    body: Bytes,
    created_at: Instant,
}

impl CachedDocument {
    /// Create an entry for `key` stamped with the current instant.
    #[must_use]
    pub fn new(key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::with_created_at(key, body, Instant::now())
    }

    /// Create an entry with an explicit render instant.
    #[must_use]
    pub fn with_created_at(
        key: impl Into<String>,
        body: impl Into<Bytes>,
        created_at: Instant,
    ) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            created_at,
        }
    }

    /// Document key this entry was rendered for.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Final response body.
    ///
    /// Cloning the returned [`Bytes`] is cheap and shares the allocation.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Instant the render completed.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether the entry is still usable at `now` for a freshness window of `ttl`.
    ///
    /// An entry is fresh iff `now - created_at < ttl`, so a zero `ttl` never
    /// reuses an entry.
    #[must_use]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let doc = CachedDocument::new("guide.md", "<p>hi</p>");
        assert_eq!(doc.key(), "guide.md");
        assert_eq!(doc.body().as_ref(), b"<p>hi</p>");
    }

    #[test]
    fn test_fresh_within_window() {
        let created = Instant::now();
        let doc = CachedDocument::with_created_at("a.md", "x", created);

        assert!(doc.is_fresh(created + Duration::from_secs(59), Duration::from_secs(60)));
    }

    #[test]
    fn test_stale_at_window_boundary() {
        let created = Instant::now();
        let doc = CachedDocument::with_created_at("a.md", "x", created);

        assert!(!doc.is_fresh(created + Duration::from_secs(60), Duration::from_secs(60)));
        assert!(!doc.is_fresh(created + Duration::from_secs(61), Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_ttl_never_fresh() {
        let created = Instant::now();
        let doc = CachedDocument::with_created_at("a.md", "x", created);

        assert!(!doc.is_fresh(created, Duration::ZERO));
    }

    #[test]
    fn test_clock_before_creation_counts_as_fresh() {
        let now = Instant::now();
        let doc = CachedDocument::with_created_at("a.md", "x", now + Duration::from_secs(5));

        assert!(doc.is_fresh(now, Duration::from_secs(1)));
    }
}
