//! Copy-on-write document store and its transactions.
//!
//! The current mapping lives behind an `Arc` that is swapped wholesale on every
//! commit. A transaction reads from the `Arc` it captured on first access, so it
//! never observes a commit that happens after it started reading. Commits clone
//! the mapping, apply their buffered writes and publish the new `Arc` while
//! holding the writer gate, which serializes them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::document::CachedDocument;
use crate::error::CacheError;

type Entries = HashMap<String, Arc<CachedDocument>>;

/// Buffered `replace` operation.
struct PendingReplace {
    previous: Option<Arc<CachedDocument>>,
    next: Arc<CachedDocument>,
}

/// In-memory store of rendered documents, keyed uniquely by document key.
///
/// Construct one per handler and share it with `Arc`. All access goes through
/// [`begin`](Self::begin).
pub struct DocumentCache {
    /// Published snapshot. The lock is only held to clone or swap the `Arc`.
    current: RwLock<Arc<Entries>>,
    /// Held for the duration of a commit.
    writer: Mutex<()>,
}

impl DocumentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(HashMap::new())),
            writer: Mutex::new(()),
        }
    }

    /// Open a transaction.
    ///
    /// Opening never blocks; the snapshot is taken on the first read.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            cache: self,
            snapshot: None,
            writes: Vec::new(),
            committed: false,
        }
    }

    /// Number of entries in the latest committed state.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.load()?.len())
    }

    /// Whether the latest committed state holds no entries.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.load()?.is_empty())
    }

    /// Keys in the latest committed state, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self.load()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn load(&self) -> Result<Arc<Entries>, CacheError> {
        Ok(Arc::clone(&*self.current.read()?))
    }

    fn apply(&self, writes: &[PendingReplace]) -> Result<(), CacheError> {
        if writes.is_empty() {
            return Ok(());
        }

        let _gate = self.writer.lock()?;
        let mut entries: Entries = (*self.load()?).clone();
        for write in writes {
            if let Some(previous) = &write.previous {
                // Already superseded by another commit is fine.
                entries.remove(previous.key());
            }
            entries.insert(write.next.key().to_owned(), Arc::clone(&write.next));
        }
        *self.current.write()? = Arc::new(entries);
        Ok(())
    }
}

/// Fault injection for tests of code built on the cache.
#[cfg(any(test, feature = "mock"))]
impl DocumentCache {
    /// Poison the published state. Reads and commits fail afterwards.
    pub fn poison_state(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.current.write();
            panic!("cache state poisoned");
        }));
    }

    /// Poison the writer gate. Reads keep working, commits with writes fail.
    pub fn poison_writer(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.writer.lock();
            panic!("cache writer poisoned");
        }));
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DocumentCache");
        match self.load() {
            Ok(entries) => s.field("entries", &entries.len()),
            Err(_) => s.field("entries", &"<poisoned>"),
        };
        s.finish()
    }
}

/// A unit of consistency over a [`DocumentCache`].
///
/// Reads within one transaction see a single snapshot plus the transaction's own
/// buffered writes. Writes become visible to transactions that start reading
/// after [`commit`](Self::commit) returns.
///
/// Dropping a transaction without calling `commit` commits it, so every exit
/// path releases the transaction exactly once. Errors from that implicit
/// commit are logged.
pub struct Transaction<'c> {
    cache: &'c DocumentCache,
    snapshot: Option<Arc<Entries>>,
    writes: Vec<PendingReplace>,
    committed: bool,
}

impl Transaction<'_> {
    /// Look up the entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the snapshot cannot be taken.
    pub fn get(&mut self, key: &str) -> Result<Option<Arc<CachedDocument>>, CacheError> {
        if let Some(write) = self.writes.iter().rev().find(|w| w.next.key() == key) {
            return Ok(Some(Arc::clone(&write.next)));
        }

        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => self.cache.load()?,
        };
        let entry = snapshot.get(key).cloned();
        self.snapshot = Some(snapshot);
        Ok(entry)
    }

    /// Replace `previous` with `next`.
    ///
    /// `previous` is whatever [`get`](Self::get) returned for the key. If another
    /// transaction already replaced it, the removal is a no-op and `next` still
    /// becomes the visible entry (last commit wins).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyMismatch`] if `previous` belongs to another key.
    pub fn replace(
        &mut self,
        previous: Option<Arc<CachedDocument>>,
        next: CachedDocument,
    ) -> Result<(), CacheError> {
        if let Some(previous) = &previous
            && previous.key() != next.key()
        {
            return Err(CacheError::KeyMismatch {
                previous: previous.key().to_owned(),
                next: next.key().to_owned(),
            });
        }

        self.writes.push(PendingReplace {
            previous,
            next: Arc::new(next),
        });
        Ok(())
    }

    /// Number of buffered writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Apply buffered writes atomically and end the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Poisoned`] if the store cannot be updated. The
    /// buffered writes are discarded in that case.
    pub fn commit(mut self) -> Result<(), CacheError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), CacheError> {
        if self.committed {
            return Ok(());
        }
        self.committed = true;
        let writes = std::mem::take(&mut self.writes);
        self.cache.apply(&writes)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            tracing::error!(error = %err, "Failed to commit cache transaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    fn put(cache: &DocumentCache, key: &str, body: &'static str) {
        let mut tx = cache.begin();
        let previous = tx.get(key).unwrap();
        tx.replace(previous, CachedDocument::new(key, body)).unwrap();
        tx.commit().unwrap();
    }

    fn body_of(cache: &DocumentCache, key: &str) -> Option<Vec<u8>> {
        let mut tx = cache.begin();
        tx.get(key).unwrap().map(|doc| doc.body().to_vec())
    }

    #[test]
    fn test_get_missing() {
        let cache = DocumentCache::new();
        let mut tx = cache.begin();
        assert!(tx.get("guide.md").unwrap().is_none());
    }

    #[test]
    fn test_replace_absent_inserts() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");

        assert_eq!(body_of(&cache, "guide.md"), Some(b"v1".to_vec()));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_replace_existing_supersedes() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");
        put(&cache, "guide.md", "v2");

        assert_eq!(body_of(&cache, "guide.md"), Some(b"v2".to_vec()));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_writes_invisible_until_commit() {
        let cache = DocumentCache::new();

        let mut writer = cache.begin();
        writer
            .replace(None, CachedDocument::new("guide.md", "v1"))
            .unwrap();

        assert!(body_of(&cache, "guide.md").is_none());
        writer.commit().unwrap();
        assert_eq!(body_of(&cache, "guide.md"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_reads_own_writes() {
        let cache = DocumentCache::new();
        let mut tx = cache.begin();
        tx.replace(None, CachedDocument::new("guide.md", "mine"))
            .unwrap();

        let doc = tx.get("guide.md").unwrap().unwrap();
        assert_eq!(doc.body().as_ref(), b"mine");
    }

    #[test]
    fn test_snapshot_isolation() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");

        let mut reader = cache.begin();
        let before = reader.get("guide.md").unwrap().unwrap();

        put(&cache, "guide.md", "v2");

        let again = reader.get("guide.md").unwrap().unwrap();
        assert!(Arc::ptr_eq(&before, &again));
        assert_eq!(again.body().as_ref(), b"v1");
        drop(reader);

        assert_eq!(body_of(&cache, "guide.md"), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_replace_tolerates_already_removed_previous() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");

        let mut slow = cache.begin();
        let stale = slow.get("guide.md").unwrap();

        // Another transaction supersedes the entry first.
        put(&cache, "guide.md", "v2");

        slow.replace(stale, CachedDocument::new("guide.md", "v3"))
            .unwrap();
        slow.commit().unwrap();

        // Last commit wins, still exactly one entry.
        assert_eq!(body_of(&cache, "guide.md"), Some(b"v3".to_vec()));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_replace_key_mismatch() {
        let cache = DocumentCache::new();
        put(&cache, "a.md", "a");

        let mut tx = cache.begin();
        let previous = tx.get("a.md").unwrap();
        let err = tx
            .replace(previous, CachedDocument::new("b.md", "b"))
            .unwrap_err();

        assert!(matches!(err, CacheError::KeyMismatch { .. }));
        assert_eq!(tx.pending_writes(), 0);
    }

    #[test]
    fn test_drop_commits() {
        let cache = DocumentCache::new();
        {
            let mut tx = cache.begin();
            tx.replace(None, CachedDocument::new("guide.md", "dropped"))
                .unwrap();
        }

        assert_eq!(body_of(&cache, "guide.md"), Some(b"dropped".to_vec()));
    }

    #[test]
    fn test_read_only_commit_is_noop() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");

        let mut tx = cache.begin();
        let _ = tx.get("guide.md").unwrap();
        tx.commit().unwrap();

        assert_eq!(cache.keys().unwrap(), vec!["guide.md".to_owned()]);
    }

    #[test]
    fn test_independent_keys() {
        let cache = DocumentCache::new();
        put(&cache, "a.md", "a");
        put(&cache, "b.md", "b");

        assert_eq!(
            cache.keys().unwrap(),
            vec!["a.md".to_owned(), "b.md".to_owned()]
        );
        assert!(!cache.is_empty().unwrap());
    }

    #[test]
    fn test_concurrent_replace_same_key_leaves_one_entry() {
        let cache = Arc::new(DocumentCache::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let mut tx = cache.begin();
                    let previous = tx.get("guide.md").unwrap();
                    tx.replace(previous, CachedDocument::new("guide.md", format!("v{i}")))
                        .unwrap();
                    tx.commit().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.keys().unwrap(), vec!["guide.md".to_owned()]);
        let body = body_of(&cache, "guide.md").unwrap();
        assert!(body.starts_with(b"v"));
    }

    #[test]
    fn test_poisoned_state_reports_error() {
        let cache = Arc::new(DocumentCache::new());

        let poisoner = Arc::clone(&cache);
        let _ = thread::spawn(move || {
            let _guard = poisoner.current.write().unwrap();
            panic!("poison the cache");
        })
        .join();

        let mut tx = cache.begin();
        assert!(matches!(tx.get("guide.md"), Err(CacheError::Poisoned)));
        assert!(matches!(cache.len(), Err(CacheError::Poisoned)));
    }

    #[test]
    fn test_poisoned_writer_keeps_reads() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");
        cache.poison_writer();

        let mut tx = cache.begin();
        let previous = tx.get("guide.md").unwrap();
        tx.replace(previous, CachedDocument::new("guide.md", "v2"))
            .unwrap();
        assert!(matches!(tx.commit(), Err(CacheError::Poisoned)));

        assert_eq!(body_of(&cache, "guide.md"), Some(b"v1".to_vec()));
    }

    #[test]
    fn test_poison_state() {
        let cache = DocumentCache::new();
        cache.poison_state();
        assert!(matches!(cache.begin().get("guide.md"), Err(CacheError::Poisoned)));
        assert_eq!(format!("{cache:?}"), "DocumentCache { entries: \"<poisoned>\" }");
    }

    #[test]
    fn test_debug_reports_size() {
        let cache = DocumentCache::new();
        put(&cache, "guide.md", "v1");
        assert_eq!(format!("{cache:?}"), "DocumentCache { entries: 1 }");
    }
}
