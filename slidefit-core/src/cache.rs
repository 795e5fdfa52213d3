//! Result cache — converged font sizes keyed on content/style.
//!
//! One cache is constructed per document/editor and handed to every
//! controller that should share results. Cloning the handle shares the
//! underlying map.
//!
//! Entries are bounded by an LRU policy. The key excludes container
//! width, so a cached size is reused for the same text and style at a
//! different width until something re-validates it.
//!
//! ```text
//! ResultCache (Arc)
//!   ├── Mutex<LruCache<CacheKey, f32>>
//!   └── hits / misses (AtomicU64)
//! ```

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::request::CacheKey;

/// Default number of entries kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Inner {
    entries: Mutex<LruCache<CacheKey, f32>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Shared, LRU-bounded map from [`CacheKey`] to a converged font size.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<Inner>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResultCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(LruCache::new(capacity)),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    // The map is consistent between calls, so poisoning is recoverable.
    fn entries(&self) -> MutexGuard<'_, LruCache<CacheKey, f32>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a converged size, marking the entry as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<f32> {
        let found = self.entries().get(key).copied();
        match found {
            Some(_) => self.inner.hits.fetch_add(1, Ordering::Relaxed),
            None => self.inner.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a converged size. Overwrites any previous value.
    pub fn set(&self, key: CacheKey, font_size: f32) {
        if let Some((evicted, _)) = self.entries().push(key.clone(), font_size) {
            if evicted != key {
                log::trace!("ResultCache: evicted {:?}", evicted.text());
            }
        }
    }

    /// Whether an entry exists, without touching recency or counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries().contains(key)
    }

    pub fn remove(&self, key: &CacheKey) -> Option<f32> {
        self.entries().pop(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries().cap().get()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        write!(
            f,
            "ResultCache({}/{} entries, {} hits, {} misses)",
            stats.entries,
            self.capacity(),
            stats.hits,
            stats.misses,
        )
    }
}
