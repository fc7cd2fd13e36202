//! In-memory content cache for reference scanning.
//!
//! A reference scan reads every searchable file once per asset it checks,
//! which for a catalog of a few thousand assets means re-reading the same
//! scenes and prefabs thousands of times. [`ContentCache`] keeps their text
//! around, bounded both by entry count and by an *estimated* memory
//! footprint, evicting the least-recently-used entries first.
//!
//! The cache is not the source of truth. Dropping it only costs re-reads.
//!
//! # Estimates
//! Memory is estimated as two bytes per byte of content. The figure is
//! deliberately rough: it's a ceiling knob, not an allocator report.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default maximum number of cached files.
pub const DEFAULT_MAX_ENTRIES: usize = 2000;
/// Default ceiling for the estimated memory footprint (200 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 200 * 1024 * 1024;

/// Estimated in-memory size of a piece of cached content.
pub fn estimate(content: &str) -> u64 {
    // Infallible on every supported platform: usize fits in u64.
    u64::try_from(content.len()).unwrap_or(u64::MAX).saturating_mul(2)
}

/// Upper bounds for a [`ContentCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheLimits {
    /// Maximum number of entries held at once.
    pub max_entries: usize,
    /// Maximum total [estimated](estimate) size of all entries.
    pub max_bytes: u64,
}
impl Default for CacheLimits {
    fn default() -> Self {
        Self { max_entries: DEFAULT_MAX_ENTRIES, max_bytes: DEFAULT_MAX_BYTES }
    }
}

/// Point-in-time counters for a [`ContentCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub estimated_bytes: u64,
    pub max_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct Entry {
    content: Arc<str>,
    tick: u64,
    estimate: u64,
}

/// Bounded least-recently-used cache of file contents, keyed by path.
///
/// Both [`get`](Self::get) and [`put`](Self::put) count as an access.
/// Eviction runs before insertion, until the cache holds fewer than
/// `max_entries` entries *and* the incoming content fits under `max_bytes`.
///
/// ```
/// use unref_cache::{CacheLimits, ContentCache};
///
/// let mut cache = ContentCache::new(CacheLimits { max_entries: 2, ..Default::default() });
/// cache.put("a.prefab", "uuid-a");
/// cache.put("b.prefab", "uuid-b");
/// cache.get("a.prefab".as_ref());
/// cache.put("c.prefab", "uuid-c");
/// // "b" was the least recently used.
/// assert!(cache.contains("a.prefab".as_ref()));
/// assert!(!cache.contains("b.prefab".as_ref()));
/// ```
#[derive(Debug, Default)]
pub struct ContentCache {
    limits: CacheLimits,
    entries: HashMap<PathBuf, Entry>,
    /// Access tick → key. The first entry is always the least recently used.
    recency: BTreeMap<u64, PathBuf>,
    next_tick: u64,
    estimated_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ContentCache {
    pub fn new(limits: CacheLimits) -> Self {
        Self { limits, ..Default::default() }
    }

    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    /// Look up cached content, marking the entry as most recently used.
    pub fn get(&mut self, path: &Path) -> Option<Arc<str>> {
        let tick = self.tick();
        let Some(entry) = self.entries.get_mut(path) else {
            self.misses += 1;
            return None;
        };
        self.recency.remove(&entry.tick);
        entry.tick = tick;
        self.recency.insert(tick, path.to_path_buf());
        self.hits += 1;
        Some(Arc::clone(&entry.content))
    }

    /// Returns `true` if `path` is cached, without touching its recency.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert (or replace) content for `path`.
    ///
    /// Content whose estimate alone exceeds `max_bytes` is never stored, so
    /// the memory ceiling holds after every call. Returns whether the content
    /// was stored.
    pub fn put(&mut self, path: impl Into<PathBuf>, content: impl Into<Arc<str>>) -> bool {
        let path = path.into();
        let content = content.into();
        let incoming = estimate(&content);

        if let Some(previous) = self.entries.remove(&path) {
            self.recency.remove(&previous.tick);
            self.estimated_bytes -= previous.estimate;
        }
        if self.limits.max_entries == 0 || incoming > self.limits.max_bytes {
            tracing::trace!(path = %path.display(), estimate = incoming, "Content too large to cache");
            return false;
        }
        while self.entries.len() >= self.limits.max_entries
            || self.estimated_bytes.saturating_add(incoming) > self.limits.max_bytes
        {
            if !self.evict_oldest() {
                break;
            }
        }

        let tick = self.tick();
        self.recency.insert(tick, path.clone());
        self.entries.insert(path, Entry { content, tick, estimate: incoming });
        self.estimated_bytes += incoming;
        true
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, path)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&path) {
            self.estimated_bytes -= entry.estimate;
            self.evictions += 1;
        }
        true
    }

    /// Drop every entry. Counters other than the contents are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.estimated_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn estimated_bytes(&self) -> u64 {
        self.estimated_bytes
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.limits.max_entries,
            estimated_bytes: self.estimated_bytes,
            max_bytes: self.limits.max_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}
