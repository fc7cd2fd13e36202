//! Textual reference search.
//!
//! An asset is referenced by a file when the file's raw text contains the
//! asset's identifier. Only [searchable](unref_catalog::is_searchable) files
//! are ever read.
//!
//! The scanner first asks the asset database for every asset under the
//! search root in one request ([`Strategy::Indexed`]). If that request fails
//! or comes back empty, the scanner stops asking and walks the disk itself
//! ([`Strategy::FileSearch`]) until it is [reset](ReferenceScanner::reset).
//! Either way the filtered listing is kept for the current search root, and
//! file contents are served through a bounded [`ContentCache`], until the
//! scanner is [invalidated](ReferenceScanner::invalidate).

use memchr::memmem;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::instrument;
use unref_assetdb::DatabaseHandle;
use unref_asyncutils::YieldEvery;
use unref_cache::{CacheLimits, CacheStats, ContentCache};
use unref_catalog::is_searchable;
use unref_storage::walk_filtered;

/// Default number of files scanned between cooperative yields.
pub const DEFAULT_YIELD_EVERY: usize = 100;

/// Where the list of searchable files comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// One bulk listing request against the asset database.
    Indexed,
    /// A direct walk of the search root on disk.
    FileSearch,
}

/// A searchable file that couldn't be read, and so matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
struct Listing {
    root: PathBuf,
    files: Arc<[PathBuf]>,
}

/// Finds the files that reference a given identifier.
///
/// All methods take `&self`; the listing, cache and skip records sit behind
/// their own locks so lookups from one analysis batch can run concurrently.
pub struct ReferenceScanner {
    database: DatabaseHandle,
    downgraded: AtomicBool,
    listing: Mutex<Option<Listing>>,
    cache: Mutex<ContentCache>,
    skipped: Mutex<BTreeMap<PathBuf, String>>,
    yield_every: usize,
}

impl ReferenceScanner {
    pub fn new(database: DatabaseHandle, limits: CacheLimits) -> Self {
        Self {
            database,
            downgraded: AtomicBool::new(false),
            listing: Mutex::new(None),
            cache: Mutex::new(ContentCache::new(limits)),
            skipped: Mutex::new(BTreeMap::new()),
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }

    /// Change how many files are scanned between cooperative yields. Zero
    /// disables yielding.
    pub fn with_yield_every(mut self, every: usize) -> Self {
        self.yield_every = every;
        self
    }

    /// The strategy the next listing will be built with.
    pub fn strategy(&self) -> Strategy {
        match self.downgraded.load(Ordering::SeqCst) {
            true => Strategy::FileSearch,
            false => Strategy::Indexed,
        }
    }

    /// Every searchable file under `search_root` whose content contains `id`,
    /// in listing order.
    ///
    /// Never fails: unreadable files are recorded (see
    /// [`skipped`](Self::skipped)) and treated as non-matching, and a missing
    /// search root simply has nothing in it.
    pub async fn find_references(&self, id: &str, search_root: &Path) -> Vec<PathBuf> {
        // An empty needle matches every file.
        if id.is_empty() {
            return Vec::new();
        }
        let files = self.listing(search_root).await;
        let finder = memmem::Finder::new(id.as_bytes());
        let mut yielder = YieldEvery::new(self.yield_every);
        let mut found = Vec::new();
        for file in files.iter() {
            if let Some(content) = self.content(file).await
                && finder.find(content.as_bytes()).is_some()
            {
                found.push(file.clone());
            }
            yielder.tick().await;
        }
        found
    }

    /// Searchable files under `search_root`, built once per root.
    async fn listing(&self, search_root: &Path) -> Arc<[PathBuf]> {
        // Held across the build so concurrent lookups share one listing.
        let mut guard = self.listing.lock().await;
        if let Some(listing) = guard.as_ref()
            && listing.root == search_root
        {
            return Arc::clone(&listing.files);
        }
        let files: Arc<[PathBuf]> = match self.strategy() {
            Strategy::Indexed => match self.indexed_listing(search_root).await {
                Some(files) => files.into(),
                None => {
                    self.downgraded.store(true, Ordering::SeqCst);
                    file_search_listing(search_root).await.into()
                },
            },
            Strategy::FileSearch => file_search_listing(search_root).await.into(),
        };
        tracing::debug!(root = %search_root.display(), files = files.len(), strategy = ?self.strategy(), "Built searchable listing");
        *guard = Some(Listing { root: search_root.to_path_buf(), files: Arc::clone(&files) });
        files
    }

    #[instrument(skip_all, fields(database = self.database.name(), root = %search_root.display()))]
    async fn indexed_listing(&self, search_root: &Path) -> Option<Vec<PathBuf>> {
        match self.database.query_assets(search_root).await {
            Ok(assets) if assets.is_empty() => {
                tracing::info!("Asset database listing is empty; switching to file search");
                None
            },
            Ok(assets) => Some(assets.into_iter().map(|a| a.file).filter(|f| is_searchable(f)).collect()),
            Err(error) => {
                tracing::warn!(error = ?error, "Asset database listing failed; switching to file search");
                None
            },
        }
    }

    async fn content(&self, path: &Path) -> Option<Arc<str>> {
        if let Some(content) = self.cache.lock().await.get(path) {
            return Some(content);
        }
        match fs::read(path).await {
            Ok(bytes) => {
                let content: Arc<str> = String::from_utf8_lossy(&bytes).into();
                self.cache.lock().await.put(path, Arc::clone(&content));
                Some(content)
            },
            Err(error) => {
                tracing::debug!(path = %path.display(), error = %error, "Skipping unreadable file");
                self.skipped.lock().await.insert(path.to_path_buf(), error.to_string());
                None
            },
        }
    }

    /// Files that couldn't be read since the last invalidation, one record
    /// per path.
    pub async fn skipped(&self) -> Vec<Skipped> {
        let skipped = self.skipped.lock().await;
        skipped.iter().map(|(path, reason)| Skipped { path: path.clone(), reason: reason.clone() }).collect()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    /// Drop cached file contents. The listing and strategy are kept.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Forget what the previous scan saw: the listing, cached content and
    /// skip records. The strategy is kept, so a downgrade stays in force.
    pub async fn invalidate(&self) {
        self.listing.lock().await.take();
        self.cache.lock().await.clear();
        self.skipped.lock().await.clear();
    }

    /// Back to a fresh scanner: [`invalidate`](Self::invalidate), and the
    /// indexed strategy is tried again.
    pub async fn reset(&self) {
        self.invalidate().await;
        self.downgraded.store(false, Ordering::SeqCst);
    }
}

async fn file_search_listing(search_root: &Path) -> Vec<PathBuf> {
    walk_filtered(search_root, is_searchable).await
}
