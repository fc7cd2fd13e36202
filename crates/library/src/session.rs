//! One user's view of one project.
//!
//! A [`Session`] owns everything that lives longer than a single call: the
//! reference scanner (and with it the content cache and the chosen listing
//! strategy), the selected folder and the latest scan result. Scans and
//! file operations take the session's single permit. A call that finds it
//! taken fails straight away with [`ErrorKind::Busy`] rather than queueing.
//!
//! Only [`move_unused`](Session::move_unused) needs a scan result, because
//! it acts on the verdicts. [`restore`](Session::restore),
//! [`delete`](Session::delete) and [`replace`](Session::replace) act on
//! whatever is on disk for the selected folder, so a selected folder is
//! enough: a quarantine left by an earlier session can be restored without
//! scanning first.

use crate::analyze::{DEFAULT_BATCH_SIZE, analyze};
use crate::error::{ErrorKind, Result};
use crate::models::{ScanSummary, UsageVerdict};
use crate::quarantine::{Delete, Move, QuarantineManager, Restore};
use crate::replace::{ReplaceReport, UuidMap, replace_in_tree};
use crate::scan::{DEFAULT_YIELD_EVERY, ReferenceScanner, Skipped, Strategy};
use exn::ResultExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tracing::instrument;
use unref_assetdb::DatabaseHandle;
use unref_cache::{CacheLimits, CacheStats};
use unref_catalog::Excluded;

/// Tunables for a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Where references are searched for. Defaults to the selected folder.
    pub search_root: Option<PathBuf>,
    /// Assets checked concurrently per analysis batch.
    pub batch_size: usize,
    /// Files scanned between cooperative yields.
    pub yield_every: usize,
    pub cache: CacheLimits,
    /// Appended to the scanned folder's name to name its quarantine.
    pub quarantine_suffix: String,
}
impl Default for Options {
    fn default() -> Self {
        Self {
            search_root: None,
            batch_size: DEFAULT_BATCH_SIZE,
            yield_every: DEFAULT_YIELD_EVERY,
            cache: CacheLimits::default(),
            quarantine_suffix: crate::quarantine::DEFAULT_SUFFIX.to_owned(),
        }
    }
}

/// Everything one scan found out.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// The folder whose assets were checked.
    pub folder: PathBuf,
    /// The folder whose files were searched for references.
    pub search_root: PathBuf,
    /// One verdict per catalogued asset, in catalog order.
    pub verdicts: Vec<UsageVerdict>,
    #[serde(skip)]
    pub excluded: Vec<Excluded>,
    pub skipped: Vec<Skipped>,
    pub summary: ScanSummary,
}
impl ScanResult {
    pub fn unused(&self) -> impl Iterator<Item = &UsageVerdict> {
        self.verdicts.iter().filter(|v| !v.is_used())
    }
}

#[derive(Debug, Default)]
struct State {
    folder: Option<PathBuf>,
    result: Option<Arc<ScanResult>>,
}

pub struct Session {
    options: Options,
    database: DatabaseHandle,
    scanner: ReferenceScanner,
    quarantine: QuarantineManager,
    permit: Semaphore,
    state: Mutex<State>,
}

impl Session {
    pub fn new(database: DatabaseHandle, options: Options) -> Self {
        let scanner = ReferenceScanner::new(Arc::clone(&database), options.cache).with_yield_every(options.yield_every);
        let quarantine = QuarantineManager::new(Arc::clone(&database)).with_suffix(options.quarantine_suffix.clone());
        Self { options, database, scanner, quarantine, permit: Semaphore::new(1), state: Mutex::new(State::default()) }
    }

    fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permit.try_acquire().or_raise(|| {
            tracing::warn!("Refusing to start while another operation is running");
            ErrorKind::Busy
        })
    }

    async fn selected_folder(&self) -> Result<PathBuf> {
        let folder = self.state.lock().await.folder.clone();
        folder.ok_or_else(|| {
            tracing::warn!("No folder selected");
            exn::Exn::from(ErrorKind::NoFolderSelected)
        })
    }

    /// Choose the folder the next operations act on. Selecting a different
    /// folder discards the current scan result.
    pub async fn select(&self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        let mut state = self.state.lock().await;
        if state.folder.as_ref() != Some(&folder) {
            state.result = None;
        }
        state.folder = Some(folder);
    }

    /// Resolve an asset identifier to its path through the asset database.
    ///
    /// # Errors
    /// - [`UnknownAsset`](ErrorKind::UnknownAsset) if nothing carries `id`,
    /// - [`Database`](ErrorKind::Database) if the lookup itself failed.
    #[instrument(skip(self), fields(database = self.database.name()))]
    pub async fn resolve_id(&self, id: &str) -> Result<PathBuf> {
        let info = self.database.query_asset_info(id).await.or_raise(|| ErrorKind::Database)?;
        match info {
            Some(info) => Ok(info.file),
            None => {
                tracing::warn!("Identifier not found");
                exn::bail!(ErrorKind::UnknownAsset(id.to_owned()))
            },
        }
    }

    /// [`select`](Self::select) the folder (or file) carrying `id`.
    pub async fn select_id(&self, id: &str) -> Result<PathBuf> {
        let folder = self.resolve_id(id).await?;
        self.select(folder.clone()).await;
        Ok(folder)
    }

    pub async fn folder(&self) -> Option<PathBuf> {
        self.state.lock().await.folder.clone()
    }

    /// Catalog the selected folder and decide which of its assets are used.
    ///
    /// References are searched for under `search_root`, falling back to the
    /// configured search root and then to the selected folder itself. The
    /// result replaces the previous one. Nothing read by an earlier scan is
    /// reused; only the listing strategy carries over.
    ///
    /// # Errors
    /// - [`Busy`](ErrorKind::Busy) / [`NoFolderSelected`](ErrorKind::NoFolderSelected)
    /// - [`ScanRoot`](ErrorKind::ScanRoot) if the folder isn't a readable directory.
    #[instrument(skip_all)]
    pub async fn scan(
        &self,
        search_root: Option<&Path>,
        on_progress: impl FnMut(usize, usize, &str),
    ) -> Result<Arc<ScanResult>> {
        let _permit = self.acquire()?;
        let folder = self.selected_folder().await?;
        match fs::metadata(&folder).await {
            Ok(metadata) if metadata.is_dir() => {},
            Ok(_) => exn::bail!(ErrorKind::ScanRoot(folder)),
            Err(error) => return Err(error).or_raise(|| ErrorKind::ScanRoot(folder.clone())),
        }
        let search_root = search_root
            .map(Path::to_path_buf)
            .or_else(|| self.options.search_root.clone())
            .unwrap_or_else(|| folder.clone());
        tracing::info!(folder = %folder.display(), search_root = %search_root.display(), "Scanning");
        // Files may have changed since the last scan, by our own hand or not.
        self.scanner.invalidate().await;

        let started = Instant::now();
        let catalog = unref_catalog::build(&folder).await;
        let verdicts = analyze(&self.scanner, &catalog.assets, &search_root, self.options.batch_size, on_progress).await;
        let skipped = self.scanner.skipped().await;
        let mut summary = ScanSummary::from_verdicts(&verdicts, self.scanner.strategy(), started.elapsed());
        summary.excluded = catalog.excluded.len();
        summary.skipped = skipped.len();
        tracing::info!(total = summary.total, used = summary.used, unused = summary.unused, "Scan complete");

        let result = Arc::new(ScanResult { folder, search_root, verdicts, excluded: catalog.excluded, skipped, summary });
        self.state.lock().await.result = Some(Arc::clone(&result));
        Ok(result)
    }

    /// The latest scan result, if any.
    pub async fn scan_result(&self) -> Option<Arc<ScanResult>> {
        self.state.lock().await.result.clone()
    }

    /// Forget the scan result, the cached listing and file contents, and try
    /// the indexed strategy again.
    pub async fn reset(&self) -> Result<()> {
        let _permit = self.acquire()?;
        self.scanner.reset().await;
        self.state.lock().await.result = None;
        Ok(())
    }

    /// Move the unused assets of the latest scan into quarantine, replacing
    /// any existing quarantine.
    pub async fn move_unused(&self) -> Result<Move> {
        let _permit = self.acquire()?;
        let Some(result) = self.scan_result().await else {
            tracing::warn!("Nothing to move without a scan result");
            exn::bail!(ErrorKind::NoScanResult);
        };
        self.quarantine.move_unused(&result.verdicts, &result.folder).await.or_raise(|| ErrorKind::Quarantine)
    }

    /// Put the selected folder's quarantined assets back.
    pub async fn restore(&self) -> Result<Restore> {
        let _permit = self.acquire()?;
        let folder = self.selected_folder().await?;
        self.quarantine.restore(&folder).await.or_raise(|| ErrorKind::Quarantine)
    }

    /// Permanently delete the selected folder's quarantine once `confirm`
    /// agrees.
    pub async fn delete(&self, confirm: impl FnOnce(&Path) -> bool) -> Result<Delete> {
        let _permit = self.acquire()?;
        let folder = self.selected_folder().await?;
        self.quarantine.delete(&folder, confirm).await.or_raise(|| ErrorKind::Quarantine)
    }

    /// The selected folder's quarantine location.
    pub async fn quarantine_dir(&self) -> Result<PathBuf> {
        let folder = self.selected_folder().await?;
        self.quarantine.quarantine_dir(&folder).or_raise(|| ErrorKind::Quarantine)
    }

    /// Rewrite identifiers in the selected folder according to `map`.
    pub async fn replace(&self, map: &UuidMap) -> Result<ReplaceReport> {
        let _permit = self.acquire()?;
        let folder = self.selected_folder().await?;
        let report = replace_in_tree(map, &folder).await;
        if report.modified > 0
            && let Err(error) = self.database.refresh().await
        {
            tracing::warn!(database = self.database.name(), error = ?error, "Asset database refresh failed");
        }
        Ok(report)
    }

    pub fn strategy(&self) -> Strategy {
        self.scanner.strategy()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.scanner.cache_stats().await
    }

    /// Drop cached file contents only.
    pub async fn clear_cache(&self) {
        self.scanner.clear_cache().await;
    }
}
