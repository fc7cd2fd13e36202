//! Moving unused assets aside, and back again.
//!
//! Unused assets are moved into a sibling of the scanned folder named
//! `<folder><suffix>` (by default `assets` → `assets_temp_unused`), keeping
//! their position relative to the scanned folder and taking their `.meta`
//! sidecars with them. From there they can be restored or deleted for good.
//!
//! A quarantine folder is either absent or populated:
//!
//! ```text
//! absent ──move_unused──▶ populated ──restore / delete──▶ absent
//!                           │    ▲
//!                           └────┘ move_unused replaces, never merges
//! ```
//!
//! None of this is transactional. Every operation keeps going past a file it
//! can't handle, and reports each such file as a [`Failure`].

pub mod error;

use self::error::{ErrorKind, Result};
use crate::models::UsageVerdict;
use exn::ResultExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;
use unref_assetdb::DatabaseHandle;
use unref_storage::ops::{copy_with_meta, exists, remove_tree, remove_with_meta, rename_with_meta};
use unref_storage::{is_meta, mirror, relative_to, remove_empty_dirs, walk};

/// Appended to the scanned folder's name to name its quarantine.
pub const DEFAULT_SUFFIX: &str = "_temp_unused";

/// A file an operation couldn't handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
}
impl Failure {
    fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self { path: path.into(), reason: reason.to_string() }
    }
}

/// The outcome of [`QuarantineManager::move_unused`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Move {
    /// Every asset is used; the quarantine was left as it was.
    NothingToMove,
    Moved {
        quarantine: PathBuf,
        /// A previous quarantine was deleted to make room.
        replaced_existing: bool,
        /// Paths, relative to the scanned folder, now in quarantine.
        moved: Vec<PathBuf>,
        failures: Vec<Failure>,
        /// Directories left empty in the scanned folder and removed.
        pruned_dirs: usize,
    },
}

/// The outcome of [`QuarantineManager::restore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Restore {
    NothingToRestore,
    Restored {
        /// Paths, relative to the scanned folder, back in place.
        restored: Vec<PathBuf>,
        failures: Vec<Failure>,
    },
}

/// The outcome of [`QuarantineManager::delete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Delete {
    NothingToDelete,
    /// Confirmation was refused; nothing was touched.
    Cancelled,
    Deleted {
        quarantine: PathBuf,
        /// Primary files (sidecars not counted) that were deleted.
        files: usize,
    },
}

/// The quarantine folder for `scan_root`, using [`DEFAULT_SUFFIX`].
pub fn quarantine_dir(scan_root: impl AsRef<Path>) -> Result<PathBuf> {
    quarantine_dir_with(scan_root, DEFAULT_SUFFIX)
}

/// The quarantine folder for `scan_root`: a sibling named after it plus
/// `suffix`.
pub fn quarantine_dir_with(scan_root: impl AsRef<Path>, suffix: &str) -> Result<PathBuf> {
    let scan_root = scan_root.as_ref();
    let Some(name) = scan_root.file_name() else {
        exn::bail!(ErrorKind::InvalidScanRoot(scan_root.to_path_buf()));
    };
    let mut name = name.to_os_string();
    name.push(suffix);
    Ok(scan_root.with_file_name(name))
}

/// Performs quarantine operations and tells the asset database about them.
pub struct QuarantineManager {
    database: DatabaseHandle,
    suffix: String,
}

impl QuarantineManager {
    pub fn new(database: DatabaseHandle) -> Self {
        Self { database, suffix: DEFAULT_SUFFIX.to_owned() }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn quarantine_dir(&self, scan_root: impl AsRef<Path>) -> Result<PathBuf> {
        quarantine_dir_with(scan_root, &self.suffix)
    }

    /// Move every unused asset (and its sidecar) out of `scan_root` into a
    /// fresh quarantine.
    ///
    /// An existing quarantine is deleted first: its contents do not survive.
    /// All copies are made before any original is deleted, and only
    /// originals whose copy succeeded are deleted. Directories left empty
    /// under `scan_root` are removed afterwards.
    ///
    /// # Errors
    /// Fails without moving anything if the quarantine folder can't be
    /// replaced or created.
    #[instrument(skip_all, fields(root = %scan_root.display()))]
    pub async fn move_unused(&self, verdicts: &[UsageVerdict], scan_root: &Path) -> Result<Move> {
        let unused: Vec<&UsageVerdict> = verdicts.iter().filter(|v| !v.is_used()).collect();
        if unused.is_empty() {
            tracing::info!("No unused assets to move");
            return Ok(Move::NothingToMove);
        }
        let quarantine = self.quarantine_dir(scan_root)?;
        let replaced_existing = exists(&quarantine).await;
        if replaced_existing {
            tracing::warn!(quarantine = %quarantine.display(), "Replacing existing quarantine");
        }
        remove_tree(&quarantine).await.or_raise(|| ErrorKind::CreateQuarantine(quarantine.clone()))?;
        fs::create_dir_all(&quarantine).await.or_raise(|| ErrorKind::CreateQuarantine(quarantine.clone()))?;

        let mut failures = Vec::new();
        let mut copied = Vec::with_capacity(unused.len());
        for verdict in unused {
            let target = match mirror(&quarantine, verdict.relative_path()) {
                Ok(target) => target,
                Err(error) => {
                    failures.push(Failure::new(verdict.path(), &*error));
                    continue;
                },
            };
            match copy_with_meta(verdict.path(), &target).await {
                Ok(_) => copied.push(verdict),
                Err(error) => {
                    tracing::debug!(path = %verdict.path().display(), error = ?error, "Copy into quarantine failed");
                    failures.push(Failure::new(verdict.path(), &*error));
                },
            }
        }

        let mut moved = Vec::with_capacity(copied.len());
        for verdict in copied {
            match remove_with_meta(verdict.path()).await {
                Ok(()) => moved.push(verdict.relative_path().to_path_buf()),
                Err(error) => {
                    tracing::debug!(path = %verdict.path().display(), error = ?error, "Removing original failed");
                    failures.push(Failure::new(verdict.path(), &*error));
                },
            }
        }

        let pruned_dirs = remove_empty_dirs(scan_root).await;
        tracing::info!(moved = moved.len(), failed = failures.len(), pruned_dirs, "Moved unused assets to quarantine");
        self.refresh().await;
        Ok(Move::Moved { quarantine, replaced_existing, moved, failures, pruned_dirs })
    }

    /// Move everything in the quarantine back to its place under
    /// `scan_root`, then delete the quarantine, whether or not every file
    /// made it back.
    #[instrument(skip_all, fields(root = %scan_root.display()))]
    pub async fn restore(&self, scan_root: &Path) -> Result<Restore> {
        let quarantine = self.quarantine_dir(scan_root)?;
        if !exists(&quarantine).await {
            tracing::warn!(quarantine = %quarantine.display(), "Nothing to restore");
            return Ok(Restore::NothingToRestore);
        }

        let mut restored = Vec::new();
        let mut failures = Vec::new();
        for file in walk(&quarantine).await.into_iter().filter(|f| !is_meta(f)) {
            let relative = match relative_to(&quarantine, &file) {
                Ok(relative) => relative,
                Err(error) => {
                    failures.push(Failure::new(&file, &*error));
                    continue;
                },
            };
            let result = match mirror(scan_root, &relative) {
                Ok(target) => rename_with_meta(&file, &target).await,
                Err(error) => Err(error),
            };
            match result {
                Ok(_) => restored.push(relative),
                Err(error) => {
                    tracing::debug!(path = %file.display(), error = ?error, "Restore failed");
                    failures.push(Failure::new(&file, &*error));
                },
            }
        }

        if let Err(error) = remove_tree(&quarantine).await {
            tracing::warn!(quarantine = %quarantine.display(), error = ?error, "Could not remove quarantine after restore");
            failures.push(Failure::new(&quarantine, &*error));
        }
        tracing::info!(restored = restored.len(), failed = failures.len(), "Restored quarantined assets");
        self.refresh().await;
        Ok(Restore::Restored { restored, failures })
    }

    /// Permanently delete the quarantine, if `confirm` agrees.
    ///
    /// `confirm` receives the quarantine path and is only asked when there
    /// is something to delete.
    #[instrument(skip_all, fields(root = %scan_root.display()))]
    pub async fn delete(&self, scan_root: &Path, confirm: impl FnOnce(&Path) -> bool) -> Result<Delete> {
        let quarantine = self.quarantine_dir(scan_root)?;
        if !exists(&quarantine).await {
            tracing::warn!(quarantine = %quarantine.display(), "Nothing to delete");
            return Ok(Delete::NothingToDelete);
        }
        if !confirm(&quarantine) {
            tracing::info!("Delete cancelled");
            return Ok(Delete::Cancelled);
        }
        let files = walk(&quarantine).await.iter().filter(|f| !is_meta(f)).count();
        remove_tree(&quarantine).await.or_raise(|| ErrorKind::RemoveQuarantine(quarantine.clone()))?;
        tracing::info!(quarantine = %quarantine.display(), files, "Deleted quarantine");
        self.refresh().await;
        Ok(Delete::Deleted { quarantine, files })
    }

    async fn refresh(&self) {
        if let Err(error) = self.database.refresh().await {
            tracing::warn!(database = self.database.name(), error = ?error, "Asset database refresh failed");
        }
    }
}
