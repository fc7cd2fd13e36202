//! The asset database seam.
//!
//! In the editor, an asset database owns the mapping between identifiers and
//! files, can list every asset under a folder in one request, and needs to be
//! told when files move underneath it. [`AssetDatabase`] models exactly those
//! three requests, so the analysis and quarantine code never care what sits
//! behind them.
//!
//! - [`MetaIndex`] answers from the sidecar files on disk.
//! - [`Unindexed`] answers nothing, which forces reference scans onto the
//!   direct file-search strategy.
//! - `MockDatabase` (feature `mock`) is scripted, for tests.

pub mod error;
mod meta_index;
#[cfg(feature = "mock")]
mod mock;
mod unindexed;

pub use crate::meta_index::MetaIndex;
#[cfg(feature = "mock")]
pub use crate::mock::MockDatabase;
pub use crate::unindexed::Unindexed;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type DatabaseHandle = Arc<dyn AssetDatabase + Send + Sync>;

/// What the database knows about one asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetInfo {
    /// Absolute path of the asset's primary file.
    pub file: PathBuf,
    /// Identifier, when the database reports it.
    pub id: Option<String>,
}
impl AssetInfo {
    pub fn new(file: impl Into<PathBuf>, id: Option<String>) -> Self {
        Self { file: file.into(), id }
    }
}

/// Requests the analysis and quarantine code make of an asset database.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unref_assetdb::{AssetDatabase, error::Result};
///
/// async fn count_prefabs(db: &dyn AssetDatabase, root: &Path) -> Result<usize> {
///     let assets = db.query_assets(root).await?;
///     Ok(assets.iter().filter(|a| a.file.extension().is_some_and(|e| e == "prefab")).count())
/// }
/// ```
#[async_trait]
pub trait AssetDatabase: Send + Sync {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Resolve an identifier to the asset carrying it.
    ///
    /// Unknown identifiers are `Ok(None)`, not an error.
    async fn query_asset_info(&self, id: &str) -> Result<Option<AssetInfo>>;

    /// Every asset underneath `root`, recursively, in one request.
    ///
    /// An empty answer is a legitimate answer; callers decide what it means.
    async fn query_assets(&self, root: &Path) -> Result<Vec<AssetInfo>>;

    /// Tell the database that files changed on disk.
    async fn refresh(&self) -> Result<()>;
}
