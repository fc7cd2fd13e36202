//! Scripted asset database for testing.

use crate::error::{ErrorKind, Result};
use crate::{AssetDatabase, AssetInfo};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Scripted asset database for testing.
///
/// Holds a fixed listing behind a [`RwLock`], can be told to fail its
/// queries or refreshes, and counts every request it receives.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unref_assetdb::{AssetDatabase, MockDatabase};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = MockDatabase::with_assets([("/project/assets/main.scene", "scene-id")]);
/// assert_eq!(db.query_assets(Path::new("/project/assets")).await?.len(), 1);
///
/// db.fail_queries(true);
/// assert!(db.query_assets(Path::new("/project/assets")).await.is_err());
/// assert_eq!(db.query_count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockDatabase {
    assets: RwLock<Vec<AssetInfo>>,
    fail_queries: AtomicBool,
    fail_refresh: AtomicBool,
    info_calls: AtomicUsize,
    query_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl MockDatabase {
    /// Create a mock database listing the given `(file, id)` pairs.
    pub fn with_assets(assets: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<String>)>) -> Self {
        let assets = assets.into_iter().map(|(file, id)| AssetInfo::new(file, Some(id.into()))).collect();
        Self { assets: RwLock::new(assets), ..Default::default() }
    }

    /// Replace the listing.
    pub async fn set_assets(&self, assets: Vec<AssetInfo>) {
        *self.assets.write().await = assets;
    }

    /// Make `query_asset_info` and `query_assets` fail (or stop failing).
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make `refresh` fail (or stop failing).
    pub fn fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn info_count(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn check_queries(&self) -> Result<()> {
        match self.fail_queries.load(Ordering::SeqCst) {
            true => exn::bail!(ErrorKind::Unavailable),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl AssetDatabase for MockDatabase {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query_asset_info(&self, id: &str) -> Result<Option<AssetInfo>> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.check_queries()?;
        Ok(self.assets.read().await.iter().find(|a| a.id.as_deref() == Some(id)).cloned())
    }

    async fn query_assets(&self, root: &Path) -> Result<Vec<AssetInfo>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_queries()?;
        Ok(self.assets.read().await.iter().filter(|a| a.file.starts_with(root)).cloned().collect())
    }

    async fn refresh(&self) -> Result<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_refresh.load(Ordering::SeqCst) {
            true => exn::bail!(ErrorKind::Refresh),
            false => Ok(()),
        }
    }
}
