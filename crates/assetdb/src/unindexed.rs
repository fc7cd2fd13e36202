use crate::error::Result;
use crate::{AssetDatabase, AssetInfo};
use async_trait::async_trait;
use std::path::Path;

/// A database that knows about nothing.
///
/// Every listing is empty, so a reference scanner backed by it immediately
/// falls back to searching the file system directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unindexed;

#[async_trait]
impl AssetDatabase for Unindexed {
    fn name(&self) -> &str {
        "unindexed"
    }

    async fn query_asset_info(&self, _id: &str) -> Result<Option<AssetInfo>> {
        Ok(None)
    }

    async fn query_assets(&self, root: &Path) -> Result<Vec<AssetInfo>> {
        tracing::trace!(root = %root.display(), "Unindexed database has no listing");
        Ok(Vec::new())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}
