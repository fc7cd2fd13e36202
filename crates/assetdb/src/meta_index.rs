//! Sidecar-backed stand-in for the editor's asset database.

use crate::error::Result;
use crate::{AssetDatabase, AssetInfo};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::instrument;
use unref_catalog::read_id;
use unref_storage::{is_meta, meta_path, walk};

/// Answers asset queries from the `.meta` sidecars on disk.
///
/// A file counts as an asset when a sidecar sits next to it. Listings are
/// always read fresh and list files only; identifier lookups cover folders
/// as well and are served from an index of the whole project that is built
/// on first use and dropped by [`refresh`](AssetDatabase::refresh).
#[derive(Debug)]
pub struct MetaIndex {
    project_root: PathBuf,
    index: RwLock<Option<HashMap<String, PathBuf>>>,
}

impl MetaIndex {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self { project_root: project_root.into(), index: RwLock::new(None) }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    async fn tracked_files(root: &Path) -> Vec<PathBuf> {
        let files = walk(root).await;
        let sidecars: HashSet<&Path> = files.iter().filter(|f| is_meta(f)).map(PathBuf::as_path).collect();
        files.iter().filter(|f| !is_meta(f) && sidecars.contains(meta_path(f).as_path())).cloned().collect()
    }

    #[instrument(skip_all, fields(root = %self.project_root.display()))]
    async fn build_index(&self) -> HashMap<String, PathBuf> {
        let mut index = HashMap::new();
        // Folders carry sidecars too, and are looked up just like files.
        let sidecars = walk(&self.project_root).await.into_iter().filter(|f| is_meta(f));
        for sidecar in sidecars {
            let asset = sidecar.with_extension("");
            if !fs::try_exists(&asset).await.unwrap_or(false) {
                continue;
            }
            if let Ok(id) = read_id(&asset).await {
                index.insert(id, asset);
            }
        }
        tracing::debug!(assets = index.len(), "Indexed project sidecars");
        index
    }
}

#[async_trait]
impl AssetDatabase for MetaIndex {
    fn name(&self) -> &str {
        "meta-index"
    }

    async fn query_asset_info(&self, id: &str) -> Result<Option<AssetInfo>> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(index.get(id).map(|file| AssetInfo::new(file.clone(), Some(id.to_owned()))));
        }
        let mut guard = self.index.write().await;
        // Another caller may have built it while we waited for the lock.
        if guard.is_none() {
            *guard = Some(self.build_index().await);
        }
        let found = guard.as_ref().and_then(|index| index.get(id)).cloned();
        Ok(found.map(|file| AssetInfo::new(file, Some(id.to_owned()))))
    }

    async fn query_assets(&self, root: &Path) -> Result<Vec<AssetInfo>> {
        Ok(Self::tracked_files(root).await.into_iter().map(|file| AssetInfo::new(file, None)).collect())
    }

    async fn refresh(&self) -> Result<()> {
        *self.index.write().await = None;
        tracing::debug!(root = %self.project_root.display(), "Dropped identifier index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn asset(root: &Path, relative: &str, uuid: Option<&str>) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"data").unwrap();
        if let Some(uuid) = uuid {
            fs::write(meta_path(&path), format!(r#"{{"uuid":"{uuid}"}}"#)).unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_lists_files_with_sidecars() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let scene = asset(root, "scenes/main.scene", Some("scene-id"));
        let prefab = asset(root, "prefabs/hero.prefab", Some("hero-id"));
        asset(root, "stray.prefab", None);

        let db = MetaIndex::new(root);
        let listed: Vec<_> = db.query_assets(root).await.unwrap().into_iter().map(|a| a.file).collect();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&scene));
        assert!(listed.contains(&prefab));

        let scoped = db.query_assets(&root.join("scenes")).await.unwrap();
        assert_eq!(scoped, vec![AssetInfo::new(scene, None)]);
    }

    #[tokio::test]
    async fn test_resolves_ids_until_refreshed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let hero = asset(root, "hero.png", Some("hero-id"));
        let db = MetaIndex::new(root);

        let info = db.query_asset_info("hero-id").await.unwrap().unwrap();
        assert_eq!(info.file, hero);
        assert!(db.query_asset_info("villain-id").await.unwrap().is_none());

        // Index is cached: a new asset is invisible until a refresh.
        let villain = asset(root, "villain.png", Some("villain-id"));
        assert!(db.query_asset_info("villain-id").await.unwrap().is_none());
        db.refresh().await.unwrap();
        assert_eq!(db.query_asset_info("villain-id").await.unwrap().unwrap().file, villain);
    }

    #[tokio::test]
    async fn test_resolves_folder_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        asset(root, "assets/ui/icon.png", Some("icon-id"));
        fs::write(root.join("assets/ui.meta"), r#"{"uuid":"ui-folder-id"}"#).unwrap();
        // A sidecar left behind by a deleted folder resolves to nothing.
        fs::write(root.join("assets/gone.meta"), r#"{"uuid":"gone-id"}"#).unwrap();
        let db = MetaIndex::new(root);

        assert_eq!(db.query_asset_info("ui-folder-id").await.unwrap().unwrap().file, root.join("assets/ui"));
        assert!(db.query_asset_info("gone-id").await.unwrap().is_none());
        // Folders are never listed as assets.
        let listed = db.query_assets(&root.join("assets")).await.unwrap();
        assert_eq!(listed, vec![AssetInfo::new(root.join("assets/ui/icon.png"), None)]);
    }

    #[tokio::test]
    async fn test_missing_root_lists_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = MetaIndex::new(temp_dir.path().join("gone"));
        assert!(db.query_assets(&temp_dir.path().join("gone")).await.unwrap().is_empty());
        assert!(db.query_asset_info("anything").await.unwrap().is_none());
    }
}
