#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use unref_assetdb::{DatabaseHandle, Unindexed};
use unref_cache::CacheLimits;
use unref_catalog::AssetRecord;
use unref_library::{ReferenceScanner, UsageVerdict};

/// A throwaway project with an `assets` folder to scan.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        Self { dir }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    /// Write a file under the assets folder, without a sidecar.
    pub fn file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a file under the assets folder with a sidecar carrying `uuid`.
    pub fn asset(&self, relative: &str, content: &str, uuid: &str) -> PathBuf {
        let path = self.file(relative, content);
        fs::write(
            self.root().join(format!("{relative}.meta")),
            format!(r#"{{"ver":"1.0.0","uuid":"{uuid}","subMetas":{{}}}}"#),
        )
        .unwrap();
        path
    }
}

pub fn unindexed() -> DatabaseHandle {
    Arc::new(Unindexed)
}

pub fn scanner(database: DatabaseHandle) -> ReferenceScanner {
    ReferenceScanner::new(database, CacheLimits::default())
}

pub fn record(root: &Path, relative: &str, id: &str) -> AssetRecord {
    let path = root.join(relative);
    AssetRecord {
        name: path.file_name().unwrap().to_string_lossy().into_owned(),
        relative_path: PathBuf::from(relative),
        path,
        id: id.to_owned(),
    }
}

pub fn verdict<'a>(verdicts: &'a [UsageVerdict], id: &str) -> &'a UsageVerdict {
    verdicts.iter().find(|v| v.id() == id).unwrap_or_else(|| panic!("no verdict for {id}"))
}
