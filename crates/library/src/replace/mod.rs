//! Bulk identifier replacement.
//!
//! Swaps every literal occurrence of one asset identifier for another across
//! the scene, prefab and animation files of a folder. Typically used to point
//! a project at replacement copies of built-in UI assets.

pub mod error;

use self::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::instrument;
use unref_catalog::extension;
use unref_storage::walk_filtered;

use crate::quarantine::Failure;

/// Files rewritten by [`replace_in_tree`].
pub const REPLACE_EXTENSIONS: &[&str] = &["prefab", "scene", "json", "anim"];

/// Old identifier → new identifier.
///
/// Entries are applied in the order they were given, so a chain such as
/// `a → b, b → c` turns `a` into `c`. A repeated key keeps its first
/// position and takes its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UuidMap(Vec<(String, String)>);

impl UuidMap {
    pub fn new(entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut map: Vec<(String, String)> = Vec::new();
        for (old, new) in entries {
            let (old, new) = (old.into(), new.into());
            // An empty key would match between every pair of characters.
            if old.is_empty() {
                continue;
            }
            match map.iter_mut().find(|(key, _)| *key == old) {
                Some(entry) => entry.1 = new,
                None => map.push((old, new)),
            }
        }
        Self(map)
    }

    /// Parse a JSON object such as `{"old-uuid": "new-uuid"}`, keeping the
    /// file's key order.
    pub fn from_json(path: &Path, content: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidMap(path.to_path_buf());
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content).or_raise(invalid)?;
        let mut entries = Vec::with_capacity(object.len());
        for (old, new) in object {
            let serde_json::Value::String(new) = new else {
                exn::bail!(invalid());
            };
            entries.push((old, new));
        }
        let map = Self::new(entries);
        if map.is_empty() {
            exn::bail!(ErrorKind::EmptyMap);
        }
        Ok(map)
    }

    /// Read and parse a map file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.or_raise(|| ErrorKind::ReadMap(path.to_path_buf()))?;
        Self::from_json(path, &content)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every entry to `content`, returning the new text and the number
    /// of occurrences replaced. Nothing is allocated when nothing matches.
    pub fn apply(&self, content: &str) -> Option<(String, usize)> {
        let mut current: Option<String> = None;
        let mut total = 0;
        for (old, new) in &self.0 {
            let text = current.as_deref().unwrap_or(content);
            let count = text.matches(old.as_str()).count();
            if count == 0 {
                continue;
            }
            total += count;
            current = Some(text.replace(old.as_str(), new));
        }
        current.map(|text| (text, total))
    }
}

/// What [`replace_in_tree`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaceReport {
    /// Candidate files read.
    pub processed: usize,
    /// Files rewritten.
    pub modified: usize,
    /// Occurrences replaced across all files.
    pub replacements: usize,
    pub failures: Vec<Failure>,
}

fn is_replace_target(path: &Path) -> bool {
    extension(path).is_some_and(|ext| REPLACE_EXTENSIONS.contains(&ext.as_str()))
}

/// Apply `map` to every candidate file under `root`. A file is only written
/// back if something in it changed.
#[instrument(skip_all, fields(root = %root.display(), entries = map.len()))]
pub async fn replace_in_tree(map: &UuidMap, root: &Path) -> ReplaceReport {
    let mut report = ReplaceReport::default();
    for file in walk_filtered(root, is_replace_target).await {
        report.processed += 1;
        match replace_in_file(map, &file).await {
            Ok(0) => {},
            Ok(count) => {
                report.modified += 1;
                report.replacements += count;
                tracing::debug!(path = %file.display(), count, "Replaced identifiers");
            },
            Err(error) => {
                tracing::debug!(path = %file.display(), error = %error, "Replacement failed");
                report.failures.push(Failure { path: file, reason: error.to_string() });
            },
        }
    }
    tracing::info!(processed = report.processed, modified = report.modified, failed = report.failures.len(), "Replacement complete");
    report
}

async fn replace_in_file(map: &UuidMap, path: &Path) -> std::io::Result<usize> {
    let content = fs::read_to_string(path).await?;
    let Some((replaced, count)) = map.apply(&content) else {
        return Ok(0);
    };
    fs::write(path, replaced).await?;
    Ok(count)
}
