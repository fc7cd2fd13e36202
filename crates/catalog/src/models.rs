//! Catalog models.

use crate::error::ErrorKind;
use serde::Serialize;
use std::path::PathBuf;

/// One tracked asset, discovered during a catalog build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AssetRecord {
    /// Absolute path to the primary asset file.
    pub path: PathBuf,
    /// Identifier read from the asset's sidecar metadata.
    pub id: String,
    /// File name including extension.
    pub name: String,
    /// Path relative to the catalog root.
    pub relative_path: PathBuf,
}

/// A supported asset file that could not be tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excluded {
    pub path: PathBuf,
    pub reason: ErrorKind,
}

/// The inventory produced by [`build`](crate::build).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Tracked assets, in traversal order.
    pub assets: Vec<AssetRecord>,
    /// Supported files left out for lack of a usable identifier.
    pub excluded: Vec<Excluded>,
}
impl Catalog {
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
impl IntoIterator for Catalog {
    type Item = AssetRecord;
    type IntoIter = std::vec::IntoIter<AssetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_iter()
    }
}
