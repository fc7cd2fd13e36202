//! Usage that flows through descriptors rather than identifiers.
//!
//! A skeleton animation is referenced by its `.json` descriptor's
//! identifier, but the `.atlas` next to it and the textures the atlas lists
//! are only ever named by file name. The same goes for a bitmap font's page
//! textures. Nothing references those files directly, so without this
//! module every one of them would look unused.

use crate::scan::ReferenceScanner;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::instrument;
use unref_catalog::parse::{read_atlas_textures, read_font_textures};
use unref_catalog::{ATLAS_EXTENSION, AssetRecord, FONT_EXTENSION, SKELETON_EXTENSION, extension, read_asset_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `.json` descriptor, `.atlas` auxiliary, atlas page textures.
    Skeleton,
    /// `.fnt` descriptor, page textures.
    Font,
}

/// Assets whose usage is decided by one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub family: Family,
    /// The shared base name for a skeleton group, the descriptor's path
    /// without extension for a font.
    pub key: PathBuf,
    pub descriptor: Option<AssetRecord>,
    pub auxiliary: Option<AssetRecord>,
    /// Texture identifiers, filled in by [`resolve_textures`](Self::resolve_textures).
    pub resolved_textures: Vec<String>,
}

impl DependencyGroup {
    fn new(family: Family, key: PathBuf) -> Self {
        Self { family, key, descriptor: None, auxiliary: None, resolved_textures: Vec::new() }
    }

    /// The file whose text names this group's textures.
    fn texture_source(&self) -> Option<&AssetRecord> {
        match self.family {
            Family::Skeleton => self.auxiliary.as_ref(),
            Family::Font => self.descriptor.as_ref(),
        }
    }

    /// Read the texture names out of the group's atlas (or font) and resolve
    /// each one, relative to that file, through its sidecar. Names without a
    /// resolvable sidecar are dropped.
    pub async fn resolve_textures(&mut self) {
        let Some(source) = self.texture_source() else {
            return;
        };
        let names = match self.family {
            Family::Skeleton => read_atlas_textures(&source.path).await,
            Family::Font => read_font_textures(&source.path).await,
        };
        let directory = source.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            match read_asset_id(directory.join(&name)).await {
                Some(id) => resolved.push(id),
                None => tracing::debug!(texture = %name, key = %self.key.display(), "Texture has no identifier"),
            }
        }
        self.resolved_textures = resolved;
    }

    /// Identifiers marked used when the descriptor is referenced.
    pub fn dependents(&self) -> impl Iterator<Item = &str> {
        self.auxiliary.iter().map(|a| a.id.as_str()).chain(self.resolved_textures.iter().map(String::as_str))
    }
}

fn stem(path: &Path) -> PathBuf {
    PathBuf::from(path.file_stem().unwrap_or_default())
}

/// Pair skeleton descriptors with the atlas of the same base name, wherever
/// in the tree each one sits. Either side may be missing. When several files
/// of one kind share a name, the last one in catalog order wins.
pub fn skeleton_groups(assets: &[AssetRecord]) -> Vec<DependencyGroup> {
    let mut groups: BTreeMap<PathBuf, DependencyGroup> = BTreeMap::new();
    for asset in assets {
        let ext = extension(&asset.path);
        let is_descriptor = ext.as_deref() == Some(SKELETON_EXTENSION);
        if !is_descriptor && ext.as_deref() != Some(ATLAS_EXTENSION) {
            continue;
        }
        let key = stem(&asset.path);
        let group = groups.entry(key.clone()).or_insert_with(|| DependencyGroup::new(Family::Skeleton, key));
        match is_descriptor {
            true => group.descriptor = Some(asset.clone()),
            false => group.auxiliary = Some(asset.clone()),
        }
    }
    groups.into_values().collect()
}

/// One group per bitmap-font descriptor.
pub fn font_groups(assets: &[AssetRecord]) -> Vec<DependencyGroup> {
    assets
        .iter()
        .filter(|asset| extension(&asset.path).as_deref() == Some(FONT_EXTENSION))
        .map(|asset| {
            let mut group = DependencyGroup::new(Family::Font, asset.path.with_extension(""));
            group.descriptor = Some(asset.clone());
            group
        })
        .collect()
}

/// Works out which identifiers are used through a dependency family.
pub struct DependencyResolver<'a> {
    scanner: &'a ReferenceScanner,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(scanner: &'a ReferenceScanner) -> Self {
        Self { scanner }
    }

    /// The union, across both families, of every identifier whose
    /// descriptor has at least one direct reference under `search_root`.
    ///
    /// A skeleton group without an atlas has nothing to propagate and isn't
    /// searched for at all.
    #[instrument(skip_all, fields(assets = assets.len(), root = %search_root.display()))]
    pub async fn resolve(&self, assets: &[AssetRecord], search_root: &Path) -> HashSet<String> {
        let mut used = HashSet::new();
        let groups = skeleton_groups(assets).into_iter().chain(font_groups(assets));
        for mut group in groups {
            let Some(descriptor) = group.descriptor.as_ref() else {
                continue;
            };
            if group.family == Family::Skeleton && group.auxiliary.is_none() {
                continue;
            }
            if self.scanner.find_references(&descriptor.id, search_root).await.is_empty() {
                continue;
            }
            group.resolve_textures().await;
            tracing::debug!(key = %group.key.display(), textures = group.resolved_textures.len(), "Descriptor in use");
            used.extend(group.dependents().map(ToOwned::to_owned));
        }
        tracing::info!(used = used.len(), "Dependencies resolved");
        used
    }
}
