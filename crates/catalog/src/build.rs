use crate::consts::is_supported_asset;
use crate::meta::read_id;
use crate::models::{AssetRecord, Catalog, Excluded};
use std::path::Path;
use tracing::instrument;
use unref_storage::{relative_to, walk_filtered};

/// Walk `root` and inventory every supported asset that carries an identifier
/// in its sidecar.
///
/// Assets appear in traversal order, which is stable for a stable tree.
/// Supported files without a usable sidecar are listed in
/// [`Catalog::excluded`] instead; they never fail the build. A root that
/// doesn't exist produces an empty catalog.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub async fn build(root: impl AsRef<Path>) -> Catalog {
    let root = root.as_ref();
    let mut catalog = Catalog::default();
    for path in walk_filtered(root, is_supported_asset).await {
        let id = match read_id(&path).await {
            Ok(id) => id,
            Err(error) => {
                tracing::debug!(path = %path.display(), reason = %*error, "Excluding asset");
                catalog.excluded.push(Excluded { path, reason: (*error).clone() });
                continue;
            },
        };
        let Ok(relative_path) = relative_to(root, &path) else {
            tracing::debug!(path = %path.display(), "Asset escaped the catalog root");
            continue;
        };
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        catalog.assets.push(AssetRecord { path, id, name, relative_path });
    }
    tracing::info!(assets = catalog.assets.len(), excluded = catalog.excluded.len(), "Catalog built");
    catalog
}
