//! Sidecar metadata parsing.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use unref_storage::meta_path;

/// The only part of a sidecar this crate cares about. Everything else the
/// editor stores in there (importer settings, sub-metas) is ignored.
#[derive(Debug, Deserialize)]
struct Sidecar {
    #[serde(default)]
    uuid: Option<String>,
}

/// Parse the identifier out of raw sidecar content.
pub(crate) fn parse_id(meta: &Path, content: &[u8]) -> Result<String> {
    let sidecar: Sidecar = serde_json::from_slice(content).or_raise(|| ErrorKind::InvalidMeta(meta.to_path_buf()))?;
    sidecar.uuid.filter(|id| !id.trim().is_empty()).ok_or_raise(|| ErrorKind::MissingId(meta.to_path_buf()))
}

/// Read the identifier of the asset at `path` from its `.meta` sidecar.
///
/// # Errors
/// - [`MissingMeta`](ErrorKind::MissingMeta) if there is no sidecar,
/// - [`InvalidMeta`](ErrorKind::InvalidMeta) if it can't be read or parsed,
/// - [`MissingId`](ErrorKind::MissingId) if it has no `uuid` field.
pub async fn read_id(path: impl AsRef<Path>) -> Result<String> {
    let meta = meta_path(path);
    let content = match fs::read(&meta).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => exn::bail!(ErrorKind::MissingMeta(meta)),
        Err(e) => return Err(e).or_raise(|| ErrorKind::InvalidMeta(meta.clone())),
    };
    parse_id(&meta, &content)
}

/// Convenience form of [`read_id`] for callers that only care whether the
/// file is resolvable.
pub async fn read_asset_id(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    match read_id(path).await {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::debug!(path = %path.display(), error = ?error, "Could not resolve asset identifier");
            None
        },
    }
}
