//! Relative path handling for mirrored directory trees.
//!
//! Quarantine and restore both re-create an asset's position relative to one
//! root underneath another root. The relative half of that operation must
//! never be able to climb out of the destination root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a relative path, rejecting anything that would leave its base.
///
/// `.` segments and redundant separators are dropped, and `..` is resolved
/// against the segments seen so far. Absolute paths, Windows prefixes, null
/// bytes and paths that normalize to nothing are all rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use unref_storage::normalize_relative;
/// assert_eq!(normalize_relative("textures/./ui//button.png").unwrap(), Path::new("textures/ui/button.png"));
/// assert!(normalize_relative("../outside.png").is_err());
/// assert!(normalize_relative("/etc/passwd").is_err());
/// ```
pub fn normalize_relative(path: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidPath(path.as_ref().to_path_buf());
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}

/// Returns `path` relative to `root`, normalized.
///
/// Fails with [`InvalidPath`](crate::error::ErrorKind::InvalidPath) when
/// `path` is not inside `root` (or *is* `root`).
pub fn relative_to(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let Ok(relative) = path.strip_prefix(root.as_ref()) else {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    };
    normalize_relative(relative)
}

/// Places `relative` underneath `base`.
///
/// ```
/// use std::path::Path;
/// use unref_storage::mirror;
/// assert_eq!(
///     mirror("/project/assets_temp_unused", "ui/icon.png").unwrap(),
///     Path::new("/project/assets_temp_unused/ui/icon.png"),
/// );
/// ```
pub fn mirror(base: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<PathBuf> {
    Ok(base.as_ref().join(normalize_relative(relative)?))
}
