//! Sidecar-aware file operations.
//!
//! Every tracked asset has a `<file>.meta` companion sitting beside it. The
//! helpers here treat the pair as a unit: the primary file must succeed, the
//! sidecar follows it if (and only if) it exists.

use crate::error::{ErrorKind, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Extension appended to an asset's file name to locate its sidecar.
pub const META_EXTENSION: &str = "meta";

/// Returns the sidecar path for `path` (`icon.png` → `icon.png.meta`).
pub fn meta_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(".");
    name.push(META_EXTENSION);
    PathBuf::from(name)
}

/// Returns `true` if `path` is itself a sidecar file.
pub fn is_meta(path: impl AsRef<Path>) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext.eq_ignore_ascii_case(META_EXTENSION))
}

/// Async existence check that treats "can't tell" as "doesn't exist".
pub async fn exists(path: impl AsRef<Path>) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| ErrorKind::from_io(e, parent))?;
    }
    Ok(())
}

/// Copy a file and its sidecar, creating the destination's parent directory.
///
/// Returns whether a sidecar was copied.
pub async fn copy_with_meta(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<bool> {
    let (from, to) = (from.as_ref(), to.as_ref());
    create_parent(to).await?;
    fs::copy(from, to).await.map_err(|e| ErrorKind::from_io(e, from))?;
    let from_meta = meta_path(from);
    if !exists(&from_meta).await {
        return Ok(false);
    }
    fs::copy(&from_meta, meta_path(to)).await.map_err(|e| ErrorKind::from_io(e, &from_meta))?;
    Ok(true)
}

/// Move a file and its sidecar, creating the destination's parent directory.
///
/// Returns whether a sidecar was moved.
pub async fn rename_with_meta(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<bool> {
    let (from, to) = (from.as_ref(), to.as_ref());
    create_parent(to).await?;
    fs::rename(from, to).await.map_err(|e| ErrorKind::from_io(e, from))?;
    let from_meta = meta_path(from);
    if !exists(&from_meta).await {
        return Ok(false);
    }
    fs::rename(&from_meta, meta_path(to)).await.map_err(|e| ErrorKind::from_io(e, &from_meta))?;
    Ok(true)
}

/// Delete a file and its sidecar. Either being absent already is fine.
pub async fn remove_with_meta(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    for target in [path.to_path_buf(), meta_path(path)] {
        match fs::remove_file(&target).await {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => exn::bail!(ErrorKind::from_io(e, &target)),
        }
    }
    Ok(())
}

/// Recursively delete a directory. A missing directory is not an error.
pub async fn remove_tree(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => exn::bail!(ErrorKind::from_io(e, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs as sync_fs;

    #[rstest]
    #[case("a/icon.png", "a/icon.png.meta")]
    #[case("hero.skel.json", "hero.skel.json.meta")]
    #[case("noext", "noext.meta")]
    fn test_meta_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(meta_path(input), Path::new(expected));
    }

    #[rstest]
    #[case("a.png.meta", true)]
    #[case("a.png.META", true)]
    #[case("a.png", false)]
    #[case("meta", false)]
    fn test_is_meta(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_meta(input), expected);
    }

    #[tokio::test]
    async fn test_copy_with_meta() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("icon.png");
        sync_fs::write(&src, b"png").unwrap();
        sync_fs::write(meta_path(&src), b"{}").unwrap();

        let dst = temp_dir.path().join("out/nested/icon.png");
        assert!(copy_with_meta(&src, &dst).await.unwrap());
        assert_eq!(sync_fs::read(&dst).unwrap(), b"png");
        assert_eq!(sync_fs::read(meta_path(&dst)).unwrap(), b"{}");
        assert!(src.exists());
    }

    #[tokio::test]
    async fn test_copy_without_meta() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("icon.png");
        sync_fs::write(&src, b"png").unwrap();
        assert!(!copy_with_meta(&src, temp_dir.path().join("copy.png")).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = copy_with_meta(temp_dir.path().join("nope.png"), temp_dir.path().join("x.png")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_with_meta() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("icon.png");
        sync_fs::write(&src, b"png").unwrap();
        sync_fs::write(meta_path(&src), b"{}").unwrap();

        let dst = temp_dir.path().join("moved/icon.png");
        assert!(rename_with_meta(&src, &dst).await.unwrap());
        assert!(!src.exists());
        assert!(!meta_path(&src).exists());
        assert!(dst.exists());
        assert!(meta_path(&dst).exists());
    }

    #[tokio::test]
    async fn test_remove_with_meta_tolerates_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("icon.png");
        sync_fs::write(&src, b"png").unwrap();
        remove_with_meta(&src).await.unwrap();
        assert!(!src.exists());
        remove_with_meta(&src).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tree = temp_dir.path().join("q");
        sync_fs::create_dir_all(tree.join("a/b")).unwrap();
        sync_fs::write(tree.join("a/b/c.png"), b"").unwrap();
        remove_tree(&tree).await.unwrap();
        assert!(!tree.exists());
        remove_tree(&tree).await.unwrap();
    }
}
