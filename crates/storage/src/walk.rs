//! Recursive directory traversal.
//!
//! Traversal never aborts because one subtree is unreadable: the streaming
//! form yields the error and moves on, the collecting forms log it and move
//! on. A root that doesn't exist is simply an empty tree.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};

pub type PathStream = Pin<Box<dyn Stream<Item = Result<PathBuf>> + Send>>;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

async fn process_entry(entry: DirEntry) -> Result<WalkEntry> {
    let path = entry.path();
    let file_type = entry.file_type().await.map_err(|e| ErrorKind::from_io(e, &path))?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if file_type.is_file() {
        return Ok(WalkEntry::File(path));
    }
    // Symlinks are not followed; a linked directory could loop forever.
    Ok(WalkEntry::Skip)
}

/// Stream every file underneath `root`.
///
/// Entries of a directory are yielded in name order, files before the
/// contents of subdirectories, so the output is stable for a stable tree.
/// Per-entry failures are yielded as `Err` items without ending the stream.
pub fn walk_stream(root: impl AsRef<Path>) -> PathStream {
    let mut stack = vec![root.as_ref().to_path_buf()];
    Box::pin(stream! {
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue 'dirs,
                Err(err) => {
                    yield Err(exn::Exn::from(ErrorKind::from_io(err, &current)));
                    continue 'dirs;
                }
            };
            let mut files = Vec::new();
            let mut dirs = Vec::new();
            'entries: loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    // A failing directory handle tends to keep failing.
                    Err(err) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(err, &current)));
                        break 'entries;
                    }
                };
                match process_entry(entry).await {
                    Ok(WalkEntry::File(f)) => files.push(f),
                    Ok(WalkEntry::Descend(d)) => dirs.push(d),
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
            files.sort();
            dirs.sort();
            for file in files {
                yield Ok(file);
            }
            // Stack is LIFO: push in reverse so the first directory pops first.
            stack.extend(dirs.into_iter().rev());
        }
    })
}

/// Collect every file underneath `root`.
pub async fn walk(root: impl AsRef<Path>) -> Vec<PathBuf> {
    walk_filtered(root, |_| true).await
}

/// Collect every file underneath `root` accepted by `predicate`.
pub async fn walk_filtered(root: impl AsRef<Path>, predicate: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut stream = walk_stream(root);
    let mut files = Vec::new();
    while let Some(entry) = stream.next().await {
        match entry {
            Ok(path) if predicate(&path) => files.push(path),
            Ok(_) => {},
            Err(error) => tracing::debug!(error = ?error, "Skipping unreadable entry during traversal"),
        }
    }
    files
}

/// Remove every directory underneath `root` that is empty once its own
/// subdirectories have been cleaned up. `root` itself is never removed.
///
/// Returns the number of directories removed. Failures are logged and
/// skipped.
pub async fn remove_empty_dirs(root: impl AsRef<Path>) -> usize {
    let root = root.as_ref();
    // Pre-order listing of directories; walking it backwards visits children
    // before their parents.
    let mut ordered = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(mut entries) = fs::read_dir(&current).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Ok(file_type) = entry.file_type().await
                && file_type.is_dir()
            {
                stack.push(entry.path());
            }
        }
        ordered.push(current);
    }

    let mut removed = 0;
    for dir in ordered.iter().rev().filter(|d| d.as_path() != root) {
        let is_empty = match fs::read_dir(dir).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
            Err(_) => false,
        };
        if !is_empty {
            continue;
        }
        match fs::remove_dir(dir).await {
            Ok(()) => removed += 1,
            Err(error) => tracing::debug!(path = %dir.display(), error = %error, "Could not remove empty directory"),
        }
    }
    removed
}
