//! Texture references embedded in atlas and bitmap-font descriptors.

use crate::consts::{ATLAS_DIRECTIVES, FONT_PAGE_REGEX};
use std::path::Path;
use tokio::fs;

/// Texture file names listed in atlas text.
///
/// A line names a texture page when it is non-empty after trimming, has no
/// `:` and doesn't start with a header directive. Region blocks and their
/// `key: value` properties are therefore never reported.
pub fn parse_atlas_textures(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains(':'))
        .filter(|line| !ATLAS_DIRECTIVES.iter().any(|directive| line.starts_with(directive)))
        .map(ToOwned::to_owned)
        .collect()
}

/// Texture file names declared by `page` lines in bitmap-font text.
pub fn parse_font_textures(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| FONT_PAGE_REGEX.captures(line))
        .filter_map(|captures| captures.get(1))
        .map(|file| file.as_str().to_owned())
        .collect()
}

async fn read_with(path: &Path, parse: fn(&str) -> Vec<String>) -> Vec<String> {
    match fs::read_to_string(path).await {
        Ok(content) => parse(&content),
        Err(error) => {
            tracing::debug!(path = %path.display(), error = %error, "Could not read descriptor");
            Vec::new()
        },
    }
}

/// Read an atlas file and list its texture names. An unreadable file lists
/// nothing.
pub async fn read_atlas_textures(path: impl AsRef<Path>) -> Vec<String> {
    read_with(path.as_ref(), parse_atlas_textures).await
}

/// Read a bitmap-font file and list its page texture names. An unreadable
/// file lists nothing.
pub async fn read_font_textures(path: impl AsRef<Path>) -> Vec<String> {
    read_with(path.as_ref(), parse_font_textures).await
}
