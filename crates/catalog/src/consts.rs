use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Extensions (lowercase, without the dot) of files tracked as assets.
pub const SUPPORTED_ASSET_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "webp", "prefab", "scene", "json", "mp3", "wav", "ogg", "fnt", "atlas"];

/// Extensions of files whose text may embed other assets' identifiers.
/// Binary formats are never searched.
pub const SEARCHABLE_EXTENSIONS: &[&str] = &["prefab", "scene", "fire", "json", "mtl", "anim"];

/// Skeleton descriptor extension (the file a scene actually references).
pub const SKELETON_EXTENSION: &str = "json";
/// Texture-atlas extension paired with a skeleton descriptor.
pub const ATLAS_EXTENSION: &str = "atlas";
/// Bitmap-font descriptor extension.
pub const FONT_EXTENSION: &str = "fnt";

/// Atlas header keywords. Lines starting with one of these describe a page,
/// they don't name one.
pub(crate) const ATLAS_DIRECTIVES: &[&str] = &["size", "format", "filter", "repeat", "pma", "rotate"];

// Bitmap-font page declaration: `page id=0 file="font_0.png"`
regex!(FONT_PAGE_REGEX, r#"page\s+id=\d+\s+file="([^"]+)""#);

/// Lowercased extension of `path`, if it has one.
pub fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    extension(path).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Returns `true` if `path` is a trackable asset.
pub fn is_supported_asset(path: &Path) -> bool {
    has_extension(path, SUPPORTED_ASSET_EXTENSIONS)
}

/// Returns `true` if `path` should be searched for identifier references.
pub fn is_searchable(path: &Path) -> bool {
    has_extension(path, SEARCHABLE_EXTENSIONS)
}
