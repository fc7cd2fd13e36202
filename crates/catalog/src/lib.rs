//! Asset inventory built from sidecar metadata.
//!
//! Every trackable asset sits next to a `<file>.meta` JSON sidecar whose
//! `uuid` field is the identifier other files use to reference it. [`build`]
//! walks a folder and turns each supported file with a usable sidecar into an
//! [`AssetRecord`]; anything else is recorded as [`Excluded`].
//!
//! Atlas and bitmap-font descriptors embed the file names of their textures
//! rather than identifiers. The [`parse`] helpers pull those names out so
//! they can be resolved with [`read_asset_id`].

mod build;
mod consts;
pub mod error;
mod meta;
mod models;
pub mod parse;

pub use crate::build::build;
pub use crate::consts::{
    ATLAS_EXTENSION, FONT_EXTENSION, SEARCHABLE_EXTENSIONS, SKELETON_EXTENSION, SUPPORTED_ASSET_EXTENSIONS, extension,
    is_searchable, is_supported_asset,
};
pub use crate::meta::{read_asset_id, read_id};
pub use crate::models::{AssetRecord, Catalog, Excluded};
