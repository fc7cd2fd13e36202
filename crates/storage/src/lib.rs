//! Filesystem plumbing shared by the catalog, scanner and quarantine.
//!
//! - [`walk`] / [`walk_filtered`] / [`walk_stream`]: recursive, error-tolerant
//!   traversal in a stable order.
//! - [`remove_empty_dirs`]: bottom-up pruning that never removes the root.
//! - [`ops`]: copy/move/delete an asset together with its `.meta` sidecar.
//! - [`mirror`] / [`relative_to`]: re-rooting relative paths safely.

pub mod error;
pub mod ops;
mod path;
mod walk;

pub use crate::ops::{is_meta, meta_path};
pub use crate::path::{mirror, normalize_relative, relative_to};
pub use crate::walk::{PathStream, remove_empty_dirs, walk, walk_filtered, walk_stream};
