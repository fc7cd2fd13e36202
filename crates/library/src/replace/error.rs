//! Error types for the [`replace`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A replacement error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for replacement operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The map file couldn't be read.
    #[display("cannot read identifier map {}", _0.display())]
    ReadMap(#[error(not(source))] PathBuf),
    /// The map file isn't a JSON object of strings.
    #[display("invalid identifier map {}", _0.display())]
    InvalidMap(#[error(not(source))] PathBuf),
    /// The map has nothing to replace.
    #[display("identifier map is empty")]
    EmptyMap,
}
