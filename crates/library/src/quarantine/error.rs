//! Error types for the [`quarantine`](super) module.
//!
//! Only failures that stop the whole operation are errors. Per-file
//! failures are collected into the operation's report instead.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A quarantine error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for quarantine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The scan root has no name to derive a quarantine folder from.
    #[display("cannot derive a quarantine folder from {}", _0.display())]
    InvalidScanRoot(#[error(not(source))] PathBuf),
    /// The quarantine folder couldn't be (re)created.
    #[display("cannot create quarantine folder {}", _0.display())]
    CreateQuarantine(#[error(not(source))] PathBuf),
    /// The quarantine folder couldn't be deleted.
    #[display("cannot delete quarantine folder {}", _0.display())]
    RemoveQuarantine(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CreateQuarantine(_) | Self::RemoveQuarantine(_))
    }
}
