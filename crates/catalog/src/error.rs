//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a file can't be tracked.
///
/// Untrackable files are excluded from a [`Catalog`](crate::Catalog), not
/// fatal to it; these variants double as the recorded exclusion reason.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No sidecar metadata file next to the asset.
    #[display("missing sidecar metadata: {}", _0.display())]
    MissingMeta(#[error(not(source))] PathBuf),
    /// Sidecar exists but couldn't be read or isn't valid JSON.
    #[display("invalid sidecar metadata: {}", _0.display())]
    InvalidMeta(#[error(not(source))] PathBuf),
    /// Sidecar parsed, but carries no identifier.
    #[display("sidecar metadata has no identifier: {}", _0.display())]
    MissingId(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The sidecar is either usable or it isn't.
        false
    }
}
