//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a [`Session`](crate::Session) operation did not complete.
///
/// ### Preconditions
/// Nothing was touched; the caller should report and carry on.
/// - [`ErrorKind::Busy`]
/// - [`ErrorKind::NoFolderSelected`]
/// - [`ErrorKind::NoScanResult`]
/// - [`ErrorKind::UnknownAsset`]
///
/// ### Fatal to the operation
/// - [`ErrorKind::ScanRoot`]
/// - [`ErrorKind::Database`]
/// - [`ErrorKind::Quarantine`]
/// - [`ErrorKind::Replace`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Another scan or file operation holds the session.
    #[display("another operation is already running")]
    Busy,
    /// No folder was selected before an operation that needs one.
    #[display("no folder selected")]
    NoFolderSelected,
    /// Moving unused assets needs a scan result to work from.
    #[display("no scan result available; run a scan first")]
    NoScanResult,
    /// No asset carries the identifier a folder was selected by.
    #[display("no asset with identifier {_0}")]
    UnknownAsset(#[error(not(source))] String),
    /// The asset database couldn't answer a lookup.
    #[display("asset database lookup failed")]
    Database,
    /// The folder to scan can't be enumerated at all.
    #[display("cannot enumerate scan root: {}", _0.display())]
    ScanRoot(#[error(not(source))] PathBuf),
    #[display("quarantine operation failed")]
    Quarantine,
    #[display("identifier replacement failed")]
    Replace,
}

impl ErrorKind {
    /// Returns `true` if the operation was refused before touching anything.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Busy | Self::NoFolderSelected | Self::NoScanResult | Self::UnknownAsset(_))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Database)
    }
}
