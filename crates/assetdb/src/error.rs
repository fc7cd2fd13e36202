//! Asset Database Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An asset database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for asset database operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database can't be reached at all.
    #[display("asset database is unavailable")]
    Unavailable,
    /// The database answered, but the query itself failed.
    #[display("asset query failed: {_0}")]
    Query(#[error(not(source))] String),
    /// The database could not pick up changes on disk.
    #[display("asset database refresh failed")]
    Refresh,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Refresh)
    }
}
