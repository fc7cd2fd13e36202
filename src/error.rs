//! Command-line Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("not a usable folder: {}", _0.display())]
    Folder(#[error(not(source))] PathBuf),
    #[display("could not determine the project root")]
    Project,
    #[display("could not resolve asset {_0}")]
    Asset(#[error(not(source))] String),
    #[display("scan failed")]
    Scan,
    #[display("quarantine operation failed")]
    Quarantine,
    #[display("identifier replacement failed")]
    Replace,
    #[display("could not read confirmation")]
    Prompt,
    #[display("could not write output")]
    Output,
}
