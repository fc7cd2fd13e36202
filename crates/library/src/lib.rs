//! Unused-asset detection.
//!
//! [`Session`] is the usual entry point. Underneath it:
//!
//! - [`scan`]: which searchable files mention an identifier,
//! - [`deps`]: usage that flows from skeleton and font descriptors to the
//!   atlases and textures they name,
//! - [`analyze`]: a verdict per catalogued asset, in cooperative batches,
//! - [`quarantine`]: moving unused assets aside, restoring or deleting them,
//! - [`replace`]: bulk identifier rewriting.

pub mod analyze;
pub mod deps;
pub mod error;
mod models;
pub mod quarantine;
pub mod replace;
pub mod scan;
mod session;

pub use crate::analyze::{AnalysisEvent, analyze, analyze_stream};
pub use crate::deps::{DependencyGroup, DependencyResolver};
pub use crate::models::{ScanSummary, UsageVerdict};
pub use crate::quarantine::{QuarantineManager, quarantine_dir};
pub use crate::replace::{ReplaceReport, UuidMap};
pub use crate::scan::{ReferenceScanner, Strategy};
pub use crate::session::{Options, ScanResult, Session};
