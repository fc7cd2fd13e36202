use crate::scan::Strategy;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use unref_catalog::AssetRecord;

/// Whether an asset is in use, and why.
///
/// `is_used` is derived at construction and can't drift from the evidence:
/// an asset is used when at least one file references it directly, or when
/// a dependency family it belongs to is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageVerdict {
    #[serde(flatten)]
    asset: AssetRecord,
    references: Vec<PathBuf>,
    used_as_dependency: bool,
    is_used: bool,
}

impl UsageVerdict {
    pub fn new(asset: AssetRecord, references: Vec<PathBuf>, used_as_dependency: bool) -> Self {
        let is_used = !references.is_empty() || used_as_dependency;
        Self { asset, references, used_as_dependency, is_used }
    }

    pub fn asset(&self) -> &AssetRecord {
        &self.asset
    }

    pub fn id(&self) -> &str {
        &self.asset.id
    }

    pub fn path(&self) -> &Path {
        &self.asset.path
    }

    pub fn relative_path(&self) -> &Path {
        &self.asset.relative_path
    }

    /// Searchable files whose content contains this asset's identifier.
    pub fn references(&self) -> &[PathBuf] {
        &self.references
    }

    /// Marked used through a descriptor it belongs to.
    pub fn used_as_dependency(&self) -> bool {
        self.used_as_dependency
    }

    pub fn is_used(&self) -> bool {
        self.is_used
    }
}

/// Headline numbers for a finished scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub used: usize,
    pub unused: usize,
    /// Supported files left out of the catalog.
    pub excluded: usize,
    /// Searchable files that couldn't be read.
    pub skipped: usize,
    pub strategy: Strategy,
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn from_verdicts(verdicts: &[UsageVerdict], strategy: Strategy, elapsed: Duration) -> Self {
        let used = verdicts.iter().filter(|v| v.is_used()).count();
        Self {
            total: verdicts.len(),
            used,
            unused: verdicts.len() - used,
            excluded: 0,
            skipped: 0,
            strategy,
            elapsed,
        }
    }
}
