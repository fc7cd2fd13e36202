use crate::deps::DependencyResolver;
use crate::models::UsageVerdict;
use crate::scan::ReferenceScanner;
use async_stream::stream;
use futures::future::join_all;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use unref_asyncutils::yield_now;
use unref_catalog::AssetRecord;

/// Default number of assets checked concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Progress events emitted by [`analyze_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the catalog size.
/// 2. [`DependenciesResolved`](Self::DependenciesResolved): once, unless the
///    catalog is empty.
/// 3. [`Checking`](Self::Checking) and [`Checked`](Self::Checked): once per
///    asset each. Every asset of a batch is announced before any of them is
///    checked.
/// 4. [`Complete`](Self::Complete): exactly once.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Started { total: usize },
    /// Number of identifiers found to be used through a dependency family.
    DependenciesResolved { used_by_dependency: usize },
    /// An asset is about to be checked. `index` is one-based.
    Checking { index: usize, total: usize, name: String },
    Checked(UsageVerdict),
    Complete,
}

/// Streams the analysis of `assets` against the searchable files under
/// `search_root`.
///
/// Dependency resolution runs to completion first. Assets are then checked
/// `batch_size` at a time, the lookups of one batch concurrently, with a
/// cooperative yield after every batch. Verdicts come out in catalog order.
/// An empty catalog skips straight to [`Complete`](AnalysisEvent::Complete)
/// without touching the scanner.
pub fn analyze_stream<'a>(
    scanner: &'a ReferenceScanner,
    assets: &'a [AssetRecord],
    search_root: &'a Path,
    batch_size: usize,
) -> impl Stream<Item = AnalysisEvent> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let total = assets.len();
        yield AnalysisEvent::Started { total };
        if assets.is_empty() {
            yield AnalysisEvent::Complete;
            return;
        }

        let used_by_dependency = DependencyResolver::new(scanner).resolve(assets, search_root).await;
        yield AnalysisEvent::DependenciesResolved { used_by_dependency: used_by_dependency.len() };

        for (batch_index, batch) in assets.chunks(batch_size.max(1)).enumerate() {
            let offset = batch_index * batch_size.max(1);
            for (i, asset) in batch.iter().enumerate() {
                yield AnalysisEvent::Checking { index: offset + i + 1, total, name: asset.name.clone() };
            }
            let verdicts = join_all(batch.iter().map(|asset| check(scanner, asset, search_root, &used_by_dependency))).await;
            for verdict in verdicts {
                yield AnalysisEvent::Checked(verdict);
            }
            yield_now().await;
        }

        yield AnalysisEvent::Complete;
    })
}

async fn check(
    scanner: &ReferenceScanner,
    asset: &AssetRecord,
    search_root: &Path,
    used_by_dependency: &HashSet<String>,
) -> UsageVerdict {
    let references = scanner.find_references(&asset.id, search_root).await;
    UsageVerdict::new(asset.clone(), references, used_by_dependency.contains(&asset.id))
}

/// Collecting form of [`analyze_stream`]. `on_progress(index, total, name)`
/// is called once per asset as it begins processing.
pub async fn analyze(
    scanner: &ReferenceScanner,
    assets: &[AssetRecord],
    search_root: &Path,
    batch_size: usize,
    mut on_progress: impl FnMut(usize, usize, &str),
) -> Vec<UsageVerdict> {
    let mut verdicts = Vec::with_capacity(assets.len());
    let mut events = std::pin::pin!(analyze_stream(scanner, assets, search_root, batch_size));
    while let Some(event) = events.next().await {
        match event {
            AnalysisEvent::Checking { index, total, name } => on_progress(index, total, &name),
            AnalysisEvent::Checked(verdict) => verdicts.push(verdict),
            AnalysisEvent::Started { .. } | AnalysisEvent::DependenciesResolved { .. } | AnalysisEvent::Complete => {},
        }
    }
    verdicts
}
