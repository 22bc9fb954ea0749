//! Top-level orchestrator tying the scanner, limits enforcer, store, and
//! incremental engine together: `scan(dir) -> C2 stream -> C3 gate ->
//! C4 write` (spec.md §2 "Data flow").

use crate::config::Settings;
use crate::error::{CoreError, CoreResult};
use crate::graph;
use crate::incremental::{self, ChangeSet, RealGitProbe};
use crate::limits::{self, EnforcementDecision, SymbolBudget, SystemDiskProbe};
use crate::scanner::{self, ScanOutcome};
use crate::store::Store;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub files_skipped_too_large: usize,
    pub files_skipped_unsupported: usize,
    pub files_failed: usize,
    pub symbols_indexed: usize,
    pub stopped_early: Option<String>,
    pub elapsed: Duration,
}

/// Full scan + index from scratch: preflight, walk, parse, and write every
/// file in `root` under the enforcer's running symbol budget.
pub fn index_full(store: &Store, root: &Path, settings: &Settings) -> CoreResult<IndexReport> {
    let start = Instant::now();
    let index_size = store.file_size_bytes(&settings.resolved_index_path());
    let preflight = limits::preflight(&settings.limits, root, index_size, &SystemDiskProbe);
    if !preflight.can_proceed {
        return Err(CoreError::Preflight(
            preflight
                .checks
                .into_iter()
                .filter(|c| c.status != limits::CheckStatus::Ok)
                .map(|c| format!("{}: {}", c.name, c.detail))
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    let outcomes = scanner::scan(root, &settings.indexing, &settings.limits);
    let mut report = IndexReport::default();
    let mut budget = SymbolBudget::new(&settings.limits);

    for outcome in outcomes {
        report.files_scanned += 1;
        match outcome {
            ScanOutcome::Parsed(record) => match budget.admit(record.symbols.len()) {
                EnforcementDecision::Allowed => {
                    report.symbols_indexed += record.symbols.len();
                    report.files_parsed += 1;
                    store.replace_file_record(&record)?;
                }
                EnforcementDecision::Skipped { .. } => {
                    report.files_skipped_too_large += 1;
                }
                EnforcementDecision::Stopped { reason } => {
                    report.stopped_early = Some(reason);
                    break;
                }
            },
            ScanOutcome::TooLarge { .. } => report.files_skipped_too_large += 1,
            ScanOutcome::Unsupported { .. } => report.files_skipped_unsupported += 1,
            ScanOutcome::ParseFailed { path, reason } => {
                report.files_failed += 1;
                tracing::warn!("{}: parse failed: {reason}", path.display());
            }
        }
    }

    graph::resolve_imports(store)?;
    store.checkpoint()?;
    report.elapsed = start.elapsed();
    Ok(report)
}

/// Detects changes since the last indexed state (git if available,
/// filesystem snapshot otherwise) and runs one incremental pass.
pub fn index_incremental(
    store: &Store,
    root: &Path,
    settings: &Settings,
    force_full: bool,
) -> CoreResult<incremental::UpdateResult> {
    let changes = detect_changes(store, root, settings)?;
    let result = incremental::apply(store, root, &changes, settings, force_full)?;
    graph::resolve_imports(store)?;
    Ok(result)
}

fn detect_changes(store: &Store, root: &Path, settings: &Settings) -> CoreResult<ChangeSet> {
    let probe = RealGitProbe { timeout: Duration::from_secs(10) };
    if let Some(changes) = incremental::detect_via_git(store, root, &probe) {
        return Ok(changes);
    }

    let mut candidates: std::collections::BTreeSet<std::path::PathBuf> =
        scanner::discover_files(root, &settings.indexing).into_iter().collect();
    for symbol in store.query_symbols(&crate::store::SymbolFilter::default())? {
        candidates.insert(root.join(&symbol.file_path));
    }

    Ok(incremental::detect_via_filesystem(store, root, &candidates.into_iter().collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn full_index_populates_the_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn hello() {}\n").unwrap();

        let store = Store::open_in_memory().unwrap();
        let mut settings = Settings::default();
        settings.indexing.extensions = vec!["rs".to_string()];

        let report = index_full(&store, dir.path(), &settings).unwrap();
        assert_eq!(report.files_parsed, 1);
        assert!(report.symbols_indexed >= 1);
    }
}
