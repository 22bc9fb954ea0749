//! Invariant and boundary-behavior checks that aren't tied to one of the
//! literal end-to-end scenarios: FTS/metadata symmetry, rescan
//! idempotence, the symbol-budget ceiling, preflight precedence, and
//! keyword-only retrieval without an embedder.

use cerberus_core::config::LimitsConfig;
use cerberus_core::limits::{self, CheckStatus, DiskProbe, EnforcementDecision, SymbolBudget};
use cerberus_core::retrieval::{self, FusionMethod, Mode};
use cerberus_core::store::SymbolFilter;
use cerberus_core::{index_full, index_incremental, Settings, Store};
use std::path::Path;

fn settings_for(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.workspace_root = Some(root.to_path_buf());
    settings.index_path = root.join(".cerberus/index.db");
    settings
}

fn open_store(settings: &Settings) -> Store {
    std::fs::create_dir_all(settings.index_path.parent().unwrap()).unwrap();
    Store::open(&settings.index_path).unwrap()
}

#[test]
fn fts_mirror_stays_symmetric_with_the_symbols_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("m.rs"), "fn first() {}\nfn second() {}\n").unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let report = store.check_integrity().unwrap();
    assert!(report.is_clean(), "orphans: {:?}", report.orphans);
    assert_eq!(report.symbol_count, report.fts_row_count);
}

#[test]
fn rescanning_an_unchanged_tree_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("stable.rs"), "fn untouched() {}\n").unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let before = store.query_symbols(&SymbolFilter::default()).unwrap();

    let result = index_incremental(&store, dir.path(), &settings, false).unwrap();

    assert_eq!(result.files_reparsed, 0);
    assert!(result.updated_symbols.is_empty());
    assert!(result.removed_symbols.is_empty());

    let after = store.query_symbols(&SymbolFilter::default()).unwrap();
    assert_eq!(before.len(), after.len());
}

#[test]
fn symbol_budget_stops_once_the_total_ceiling_is_crossed() {
    let mut limits = LimitsConfig::default();
    limits.max_total_symbols = 10;
    let mut budget = SymbolBudget::new(&limits);

    assert_eq!(budget.admit(6), EnforcementDecision::Allowed);
    assert_eq!(budget.admit(4), EnforcementDecision::Allowed);
    match budget.admit(1) {
        EnforcementDecision::Stopped { .. } => {}
        other => panic!("expected Stopped once the ceiling is crossed, got {other:?}"),
    }
    // Once stopped, the budget stays stopped even for a zero-size file.
    match budget.admit(0) {
        EnforcementDecision::Stopped { .. } => {}
        other => panic!("expected Stopped to be sticky, got {other:?}"),
    }
}

struct FixedDiskProbe(u64);

impl DiskProbe for FixedDiskProbe {
    fn free_bytes(&self, _path: &Path) -> std::io::Result<u64> {
        Ok(self.0)
    }
}

#[test]
fn preflight_fails_closed_on_low_disk_regardless_of_index_size() {
    let limits = LimitsConfig::default();
    let probe = FixedDiskProbe(1); // far below min_free_disk_mb
    let report = limits::preflight(&limits, Path::new("."), 0, &probe);

    assert_eq!(report.status, CheckStatus::Fail);
    assert!(!report.can_proceed);
}

#[test]
fn preflight_warn_threshold_blocks_only_in_strict_mode() {
    let mut limits = LimitsConfig::default();
    limits.max_index_size_mb = 100;
    limits.warn_threshold = 0.5;
    let probe = FixedDiskProbe(u64::MAX / 2);

    let large_index_bytes = 60_000_000; // 60% of the 100MB ceiling
    let lenient = limits::preflight(&limits, Path::new("."), large_index_bytes, &probe);
    assert_eq!(lenient.status, CheckStatus::Warn);
    assert!(lenient.can_proceed);

    limits.strict_mode = true;
    let strict = limits::preflight(&limits, Path::new("."), large_index_bytes, &probe);
    assert_eq!(strict.status, CheckStatus::Warn);
    assert!(!strict.can_proceed);
}

#[test]
fn keyword_search_works_without_an_embedder() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("query_target.rs"), "fn findme() {}\n").unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let hits = retrieval::search(
        &store,
        None,
        &settings.retrieval,
        "findme",
        Mode::Keyword,
        FusionMethod::ReciprocalRank,
        10,
    )
    .unwrap();

    assert!(hits.iter().any(|h| h.symbol.as_ref().is_some_and(|s| s.name == "findme")));
}
