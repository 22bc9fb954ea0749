//! End-to-end scenarios against a real on-disk store: scan, query,
//! incremental update, mutate/undo, batch rollback, and graph cycle
//! safety all go through the same public API a CLI invocation would use.

use cerberus_core::{index_full, index_incremental, mutation, Settings, Store};
use std::path::{Path, PathBuf};

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
fn fresh_scan_counts_files_and_symbols() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.rs"),
        "fn one() {}\nfn two() {}\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.rs"),
        "struct S1;\nstruct S2;\nstruct S3;\nfn f1() {}\nfn f2() {}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("c.rs"), "fn lonely() {}\n").unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);

    let report = index_full(&store, dir.path(), &settings).unwrap();

    assert_eq!(report.files_parsed, 3);
    assert_eq!(report.symbols_indexed, 8);
    assert_eq!(store.count_files().unwrap(), 3);
    assert_eq!(
        store
            .query_symbols(&cerberus_core::store::SymbolFilter::default())
            .unwrap()
            .len(),
        8
    );
}

#[test]
fn exact_symbol_lookup_returns_precise_span_and_signature() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("greet.py"),
        "import sys\n\n\ndef hello(name):\n    greeting = f\"hi {name}\"\n    return greeting\n",
    )
    .unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let matches = store
        .query_symbols(&cerberus_core::store::SymbolFilter {
            name: Some("hello".to_string()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(matches.len(), 1);
    let symbol = &matches[0];
    assert_eq!(symbol.kind.as_str(), "function");
    assert_eq!(symbol.start_line, 4);
    assert_eq!(symbol.end_line, 6);
    assert!(symbol.signature.starts_with("def hello"), "signature was: {}", symbol.signature);
}

#[test]
fn incremental_update_after_localized_edit_reports_one_symbol_touched() {
    let dir = tempfile::tempdir().unwrap();
    // Enough sibling files that a single modification stays under the
    // incremental ratio ceiling even without git-derived line ranges.
    for i in 0..9 {
        std::fs::write(dir.path().join(format!("sibling_{i}.rs")), format!("fn s{i}() {{}}\n")).unwrap();
    }
    let target = dir.path().join("target.rs");
    // A single symbol in the file, with its body at lines 10-12, so the
    // reparsed symbol set before and after the edit is exactly one name.
    let before = "// line 1\n// line 2\n// line 3\n// line 4\n// line 5\n// line 6\n// line 7\n// line 8\nfn compute(x: i32) -> i32 {\n    x + 1\n}\n";
    std::fs::write(&target, before).unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    // Mtimes are second-granularity; force this edit into a new second so
    // filesystem-mode change detection actually observes it.
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let after = "// line 1\n// line 2\n// line 3\n// line 4\n// line 5\n// line 6\n// line 7\n// line 8\nfn compute(x: i32) -> i32 {\n    x + 2\n}\n";
    std::fs::write(&target, after).unwrap();

    let result = index_incremental(&store, dir.path(), &settings, false).unwrap();

    assert!(
        matches!(result.strategy, cerberus_core::incremental::Strategy::Surgical | cerberus_core::incremental::Strategy::Incremental),
        "strategy was {:?}",
        result.strategy
    );
    assert_eq!(result.files_reparsed, 1);
    assert_eq!(result.updated_symbols.len(), 1);
    assert_eq!(result.updated_symbols[0], "compute");
    assert!(result.removed_symbols.is_empty());
}

#[test]
fn edit_then_undo_restores_bytes_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lib.rs");
    let original = "fn target() -> i32 {\n    1\n}\n";
    std::fs::write(&file, original).unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let outcome = mutation::edit(
        &store,
        dir.path(),
        &settings.limits,
        Path::new("lib.rs"),
        "target",
        "fn target() -> i32 {\n    2\n}\n",
        &mutation::EditOptions::default(),
    )
    .unwrap();

    let edited = std::fs::read_to_string(&file).unwrap();
    assert_ne!(edited, original);
    assert!(edited.contains('2'));

    mutation::undo(&store, dir.path(), &settings.limits, outcome.transaction_id).unwrap();

    let restored = std::fs::read_to_string(&file).unwrap();
    assert_eq!(restored, original);

    let resynced = store
        .query_symbols(&cerberus_core::store::SymbolFilter {
            name: Some("target".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(resynced.len(), 1);
    assert_eq!(resynced[0].signature, "fn target() -> i32");
}

#[test]
fn batch_rolls_back_every_file_when_verify_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file_a = dir.path().join("a.rs");
    let file_b = dir.path().join("b.rs");
    let original_a = "fn alpha() -> i32 {\n    1\n}\n";
    let original_b = "fn beta() -> i32 {\n    2\n}\n";
    std::fs::write(&file_a, original_a).unwrap();
    std::fs::write(&file_b, original_b).unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let ops = vec![
        mutation::Operation::Edit {
            file_path: PathBuf::from("a.rs"),
            symbol_name: "alpha".to_string(),
            new_code: "fn alpha() -> i32 {\n    100\n}\n".to_string(),
            options: mutation::EditOptions::default(),
        },
        mutation::Operation::Edit {
            file_path: PathBuf::from("b.rs"),
            symbol_name: "beta".to_string(),
            new_code: "fn beta() -> i32 {\n    200\n}\n".to_string(),
            options: mutation::EditOptions::default(),
        },
    ];

    let result = mutation::batch(&store, dir.path(), &settings.limits, &ops, Some("exit 1"));

    assert!(result.is_err(), "batch should fail when the verify command exits non-zero");
    assert_eq!(std::fs::read_to_string(&file_a).unwrap(), original_a);
    assert_eq!(std::fs::read_to_string(&file_b).unwrap(), original_b);
}

#[test]
fn call_graph_handles_a_b_cycle_without_duplicating_nodes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cycle.rs"),
        "fn a() {\n    b();\n}\n\nfn b() {\n    a();\n}\n",
    )
    .unwrap();

    let settings = settings_for(dir.path());
    let store = open_store(&settings);
    index_full(&store, dir.path(), &settings).unwrap();

    let graph = cerberus_core::graph::forward_graph(&store, "a", 5).unwrap();

    assert_eq!(graph.nodes.len(), 2);
    assert!(!graph.truncated);
    assert!(graph.edges.contains(&("a".to_string(), "b".to_string())));
    assert!(graph.edges.contains(&("b".to_string(), "a".to_string())));
}
