//! C5 — incremental updates: change detection, strategy selection, and
//! per-strategy application against the store (spec.md §4.4).

mod diff;
mod strategy;

pub use diff::{detect_via_filesystem, detect_via_git, ChangeSet, GitProbe, ModifiedFile, RealGitProbe};
pub use strategy::Strategy;

use crate::config::Settings;
use crate::model::Symbol;
use crate::parsing::parser_for;
use crate::store::{Store, SymbolFilter};
use crate::types::repo_relative;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub strategy: Strategy,
    pub files_reparsed: usize,
    pub updated_symbols: Vec<String>,
    pub removed_symbols: Vec<String>,
    pub affected_callers: Vec<PathBuf>,
    pub elapsed: Duration,
    /// Files whose per-file transaction failed; the run still covers the
    /// rest (spec.md §4.4 failure semantics).
    pub errors: Vec<(PathBuf, String)>,
}

/// Runs one incremental pass over `changes` against `store`, rooted at
/// `root`. `force_full` overrides the chooser per spec.md §4.4.
pub fn apply(
    store: &Store,
    root: &Path,
    changes: &ChangeSet,
    settings: &Settings,
    force_full: bool,
) -> crate::error::CoreResult<UpdateResult> {
    let start = std::time::Instant::now();
    let strategy = if force_full {
        Strategy::ForceFull
    } else {
        strategy::choose(changes, store.count_files()?.max(1))
    };

    let mut result = UpdateResult {
        strategy,
        ..Default::default()
    };

    for path in changes.added.iter().chain(changes.modified.iter().map(|m| &m.path)) {
        match apply_one_file(store, root, path, &changes.modified, strategy, settings) {
            Ok(update) => {
                result.files_reparsed += 1;
                result.updated_symbols.extend(update);
            }
            Err(e) => result.errors.push((path.clone(), e.to_string())),
        }
    }

    for path in &changes.deleted {
        let relative = repo_relative(root, path);
        let rel_str = relative.to_string_lossy().to_string();
        let removed: Vec<String> = store
            .query_symbols(&SymbolFilter {
                file_path: Some(rel_str.clone()),
                ..Default::default()
            })?
            .into_iter()
            .map(|s| s.name)
            .collect();
        store.delete_file(&rel_str)?;
        result.removed_symbols.extend(removed);
    }

    result.affected_callers = recompute_affected_callers(store, &result.updated_symbols)?;
    result.elapsed = start.elapsed();
    Ok(result)
}

fn apply_one_file(
    store: &Store,
    root: &Path,
    path: &Path,
    modified: &[ModifiedFile],
    strategy: Strategy,
    settings: &Settings,
) -> crate::error::CoreResult<Vec<String>> {
    let source = std::fs::read_to_string(path).map_err(|e| crate::error::CoreError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
    let Some(mut parser) = parser_for(&extension) else {
        return Ok(Vec::new());
    };
    let relative = repo_relative(root, path);
    let mut record = parser.parse_file(&relative, &source);

    let mut surgically_changed: Option<Vec<String>> = None;
    if strategy == Strategy::Surgical {
        if let Some(entry) = modified.iter().find(|m| m.path == path) {
            let existing = store.query_symbols(&SymbolFilter {
                file_path: Some(relative.to_string_lossy().to_string()),
                ..Default::default()
            })?;
            surgically_changed = Some(
                record
                    .symbols
                    .iter()
                    .filter(|s| entry.changed_line_ranges.iter().any(|(start, end)| s.range().overlaps_lines(*start, *end)))
                    .map(|s| s.name.clone())
                    .collect(),
            );
            record.symbols = merge_surgical(existing, record.symbols, &entry.changed_line_ranges);
        }
    }

    if record.symbols.len() > settings.limits.max_symbols_per_file {
        record.symbols.truncate(settings.limits.max_symbols_per_file);
    }

    let names: Vec<String> = match surgically_changed {
        Some(changed) => changed,
        None => record.symbols.iter().map(|s| s.name.clone()).collect(),
    };
    let metadata = std::fs::metadata(path).map_err(|e| crate::error::CoreError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    record.file = Some(crate::model::File {
        path: relative,
        size: metadata.len(),
        last_modified,
        extension,
        content_hash: None,
    });

    store.replace_file_record(&record)?;
    Ok(names)
}

/// For `surgical`, only symbols whose span overlaps a changed range are
/// re-emitted; everything else is preserved from the store unchanged
/// (spec.md §4.4).
fn merge_surgical(existing: Vec<Symbol>, freshly_parsed: Vec<Symbol>, changed_ranges: &[(u32, u32)]) -> Vec<Symbol> {
    let mut merged: Vec<Symbol> = existing
        .into_iter()
        .filter(|s| !changed_ranges.iter().any(|(start, end)| s.range().overlaps_lines(*start, *end)))
        .collect();

    for symbol in freshly_parsed {
        if changed_ranges.iter().any(|(start, end)| symbol.range().overlaps_lines(*start, *end)) {
            merged.push(symbol);
        }
    }

    crate::model::sort_symbols(&mut merged);
    merged
}

/// Recomputes only `symbol_references`/`method_calls` whose target
/// intersects `updated_symbol_names`, scoped to the affected files — never
/// a whole-index recompute (spec.md §4.4).
fn recompute_affected_callers(store: &Store, updated_symbol_names: &[String]) -> crate::error::CoreResult<Vec<PathBuf>> {
    let mut affected = std::collections::BTreeSet::new();
    for name in updated_symbol_names {
        for call in store.query_method_calls_filtered(Some(name), None, None, None)? {
            affected.insert(call.caller_file);
        }
        for reference in store.query_symbol_references_filtered(None, Some(name), None)? {
            affected.insert(reference.source_file);
        }
    }
    Ok(affected.into_iter().collect())
}
