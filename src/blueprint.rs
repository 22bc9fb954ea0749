//! C10 — blueprint cache: a file's structural outline (symbols sorted by
//! line, top-level entries with nested class methods), cached by mtime
//! (spec.md §4.9).

use crate::model::{dedup_symbols, sort_symbols, Symbol};
use crate::store::{Store, SymbolFilter};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintEntry {
    pub name: String,
    pub kind: crate::types::SymbolKind,
    pub start_line: u32,
    pub signature: String,
    pub methods: Vec<BlueprintEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub file_path: String,
    pub entries: Vec<BlueprintEntry>,
}

#[derive(Debug, Default)]
pub struct BlueprintStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl BlueprintStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Returns the cached blueprint for `file_path` if `current_mtime` matches
/// what was cached, recomputing and writing back on a miss. `file_path`
/// is the same repo-relative key every other table uses.
pub fn get_or_build(
    store: &Store,
    stats: &BlueprintStats,
    file_path: &str,
    current_mtime: u64,
) -> crate::error::CoreResult<Blueprint> {
    if let Some(cached) = cached_if_valid(store, file_path, current_mtime)? {
        stats.hits.fetch_add(1, Ordering::Relaxed);
        return Ok(cached);
    }

    stats.misses.fetch_add(1, Ordering::Relaxed);
    let blueprint = build(store, file_path)?;
    let serialized = serde_json::to_string(&blueprint).map_err(|e| crate::error::CoreError::Other(e.to_string()))?;
    let created_at = crate::utils::get_utc_timestamp();
    store.put_blueprint(file_path, &serialized, current_mtime, created_at)?;
    Ok(blueprint)
}

fn cached_if_valid(store: &Store, file_path: &str, current_mtime: u64) -> crate::error::CoreResult<Option<Blueprint>> {
    let Some(cached_mtime) = store.get_blueprint_mtime(file_path)? else {
        return Ok(None);
    };
    if cached_mtime != current_mtime {
        return Ok(None);
    }
    let Some(serialized) = store.get_blueprint_blob(file_path)? else {
        return Ok(None);
    };
    Ok(serde_json::from_str(&serialized).ok())
}

/// Recomputes a blueprint straight from the store — no disk read, per
/// spec.md §4.9's "miss recomputes from the store".
fn build(store: &Store, file_path: &str) -> crate::error::CoreResult<Blueprint> {
    let mut symbols = store.query_symbols(&SymbolFilter {
        file_path: Some(file_path.to_string()),
        ..Default::default()
    })?;
    sort_symbols(&mut symbols);
    let symbols = dedup_symbols(symbols);

    let (top_level, methods): (Vec<Symbol>, Vec<Symbol>) =
        symbols.into_iter().partition(|s| s.parent_class.is_none());

    let entries = top_level
        .into_iter()
        .map(|symbol| {
            let nested = if symbol.kind == crate::types::SymbolKind::Class {
                methods
                    .iter()
                    .filter(|m| m.parent_class.as_deref() == Some(symbol.name.as_str()))
                    .cloned()
                    .map(to_entry)
                    .collect()
            } else {
                Vec::new()
            };
            let mut entry = to_entry(symbol);
            entry.methods = nested;
            entry
        })
        .collect();

    Ok(Blueprint {
        file_path: file_path.to_string(),
        entries,
    })
}

fn to_entry(symbol: Symbol) -> BlueprintEntry {
    BlueprintEntry {
        name: symbol.name,
        kind: symbol.kind,
        start_line: symbol.start_line,
        signature: symbol.signature,
        methods: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, FileRecord};
    use crate::types::SymbolKind;
    use std::path::PathBuf;

    fn symbol(name: &str, kind: SymbolKind, start: u32, parent: Option<&str>) -> Symbol {
        Symbol {
            id: None,
            name: name.to_string(),
            kind,
            file_path: PathBuf::from("a.py"),
            start_line: start,
            end_line: start,
            signature: format!("def {name}():"),
            parent_class: parent.map(str::to_string),
            docstring: None,
        }
    }

    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_file_record(&FileRecord {
                file: Some(File {
                    path: PathBuf::from("a.py"),
                    size: 1,
                    last_modified: 10,
                    extension: "py".into(),
                    content_hash: None,
                }),
                symbols: vec![
                    symbol("Animal", SymbolKind::Class, 1, None),
                    symbol("speak", SymbolKind::Method, 2, Some("Animal")),
                    symbol("helper", SymbolKind::Function, 10, None),
                ],
                ..Default::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn builds_nested_blueprint_from_store() {
        let store = seeded_store();
        let stats = BlueprintStats::default();
        let blueprint = get_or_build(&store, &stats, "a.py", 10).unwrap();

        assert_eq!(blueprint.entries.len(), 2);
        let animal = blueprint.entries.iter().find(|e| e.name == "Animal").unwrap();
        assert_eq!(animal.methods.len(), 1);
        assert_eq!(animal.methods[0].name, "speak");
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.hits(), 0);
    }

    #[test]
    fn second_call_with_same_mtime_is_a_cache_hit() {
        let store = seeded_store();
        let stats = BlueprintStats::default();
        get_or_build(&store, &stats, "a.py", 10).unwrap();
        get_or_build(&store, &stats, "a.py", 10).unwrap();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
    }

    #[test]
    fn mtime_mismatch_forces_a_miss() {
        let store = seeded_store();
        let stats = BlueprintStats::default();
        get_or_build(&store, &stats, "a.py", 10).unwrap();
        get_or_build(&store, &stats, "a.py", 20).unwrap();
        assert_eq!(stats.misses(), 2);
    }
}
