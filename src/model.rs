//! Domain entities mirrored 1:1 onto the store's tables (spec.md §3).
//!
//! These are plain data carriers — no behavior lives here beyond small
//! dedup/sort helpers. Parsing produces them, the store persists them,
//! retrieval and graphs hydrate them back out.

use crate::types::{ReferenceKind, Range, SymbolId, SymbolKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub path: PathBuf,
    pub size: u64,
    pub last_modified: u64,
    pub extension: String,
    pub content_hash: Option<String>,
}

/// Identity per spec.md §3: `(file_path, parent_class, name, start_line)`.
/// Stores persist duplicates rather than deduping at write time; callers
/// dedupe on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: Option<SymbolId>,
    pub name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
    pub signature: String,
    pub parent_class: Option<String>,
    pub docstring: Option<String>,
}

impl Symbol {
    pub fn range(&self) -> Range {
        Range::new(self.start_line, 0, self.end_line, 0)
    }

    /// The dedup key spec.md §3 mandates readers apply over store results.
    pub fn dedup_key(&self) -> (String, u32, u32, SymbolKind, Option<String>) {
        (
            self.name.clone(),
            self.start_line,
            self.end_line,
            self.kind,
            self.parent_class.clone(),
        )
    }
}

/// Sorts symbols `(start_line, name)` within a file, per spec.md §3.
pub fn sort_symbols(symbols: &mut [Symbol]) {
    symbols.sort_by(|a, b| a.start_line.cmp(&b.start_line).then_with(|| a.name.cmp(&b.name)));
}

/// Removes duplicates by spec.md §3's dedup tuple, keeping the first
/// occurrence (symbols are expected to already be sorted).
pub fn dedup_symbols(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut seen = std::collections::HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.dedup_key()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub importer_file: PathBuf,
    pub imported_module: String,
    pub import_line: u32,
    pub imported_symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLink {
    pub importer_file: PathBuf,
    pub imported_module: String,
    pub import_line: u32,
    pub imported_symbols: Vec<String>,
    pub definition_file: Option<PathBuf>,
    pub definition_symbol: Option<String>,
}

impl ImportLink {
    pub fn unresolved(import: Import) -> Self {
        Self {
            importer_file: import.importer_file,
            imported_module: import.imported_module,
            import_line: import.import_line,
            imported_symbols: import.imported_symbols,
            definition_file: None,
            definition_symbol: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.definition_file.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub caller_file: PathBuf,
    pub callee: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub caller_file: PathBuf,
    pub line: u32,
    pub receiver: String,
    pub method: String,
    pub receiver_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReference {
    pub source_file: PathBuf,
    pub source_line: u32,
    pub source_symbol: String,
    pub reference_type: ReferenceKind,
    pub target_file: Option<PathBuf>,
    pub target_symbol: Option<String>,
    pub target_type: Option<String>,
    pub confidence: f32,
    pub resolution_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub variable: String,
    pub file: PathBuf,
    pub line: u32,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub symbol_id: SymbolId,
    pub vector: Vec<f32>,
    pub model_name: String,
}

/// One file's worth of reverse-patch material for a transaction, per
/// spec.md §3. `original_content` is `None` when the file was created by
/// the operation (so undo means delete, not restore empty content).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversePatch {
    pub file_path: PathBuf,
    pub original_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub operation_type: String,
    pub files: Vec<PathBuf>,
    pub reverse_patches: Vec<ReversePatch>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintCacheEntry {
    pub file_path: PathBuf,
    pub serialized_blueprint: String,
    pub source_mtime: u64,
    pub created_at: u64,
}

impl BlueprintCacheEntry {
    pub fn is_valid(&self, current_mtime: u64) -> bool {
        self.source_mtime == current_mtime
    }
}

/// The per-file bundle C2 emits for every scanned file (spec.md §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRecord {
    pub file: Option<File>,
    pub symbols: Vec<Symbol>,
    pub calls: Vec<Call>,
    pub imports: Vec<Import>,
    pub method_calls: Vec<MethodCall>,
    pub type_infos: Vec<TypeInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str, start: u32, end: u32) -> Symbol {
        Symbol {
            id: None,
            name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: PathBuf::from("a.rs"),
            start_line: start,
            end_line: end,
            signature: format!("fn {name}()"),
            parent_class: None,
            docstring: None,
        }
    }

    #[test]
    fn sort_orders_by_line_then_name() {
        let mut symbols = vec![sym("b", 10, 12), sym("a", 10, 12), sym("z", 1, 2)];
        sort_symbols(&mut symbols);
        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "b"]);
    }

    #[test]
    fn dedup_keeps_first_of_identical_tuples() {
        let symbols = vec![sym("f", 1, 2), sym("f", 1, 2), sym("g", 3, 4)];
        let deduped = dedup_symbols(symbols);
        assert_eq!(deduped.len(), 2);
    }
}
