//! Per-language tree-sitter parsers implementing the C2 per-file contract
//! (spec.md §4.2): symbols, calls, imports, method calls, and best-effort
//! type bindings extracted from one source file.

mod python;
mod rust;

pub use python::PythonParser;
pub use rust::RustParser;

use crate::model::{Call, FileRecord, Import, MethodCall, TypeInfo};
use crate::types::SymbolKind;
use std::path::Path;

/// One language's tree-sitter-backed extractor. Each implementor owns its
/// own `tree_sitter::Parser` instance; parsers are not `Sync` so callers
/// hold one per worker thread rather than sharing.
pub trait LanguageParser {
    /// Parses `source` (the file at `path`, already read) into a full
    /// per-file record. Never panics on malformed input — a tree-sitter
    /// parse that can't produce a root node yields an empty record rather
    /// than propagating an error, so a single bad file never aborts a scan.
    fn parse_file(&mut self, path: &Path, source: &str) -> FileRecord;

    /// The file extensions (without the dot) this parser claims.
    fn extensions(&self) -> &'static [&'static str];
}

/// Returns a fresh parser for `extension`, or `None` if unsupported.
/// Rust + Python only — the pack's other grammars are out of scope here.
pub fn parser_for(extension: &str) -> Option<Box<dyn LanguageParser>> {
    match extension {
        "rs" => RustParser::new().ok().map(|p| Box::new(p) as Box<dyn LanguageParser>),
        "py" | "pyi" => PythonParser::new().ok().map(|p| Box::new(p) as Box<dyn LanguageParser>),
        _ => None,
    }
}

/// Shared helper: does `kind` look like scanner/compiler noise we never
/// want to treat as a real call target? (spec.md §4.7 "filter out
/// built-in/universal names").
pub fn is_noise_callee(name: &str) -> bool {
    const NOISE: &[&str] = &[
        "print", "println", "len", "str", "int", "float", "list", "dict", "range", "format",
        "vec", "Some", "None", "Ok", "Err", "into", "from", "clone", "to_string", "unwrap",
    ];
    NOISE.contains(&name)
}

pub(crate) fn empty_record() -> FileRecord {
    FileRecord::default()
}

pub(crate) fn push_call(calls: &mut Vec<Call>, caller_file: &Path, callee: String, line: u32) {
    if is_noise_callee(&callee) {
        return;
    }
    calls.push(Call {
        caller_file: caller_file.to_path_buf(),
        callee,
        line,
    });
}

pub(crate) fn push_method_call(
    calls: &mut Vec<MethodCall>,
    caller_file: &Path,
    line: u32,
    receiver: String,
    method: String,
    receiver_type: Option<String>,
) {
    calls.push(MethodCall {
        caller_file: caller_file.to_path_buf(),
        line,
        receiver,
        method,
        receiver_type,
    });
}

pub(crate) fn push_import(
    imports: &mut Vec<Import>,
    importer_file: &Path,
    imported_module: String,
    import_line: u32,
    imported_symbols: Vec<String>,
) {
    imports.push(Import {
        importer_file: importer_file.to_path_buf(),
        imported_module,
        import_line,
        imported_symbols,
    });
}

pub(crate) fn push_type_info(infos: &mut Vec<TypeInfo>, file: &Path, variable: String, line: u32, type_name: String) {
    infos.push(TypeInfo {
        variable,
        file: file.to_path_buf(),
        line,
        type_name,
    });
}

/// Maps a tree-sitter node kind shared by class-like constructs onto
/// `SymbolKind`, used by both language backends when deciding
/// function-vs-method.
pub(crate) fn function_or_method(is_nested_in_class: bool) -> SymbolKind {
    if is_nested_in_class {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    }
}
