//! Context assembly: bundle a symbol's source with just enough
//! surrounding material (base classes, callers, callees, imports) for a
//! downstream consumer to act on it without the whole file (spec.md §4.7).

use super::mro::mro_of;
use super::{forward_graph, reverse_graph, DEFAULT_MAX_DEPTH};
use crate::store::{Store, SymbolFilter};

/// A base class reduced to its signatures and docstrings — no bodies —
/// so the bundle stays small even for a deep hierarchy.
#[derive(Debug, Clone)]
pub struct SkeletonizedClass {
    pub class_name: String,
    pub members: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone)]
pub struct ContextBundle {
    pub target_source: Option<String>,
    pub base_classes: Vec<SkeletonizedClass>,
    pub callers: Vec<String>,
    pub callees: Vec<String>,
    pub related_imports: Vec<String>,
    /// `full_bytes / bundle_bytes`, reported so callers can judge how much
    /// was left out relative to a naive whole-file dump.
    pub compression_ratio: f32,
}

pub fn assemble(store: &Store, symbol_name: &str, file_contents: Option<&str>) -> crate::error::CoreResult<ContextBundle> {
    let symbols = store.query_symbols(&SymbolFilter { name: Some(symbol_name.to_string()), ..Default::default() })?;
    let Some(target) = symbols.first() else {
        return Err(crate::error::CoreError::SymbolNotFound { name: symbol_name.to_string() });
    };

    let target_source = file_contents.map(|src| extract_lines(src, target.start_line, target.end_line));

    let (mro, _confidence) = mro_of(store, symbol_name)?;
    let mut base_classes = Vec::new();
    for entry in mro.iter().skip(1) {
        let members = store
            .query_symbols(&SymbolFilter { parent_class: Some(entry.class_name.clone()), ..Default::default() })?
            .into_iter()
            .map(|s| (s.signature, s.docstring))
            .collect();
        base_classes.push(SkeletonizedClass { class_name: entry.class_name.clone(), members });
    }

    let callers = reverse_graph(store, symbol_name, DEFAULT_MAX_DEPTH.min(2))?
        .nodes
        .into_iter()
        .filter(|n| n.symbol != symbol_name)
        .map(|n| n.symbol)
        .collect();
    let callees = forward_graph(store, symbol_name, DEFAULT_MAX_DEPTH.min(2))?
        .nodes
        .into_iter()
        .filter(|n| n.symbol != symbol_name)
        .map(|n| n.symbol)
        .collect();

    let related_imports = store
        .query_import_links(Some(&target.file_path.to_string_lossy()))?
        .into_iter()
        .map(|l| l.imported_module)
        .collect();

    let compression_ratio = compute_ratio(file_contents, &target_source, &base_classes);

    Ok(ContextBundle {
        target_source,
        base_classes,
        callers,
        callees,
        related_imports,
        compression_ratio,
    })
}

fn extract_lines(src: &str, start: u32, end: u32) -> String {
    src.lines()
        .enumerate()
        .filter(|(i, _)| {
            let line_no = *i as u32 + 1;
            line_no >= start && line_no <= end
        })
        .map(|(_, l)| l)
        .collect::<Vec<_>>()
        .join("\n")
}

fn compute_ratio(full: Option<&str>, target: &Option<String>, bases: &[SkeletonizedClass]) -> f32 {
    let Some(full) = full else { return 1.0 };
    let full_len = full.len().max(1);
    let target_len = target.as_ref().map(|s| s.len()).unwrap_or(0);
    let bases_len: usize = bases
        .iter()
        .flat_map(|b| b.members.iter())
        .map(|(sig, doc)| sig.len() + doc.as_ref().map(|d| d.len()).unwrap_or(0))
        .sum();
    let bundle_len = (target_len + bases_len).max(1);
    full_len as f32 / bundle_len as f32
}
