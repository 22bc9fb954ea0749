//! Method resolution order linearization (spec.md §4.7).
//!
//! Languages in scope here (Rust, Python) don't share Python's true C3
//! linearization rules across multiple inheritance with diamonds the way
//! CPython does; rather than reimplement C3, this walks `base_classes`
//! depth-first, left to right, deduplicating to first occurrence. That
//! matches single-inheritance chains exactly and degrades gracefully on
//! multiple inheritance instead of rejecting it outright.

use crate::store::{Store, SymbolFilter};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct MroEntry {
    pub class_name: String,
    pub depth: usize,
}

/// Returns `class_name` followed by its ancestors in resolution order,
/// plus a confidence score (1.0 for a clean single-inheritance chain,
/// lower when a base class couldn't be resolved to a known symbol).
pub fn mro_of(store: &Store, class_name: &str) -> crate::error::CoreResult<(Vec<MroEntry>, f32)> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut unresolved = 0usize;
    let mut total = 0usize;

    walk(store, class_name, 0, &mut order, &mut seen, &mut unresolved, &mut total)?;

    let confidence = if total == 0 { 1.0 } else { 1.0 - (unresolved as f32 / total as f32) };
    Ok((order, confidence))
}

fn walk(
    store: &Store,
    class_name: &str,
    depth: usize,
    order: &mut Vec<MroEntry>,
    seen: &mut HashSet<String>,
    unresolved: &mut usize,
    total: &mut usize,
) -> crate::error::CoreResult<()> {
    if !seen.insert(class_name.to_string()) {
        return Ok(());
    }
    order.push(MroEntry { class_name: class_name.to_string(), depth });

    for base in base_classes_of(store, class_name)? {
        *total += 1;
        let symbols = store.query_symbols(&SymbolFilter { name: Some(base.clone()), ..Default::default() })?;
        if symbols.is_empty() {
            *unresolved += 1;
            continue;
        }
        walk(store, &base, depth + 1, order, seen, unresolved, total)?;
    }

    Ok(())
}

/// Base classes are carried in `signature` for class symbols (e.g.
/// `class Dog(Animal, Named):`), since the schema has no dedicated column.
/// Parses the parenthesized list the teacher's Python parser already wrote.
fn base_classes_of(store: &Store, class_name: &str) -> crate::error::CoreResult<Vec<String>> {
    let symbols = store.query_symbols(&SymbolFilter { name: Some(class_name.to_string()), ..Default::default() })?;
    let Some(class) = symbols.into_iter().find(|s| s.kind == crate::types::SymbolKind::Class) else {
        return Ok(Vec::new());
    };

    let Some(open) = class.signature.find('(') else { return Ok(Vec::new()) };
    let Some(close) = class.signature[open..].find(')') else { return Ok(Vec::new()) };
    let inside = &class.signature[open + 1..open + close];

    Ok(inside
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "object")
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Symbol;
    use crate::store::Store;
    use crate::types::SymbolKind;
    use std::path::PathBuf;

    fn class_symbol(name: &str, signature: &str) -> Symbol {
        Symbol {
            id: None,
            name: name.to_string(),
            kind: SymbolKind::Class,
            file_path: PathBuf::from("a.py"),
            start_line: 1,
            end_line: 10,
            signature: signature.to_string(),
            parent_class: None,
            docstring: None,
        }
    }

    #[test]
    fn linearizes_single_inheritance_chain() {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_file_record(&crate::model::FileRecord {
                file: Some(crate::model::File {
                    path: PathBuf::from("a.py"),
                    size: 1,
                    last_modified: 0,
                    extension: "py".into(),
                    content_hash: None,
                }),
                symbols: vec![
                    class_symbol("Animal", "class Animal:"),
                    class_symbol("Dog", "class Dog(Animal):"),
                ],
                ..Default::default()
            })
            .unwrap();

        let (order, confidence) = mro_of(&store, "Dog").unwrap();
        let names: Vec<_> = order.iter().map(|e| e.class_name.as_str()).collect();
        assert_eq!(names, vec!["Dog", "Animal"]);
        assert!((confidence - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unresolved_base_lowers_confidence() {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_file_record(&crate::model::FileRecord {
                file: Some(crate::model::File {
                    path: PathBuf::from("a.py"),
                    size: 1,
                    last_modified: 0,
                    extension: "py".into(),
                    content_hash: None,
                }),
                symbols: vec![class_symbol("Dog", "class Dog(Animal):")],
                ..Default::default()
            })
            .unwrap();

        let (_order, confidence) = mro_of(&store, "Dog").unwrap();
        assert!(confidence < 1.0);
    }
}
