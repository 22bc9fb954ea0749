//! Two cheap, store-only pattern checks: identical signatures across
//! distinct symbols, and "god functions" by call fan-in/out.

use crate::graph::{forward_graph, reverse_graph};
use crate::store::{Store, SymbolFilter};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DuplicateSignature {
    pub signature: String,
    pub symbols: Vec<(String, String)>,
}

/// Groups every symbol by its exact `signature` text; anything sharing a
/// signature with more than one distinct `(name, file)` pair is flagged.
/// Overload-by-signature in Rust makes this noisier there than in Python,
/// so it's a hint, not a hard rule.
pub fn detect_duplicate_signatures(store: &Store) -> crate::error::CoreResult<Vec<DuplicateSignature>> {
    let symbols = store.query_symbols(&SymbolFilter::default())?;
    let mut by_signature: HashMap<String, Vec<(String, String)>> = HashMap::new();

    for symbol in symbols {
        by_signature
            .entry(symbol.signature.clone())
            .or_default()
            .push((symbol.name, symbol.file_path.to_string_lossy().to_string()));
    }

    Ok(by_signature
        .into_iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .map(|(signature, symbols)| DuplicateSignature { signature, symbols })
        .collect())
}

#[derive(Debug, Clone)]
pub struct GodFunction {
    pub symbol: String,
    pub fan_in: usize,
    pub fan_out: usize,
}

const DEFAULT_FAN_THRESHOLD: usize = 15;

/// Flags symbols whose direct caller + callee count crosses
/// `fan_threshold` — a coarse proxy for "too central, too coupled" that
/// reuses C8's BFS at depth 1 rather than a bespoke query.
pub fn detect_god_functions(store: &Store, fan_threshold: Option<usize>) -> crate::error::CoreResult<Vec<GodFunction>> {
    let threshold = fan_threshold.unwrap_or(DEFAULT_FAN_THRESHOLD);
    let symbols = store.query_symbols(&SymbolFilter::default())?;
    let mut flagged = Vec::new();

    for symbol in symbols {
        let fan_in = reverse_graph(store, &symbol.name, 1)?.nodes.len().saturating_sub(1);
        let fan_out = forward_graph(store, &symbol.name, 1)?.nodes.len().saturating_sub(1);
        if fan_in + fan_out >= threshold {
            flagged.push(GodFunction { symbol: symbol.name, fan_in, fan_out });
        }
    }

    Ok(flagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Call, File, FileRecord, Symbol};
    use crate::types::SymbolKind;
    use std::path::PathBuf;

    fn symbol(name: &str, signature: &str) -> Symbol {
        Symbol {
            id: None,
            name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: PathBuf::from("a.rs"),
            start_line: 1,
            end_line: 1,
            signature: signature.to_string(),
            parent_class: None,
            docstring: None,
        }
    }

    #[test]
    fn flags_symbols_sharing_a_signature() {
        let store = Store::open_in_memory().unwrap();
        store
            .replace_file_record(&FileRecord {
                file: Some(File {
                    path: PathBuf::from("a.rs"),
                    size: 1,
                    last_modified: 0,
                    extension: "rs".into(),
                    content_hash: None,
                }),
                symbols: vec![symbol("a", "fn run()"), symbol("b", "fn run()"), symbol("c", "fn other()")],
                ..Default::default()
            })
            .unwrap();

        let dupes = detect_duplicate_signatures(&store).unwrap();
        assert_eq!(dupes.len(), 1);
        assert_eq!(dupes[0].symbols.len(), 2);
    }

    #[test]
    fn flags_a_symbol_whose_fan_exceeds_the_threshold() {
        let store = Store::open_in_memory().unwrap();
        let mut symbols = vec![symbol("hub", "fn hub()")];
        let mut calls = Vec::new();
        for i in 0..5u32 {
            let caller_line = i * 10 + 1;
            let mut caller = symbol(&format!("caller_{i}"), "fn caller()");
            caller.start_line = caller_line;
            caller.end_line = caller_line;
            symbols.push(caller);
            calls.push(Call { caller_file: PathBuf::from("a.rs"), callee: "hub".to_string(), line: caller_line });
        }

        store
            .replace_file_record(&FileRecord {
                file: Some(File {
                    path: PathBuf::from("a.rs"),
                    size: 1,
                    last_modified: 0,
                    extension: "rs".into(),
                    content_hash: None,
                }),
                symbols,
                calls,
                ..Default::default()
            })
            .unwrap();

        let flagged = detect_god_functions(&store, Some(1)).unwrap();
        assert!(flagged.iter().any(|g| g.symbol == "hub"));
    }
}
