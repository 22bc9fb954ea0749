//! Related-change prediction: symbols reachable within 2 call-graph hops
//! of an edited symbol, in either direction — a cheap "what else might
//! need updating" hint, not a static-analysis guarantee.

use crate::graph::{forward_graph, reverse_graph};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct RelatedSymbol {
    pub symbol: String,
    pub hops: usize,
    pub direction: &'static str,
}

const RELATED_CHANGE_DEPTH: usize = 2;

/// Union of the forward and reverse call graphs around `symbol_name`,
/// truncated to `RELATED_CHANGE_DEPTH` hops, sorted by hop count then
/// name so results are deterministic.
pub fn related_changes(store: &Store, symbol_name: &str) -> crate::error::CoreResult<Vec<RelatedSymbol>> {
    let mut related = Vec::new();

    for node in forward_graph(store, symbol_name, RELATED_CHANGE_DEPTH)?.nodes {
        if node.symbol != symbol_name {
            related.push(RelatedSymbol { symbol: node.symbol, hops: node.depth, direction: "callee" });
        }
    }
    for node in reverse_graph(store, symbol_name, RELATED_CHANGE_DEPTH)?.nodes {
        if node.symbol != symbol_name {
            related.push(RelatedSymbol { symbol: node.symbol, hops: node.depth, direction: "caller" });
        }
    }

    related.sort_by(|a, b| a.hops.cmp(&b.hops).then_with(|| a.symbol.cmp(&b.symbol)));
    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Call, File, FileRecord, Symbol};
    use crate::types::SymbolKind;
    use std::path::PathBuf;

    fn symbol(name: &str, line: u32) -> Symbol {
        Symbol {
            id: None,
            name: name.to_string(),
            kind: SymbolKind::Function,
            file_path: PathBuf::from("a.rs"),
            start_line: line,
            end_line: line,
            signature: format!("fn {name}()"),
            parent_class: None,
            docstring: None,
        }
    }

    #[test]
    fn includes_direct_callee_and_caller() {
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
                symbols: vec![symbol("caller", 1), symbol("target", 5), symbol("callee", 10)],
                calls: vec![
                    Call { caller_file: PathBuf::from("a.rs"), callee: "target".to_string(), line: 1 },
                    Call { caller_file: PathBuf::from("a.rs"), callee: "callee".to_string(), line: 5 },
                ],
                ..Default::default()
            })
            .unwrap();

        let related = related_changes(&store, "target").unwrap();
        let names: Vec<_> = related.iter().map(|r| r.symbol.as_str()).collect();
        assert!(names.contains(&"caller"));
        assert!(names.contains(&"callee"));
    }
}
