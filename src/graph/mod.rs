//! C8 — import resolution, MRO linearization, call graphs, path tracing,
//! and context assembly (spec.md §4.7).

mod context;
mod mro;
mod resolve;

pub use context::{assemble, ContextBundle, SkeletonizedClass};
pub use mro::{mro_of, MroEntry};
pub use resolve::resolve_imports;

use crate::model::{Call, MethodCall};
use crate::parsing::is_noise_callee;
use crate::store::Store;
use std::collections::{HashSet, VecDeque};

pub const DEFAULT_MAX_NODES: usize = 100;
pub const DEFAULT_MAX_EDGES: usize = 200;
pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub symbol: String,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<(String, String)>,
    pub truncated: bool,
}

/// BFS over `calls`/`method_calls` outward from `root_symbol`, depth-bounded
/// and node/edge-capped, with built-in/universal names filtered.
pub fn forward_graph(store: &Store, root_symbol: &str, max_depth: usize) -> crate::error::CoreResult<CallGraph> {
    bfs(store, root_symbol, max_depth, Direction::Forward)
}

/// Same traversal over the reverse edges: who calls `root_symbol`.
pub fn reverse_graph(store: &Store, root_symbol: &str, max_depth: usize) -> crate::error::CoreResult<CallGraph> {
    bfs(store, root_symbol, max_depth, Direction::Reverse)
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Reverse,
}

fn bfs(store: &Store, root_symbol: &str, max_depth: usize, direction: Direction) -> crate::error::CoreResult<CallGraph> {
    let mut visited = HashSet::new();
    let mut nodes = vec![GraphNode { symbol: root_symbol.to_string(), depth: 0 }];
    let mut edges = Vec::new();
    let mut truncated = false;
    visited.insert(root_symbol.to_string());

    let mut queue = VecDeque::new();
    queue.push_back((root_symbol.to_string(), 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        if nodes.len() >= DEFAULT_MAX_NODES || edges.len() >= DEFAULT_MAX_EDGES {
            truncated = true;
            break;
        }

        for neighbor in neighbors(store, &current, direction)? {
            if is_noise_callee(&neighbor) {
                continue;
            }
            let (from, to) = match direction {
                Direction::Forward => (current.clone(), neighbor.clone()),
                Direction::Reverse => (neighbor.clone(), current.clone()),
            };
            if edges.len() >= DEFAULT_MAX_EDGES {
                truncated = true;
                break;
            }
            edges.push((from, to));

            if visited.insert(neighbor.clone()) {
                if nodes.len() >= DEFAULT_MAX_NODES {
                    truncated = true;
                    break;
                }
                nodes.push(GraphNode { symbol: neighbor.clone(), depth: depth + 1 });
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    Ok(CallGraph { nodes, edges, truncated })
}

fn neighbors(store: &Store, symbol: &str, direction: Direction) -> crate::error::CoreResult<Vec<String>> {
    match direction {
        Direction::Forward => {
            let calls: Vec<Call> = store
                .query_calls(None)?
                .into_iter()
                .filter(|c| caller_symbol_matches(store, c, symbol))
                .collect();
            Ok(calls.into_iter().map(|c| c.callee).collect())
        }
        Direction::Reverse => {
            let calls: Vec<Call> = store.query_calls(None)?.into_iter().filter(|c| c.callee == symbol).collect();
            let mut out = Vec::new();
            for call in calls {
                if let Some(caller) = containing_symbol(store, &call.caller_file, call.line)? {
                    out.push(caller);
                }
            }
            Ok(out)
        }
    }
}

/// Calls only carry `(caller_file, callee, line)`; resolving which symbol
/// in that file actually contains the call site means finding the
/// smallest symbol span covering the line.
fn containing_symbol(store: &Store, file: &std::path::Path, line: u32) -> crate::error::CoreResult<Option<String>> {
    let symbols = store.query_symbols(&crate::store::SymbolFilter {
        file_path: Some(file.to_string_lossy().to_string()),
        ..Default::default()
    })?;
    Ok(symbols
        .into_iter()
        .filter(|s| s.start_line <= line && line <= s.end_line)
        .min_by_key(|s| s.end_line - s.start_line)
        .map(|s| s.name))
}

fn caller_symbol_matches(store: &Store, call: &Call, symbol: &str) -> bool {
    containing_symbol(store, &call.caller_file, call.line)
        .ok()
        .flatten()
        .is_some_and(|name| name == symbol)
}

/// BFS from `source` to `target` over the forward graph; returns up to 3
/// shortest paths, each a list of symbol names (spec.md §4.7).
pub fn shortest_paths(
    store: &Store,
    source: &str,
    target: &str,
    max_depth: usize,
) -> crate::error::CoreResult<Vec<Vec<String>>> {
    let mut paths = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(vec![source.to_string()]);
    let mut visited_at_depth: HashSet<(String, usize)> = HashSet::new();

    while let Some(path) = queue.pop_front() {
        if paths.len() >= 3 {
            break;
        }
        let current = path.last().unwrap().clone();
        if current == target && path.len() > 1 {
            paths.push(path);
            continue;
        }
        if path.len() - 1 >= max_depth {
            continue;
        }
        for neighbor in neighbors(store, &current, Direction::Forward)? {
            if is_noise_callee(&neighbor) || path.contains(&neighbor) {
                continue;
            }
            let key = (neighbor.clone(), path.len());
            if !visited_at_depth.insert(key) {
                continue;
            }
            let mut next = path.clone();
            next.push(neighbor);
            queue.push_back(next);
        }
    }

    Ok(paths)
}

#[derive(Debug, Clone)]
pub struct MethodCallEdge {
    pub call: MethodCall,
}
