//! Call-graph, MRO, and context commands (C8).

use anyhow::Result;
use cerberus_core::graph;
use cerberus_core::Store;
use std::path::PathBuf;

pub fn run_callees(store: &Store, symbol: &str, depth: usize, json: bool) -> Result<()> {
    print_graph(graph::forward_graph(store, symbol, depth)?, json)
}

pub fn run_callers(store: &Store, symbol: &str, depth: usize, json: bool) -> Result<()> {
    print_graph(graph::reverse_graph(store, symbol, depth)?, json)
}

fn print_graph(call_graph: graph::CallGraph, json: bool) -> Result<()> {
    if json {
        let nodes: Vec<_> = call_graph
            .nodes
            .iter()
            .map(|n| serde_json::json!({ "symbol": n.symbol, "depth": n.depth }))
            .collect();
        println!("{}", serde_json::json!({ "nodes": nodes, "edges": call_graph.edges, "truncated": call_graph.truncated }));
        return Ok(());
    }
    for node in call_graph.nodes.iter().skip(1) {
        println!("{}{}", "  ".repeat(node.depth), node.symbol);
    }
    if call_graph.truncated {
        println!("(truncated)");
    }
    Ok(())
}

pub fn run_paths(store: &Store, source: &str, target: &str, depth: usize, json: bool) -> Result<()> {
    let paths = graph::shortest_paths(store, source, target, depth)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }
    if paths.is_empty() {
        println!("No path found from '{source}' to '{target}' within depth {depth}");
        return Ok(());
    }
    for path in &paths {
        println!("{}", path.join(" -> "));
    }
    Ok(())
}

pub fn run_mro(store: &Store, class: &str, json: bool) -> Result<()> {
    let (order, confidence) = graph::mro_of(store, class)?;
    if json {
        let entries: Vec<_> = order
            .iter()
            .map(|e| serde_json::json!({ "class": e.class_name, "depth": e.depth }))
            .collect();
        println!("{}", serde_json::json!({ "mro": entries, "confidence": confidence }));
        return Ok(());
    }
    for entry in &order {
        println!("{}{}", "  ".repeat(entry.depth), entry.class_name);
    }
    println!("confidence: {confidence:.2}");
    Ok(())
}

pub fn run_context(store: &Store, symbol: &str, file: Option<PathBuf>, json: bool) -> Result<()> {
    let contents = file.map(std::fs::read_to_string).transpose()?;
    let bundle = graph::assemble(store, symbol, contents.as_deref())?;

    if json {
        let bases: Vec<_> = bundle
            .base_classes
            .iter()
            .map(|b| {
                serde_json::json!({
                    "class": b.class_name,
                    "members": b.members.iter().map(|(sig, doc)| serde_json::json!({ "signature": sig, "docstring": doc })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "target_source": bundle.target_source,
                "base_classes": bases,
                "callers": bundle.callers,
                "callees": bundle.callees,
                "related_imports": bundle.related_imports,
                "compression_ratio": bundle.compression_ratio,
            })
        );
        return Ok(());
    }

    if let Some(source) = &bundle.target_source {
        println!("--- {symbol} ---\n{source}\n");
    }
    for base in &bundle.base_classes {
        println!("base: {} ({} members)", base.class_name, base.members.len());
    }
    println!("callers: {}", bundle.callers.join(", "));
    println!("callees: {}", bundle.callees.join(", "));
    println!("compression ratio: {:.2}x", bundle.compression_ratio);
    Ok(())
}
