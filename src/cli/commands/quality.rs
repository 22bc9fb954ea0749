//! Pattern detection and related-change prediction (C12).

use anyhow::Result;
use cerberus_core::quality;
use cerberus_core::Store;

pub fn run_duplicates(store: &Store, json: bool) -> Result<()> {
    let dupes = quality::detect_duplicate_signatures(store)?;
    if json {
        let value: Vec<_> = dupes
            .iter()
            .map(|d| serde_json::json!({ "signature": d.signature, "symbols": d.symbols }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if dupes.is_empty() {
        println!("No duplicate signatures found");
        return Ok(());
    }
    for dupe in &dupes {
        println!("{}", dupe.signature);
        for (name, file) in &dupe.symbols {
            println!("  {name} ({file})");
        }
    }
    Ok(())
}

pub fn run_god_functions(store: &Store, threshold: Option<usize>, json: bool) -> Result<()> {
    let flagged = quality::detect_god_functions(store, threshold)?;
    if json {
        let value: Vec<_> = flagged
            .iter()
            .map(|g| serde_json::json!({ "symbol": g.symbol, "fan_in": g.fan_in, "fan_out": g.fan_out }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if flagged.is_empty() {
        println!("No symbols crossed the fan-in/out threshold");
        return Ok(());
    }
    for g in &flagged {
        println!("{} (fan-in={}, fan-out={})", g.symbol, g.fan_in, g.fan_out);
    }
    Ok(())
}

pub fn run_related(store: &Store, symbol: &str, json: bool) -> Result<()> {
    let related = quality::related_changes(store, symbol)?;
    if json {
        let value: Vec<_> = related
            .iter()
            .map(|r| serde_json::json!({ "symbol": r.symbol, "hops": r.hops, "direction": r.direction }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    for r in &related {
        println!("{} ({}, {} hop{})", r.symbol, r.direction, r.hops, if r.hops == 1 { "" } else { "s" });
    }
    Ok(())
}
