//! File structural outline command (C10).

use anyhow::Result;
use cerberus_core::blueprint::{self, BlueprintEntry, BlueprintStats};
use cerberus_core::{Settings, Store};
use std::path::Path;

pub fn run_blueprint(store: &Store, settings: &Settings, file: &Path, json: bool) -> Result<()> {
    let root = settings.workspace_root.clone().unwrap_or_else(|| Path::new(".").to_path_buf());
    let absolute = root.join(file);
    let mtime = std::fs::metadata(&absolute)?
        .modified()?
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();

    let stats = BlueprintStats::default();
    let blueprint = blueprint::get_or_build(store, &stats, &file.to_string_lossy(), mtime)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&blueprint)?);
        return Ok(());
    }
    for entry in &blueprint.entries {
        print_entry(entry, 0);
    }
    Ok(())
}

fn print_entry(entry: &BlueprintEntry, depth: usize) {
    println!("{}{} ({:?}) :{}", "  ".repeat(depth), entry.name, entry.kind, entry.start_line);
    for method in &entry.methods {
        print_entry(method, depth + 1);
    }
}
