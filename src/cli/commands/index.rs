//! Index and reindex commands.

use anyhow::Result;
use cerberus_core::{index_full, index_incremental, Settings, Store};
use std::path::{Path, PathBuf};

pub fn run_index(store: &Store, settings: &Settings, path: Option<PathBuf>, json: bool) -> Result<()> {
    let root = resolve_root(settings, path);
    let report = index_full(store, &root, settings)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "files_scanned": report.files_scanned,
                "files_parsed": report.files_parsed,
                "files_skipped_too_large": report.files_skipped_too_large,
                "files_skipped_unsupported": report.files_skipped_unsupported,
                "files_failed": report.files_failed,
                "symbols_indexed": report.symbols_indexed,
                "stopped_early": report.stopped_early,
                "elapsed_ms": report.elapsed.as_millis(),
            })
        );
    } else {
        println!("Indexed {} files ({} symbols)", report.files_parsed, report.symbols_indexed);
        if report.files_skipped_too_large > 0 {
            println!("  skipped (too large): {}", report.files_skipped_too_large);
        }
        if report.files_skipped_unsupported > 0 {
            println!("  skipped (unsupported): {}", report.files_skipped_unsupported);
        }
        if report.files_failed > 0 {
            println!("  parse failures: {}", report.files_failed);
        }
        if let Some(reason) = report.stopped_early {
            println!("  stopped early: {reason}");
        }
    }
    Ok(())
}

pub fn run_reindex(store: &Store, settings: &Settings, path: Option<PathBuf>, force_full: bool, json: bool) -> Result<()> {
    let root = resolve_root(settings, path);
    let result = index_incremental(store, &root, settings, force_full)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "strategy": format!("{:?}", result.strategy),
                "files_reparsed": result.files_reparsed,
                "updated_symbols": result.updated_symbols,
                "removed_symbols": result.removed_symbols,
                "errors": result.errors.iter().map(|(p, e)| format!("{}: {e}", p.display())).collect::<Vec<_>>(),
                "elapsed_ms": result.elapsed.as_millis(),
            })
        );
    } else {
        println!(
            "Reindexed ({:?}): {} files, {} symbols updated, {} removed",
            result.strategy,
            result.files_reparsed,
            result.updated_symbols.len(),
            result.removed_symbols.len()
        );
        for (path, reason) in &result.errors {
            println!("  error in {}: {reason}", path.display());
        }
    }
    Ok(())
}

fn resolve_root(settings: &Settings, path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| settings.workspace_root.clone().unwrap_or_else(|| Path::new(".").to_path_buf()))
}
