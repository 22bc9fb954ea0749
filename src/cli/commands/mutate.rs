//! Edit/delete/undo commands (C9).

use anyhow::Result;
use cerberus_core::mutation::{self, EditOptions};
use cerberus_core::{Settings, Store};
use std::io::Read;
use std::path::{Path, PathBuf};

pub fn run_edit(
    store: &Store,
    settings: &Settings,
    file: &Path,
    symbol: &str,
    code_source: &str,
    force: bool,
    no_symbol_guard: bool,
) -> Result<()> {
    let code = read_code(code_source)?;
    let options = EditOptions { force, symbol_guard: !no_symbol_guard, ..Default::default() };
    let root = workspace_root(settings);
    let outcome = mutation::edit(store, &root, &settings.limits, file, symbol, &code, &options)?;
    println!("edited '{symbol}' in {} (transaction {})", file.display(), outcome.transaction_id);
    Ok(())
}

pub fn run_delete(store: &Store, settings: &Settings, file: &Path, symbol: &str, force: bool, no_symbol_guard: bool) -> Result<()> {
    let options = EditOptions { force, symbol_guard: !no_symbol_guard, ..Default::default() };
    let root = workspace_root(settings);
    let outcome = mutation::delete(store, &root, &settings.limits, file, symbol, &options)?;
    println!("deleted '{symbol}' from {} (transaction {})", file.display(), outcome.transaction_id);
    Ok(())
}

pub fn run_undo(store: &Store, settings: &Settings, transaction_id: i64) -> Result<()> {
    let root = workspace_root(settings);
    mutation::undo(store, &root, &settings.limits, transaction_id)?;
    println!("reverted transaction {transaction_id}");
    Ok(())
}

fn workspace_root(settings: &Settings) -> PathBuf {
    settings.workspace_root.clone().unwrap_or_else(|| Path::new(".").to_path_buf())
}

fn read_code(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}
