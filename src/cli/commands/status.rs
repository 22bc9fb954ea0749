//! Store/watcher status command.

use anyhow::Result;
use cerberus_core::ipc;
use cerberus_core::{Settings, Store};

pub async fn run_status(store: &Store, settings: &Settings, json: bool) -> Result<()> {
    let socket = ipc::socket_path(&settings.state_dir(), &workspace_root(settings));
    let remote = ipc::try_request(&socket, "status", serde_json::Value::Null).await;

    let (indexed_files, via_daemon) = match remote {
        Some(ipc::Response::Ok { result }) => (result.get("indexed_files").and_then(|v| v.as_u64()).unwrap_or(0), true),
        _ => (store.count_files()? as u64, false),
    };

    if json {
        println!("{}", serde_json::json!({ "indexed_files": indexed_files, "via_daemon": via_daemon }));
    } else {
        println!("indexed files: {indexed_files}{}", if via_daemon { " (via watcher daemon)" } else { "" });
    }
    Ok(())
}

fn workspace_root(settings: &Settings) -> std::path::PathBuf {
    settings.workspace_root.clone().unwrap_or_else(|| std::path::PathBuf::from("."))
}
