//! Watcher daemon command (C6 + C11).

use anyhow::Result;
use cerberus_core::{index_incremental, ipc, watcher, Settings, Store};
use std::sync::Arc;

pub async fn run_watch(store: Arc<Store>, settings: Settings) -> Result<()> {
    let root = settings.workspace_root.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
    let socket = ipc::socket_path(&settings.state_dir(), &root);

    let ipc_store = store.clone();
    let ipc_socket = socket.clone();
    let ipc_task = tokio::spawn(async move { ipc::serve(ipc_store, &ipc_socket).await });

    let watch_root = root.clone();
    let watch_settings = Arc::new(settings.clone());
    let watch_store = store.clone();
    let handle = watcher::spawn(watch_root.clone(), watch_settings.clone(), move |_batch| {
        index_incremental(&watch_store, &watch_root, &watch_settings, false).is_ok()
    });

    println!("watching {} (socket: {})", root.display(), socket.display());
    tokio::signal::ctrl_c().await?;
    println!("stopping watcher");
    let _ = handle.control_tx.send(watcher::Command::Stop);
    ipc_task.abort();
    Ok(())
}
