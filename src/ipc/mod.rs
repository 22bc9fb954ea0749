//! C11 — optional daemon IPC: when a watcher is running, route a narrow
//! set of read queries through its already-loaded store over a local
//! socket instead of opening a second connection (spec.md §4.10, §6).

use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok { result: Value },
    Error { error: String },
}

/// One socket file per project root, same naming scheme as the PID file
/// (spec.md §6 "Under `.cerberus/`").
pub fn socket_path(state_dir: &Path, project_root: &Path) -> PathBuf {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(project_root.to_string_lossy().as_bytes());
    state_dir.join(format!("{:x}.sock", hasher.finalize()))
}

/// Runs the IPC accept loop until the socket is removed or a fatal I/O
/// error occurs. Intended to be spawned on the watcher's tokio runtime.
pub async fn serve(store: Arc<Store>, socket_path: &Path) -> std::io::Result<()> {
    let _ = std::fs::remove_file(socket_path);
    let listener = UnixListener::bind(socket_path)?;
    tracing::info!("ipc: listening on {}", socket_path.display());

    loop {
        let (stream, _addr) = listener.accept().await?;
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, store).await {
                tracing::warn!("ipc: connection error: {e}");
            }
        });
    }
}

async fn handle_connection(stream: UnixStream, store: Arc<Store>) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(&store, &request),
            Err(e) => Response::Error { error: format!("malformed request: {e}") },
        };
        let mut payload = serde_json::to_vec(&response).unwrap_or_else(|_| b"{\"status\":\"error\"}".to_vec());
        payload.push(b'\n');
        writer.write_all(&payload).await?;
    }
    Ok(())
}

/// Commands relevant to the core: `get-symbol`, `health`, `status`.
/// Unknown commands return a structured error, never a panic.
fn dispatch(store: &Store, request: &Request) -> Response {
    match request.command.as_str() {
        "get-symbol" => get_symbol(store, &request.args),
        "health" => Response::Ok { result: serde_json::json!({ "status": "ok" }) },
        "status" => match store.count_files() {
            Ok(count) => Response::Ok { result: serde_json::json!({ "indexed_files": count }) },
            Err(e) => Response::Error { error: e.to_string() },
        },
        other => Response::Error { error: format!("unknown command '{other}'") },
    }
}

fn get_symbol(store: &Store, args: &Value) -> Response {
    let Some(name) = args.get("name").and_then(Value::as_str) else {
        return Response::Error { error: "missing required arg 'name'".to_string() };
    };
    let filter = crate::store::SymbolFilter { name: Some(name.to_string()), ..Default::default() };
    match store.query_symbols(&filter) {
        Ok(symbols) => match serde_json::to_value(symbols) {
            Ok(result) => Response::Ok { result },
            Err(e) => Response::Error { error: e.to_string() },
        },
        Err(e) => Response::Error { error: e.to_string() },
    }
}

/// Sends one request and reads one response line. Returns `None` on any
/// connection failure so callers fall back to a direct store query
/// instead of surfacing a user-visible error (spec.md §7 "socket
/// unreachable -> fallback, not a user-visible error").
pub async fn try_request(socket_path: &Path, command: &str, args: Value) -> Option<Response> {
    let stream = UnixStream::connect(socket_path).await.ok()?;
    let (reader, mut writer) = stream.into_split();
    let mut line = serde_json::to_string(&Request { command: command.to_string(), args }).ok()?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await.ok()?;

    let mut reply = String::new();
    BufReader::new(reader).read_line(&mut reply).await.ok()?;
    serde_json::from_str(reply.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_is_stable_for_the_same_root() {
        let state_dir = PathBuf::from("/tmp/state");
        let root = PathBuf::from("/home/me/project");
        assert_eq!(socket_path(&state_dir, &root), socket_path(&state_dir, &root));
    }

    #[tokio::test]
    async fn request_to_a_missing_socket_returns_none() {
        let path = PathBuf::from("/tmp/cerberus-nonexistent-socket-for-test.sock");
        let reply = try_request(&path, "health", Value::Null).await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn serves_get_symbol_over_the_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("test.sock");
        let store = Arc::new(Store::open_in_memory().unwrap());
        store
            .replace_file_record(&crate::model::FileRecord {
                file: Some(crate::model::File {
                    path: PathBuf::from("a.rs"),
                    size: 1,
                    last_modified: 0,
                    extension: "rs".into(),
                    content_hash: None,
                }),
                symbols: vec![crate::model::Symbol {
                    id: None,
                    name: "foo".into(),
                    kind: crate::types::SymbolKind::Function,
                    file_path: PathBuf::from("a.rs"),
                    start_line: 1,
                    end_line: 1,
                    signature: "fn foo()".into(),
                    parent_class: None,
                    docstring: None,
                }],
                ..Default::default()
            })
            .unwrap();

        let server_store = store.clone();
        let server_socket = socket.clone();
        let server = tokio::spawn(async move { serve(server_store, &server_socket).await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let reply = try_request(&socket, "get-symbol", serde_json::json!({ "name": "foo" })).await;
        server.abort();

        match reply {
            Some(Response::Ok { result }) => assert_eq!(result[0]["name"], "foo"),
            other => panic!("expected Ok response, got {other:?}"),
        }
    }
}
