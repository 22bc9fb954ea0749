//! `cerberus-core` — a persistent, queryable index of a source repository
//! for AI coding agents: scan, store, watch, retrieve, trace, and mutate,
//! all against one SQLite file per project (spec.md §1-2).

pub mod blueprint;
pub mod config;
pub mod error;
pub mod graph;
pub mod incremental;
pub mod indexer;
pub mod ipc;
pub mod limits;
pub mod logging;
pub mod model;
pub mod mutation;
pub mod parsing;
pub mod quality;
pub mod retrieval;
pub mod scanner;
pub mod store;
pub mod types;
pub mod utils;
pub mod watcher;

pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use indexer::{index_full, index_incremental, IndexReport};
pub use model::{File, FileRecord, Symbol};
pub use store::Store;
pub use types::SymbolKind;
