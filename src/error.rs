//! Structured error types. Every error surfaced to a caller carries a stable
//! `code()` and a human message, per spec.md §7's propagation policy.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("symbol '{name}' not found")]
    SymbolNotFound { name: String },

    #[error("symbol '{name}' is ambiguous: {count} matches")]
    AmbiguousSymbol { name: String, count: usize },

    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("preflight failed: {0}")]
    Preflight(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("mutation error: {0}")]
    Mutation(#[from] crate::mutation::MutationError),

    #[error("watcher error: {0}")]
    Watcher(#[from] crate::watcher::WatcherError),

    #[error("git probe failed: {0}")]
    Git(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Stable machine-readable tag, for the structured-error contract in
    /// spec.md §7 (`code`, message, offending input, suggested next step).
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::FileRead { .. } => "file_read",
            CoreError::FileWrite { .. } => "file_write",
            CoreError::PathNotFound(_) => "path_not_found",
            CoreError::SymbolNotFound { .. } => "symbol_not_found",
            CoreError::AmbiguousSymbol { .. } => "ambiguous_symbol",
            CoreError::Store(_) => "store_error",
            CoreError::Parse { .. } => "parse_error",
            CoreError::Preflight(_) => "preflight_failed",
            CoreError::LimitExceeded(_) => "limit_exceeded",
            CoreError::Mutation(_) => "mutation_error",
            CoreError::Watcher(_) => "watcher_error",
            CoreError::Git(_) => "git_error",
            CoreError::Config(_) => "config_error",
            CoreError::Other(_) => "error",
        }
    }

    /// A concrete suggested next command, where one exists.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CoreError::AmbiguousSymbol { .. } => {
                Some("qualify the symbol with its file path or parent class")
            }
            CoreError::SymbolNotFound { .. } => Some("run a rebuild: cerberus index --force"),
            CoreError::Store(crate::store::StoreError::SchemaMismatch { .. }) => {
                Some("run cerberus index --force to rebuild the store on the current schema")
            }
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
