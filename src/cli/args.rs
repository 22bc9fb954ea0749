//! Argument parsing: one subcommand per core operation, per spec.md's
//! "deliberately thin CLI" contract. No output logic lives here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cerberus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A persistent, queryable code index for AI coding agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit JSON instead of plain text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create `.cerberus/settings.toml` with default configuration.
    Init {
        #[arg(short, long)]
        force: bool,
    },

    /// Print the resolved configuration.
    Config,

    /// Full scan and index of the current workspace.
    Index {
        /// Path to index (defaults to the workspace root).
        path: Option<PathBuf>,
        #[arg(long)]
        force_full: bool,
    },

    /// Run one incremental pass (git diff, or filesystem fallback).
    Reindex {
        path: Option<PathBuf>,
        #[arg(long)]
        force_full: bool,
    },

    /// Start the filesystem watcher daemon for the current workspace.
    Watch,

    /// Report watcher/store status for the current workspace.
    Status,

    /// Search the index (keyword, semantic, or auto-classified).
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(short, long, default_value = "auto")]
        mode: String,
    },

    /// Look up a symbol by exact name.
    Symbol { name: String },

    /// A file's structural outline.
    Blueprint { file: PathBuf },

    #[command(subcommand)]
    Graph(GraphCommand),

    #[command(subcommand)]
    Mutate(MutateCommand),

    #[command(subcommand)]
    Quality(QualityCommand),
}

#[derive(Subcommand)]
pub enum GraphCommand {
    /// Functions `symbol` calls, depth-bounded.
    Callees {
        symbol: String,
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },
    /// Functions that call `symbol`, depth-bounded.
    Callers {
        symbol: String,
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },
    /// Up to 3 shortest call paths from `source` to `target`.
    Paths {
        source: String,
        target: String,
        #[arg(short, long, default_value_t = 6)]
        depth: usize,
    },
    /// Method resolution order for a class.
    Mro { class: String },
    /// Assembled context bundle (target source, bases, callers/callees, imports).
    Context { symbol: String, file: Option<PathBuf> },
}

#[derive(Subcommand)]
pub enum MutateCommand {
    /// Replace a symbol's body with `code` (a file path, or `-` for stdin).
    Edit {
        file: PathBuf,
        symbol: String,
        code: String,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        no_symbol_guard: bool,
    },
    /// Collapse a symbol's span.
    Delete {
        file: PathBuf,
        symbol: String,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        no_symbol_guard: bool,
    },
    /// Revert every file touched by a transaction.
    Undo { transaction_id: i64 },
}

#[derive(Subcommand)]
pub enum QualityCommand {
    /// Symbols sharing an identical signature.
    Duplicates,
    /// Symbols whose call fan-in + fan-out crosses a threshold.
    GodFunctions {
        #[arg(short, long)]
        threshold: Option<usize>,
    },
    /// Symbols within 2 call-graph hops of `symbol`.
    Related { symbol: String },
}
