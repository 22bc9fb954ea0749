//! Thin CLI layer: argument parsing and output formatting only. No
//! indexing or query logic lives here — everything routes straight
//! through `cerberus_core`'s public API.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GraphCommand, MutateCommand, QualityCommand};
