mod cli;

use cli::{Cli, Commands, GraphCommand, MutateCommand, QualityCommand};
use cli::commands::{blueprint, graph, index, init, mutate, quality, search, status, watch};

use anyhow::Result;
use cerberus_core::{Settings, Store};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}, using defaults");
        Settings::default()
    });
    cerberus_core::logging::init_with_config(&settings.logging);

    if let Commands::Init { force } = &cli.command {
        return init::run_init(*force);
    }

    let store = Arc::new(Store::open(&settings.resolved_index_path())?);

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Config => init::run_config(&settings, cli.json),
        Commands::Index { path, force_full: _ } => index::run_index(&store, &settings, path, cli.json),
        Commands::Reindex { path, force_full } => index::run_reindex(&store, &settings, path, force_full, cli.json),
        Commands::Watch => watch::run_watch(store, settings).await,
        Commands::Status => status::run_status(&store, &settings, cli.json).await,
        Commands::Search { query, limit, mode } => search::run_search(&store, &settings, &query, &mode, limit, cli.json),
        Commands::Symbol { name } => search::run_symbol(&store, &name, cli.json),
        Commands::Blueprint { file } => blueprint::run_blueprint(&store, &settings, &file, cli.json),
        Commands::Graph(cmd) => dispatch_graph(&store, cmd, cli.json),
        Commands::Mutate(cmd) => dispatch_mutate(&store, &settings, cmd),
        Commands::Quality(cmd) => dispatch_quality(&store, cmd, cli.json),
    }
}

fn dispatch_graph(store: &Store, cmd: GraphCommand, json: bool) -> Result<()> {
    match cmd {
        GraphCommand::Callees { symbol, depth } => graph::run_callees(store, &symbol, depth, json),
        GraphCommand::Callers { symbol, depth } => graph::run_callers(store, &symbol, depth, json),
        GraphCommand::Paths { source, target, depth } => graph::run_paths(store, &source, &target, depth, json),
        GraphCommand::Mro { class } => graph::run_mro(store, &class, json),
        GraphCommand::Context { symbol, file } => graph::run_context(store, &symbol, file, json),
    }
}

fn dispatch_mutate(store: &Store, settings: &Settings, cmd: MutateCommand) -> Result<()> {
    match cmd {
        MutateCommand::Edit { file, symbol, code, force, no_symbol_guard } => {
            mutate::run_edit(store, settings, &file, &symbol, &code, force, no_symbol_guard)
        }
        MutateCommand::Delete { file, symbol, force, no_symbol_guard } => {
            mutate::run_delete(store, settings, &file, &symbol, force, no_symbol_guard)
        }
        MutateCommand::Undo { transaction_id } => mutate::run_undo(store, settings, transaction_id),
    }
}

fn dispatch_quality(store: &Store, cmd: QualityCommand, json: bool) -> Result<()> {
    match cmd {
        QualityCommand::Duplicates => quality::run_duplicates(store, json),
        QualityCommand::GodFunctions { threshold } => quality::run_god_functions(store, threshold, json),
        QualityCommand::Related { symbol } => quality::run_related(store, &symbol, json),
    }
}
