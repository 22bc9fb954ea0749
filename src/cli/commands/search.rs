//! Search and symbol lookup commands.

use anyhow::Result;
use cerberus_core::retrieval::{self, FusionMethod, Mode};
use cerberus_core::store::SymbolFilter;
use cerberus_core::{Settings, Store};

pub fn run_search(store: &Store, settings: &Settings, query: &str, mode: &str, limit: usize, json: bool) -> Result<()> {
    let mode = match mode {
        "keyword" => Mode::Keyword,
        "semantic" => Mode::Semantic,
        "balanced" => Mode::Balanced,
        _ => Mode::Auto,
    };

    let embedder = retrieval::FastEmbedEmbedder::new(&settings.retrieval.embedding_model).ok();
    let hits = retrieval::search(
        store,
        embedder.as_ref().map(|e| e as &dyn retrieval::Embedder),
        &settings.retrieval,
        query,
        mode,
        FusionMethod::ReciprocalRank,
        limit,
    )?;

    if json {
        let enriched: Vec<_> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "rank": hit.rank,
                    "symbol_id": hit.symbol_id,
                    "bm25": hit.bm25,
                    "cos": hit.cos,
                    "hybrid": hit.hybrid,
                    "match_type": format!("{:?}", hit.match_type),
                    "symbol": hit.symbol,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&enriched)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No matches for '{query}'");
        return Ok(());
    }
    for hit in &hits {
        let label = hit.symbol.as_ref().map(|s| s.name.as_str()).unwrap_or("<unknown>");
        let file = hit
            .symbol
            .as_ref()
            .map(|s| s.file_path.display().to_string())
            .unwrap_or_default();
        println!("{:>2}. {label} ({file}:{}) score={:.4} [{:?}]", hit.rank, hit.symbol.as_ref().map(|s| s.start_line).unwrap_or(0), hit.hybrid, hit.match_type);
    }
    Ok(())
}

pub fn run_symbol(store: &Store, name: &str, json: bool) -> Result<()> {
    let symbols = store.query_symbols(&SymbolFilter { name: Some(name.to_string()), ..Default::default() })?;
    if json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
        return Ok(());
    }
    if symbols.is_empty() {
        println!("No symbol named '{name}'");
        return Ok(());
    }
    for symbol in symbols {
        println!(
            "{} [{:?}] {}:{}-{}",
            symbol.name, symbol.kind, symbol.file_path.display(), symbol.start_line, symbol.end_line
        );
        println!("  {}", symbol.signature);
    }
    Ok(())
}
