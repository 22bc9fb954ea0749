//! C7 — retrieval: keyword (FTS5/BM25), semantic (embeddings/cosine), and
//! rank fusion across the two (spec.md §4.6).

mod fusion;
mod semantic;

pub use fusion::{FusionMethod, RankedHit};
pub use semantic::{Embedder, FastEmbedEmbedder};

use crate::config::RetrievalConfig;
use crate::model::Symbol;
use crate::store::Store;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Keyword,
    Semantic,
    Balanced,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchType {
    Keyword,
    Semantic,
    Both,
    /// `semantic` was requested but the index has no embeddings.
    KeywordFallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub symbol_id: i64,
    pub bm25: Option<f64>,
    pub cos: Option<f32>,
    pub hybrid: f64,
    pub match_type: MatchType,
    #[serde(skip)]
    pub symbol: Option<Symbol>,
}

/// Classifies a free-text query the way `auto` mode does: a single
/// identifier-like token reads as `keyword`, a multi-word phrase as
/// `semantic`, anything else as `balanced`.
pub fn classify_query(query: &str) -> Mode {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let is_identifier_like = |s: &str| s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':' || c == '.');

    match tokens.as_slice() {
        [single] if is_identifier_like(single) => Mode::Keyword,
        tokens if tokens.len() > 1 && tokens.iter().all(|t| is_identifier_like(t)) => Mode::Balanced,
        _ => Mode::Semantic,
    }
}

pub fn search(
    store: &Store,
    embedder: Option<&dyn Embedder>,
    config: &RetrievalConfig,
    query: &str,
    mode: Mode,
    fusion_method: FusionMethod,
    limit: usize,
) -> crate::error::CoreResult<Vec<SearchHit>> {
    let resolved_mode = if mode == Mode::Auto { classify_query(query) } else { mode };

    let (semantic_hits, match_type_if_semantic) = if resolved_mode != Mode::Keyword {
        match embedder {
            Some(embedder) => (semantic::search(store, embedder, query, limit * 4)?, MatchType::Semantic),
            None => (Vec::new(), MatchType::KeywordFallback),
        }
    } else {
        (Vec::new(), MatchType::Keyword)
    };

    // A requested semantic search with no embedder available still has to
    // return something: fall back to the keyword lane rather than an empty
    // result set.
    let needs_keyword_fallback = resolved_mode == Mode::Semantic && match_type_if_semantic == MatchType::KeywordFallback;
    let keyword_hits = if resolved_mode != Mode::Semantic || needs_keyword_fallback {
        store.fts_match(query, limit * 4)?
    } else {
        Vec::new()
    };

    let match_type = match resolved_mode {
        Mode::Keyword => MatchType::Keyword,
        Mode::Semantic => match_type_if_semantic,
        Mode::Balanced | Mode::Auto => {
            if semantic_hits.is_empty() && resolved_mode == Mode::Balanced {
                MatchType::Keyword
            } else {
                MatchType::Both
            }
        }
    };

    let fused = fusion::fuse(&keyword_hits, &semantic_hits, fusion_method, config);
    let mut hits: Vec<SearchHit> = fused
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, ranked)| SearchHit {
            rank: i + 1,
            symbol_id: ranked.symbol_id,
            bm25: ranked.bm25,
            cos: ranked.cos,
            hybrid: ranked.hybrid,
            match_type,
            symbol: None,
        })
        .collect();

    for hit in &mut hits {
        hit.symbol = store.get_symbol_by_id(hit.symbol_id)?;
    }

    Ok(hits)
}
