//! Rank fusion across keyword and semantic result lists (spec.md §4.6).

use crate::config::RetrievalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMethod {
    ReciprocalRank,
    Weighted,
}

#[derive(Debug, Clone)]
pub struct RankedHit {
    pub symbol_id: i64,
    pub bm25: Option<f64>,
    pub cos: Option<f32>,
    pub hybrid: f64,
}

pub fn fuse(
    keyword: &[(i64, f64)],
    semantic: &[(i64, f32)],
    method: FusionMethod,
    config: &RetrievalConfig,
) -> Vec<RankedHit> {
    match method {
        FusionMethod::ReciprocalRank => reciprocal_rank_fusion(keyword, semantic, config.rrf_k),
        FusionMethod::Weighted => weighted_fusion(keyword, semantic, config.weight_keyword, config.weight_semantic),
    }
}

fn reciprocal_rank_fusion(keyword: &[(i64, f64)], semantic: &[(i64, f32)], k: f64) -> Vec<RankedHit> {
    let mut scores: std::collections::HashMap<i64, (f64, Option<f64>, Option<f32>)> = std::collections::HashMap::new();

    for (rank, (id, score)) in keyword.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, None, None));
        entry.0 += 1.0 / (k + rank as f64 + 1.0);
        entry.1 = Some(*score);
    }
    for (rank, (id, score)) in semantic.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, None, None));
        entry.0 += 1.0 / (k + rank as f64 + 1.0);
        entry.2 = Some(*score);
    }

    let mut hits: Vec<RankedHit> = scores
        .into_iter()
        .map(|(id, (hybrid, bm25, cos))| RankedHit { symbol_id: id, bm25, cos, hybrid })
        .collect();
    hits.sort_by(|a, b| b.hybrid.partial_cmp(&a.hybrid).unwrap_or(std::cmp::Ordering::Equal));
    hits
}

fn weighted_fusion(keyword: &[(i64, f64)], semantic: &[(i64, f32)], w_kw: f64, w_sem: f64) -> Vec<RankedHit> {
    let kw_norm = min_max_normalize(keyword.iter().map(|(_, s)| *s));
    let sem_norm = min_max_normalize(semantic.iter().map(|(_, s)| *s as f64));

    let mut scores: std::collections::HashMap<i64, (f64, Option<f64>, Option<f32>)> = std::collections::HashMap::new();
    for (i, (id, raw)) in keyword.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, None, None));
        entry.0 += w_kw * kw_norm[i];
        entry.1 = Some(*raw);
    }
    for (i, (id, raw)) in semantic.iter().enumerate() {
        let entry = scores.entry(*id).or_insert((0.0, None, None));
        entry.0 += w_sem * sem_norm[i];
        entry.2 = Some(*raw);
    }

    let mut hits: Vec<RankedHit> = scores
        .into_iter()
        .map(|(id, (hybrid, bm25, cos))| RankedHit { symbol_id: id, bm25, cos, hybrid })
        .collect();
    hits.sort_by(|a, b| b.hybrid.partial_cmp(&a.hybrid).unwrap_or(std::cmp::Ordering::Equal));
    hits
}

fn min_max_normalize(values: impl Iterator<Item = f64> + Clone) -> Vec<f64> {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() || (max - min).abs() < f64::EPSILON {
        return values.map(|_| 1.0).collect();
    }
    values.map(|v| (v - min) / (max - min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrf_prefers_items_ranked_well_in_both_lists() {
        let keyword = vec![(1, 10.0), (2, 5.0)];
        let semantic = vec![(2, 0.9), (1, 0.1)];
        let fused = reciprocal_rank_fusion(&keyword, &semantic, 60.0);
        // symbol 2 is #2 keyword + #1 semantic; symbol 1 is #1 keyword + #2 semantic
        // with k=60 both land close, but each appears in both lists
        assert_eq!(fused.len(), 2);
        assert!(fused[0].hybrid >= fused[1].hybrid);
    }

    #[test]
    fn weighted_fusion_respects_weights() {
        let keyword = vec![(1, 10.0)];
        let semantic = vec![(1, 0.5)];
        let fused = weighted_fusion(&keyword, &semantic, 1.0, 0.0);
        assert_eq!(fused[0].symbol_id, 1);
        assert!(fused[0].hybrid > 0.0);
    }
}
