//! Semantic retrieval: encode the query with the index's configured
//! embedding model, then cosine-similarity against stored vectors
//! (spec.md §4.6).

use crate::store::Store;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Encodes text to a fixed-dimension vector. Abstracted so retrieval tests
/// can stub it out instead of loading an ONNX model.
pub trait Embedder {
    fn embed(&self, text: &str) -> crate::error::CoreResult<Vec<f32>>;
    fn model_name(&self) -> &str;
}

pub struct FastEmbedEmbedder {
    model: Mutex<TextEmbedding>,
    name: String,
}

impl FastEmbedEmbedder {
    pub fn new(model_name: &str) -> crate::error::CoreResult<Self> {
        let model = model_for_name(model_name);
        let text_model = TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
            .map_err(|e| crate::error::CoreError::Other(format!("failed to initialize embedding model: {e}")))?;
        Ok(Self {
            model: Mutex::new(text_model),
            name: model_name.to_string(),
        })
    }
}

fn model_for_name(name: &str) -> EmbeddingModel {
    match name {
        "bge-small-en" => EmbeddingModel::BGESmallENV15,
        _ => EmbeddingModel::AllMiniLML6V2,
    }
}

impl Embedder for FastEmbedEmbedder {
    fn embed(&self, text: &str) -> crate::error::CoreResult<Vec<f32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| crate::error::CoreError::Other("embedding model lock poisoned".into()))?;
        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| crate::error::CoreError::Other(format!("embedding failed: {e}")))?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| crate::error::CoreError::Other("embedding model returned no vectors".into()))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

pub fn search(store: &Store, embedder: &dyn Embedder, query: &str, limit: usize) -> crate::error::CoreResult<Vec<(i64, f32)>> {
    let query_vector = embedder.embed(query)?;
    let all = store.all_embeddings()?;
    if all.is_empty() {
        return Ok(Vec::new());
    }
    let mut scored: Vec<(i64, f32)> = all
        .into_iter()
        .map(|(id, vector)| (id, cosine_similarity(&query_vector, &vector)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    Ok(scored)
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }
}
