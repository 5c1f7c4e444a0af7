//! Similarity Scorer: cosine similarity of embedding vectors.

pub mod handlers;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::EmbeddingModel;

/// Embeds one text with a single embedding-model call.
pub async fn embed(text: &str, embedder: &dyn EmbeddingModel) -> Result<Vec<f32>, AppError> {
    embedder
        .embed_one(text)
        .await
        .map_err(|e| AppError::Embedding(format!("Failed to generate embedding: {e}")))
}

/// `dot(u, v) / (|u| * |v|)`.
///
/// Returns exactly 0.0 when either vector has zero norm. Vectors of different length come
/// from mismatched embedding models and are rejected.
pub fn cosine(u: &[f32], v: &[f32]) -> Result<f64, AppError> {
    if u.len() != v.len() {
        return Err(AppError::Embedding(format!(
            "Embedding dimensions differ ({} vs {})",
            u.len(),
            v.len()
        )));
    }

    let dot: f64 = u
        .iter()
        .zip(v)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum();
    let norm_u = norm(u);
    let norm_v = norm(v);

    if norm_u == 0.0 || norm_v == 0.0 {
        warn!("Zero vector norm detected");
        return Ok(0.0);
    }

    Ok(dot / (norm_u * norm_v))
}

fn norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

/// Embeds both texts independently (two round trips) and returns their cosine similarity.
pub async fn similarity(
    text_a: &str,
    text_b: &str,
    embedder: &dyn EmbeddingModel,
) -> Result<f64, AppError> {
    let embedding_a = embed(text_a, embedder).await?;
    let embedding_b = embed(text_b, embedder).await?;
    let score = cosine(&embedding_a, &embedding_b)?;
    info!("Calculated cosine similarity: {score:.6}");
    Ok(score)
}
