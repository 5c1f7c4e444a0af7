//! Ephemeral in-memory vector index over one posting's chunks.

use std::cmp::Ordering;

use crate::errors::AppError;
use crate::llm_client::EmbeddingModel;
use crate::similarity::{cosine, embed};

#[derive(Debug, Clone)]
struct IndexedChunk {
    text: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    chunks: Vec<IndexedChunk>,
}

impl InMemoryVectorStore {
    /// Embeds all chunks in one batch and indexes them in input order.
    pub async fn from_texts(
        texts: Vec<String>,
        embedder: &dyn EmbeddingModel,
    ) -> Result<Self, AppError> {
        if texts.is_empty() {
            return Ok(Self::default());
        }

        let embeddings = embedder
            .embed(&texts)
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to embed job chunks: {e}")))?;

        Ok(Self {
            chunks: texts
                .into_iter()
                .zip(embeddings)
                .map(|(text, embedding)| IndexedChunk { text, embedding })
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-`k` chunks by cosine similarity to `query`, best first. Ties keep index order.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn EmbeddingModel,
    ) -> Result<Vec<&str>, AppError> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = embed(query, embedder).await?;
        self.rank(&query_embedding, k)
    }

    fn rank(&self, query_embedding: &[f32], k: usize) -> Result<Vec<&str>, AppError> {
        let mut scored = self
            .chunks
            .iter()
            .map(|chunk| Ok((cosine(query_embedding, &chunk.embedding)?, chunk)))
            .collect::<Result<Vec<(f64, &IndexedChunk)>, AppError>>()?;
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| chunk.text.as_str())
            .collect())
    }
}
