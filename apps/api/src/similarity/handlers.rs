//! Axum route handler for ad-hoc similarity scoring.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::similarity::similarity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    pub text_a: String,
    pub text_b: String,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub similarity: f64,
}

/// POST /api/v1/calculate-similarity
pub async fn handle_calculate_similarity(
    State(state): State<AppState>,
    Json(request): Json<SimilarityRequest>,
) -> Result<Json<SimilarityResponse>, AppError> {
    let embedder = state
        .pipeline
        .models()
        .embedding()
        .await
        .map_err(|e| AppError::Embedding(e.to_string()))?;

    let similarity = similarity(&request.text_a, &request.text_b, embedder.as_ref()).await?;

    Ok(Json(SimilarityResponse { similarity }))
}
