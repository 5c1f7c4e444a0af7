//! Axum route handler for CV keyword extraction.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::routes::upload::read_upload_form;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: String,
}

/// POST /api/v1/extract-keywords
///
/// Multipart with a `cv_file` PDF part. Returns the fast model's keyword set for the CV.
pub async fn handle_extract_keywords(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<KeywordsResponse>, AppError> {
    let mut form = read_upload_form(multipart).await?;
    let pdf = form.take_cv_file()?.into_pdf()?;

    let keywords = state.pipeline.extract_cv_keywords(pdf).await?;

    Ok(Json(KeywordsResponse { keywords }))
}
