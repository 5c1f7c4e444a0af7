//! Axum route handler for the full enhancement run.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::enhancement::{EnhancementRequest, EnhancementResult, JobSource};
use crate::routes::upload::read_upload_form;
use crate::state::AppState;

pub const JOB_POSTING_URL_FIELD: &str = "job_posting_url";
pub const JOB_POSTING_TEXT_FIELD: &str = "job_posting_text";
pub const ADDITIONAL_INFO_FIELD: &str = "additional_info";

/// Text inputs may also arrive as query parameters; multipart parts take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct EnhanceQuery {
    pub job_posting_url: Option<String>,
    pub job_posting_text: Option<String>,
    pub additional_info: Option<String>,
}

/// POST /api/v1/enhance-cv
///
/// Multipart with a `cv_file` PDF part and either `job_posting_url` or `job_posting_text`.
/// `additional_info` is optional.
pub async fn handle_enhance_cv(
    State(state): State<AppState>,
    Query(query): Query<EnhanceQuery>,
    multipart: Multipart,
) -> Result<Json<EnhancementResult>, AppError> {
    let mut form = read_upload_form(multipart).await?;
    let cv_file = form.take_cv_file()?;

    let pick = |field: &str, fallback: &Option<String>| {
        form.text(field)
            .map(str::to_string)
            .or_else(|| fallback.clone().filter(|v| !v.trim().is_empty()))
    };
    let job_url = pick(JOB_POSTING_URL_FIELD, &query.job_posting_url);
    let job_text = pick(JOB_POSTING_TEXT_FIELD, &query.job_posting_text);
    let additional_info = pick(ADDITIONAL_INFO_FIELD, &query.additional_info);

    let job = JobSource::from_inputs(job_url.as_deref(), job_text.as_deref())?;
    let cv_pdf = cv_file.into_pdf()?;

    let result = state
        .pipeline
        .process(EnhancementRequest {
            cv_pdf,
            job,
            additional_info,
        })
        .await?;

    Ok(Json(result))
}
