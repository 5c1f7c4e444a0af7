//! Axum route handler for share links.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::share::{build_share_link, ShareLink};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShareLinkRequest {
    pub markdown: String,
    /// Overrides `SHARE_BASE_URL` for this link.
    pub base_url: Option<String>,
}

/// POST /api/v1/share-link
pub async fn handle_share_link(
    State(state): State<AppState>,
    Json(request): Json<ShareLinkRequest>,
) -> Result<Json<ShareLink>, AppError> {
    let base_url = request
        .base_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(&state.config.share_base_url);

    Ok(Json(build_share_link(&request.markdown, base_url)?))
}
