pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::cv::handlers::handle_extract_keywords;
use crate::pipeline::handlers::handle_enhance_cv;
use crate::share::handlers::handle_share_link;
use crate::similarity::handlers::handle_calculate_similarity;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/enhance-cv", post(handle_enhance_cv))
        .route("/api/v1/extract-keywords", post(handle_extract_keywords))
        .route(
            "/api/v1/calculate-similarity",
            post(handle_calculate_similarity),
        )
        .route("/api/v1/share-link", post(handle_share_link))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
