use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::EnhancementPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Prompt store, lazily built model clients and the page fetcher, behind one orchestrator.
    pub pipeline: Arc<EnhancementPipeline>,
    pub config: Config,
}
