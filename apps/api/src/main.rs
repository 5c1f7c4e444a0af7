mod config;
mod cv;
mod enhancer;
mod errors;
mod job;
mod llm_client;
mod models;
mod pipeline;
mod prompts;
mod routes;
mod share;
mod similarity;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::job::fetcher::fetcher_for;
use crate::llm_client::ModelClients;
use crate::pipeline::{EnhancementPipeline, PipelineSettings};
use crate::prompts::PromptStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.log_level))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Knitty API v{}", env!("CARGO_PKG_VERSION"));

    // Templates are read on first use and cached for the process lifetime
    let prompts = Arc::new(PromptStore::new(config.config_dir.clone()));
    info!("Prompt templates directory: {}", prompts.config_dir().display());

    // Model clients are built lazily; bad credentials surface on the first request
    let models = Arc::new(ModelClients::new(
        config.fast_llm.clone(),
        config.smart_llm.clone(),
        config.embed_llm.clone(),
    ));

    let fetcher = fetcher_for(config.fetch_mode)?;
    info!("Job page fetch mode: {:?}", config.fetch_mode);

    let pipeline = EnhancementPipeline::new(
        prompts,
        models,
        fetcher,
        PipelineSettings::from(&config),
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
