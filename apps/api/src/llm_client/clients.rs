//! Lazily constructed model handles for the three roles: fast, smart, embedding.
//!
//! Construction happens on first access, so a bad base URL or missing key surfaces on
//! the first request that needs the role rather than at startup. `OnceCell` makes the
//! first construction race-free; a failed construction leaves the cell empty and is
//! attempted again on the next access.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::ModelSettings;
use crate::llm_client::{ChatClient, ChatModel, EmbeddingClient, EmbeddingModel, LlmError};

/// Keyword extraction wants repeatable output.
pub const FAST_TEMPERATURE: f32 = 0.3;
/// CV rewriting benefits from more varied phrasing.
pub const SMART_TEMPERATURE: f32 = 0.7;

pub struct ModelClients {
    fast_settings: ModelSettings,
    smart_settings: ModelSettings,
    embed_settings: ModelSettings,
    fast: OnceCell<Arc<dyn ChatModel>>,
    smart: OnceCell<Arc<dyn ChatModel>>,
    embedding: OnceCell<Arc<dyn EmbeddingModel>>,
}

impl ModelClients {
    pub fn new(fast: ModelSettings, smart: ModelSettings, embedding: ModelSettings) -> Self {
        Self {
            fast_settings: fast,
            smart_settings: smart,
            embed_settings: embedding,
            fast: OnceCell::new(),
            smart: OnceCell::new(),
            embedding: OnceCell::new(),
        }
    }

    /// Builds a set whose handles are already populated. Used to inject stub models.
    #[cfg(test)]
    pub fn from_models(
        fast: Arc<dyn ChatModel>,
        smart: Arc<dyn ChatModel>,
        embedding: Arc<dyn EmbeddingModel>,
    ) -> Self {
        let unused = || ModelSettings {
            api_key: String::new(),
            api_base: String::new(),
            model_name: String::new(),
        };
        Self {
            fast_settings: unused(),
            smart_settings: unused(),
            embed_settings: unused(),
            fast: OnceCell::new_with(Some(fast)),
            smart: OnceCell::new_with(Some(smart)),
            embedding: OnceCell::new_with(Some(embedding)),
        }
    }

    /// Low-temperature chat model used for keyword and job-record extraction.
    pub async fn fast(&self) -> Result<Arc<dyn ChatModel>, LlmError> {
        self.fast
            .get_or_try_init(|| async {
                let client = ChatClient::new(&self.fast_settings, FAST_TEMPERATURE)?;
                info!("Fast LLM client initialized (model: {})", self.fast_settings.model_name);
                Ok::<_, LlmError>(Arc::new(client) as Arc<dyn ChatModel>)
            })
            .await
            .cloned()
    }

    /// Higher-temperature chat model used for CV rewriting.
    pub async fn smart(&self) -> Result<Arc<dyn ChatModel>, LlmError> {
        self.smart
            .get_or_try_init(|| async {
                let client = ChatClient::new(&self.smart_settings, SMART_TEMPERATURE)?;
                info!("Smart LLM client initialized (model: {})", self.smart_settings.model_name);
                Ok::<_, LlmError>(Arc::new(client) as Arc<dyn ChatModel>)
            })
            .await
            .cloned()
    }

    pub async fn embedding(&self) -> Result<Arc<dyn EmbeddingModel>, LlmError> {
        self.embedding
            .get_or_try_init(|| async {
                let client = EmbeddingClient::new(&self.embed_settings)?;
                info!(
                    "Embedding client initialized (model: {})",
                    self.embed_settings.model_name
                );
                Ok::<_, LlmError>(Arc::new(client) as Arc<dyn EmbeddingModel>)
            })
            .await
            .cloned()
    }
}
