/// LLM Client: the single point of entry for all model endpoint calls in Knitty.
///
/// ARCHITECTURAL RULE: No other module may call a model endpoint directly.
/// All chat and embedding requests MUST go through the `ChatModel` / `EmbeddingModel`
/// traits defined here.
///
/// Endpoints speak the OpenAI-compatible protocol (`/chat/completions`, `/embeddings`),
/// so any provider exposing it can back any of the three roles.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ModelSettings;

pub mod clients;
pub mod prompts;

pub use clients::ModelClients;

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM response contained no result")]
    EmptyContent,

    #[error("Invalid model client configuration: {0}")]
    InvalidConfig(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Conversation types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

/// A chat-completion model. Implemented by `ChatClient` and by test stubs.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the conversation and returns the assistant's reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// An embedding model. Implemented by `EmbeddingClient` and by test stubs.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds every input, returning vectors in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embeds a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP clients
// ────────────────────────────────────────────────────────────────────────────

/// Chat client for one model role.
pub struct ChatClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    pub fn new(settings: &ModelSettings, temperature: f32) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint_url(&settings.api_base, "chat/completions")?,
            api_key: require_key(settings)?,
            model: settings.model_name.clone(),
            temperature,
        })
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let body: ChatCompletionResponse = read_json(response).await?;

        if let Some(usage) = &body.usage {
            debug!(
                "Chat call to {} succeeded: prompt_tokens={}, completion_tokens={:?}",
                self.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        reply_text(body)
    }
}

/// Embedding client for the embedding role.
pub struct EmbeddingClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client()?,
            endpoint: endpoint_url(&settings.api_base, "embeddings")?,
            api_key: require_key(settings)?,
            model: settings.model_name.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await?;

        let body: EmbeddingResponse = read_json(response).await?;
        let vectors = order_embeddings(body.data);

        if vectors.len() != inputs.len() {
            return Err(LlmError::Api {
                status: 200,
                message: format!(
                    "expected {} embeddings, received {}",
                    inputs.len(),
                    vectors.len()
                ),
            });
        }

        debug!("Embedded {} inputs with {}", inputs.len(), self.model);
        Ok(vectors)
    }
}

fn build_http_client() -> Result<Client, LlmError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

fn require_key(settings: &ModelSettings) -> Result<String, LlmError> {
    if settings.api_key.trim().is_empty() {
        return Err(LlmError::InvalidConfig(format!(
            "missing API key for model '{}'",
            settings.model_name
        )));
    }
    Ok(settings.api_key.clone())
}

/// Joins `path` onto the configured base URL, keeping any path prefix such as `/v1`.
fn endpoint_url(base: &str, path: &str) -> Result<Url, LlmError> {
    let base = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|url| url.join(path))
        .map_err(|e| LlmError::InvalidConfig(format!("invalid API base '{base}': {e}")))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(LlmError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The first choice's text, trimmed. A blank reply is passed through; only a response
/// without any choice is an error.
fn reply_text(body: ChatCompletionResponse) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default().trim().to_string())
        .ok_or(LlmError::EmptyContent)
}

fn order_embeddings(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Response normalisation
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from model output and trims.
/// Text without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parses fenced or bare model output as JSON.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fences(text))
}
