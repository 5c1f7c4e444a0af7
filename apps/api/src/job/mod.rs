//! Job Posting Extractor: turns a posting URL into a job record via retrieval over the
//! cleaned page, and derives the posting's keyword set.

pub mod fetcher;
pub mod html;
pub mod splitter;
pub mod vector_store;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{job_extraction_request, JOB_RETRIEVAL_QUERY, JOB_RETRIEVAL_TOP_K};
use crate::llm_client::{parse_json, strip_code_fences, ChatMessage, ChatModel, EmbeddingModel};
use crate::prompts::PromptStore;

use fetcher::PageFetcher;
use splitter::TextSplitter;
use vector_store::InMemoryVectorStore;

const NO_RELEVANT_INFORMATION: &str = "No relevant job information found";

/// Structured job information, or the marker for a posting with nothing retrievable.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRecord {
    Extracted(Value),
    NoRelevantInformation,
}

impl JobRecord {
    pub fn to_json(&self) -> Value {
        match self {
            JobRecord::Extracted(value) => value.clone(),
            JobRecord::NoRelevantInformation => json!({ "error": NO_RELEVANT_INFORMATION }),
        }
    }

    /// Text handed to downstream prompts: pretty-printed JSON, or the bare string when
    /// the model answered with a JSON string.
    pub fn to_prompt_text(&self) -> String {
        match self.to_json() {
            Value::String(text) => text,
            value => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        }
    }
}

/// Borrowed dependencies for one request's job-posting work.
pub struct JobExtractor<'a> {
    pub prompts: &'a PromptStore,
    pub fast: &'a dyn ChatModel,
    pub embedder: &'a dyn EmbeddingModel,
    pub splitter: TextSplitter,
}

impl JobExtractor<'_> {
    /// fetch → clean → retrieval-augmented extraction.
    pub async fn extract_from_url(
        &self,
        url: &str,
        fetcher: &dyn PageFetcher,
    ) -> Result<JobRecord, AppError> {
        let html = fetcher.fetch(url).await?;
        let text = html::clean(&html);
        self.extract_via_retrieval(&text).await
    }

    /// Chunks and indexes `text`, retrieves the chunks most related to a fixed
    /// job-description query, and asks the fast model for a JSON job record.
    pub async fn extract_via_retrieval(&self, text: &str) -> Result<JobRecord, AppError> {
        let chunks = self.splitter.split(text);
        info!("Created {} chunks for RAG", chunks.len());

        let store = InMemoryVectorStore::from_texts(chunks, self.embedder).await?;
        if store.is_empty() {
            warn!("No text left after cleaning; nothing to index");
            return Ok(JobRecord::NoRelevantInformation);
        }
        debug!("Indexed {} chunks", store.len());

        let relevant = store
            .similarity_search(JOB_RETRIEVAL_QUERY, JOB_RETRIEVAL_TOP_K, self.embedder)
            .await?;

        if relevant.is_empty() {
            warn!("No relevant chunks found in RAG");
            return Ok(JobRecord::NoRelevantInformation);
        }

        let context = relevant.join("\n\n");
        let system = self.prompts.job_rag_prompt()?;
        let reply = self
            .fast
            .chat(&[
                ChatMessage::system(&*system),
                ChatMessage::user(job_extraction_request(&context)),
            ])
            .await
            .map_err(|e| {
                error!("Error in RAG extraction: {e}");
                AppError::Llm(format!("Failed to extract job information: {e}"))
            })?;

        let record: Value = parse_json(&reply).map_err(|e| {
            error!("JSON parsing error: {e}");
            AppError::Processing(format!("Failed to parse job information: {e}"))
        })?;

        info!("Successfully extracted job information via RAG");
        Ok(JobRecord::Extracted(record))
    }

    /// Asks the fast model for the posting's keyword set. Not validated as JSON.
    pub async fn extract_keywords(&self, job_posting_text: &str) -> Result<String, AppError> {
        let prompt = self.prompts.format_job_keywords_prompt(job_posting_text)?;
        let reply = self
            .fast
            .chat(&[ChatMessage::user(prompt)])
            .await
            .map_err(|e| AppError::Llm(format!("Failed to extract job keywords: {e}")))?;

        info!("Extracted keywords from job posting");
        Ok(strip_code_fences(&reply).to_string())
    }
}
