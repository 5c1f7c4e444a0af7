//! Enhancement Pipeline: runs every stage of one CV enhancement in order.
//! The first failing stage fails the run; nothing partial is returned.

pub mod handlers;

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::cv;
use crate::enhancer::{CvEnhancer, EnhanceInput};
use crate::errors::AppError;
use crate::job::fetcher::PageFetcher;
use crate::job::splitter::TextSplitter;
use crate::job::JobExtractor;
use crate::llm_client::{ChatModel, EmbeddingModel, LlmError, ModelClients};
use crate::models::enhancement::{EnhancementRequest, EnhancementResult, JobSource};
use crate::prompts::PromptStore;
use crate::similarity::similarity;

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub max_retries: u32,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

pub struct EnhancementPipeline {
    prompts: Arc<PromptStore>,
    models: Arc<ModelClients>,
    fetcher: Arc<dyn PageFetcher>,
    settings: PipelineSettings,
}

impl EnhancementPipeline {
    pub fn new(
        prompts: Arc<PromptStore>,
        models: Arc<ModelClients>,
        fetcher: Arc<dyn PageFetcher>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            prompts,
            models,
            fetcher,
            settings,
        }
    }

    pub fn models(&self) -> &ModelClients {
        &self.models
    }

    /// Runs the full enhancement for one request.
    pub async fn process(&self, request: EnhancementRequest) -> Result<EnhancementResult, AppError> {
        let span = info_span!("enhance_cv", request_id = %Uuid::new_v4());
        async move {
            info!("Starting CV enhancement pipeline");
            let cv_raw_text = extract_pdf_text(request.cv_pdf).await?;
            self.enhance_text(&cv_raw_text, &request.job, request.additional_info.as_deref())
                .await
        }
        .instrument(span)
        .await
    }

    /// Everything after PDF extraction.
    pub async fn enhance_text(
        &self,
        cv_raw_text: &str,
        job: &JobSource,
        additional_info: Option<&str>,
    ) -> Result<EnhancementResult, AppError> {
        let cv_text = cv::combine(cv_raw_text, additional_info);

        let fast = self.fast().await?;
        let cv_keywords = cv::extract_keywords(&cv_text, &self.prompts, fast.as_ref()).await?;

        let embedder = self.embedder().await?;
        let extractor = JobExtractor {
            prompts: &self.prompts,
            fast: fast.as_ref(),
            embedder: embedder.as_ref(),
            splitter: TextSplitter::new(self.settings.chunk_size, self.settings.chunk_overlap),
        };

        let job_posting_text = match job {
            JobSource::Url(url) => {
                info!("Extracting job posting from {url}");
                extractor
                    .extract_from_url(url, self.fetcher.as_ref())
                    .await?
                    .to_prompt_text()
            }
            JobSource::Text(text) => text.clone(),
        };
        let job_keywords = extractor.extract_keywords(&job_posting_text).await?;

        // Scored against the job keywords, not the posting itself.
        let baseline_similarity = similarity(cv_raw_text, &job_keywords, embedder.as_ref()).await?;
        info!("Baseline similarity: {baseline_similarity:.6}");

        let cv_template = self.prompts.cv_template()?;
        let smart = self.smart().await?;
        let enhancer = CvEnhancer {
            prompts: &self.prompts,
            smart: smart.as_ref(),
            embedder: embedder.as_ref(),
            max_retries: self.settings.max_retries,
        };
        let enhancement = enhancer
            .enhance(EnhanceInput {
                cv_template: &cv_template,
                cv_text: &cv_text,
                job_posting_text: &job_posting_text,
                cv_keywords: &cv_keywords,
                job_keywords: &job_keywords,
                baseline_similarity,
            })
            .await?;

        info!("CV enhancement pipeline completed");
        Ok(EnhancementResult {
            improvement: enhancement.improvement(baseline_similarity),
            enhanced_cv: enhancement.enhanced_cv,
            baseline_similarity,
            final_similarity: enhancement.final_similarity,
            cv_keywords,
            job_keywords,
        })
    }

    /// PDF text → fast-model keyword set, without supplementary info.
    pub async fn extract_cv_keywords(&self, pdf: Bytes) -> Result<String, AppError> {
        let cv_raw_text = extract_pdf_text(pdf).await?;
        let fast = self.fast().await?;
        cv::extract_keywords(&cv_raw_text, &self.prompts, fast.as_ref()).await
    }

    async fn fast(&self) -> Result<Arc<dyn ChatModel>, AppError> {
        self.models.fast().await.map_err(init_failure("fast"))
    }

    async fn smart(&self) -> Result<Arc<dyn ChatModel>, AppError> {
        self.models.smart().await.map_err(init_failure("smart"))
    }

    async fn embedder(&self) -> Result<Arc<dyn EmbeddingModel>, AppError> {
        self.models
            .embedding()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to initialize embedding model: {e}")))
    }
}

fn init_failure(role: &'static str) -> impl Fn(LlmError) -> AppError {
    move |e| AppError::Llm(format!("Failed to initialize {role} model: {e}"))
}

/// PDF parsing is CPU-bound; keep it off the async workers.
async fn extract_pdf_text(pdf: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || cv::extract_text(&pdf))
        .await
        .map_err(|e| AppError::Internal(anyhow!("PDF extraction task failed: {e}")))?
}
