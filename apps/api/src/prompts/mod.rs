//! Prompt Template Store: loads the five operator-editable templates from the
//! config directory and formats them.
//!
//! File contents are cached for the life of the process after the first read.
//! There is no invalidation; edit the files and restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

mod format;

pub use format::format_template;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template placeholder '{0}' has no value")]
    MissingPlaceholder(String),

    #[error("Malformed template: {0}")]
    Malformed(String),
}

/// The named templates the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptName {
    CvTemplate,
    CvKeywords,
    JobKeywords,
    JobRag,
    CvEnhance,
}

impl PromptName {
    pub fn file_name(self) -> &'static str {
        match self {
            PromptName::CvTemplate => "cvTemplate.txt",
            PromptName::CvKeywords => "cvKeywordsPrompt.txt",
            PromptName::JobKeywords => "jobKeywordsPrompt.txt",
            PromptName::JobRag => "jobRagPrompt.txt",
            PromptName::CvEnhance => "cvEnhancePrompt.txt",
        }
    }
}

/// Inputs for the CV enhancement prompt.
#[derive(Debug, Clone, Copy)]
pub struct EnhancePromptArgs<'a> {
    pub cv_template: &'a str,
    pub cv_text: &'a str,
    pub job_posting_text: &'a str,
    pub cv_keywords: &'a str,
    pub job_keywords: &'a str,
    pub current_similarity: f64,
}

pub struct PromptStore {
    config_dir: PathBuf,
    cache: RwLock<HashMap<&'static str, Arc<str>>>,
}

impl PromptStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the trimmed contents of a template file, reading it on first use.
    pub fn load(&self, name: PromptName) -> Result<Arc<str>, PromptError> {
        let file_name = name.file_name();

        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(file_name)
        {
            return Ok(Arc::clone(hit));
        }

        let path = self.config_dir.join(file_name);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PromptError::NotFound { path: path.clone() }
            } else {
                PromptError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let content: Arc<str> = Arc::from(content.trim());
        debug!("Loaded prompt template {} ({} chars)", file_name, content.len());

        // Two concurrent first loads both read the file; whichever inserts first wins.
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Arc::clone(cache.entry(file_name).or_insert(content)))
    }

    pub fn cv_template(&self) -> Result<Arc<str>, PromptError> {
        self.load(PromptName::CvTemplate)
    }

    /// System prompt for retrieval-augmented job extraction. Sent verbatim.
    pub fn job_rag_prompt(&self) -> Result<Arc<str>, PromptError> {
        self.load(PromptName::JobRag)
    }

    pub fn format_cv_keywords_prompt(&self, cv_text: &str) -> Result<String, PromptError> {
        format_template(&self.load(PromptName::CvKeywords)?, &[("cvText", cv_text)])
    }

    pub fn format_job_keywords_prompt(&self, job_posting_text: &str) -> Result<String, PromptError> {
        format_template(
            &self.load(PromptName::JobKeywords)?,
            &[("jobPostingText", job_posting_text)],
        )
    }

    pub fn format_cv_enhance_prompt(&self, args: EnhancePromptArgs<'_>) -> Result<String, PromptError> {
        let similarity = args.current_similarity.to_string();
        format_template(
            &self.load(PromptName::CvEnhance)?,
            &[
                ("cvTemplate", args.cv_template),
                ("cvText", args.cv_text),
                ("jobPostingText", args.job_posting_text),
                ("cvKeywords", args.cv_keywords),
                ("jobKeywords", args.job_keywords),
                ("currentCosineSimilarity", &similarity),
            ],
        )
    }
}
