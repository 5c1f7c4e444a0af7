use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Where the job posting comes from. A URL takes precedence over pasted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Url(String),
    Text(String),
}

impl JobSource {
    /// Picks the usable input; blank values count as absent.
    pub fn from_inputs(url: Option<&str>, text: Option<&str>) -> Result<Self, AppError> {
        let usable = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        match (usable(url), usable(text)) {
            (Some(url), _) => Ok(JobSource::Url(url)),
            (None, Some(text)) => Ok(JobSource::Text(text)),
            (None, None) => Err(AppError::Validation(
                "Either job_posting_url or job_posting_text must be provided".to_string(),
            )),
        }
    }
}

/// One enhancement run's inputs. Lives for a single request.
#[derive(Debug, Clone)]
pub struct EnhancementRequest {
    pub cv_pdf: Bytes,
    pub job: JobSource,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementResult {
    pub enhanced_cv: String,
    pub baseline_similarity: f64,
    pub final_similarity: f64,
    /// `final_similarity - baseline_similarity`; negative when the rewrite scored worse.
    pub improvement: f64,
    pub cv_keywords: String,
    pub job_keywords: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_wins_over_text() {
        let source = JobSource::from_inputs(Some("https://jobs.example.com/1"), Some("text"));
        assert_eq!(source.unwrap(), JobSource::Url("https://jobs.example.com/1".to_string()));
    }

    #[test]
    fn test_blank_url_falls_back_to_text() {
        let source = JobSource::from_inputs(Some("   "), Some("Rust engineer wanted"));
        assert_eq!(source.unwrap(), JobSource::Text("Rust engineer wanted".to_string()));
    }

    #[test]
    fn test_missing_both_is_validation_error() {
        let err = JobSource::from_inputs(None, Some("\n")).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ref m) if m == "Either job_posting_url or job_posting_text must be provided"
        ));
    }

    #[test]
    fn test_result_serializes_all_metrics() {
        let result = EnhancementResult {
            enhanced_cv: "# CV".to_string(),
            baseline_similarity: 0.5,
            final_similarity: 0.75,
            improvement: 0.25,
            cv_keywords: "[]".to_string(),
            job_keywords: "{}".to_string(),
        };
        let value = serde_json::to_value(&result).unwrap();
        for key in [
            "enhanced_cv",
            "baseline_similarity",
            "final_similarity",
            "improvement",
            "cv_keywords",
            "job_keywords",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["improvement"], 0.25);
    }
}
