//! CV Enhancer: smart-model rewrite with a single similarity-driven correction.
//!
//! Two steps, not a loop:
//!
//! ```text
//! Drafted ──score > baseline or no budget──▶ Accepted
//!    │
//!    └──score <= baseline──▶ Retried ──(rescored, never compared)──▶ Accepted
//! ```
//!
//! The configured retry budget only gates whether the corrective turn may happen at all.
//! A budget above one still yields at most one corrective turn.

use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::similarity_feedback;
use crate::llm_client::{ChatMessage, ChatModel, EmbeddingModel};
use crate::prompts::{EnhancePromptArgs, PromptStore};
use crate::similarity::similarity;

/// Everything the enhancement prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct EnhanceInput<'a> {
    pub cv_template: &'a str,
    pub cv_text: &'a str,
    pub job_posting_text: &'a str,
    pub cv_keywords: &'a str,
    pub job_keywords: &'a str,
    pub baseline_similarity: f64,
}

/// Where the state machine ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The first draft beat the baseline, or no retry budget was configured.
    AcceptedDraft,
    /// The corrective turn's answer, accepted regardless of its score.
    AcceptedRetry,
}

#[derive(Debug, Clone)]
pub struct Enhancement {
    pub enhanced_cv: String,
    pub final_similarity: f64,
    pub outcome: Outcome,
}

impl Enhancement {
    /// May be negative; reported, not treated as a failure.
    pub fn improvement(&self, baseline_similarity: f64) -> f64 {
        self.final_similarity - baseline_similarity
    }
}

/// Transition out of `Drafted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Accept,
    Retry,
}

fn after_draft(draft_similarity: f64, baseline_similarity: f64, max_retries: u32) -> Transition {
    if draft_similarity > baseline_similarity || max_retries == 0 {
        Transition::Accept
    } else {
        Transition::Retry
    }
}

pub struct CvEnhancer<'a> {
    pub prompts: &'a PromptStore,
    pub smart: &'a dyn ChatModel,
    pub embedder: &'a dyn EmbeddingModel,
    pub max_retries: u32,
}

impl CvEnhancer<'_> {
    pub async fn enhance(&self, input: EnhanceInput<'_>) -> Result<Enhancement, AppError> {
        let prompt = self.prompts.format_cv_enhance_prompt(EnhancePromptArgs {
            cv_template: input.cv_template,
            cv_text: input.cv_text,
            job_posting_text: input.job_posting_text,
            cv_keywords: input.cv_keywords,
            job_keywords: input.job_keywords,
            current_similarity: input.baseline_similarity,
        })?;

        // Drafted
        let draft = self.ask(&[ChatMessage::user(prompt.clone())]).await?;
        info!("Generated enhanced CV");
        let draft_similarity = similarity(&draft, input.job_keywords, self.embedder).await?;
        info!(
            "Initial enhancement similarity: {draft_similarity:.6} (baseline: {:.6})",
            input.baseline_similarity
        );

        let enhancement = match after_draft(draft_similarity, input.baseline_similarity, self.max_retries)
        {
            Transition::Accept => Enhancement {
                enhanced_cv: draft,
                final_similarity: draft_similarity,
                outcome: Outcome::AcceptedDraft,
            },
            Transition::Retry => {
                info!("No improvement detected, retrying with feedback...");
                let feedback = similarity_feedback(draft_similarity, input.baseline_similarity);
                let replacement = self
                    .ask(&[
                        ChatMessage::user(prompt),
                        ChatMessage::assistant(draft),
                        ChatMessage::user(feedback),
                    ])
                    .await?;
                let retry_similarity =
                    similarity(&replacement, input.job_keywords, self.embedder).await?;
                info!("Retry enhancement similarity: {retry_similarity:.6}");

                Enhancement {
                    enhanced_cv: replacement,
                    final_similarity: retry_similarity,
                    outcome: Outcome::AcceptedRetry,
                }
            }
        };

        info!(
            "Final similarity: {:.6}, Improvement: {:+.6} ({:?})",
            enhancement.final_similarity,
            enhancement.improvement(input.baseline_similarity),
            enhancement.outcome
        );
        Ok(enhancement)
    }

    async fn ask(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        self.smart
            .chat(messages)
            .await
            .map(|text| text.trim().to_string())
            .map_err(|e| AppError::Llm(format!("Failed to generate enhanced CV: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::test_support::{prompt_dir, unit_at, FailingChat, ScriptedChat, TableEmbedder};

    const JOB_KEYWORDS: &str = "[\"Rust\", \"Kubernetes\"]";

    fn input() -> EnhanceInput<'static> {
        EnhanceInput {
            cv_template: "# TEMPLATE",
            cv_text: "Backend developer",
            job_posting_text: "Platform role",
            cv_keywords: "[\"Go\"]",
            job_keywords: JOB_KEYWORDS,
            baseline_similarity: 0.5,
        }
    }

    fn embedder(draft_score: f32, retry_score: f32) -> std::sync::Arc<TableEmbedder> {
        TableEmbedder::new(
            &[
                (JOB_KEYWORDS, vec![1.0, 0.0]),
                ("draft cv", unit_at(draft_score)),
                ("retried cv", unit_at(retry_score)),
            ],
            vec![0.0, 1.0],
        )
    }

    #[test]
    fn test_transition_rules() {
        assert_eq!(after_draft(0.6, 0.5, 3), Transition::Accept);
        assert_eq!(after_draft(0.5, 0.5, 3), Transition::Retry);
        assert_eq!(after_draft(0.4, 0.5, 1), Transition::Retry);
        assert_eq!(after_draft(0.4, 0.5, 0), Transition::Accept);
    }

    #[tokio::test]
    async fn test_improving_draft_is_accepted_without_corrective_turn() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let smart = ScriptedChat::new(["draft cv", "retried cv"]);
        let embedder = embedder(0.6, 0.9);

        let enhancer = CvEnhancer {
            prompts: &prompts,
            smart: smart.as_ref(),
            embedder: embedder.as_ref(),
            max_retries: 3,
        };
        let result = enhancer.enhance(input()).await.unwrap();

        assert_eq!(smart.call_count(), 1);
        assert_eq!(result.outcome, Outcome::AcceptedDraft);
        assert_eq!(result.enhanced_cv, "draft cv");
        assert!((result.final_similarity - 0.6).abs() < 1e-6);
        assert!((result.improvement(0.5) - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_non_improving_draft_gets_exactly_one_corrective_turn() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        // Budget of 3 but the retried answer is even worse: still only one correction.
        let smart = ScriptedChat::new(["draft cv", "retried cv", "never requested"]);
        let embedder = embedder(0.4, 0.3);

        let enhancer = CvEnhancer {
            prompts: &prompts,
            smart: smart.as_ref(),
            embedder: embedder.as_ref(),
            max_retries: 3,
        };
        let result = enhancer.enhance(input()).await.unwrap();

        assert_eq!(smart.call_count(), 2);
        assert_eq!(result.outcome, Outcome::AcceptedRetry);
        assert_eq!(result.enhanced_cv, "retried cv");
        assert!((result.final_similarity - 0.3).abs() < 1e-6);
        assert!(result.improvement(0.5) < 0.0);

        let corrective = &smart.calls()[1];
        assert_eq!(corrective.len(), 3);
        assert_eq!(corrective[0].role, Role::User);
        assert_eq!(corrective[0].content, smart.calls()[0][0].content);
        assert_eq!(corrective[1], ChatMessage::assistant("draft cv"));
        assert_eq!(corrective[2].role, Role::User);
        assert!(corrective[2]
            .content
            .starts_with("New Cosine Similarity: 0.400000; Improvement over previous: -0.1"));
    }

    #[tokio::test]
    async fn test_zero_budget_accepts_non_improving_draft() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let smart = ScriptedChat::new(["draft cv"]);
        let embedder = embedder(0.4, 0.9);

        let enhancer = CvEnhancer {
            prompts: &prompts,
            smart: smart.as_ref(),
            embedder: embedder.as_ref(),
            max_retries: 0,
        };
        let result = enhancer.enhance(input()).await.unwrap();

        assert_eq!(smart.call_count(), 1);
        assert_eq!(result.outcome, Outcome::AcceptedDraft);
    }

    #[tokio::test]
    async fn test_prompt_carries_baseline_similarity() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let smart = ScriptedChat::new(["draft cv"]);
        let embedder = embedder(0.9, 0.9);

        let enhancer = CvEnhancer {
            prompts: &prompts,
            smart: smart.as_ref(),
            embedder: embedder.as_ref(),
            max_retries: 3,
        };
        enhancer.enhance(input()).await.unwrap();

        assert_eq!(
            smart.calls()[0][0].content,
            "ENHANCE # TEMPLATE / Backend developer / Platform role / [\"Go\"] / [\"Rust\", \"Kubernetes\"] @ 0.5"
        );
    }

    #[tokio::test]
    async fn test_model_failure_is_llm_error() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let embedder = embedder(0.9, 0.9);

        let enhancer = CvEnhancer {
            prompts: &prompts,
            smart: &FailingChat,
            embedder: embedder.as_ref(),
            max_retries: 3,
        };
        let err = enhancer.enhance(input()).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref m) if m.contains("Failed to generate enhanced CV")));
    }
}
