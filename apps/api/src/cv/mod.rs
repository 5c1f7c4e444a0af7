//! CV Content Extractor: PDF text plus supplementary info, and the CV keyword set.

pub mod handlers;

use tracing::{error, info};

use crate::errors::AppError;
use crate::llm_client::{strip_code_fences, ChatMessage, ChatModel};
use crate::prompts::PromptStore;

/// Extracts the text of every page, in page order, from an in-memory PDF.
pub fn extract_text(pdf: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(pdf).map_err(|e| {
        error!("Error extracting PDF: {e}");
        AppError::Processing(format!("Failed to extract text from PDF: {e}"))
    })?;
    info!("Extracted {} characters from PDF", text.chars().count());
    Ok(text)
}

/// Appends supplementary information under fixed headers.
/// Returns `cv_raw_text` unchanged when `additional_info` is absent or blank.
pub fn combine(cv_raw_text: &str, additional_info: Option<&str>) -> String {
    match additional_info.map(str::trim).filter(|info| !info.is_empty()) {
        Some(info) => format!(
            "\n------------\nCV Raw Text:\n------------\n{cv_raw_text}\n---------------\nAdditional Info:\n---------------\n{info}\n"
        ),
        None => cv_raw_text.to_string(),
    }
}

/// Asks the fast model for the CV's keyword set. The reply is returned with any code
/// fence removed; it is not validated as JSON.
pub async fn extract_keywords(
    cv_text: &str,
    prompts: &PromptStore,
    fast: &dyn ChatModel,
) -> Result<String, AppError> {
    let prompt = prompts.format_cv_keywords_prompt(cv_text)?;
    let reply = fast
        .chat(&[ChatMessage::user(prompt)])
        .await
        .map_err(|e| AppError::Llm(format!("Failed to extract CV keywords: {e}")))?;

    info!("Extracted keywords from CV");
    Ok(strip_code_fences(&reply).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::test_support::{pdf_with_pages, prompt_dir, FailingChat, ScriptedChat};

    #[test]
    fn test_combine_without_additional_info_is_identity() {
        assert_eq!(combine("Original CV text", None), "Original CV text");
    }

    #[test]
    fn test_combine_with_blank_additional_info_is_identity() {
        assert_eq!(combine("Original CV text", Some("  \n\t ")), "Original CV text");
    }

    #[test]
    fn test_combine_labels_both_sections() {
        let combined = combine("A", Some("  B  "));
        assert!(combined.contains("CV Raw Text:\n------------\nA\n"));
        assert!(combined.contains("Additional Info:\n---------------\nB\n"));
        assert!(combined.find("A").unwrap() < combined.find("B").unwrap());
    }

    #[test]
    fn test_extract_text_reads_pages_in_order() {
        let pdf = pdf_with_pages(&["Jane Doe Platform Engineer", "Certified Kubernetes Administrator"]);

        let text = extract_text(&pdf).unwrap();

        let first = text.find("Jane Doe Platform Engineer").unwrap();
        let second = text.find("Certified Kubernetes Administrator").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_extract_text_rejects_non_pdf() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(
            matches!(err, AppError::Processing(ref m) if m.starts_with("Failed to extract text from PDF"))
        );
    }

    #[tokio::test]
    async fn test_extract_keywords_strips_json_fence() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let fast = ScriptedChat::new(["```json\n[\"Python\", \"React\", \"Node.js\"]\n```"]);

        let keywords = extract_keywords("Python developer with React experience", &prompts, fast.as_ref())
            .await
            .unwrap();

        assert_eq!(keywords, "[\"Python\", \"React\", \"Node.js\"]");
        let calls = fast.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].role, Role::User);
        assert_eq!(
            calls[0][0].content,
            "CV KEYWORDS FOR: Python developer with React experience"
        );
    }

    #[tokio::test]
    async fn test_extract_keywords_returns_unfenced_reply_unchanged() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let fast = ScriptedChat::new(["Rust, Tokio, Axum"]);

        let keywords = extract_keywords("cv", &prompts, fast.as_ref()).await.unwrap();
        assert_eq!(keywords, "Rust, Tokio, Axum");
    }

    #[tokio::test]
    async fn test_extract_keywords_passes_blank_reply_through() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());
        let fast = ScriptedChat::new(["  \n"]);

        let keywords = extract_keywords("cv", &prompts, fast.as_ref()).await.unwrap();
        assert_eq!(keywords, "");
    }

    #[tokio::test]
    async fn test_extract_keywords_wraps_model_failure() {
        let dir = prompt_dir();
        let prompts = PromptStore::new(dir.path());

        let err = extract_keywords("cv", &prompts, &FailingChat).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(ref m) if m.contains("Failed to extract CV keywords")));
    }
}
