// Fixed prompt fragments that are part of the pipeline's behaviour rather than
// operator-editable templates. Editable templates live in the config directory
// and are loaded through `crate::prompts::PromptStore`.

/// Query embedded to pick the job-posting chunks worth sending to the model.
pub const JOB_RETRIEVAL_QUERY: &str =
    "job title responsibilities qualifications requirements description";

/// Number of chunks retrieved for job-record extraction.
pub const JOB_RETRIEVAL_TOP_K: usize = 3;

/// Human turn paired with the job RAG system prompt.
pub fn job_extraction_request(context: &str) -> String {
    format!("Extract the job details from this text:\n\n{context}")
}

/// Corrective turn sent after a rewrite failed to raise similarity.
pub fn similarity_feedback(new_similarity: f64, baseline_similarity: f64) -> String {
    format!(
        "New Cosine Similarity: {new_similarity:.6}; Improvement over previous: {:+.6}",
        new_similarity - baseline_similarity
    )
}
