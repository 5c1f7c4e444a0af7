//! Share links: the Markdown CV compressed into the URL fragment of a rendering service.
//!
//! Encoding is zlib at maximum compression followed by unpadded URL-safe base64, so the
//! renderer can decode the fragment entirely client-side.

pub mod handlers;

use std::io::Write;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use flate2::{write::ZlibEncoder, Compression};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareLink {
    pub url: String,
    /// Characters in the Markdown source.
    pub original_length: usize,
    /// Characters in the encoded fragment.
    pub compressed_length: usize,
    /// `(1 - compressed / original) * 100` with one decimal and a `%` suffix.
    pub compression_ratio: String,
    pub total_url_length: usize,
}

pub fn encode_markdown(markdown: &str) -> Result<String, AppError> {
    let compressed = zlib_compress(markdown.as_bytes())
        .map_err(|e| AppError::Processing(format!("Failed to compress CV: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

fn zlib_compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

pub fn build_share_link(markdown: &str, base_url: &str) -> Result<ShareLink, AppError> {
    if markdown.trim().is_empty() {
        return Err(AppError::Validation("markdown must not be empty".to_string()));
    }

    let fragment = encode_markdown(markdown)?;
    let url = format!("{}/#{fragment}", base_url.trim_end_matches('/'));

    let original_length = markdown.chars().count();
    let compressed_length = fragment.len();
    let ratio = (1.0 - compressed_length as f64 / original_length as f64) * 100.0;

    info!("Built share link ({original_length} -> {compressed_length} characters)");
    Ok(ShareLink {
        total_url_length: url.len(),
        url,
        original_length,
        compressed_length,
        compression_ratio: format!("{ratio:.1}%"),
    })
}
