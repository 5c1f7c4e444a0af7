//! Multipart form reading shared by the upload endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

pub const CV_FILE_FIELD: &str = "cv_file";
const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug)]
pub struct UploadedFile {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Checks the declared content type (not the bytes) and returns the PDF payload.
    pub fn into_pdf(self) -> Result<Bytes, AppError> {
        let is_pdf = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
            .unwrap_or(false);

        if !is_pdf {
            return Err(AppError::Validation("File must be a PDF".to_string()));
        }
        Ok(self.bytes)
    }
}

/// A parsed multipart body: the CV file part plus every text part by name.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub cv_file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// A text field's value, or `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn take_cv_file(&mut self) -> Result<UploadedFile, AppError> {
        self.cv_file
            .take()
            .ok_or_else(|| AppError::Validation(format!("Missing '{CV_FILE_FIELD}' file part")))
    }
}

pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == CV_FILE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
            debug!(
                "Received {} ({:?}, {} bytes)",
                file_name.as_deref().unwrap_or("<unnamed>"),
                content_type,
                bytes.len()
            );
            form.cv_file = Some(UploadedFile {
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
