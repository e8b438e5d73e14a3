//! Uploaded record files
//!
//! An [`UploadSet`] lives for one request and is dropped once its files have
//! been staged.

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the uploaded files
pub const FILES_FIELD: &str = "files";

/// One uploaded file
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Final path component of the client-supplied filename
    pub filename: String,
    pub content: Bytes,
}

impl UploadedFile {
    /// Build from a client filename, keeping only its final path component
    pub fn new(client_filename: &str, content: Bytes) -> ApiResult<Self> {
        Ok(Self {
            filename: sanitize_filename(client_filename)?,
            content,
        })
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Lowercased extension with leading dot, empty if there is none
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }

    /// Filename without its extension
    pub fn stem(&self) -> String {
        Path::new(&self.filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }
}

/// Uploaded files in the order they arrived
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    files: Vec<UploadedFile>,
}

impl UploadSet {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter()
    }

    pub fn first(&self) -> Option<&UploadedFile> {
        self.files.first()
    }

    /// Drain a multipart body, keeping every part of the `files` field
    pub async fn from_multipart(mut multipart: Multipart) -> ApiResult<Self> {
        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, "multipart field"))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name != FILES_FIELD {
                warn!("Ignoring unknown multipart field: {}", name);
                continue;
            }

            let client_filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| ApiError::InvalidUpload("Uploaded file is missing a filename".to_string()))?;
            let content = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, &client_filename))?;

            debug!(filename = %client_filename, size = content.len(), "Received upload");
            files.push(UploadedFile::new(&client_filename, content)?);
        }

        Ok(Self { files })
    }
}

/// Body-limit breaches become 413, everything else is a malformed upload
fn multipart_error(err: MultipartError, context: &str) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::RequestTooLarge(err.body_text())
    } else {
        ApiError::InvalidUpload(format!("Failed to read {}: {}", context, err.body_text()))
    }
}

/// Reduce a client filename to its final path component
///
/// Both `/` and `\` count as separators whatever the host platform. Names
/// with control characters (NUL included) are rejected.
pub fn sanitize_filename(client_filename: &str) -> ApiResult<String> {
    let name = client_filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();

    if name.chars().any(char::is_control) {
        return Err(ApiError::InvalidUpload(format!(
            "Filename contains control characters: {:?}",
            client_filename
        )));
    }
    if name.is_empty() || name == "." || name == ".." {
        return Err(ApiError::InvalidUpload(format!(
            "Unusable filename: '{}'",
            client_filename
        )));
    }
    Ok(name.to_string())
}
