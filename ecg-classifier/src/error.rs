//! Error types for ecg-classifier
//!
//! Every pipeline stage returns `ApiResult`. Errors fall into two tiers:
//! - client input errors (4xx): the message is returned to the caller verbatim
//! - server faults (500): the message is logged and the caller receives a
//!   fixed redacted detail

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Detail returned in place of the message for server faults
pub const REDACTED_DETAIL: &str = "An unexpected error occurred";

/// Error category returned for server faults
pub const INTERNAL_ERROR: &str = "Internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload set was empty (400)
    #[error("No files uploaded")]
    NoFiles,

    /// None of the uploaded extensions are accepted (400)
    #[error("Please upload files with extensions: {allowed}")]
    DisallowedExtensions { allowed: String },

    /// Strict mode: part of the record is missing (400)
    #[error("Missing companion file(s) for record '{record}': {missing}")]
    IncompleteRecord { record: String, missing: String },

    /// One file exceeds the per-file cap (413)
    #[error("File {filename} is too large. Max size: {max_mb}MB")]
    FileTooLarge { filename: String, max_mb: u64 },

    /// Whole request body exceeds the configured limit (413)
    #[error("Request body too large: {0}")]
    RequestTooLarge(String),

    /// Malformed multipart body or unusable filename (400)
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Reader rejected the staged record (400)
    #[error("Failed to read ECG files: {0}")]
    MalformedRecord(String),

    /// Record lead count does not match the model input (400)
    #[error("Record has {actual} leads but the model expects {expected}")]
    LeadCountMismatch { expected: usize, actual: usize },

    /// Writing staged files failed (500)
    #[error("Staging failed: {0}")]
    Staging(#[from] std::io::Error),

    /// Model raised during inference (500)
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Anything else unexpected (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFiles
            | ApiError::DisallowedExtensions { .. }
            | ApiError::IncompleteRecord { .. }
            | ApiError::InvalidUpload(_)
            | ApiError::MalformedRecord(_)
            | ApiError::LeadCountMismatch { .. } => StatusCode::BAD_REQUEST,
            ApiError::FileTooLarge { .. } | ApiError::RequestTooLarge(_) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Staging(_) | ApiError::Inference(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for errors caused by the uploaded input
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Short error category for the response envelope
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::NoFiles
            | ApiError::DisallowedExtensions { .. }
            | ApiError::IncompleteRecord { .. }
            | ApiError::InvalidUpload(_) => "Invalid upload",
            ApiError::FileTooLarge { .. } | ApiError::RequestTooLarge(_) => "File too large",
            ApiError::MalformedRecord(_) | ApiError::LeadCountMismatch { .. } => "Invalid record",
            ApiError::Staging(_) | ApiError::Inference(_) | ApiError::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Response envelope for this error, redacted for server faults
    pub fn to_error_response(&self) -> ErrorResponse {
        if self.is_client_error() {
            ErrorResponse::new(self.category(), self.to_string())
        } else {
            ErrorResponse::new(INTERNAL_ERROR, REDACTED_DETAIL)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_client_error() {
            tracing::info!(status = status.as_u16(), "Request rejected: {}", self);
        } else {
            error!(status = status.as_u16(), "Prediction error: {}", self);
        }
        (status, Json(self.to_error_response())).into_response()
    }
}

/// Result type for API handlers and pipeline stages
pub type ApiResult<T> = Result<T, ApiError>;
