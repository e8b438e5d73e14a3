//! Request/response payloads
//!
//! Success and error bodies keep a fixed shape whichever stage produced them.

use ecg_common::EcgStats;
use serde::{Deserialize, Serialize};

use crate::model::Prediction;

/// Completion message on every successful prediction
pub const SUCCESS_MESSAGE: &str = "ECG classification completed successfully";

/// POST /predict_file success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub predicted_class: String,
    pub predicted_class_index: usize,
    pub confidence: f64,
    /// Raw waveform statistics
    pub ecg_stats: EcgStats,
    pub message: String,
}

impl PredictionResponse {
    pub fn new(prediction: Prediction, stats: EcgStats) -> Self {
        Self {
            success: true,
            predicted_class: prediction.label,
            predicted_class_index: prediction.class_index,
            confidence: prediction.confidence,
            ecg_stats: stats,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Error body for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            detail: detail.into(),
        }
    }
}

/// GET / liveness body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

/// GET /health body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: i64,
}
