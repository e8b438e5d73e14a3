//! Prediction orchestration
//!
//! One request moves strictly forward through
//! `Validating → Staging → Reading → Normalizing → Predicting → Responding`.
//! Any stage may fail; the first error ends the request and is returned
//! unchanged to the HTTP layer, which decides status code and redaction.
//!
//! The staging directory is opened after validation and closed before the
//! response is built, on success and failure alike.

use ecg_common::signal::{compute_stats, normalize};
use ecg_common::EcgStats;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::assembler::{assemble_waveform, check_lead_count, check_signal_length};
use crate::error::{ApiError, ApiResult};
use crate::model::{Classifier, InputTensor, Prediction};
use crate::models::PredictionResponse;
use crate::reader::WaveformReader;
use crate::settings::ServiceConfig;
use crate::staging::{StagingArea, StagingScope};
use crate::upload::UploadSet;
use crate::validation::validate_uploads;

/// Request lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Staging,
    Reading,
    Normalizing,
    Predicting,
    Responding,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Staging => "staging",
            PipelineStage::Reading => "reading",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Predicting => "predicting",
            PipelineStage::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// Model output merged with raw waveform statistics
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub prediction: Prediction,
    pub stats: EcgStats,
}

/// Wires validation, staging, reading, normalisation and inference together
#[derive(Clone)]
pub struct PredictionPipeline {
    config: Arc<ServiceConfig>,
    reader: Arc<dyn WaveformReader>,
    model: Arc<dyn Classifier>,
    staging: StagingArea,
}

impl PredictionPipeline {
    pub fn new(
        config: Arc<ServiceConfig>,
        reader: Arc<dyn WaveformReader>,
        model: Arc<dyn Classifier>,
    ) -> Self {
        let staging = StagingArea::new(config.staging_dir.clone());
        Self {
            config,
            reader,
            model,
            staging,
        }
    }

    /// Run one request to completion
    pub async fn run(&self, uploads: UploadSet) -> ApiResult<PredictionResponse> {
        let mut stage = PipelineStage::Validating;
        match self.execute(&mut stage, uploads).await {
            Ok(outcome) => {
                advance(&mut stage, PipelineStage::Responding);
                info!(
                    "Prediction: {} (confidence: {:.4})",
                    outcome.prediction.label, outcome.prediction.confidence
                );
                Ok(PredictionResponse::new(outcome.prediction, outcome.stats))
            }
            Err(err) => {
                debug!(stage = %stage, "Pipeline failed");
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        stage: &mut PipelineStage,
        uploads: UploadSet,
    ) -> ApiResult<PredictionOutcome> {
        validate_uploads(&uploads, &self.config)?;
        info!("Processing {} files", uploads.len());

        advance(stage, PipelineStage::Staging);
        let scope = self.staging.open()?;
        let outcome = self.execute_staged(stage, &scope, uploads).await;
        scope.close().await;
        outcome
    }

    async fn execute_staged(
        &self,
        stage: &mut PipelineStage,
        scope: &StagingScope,
        uploads: UploadSet,
    ) -> ApiResult<PredictionOutcome> {
        let record = scope.stage(&uploads).await?;
        drop(uploads);

        advance(stage, PipelineStage::Reading);
        let waveform = assemble_waveform(self.reader.as_ref(), &record).await?;
        check_lead_count(&waveform, self.model.input_channels())?;
        check_signal_length(&waveform, self.config.expected_signal_length);

        advance(stage, PipelineStage::Normalizing);
        let stats = compute_stats(&waveform);
        let tensor = InputTensor::from_normalized(&normalize(&waveform));

        advance(stage, PipelineStage::Predicting);
        let prediction = self.predict(tensor).await?;

        Ok(PredictionOutcome { prediction, stats })
    }

    /// Inference is CPU-bound, so it runs off the async executor
    async fn predict(&self, tensor: InputTensor) -> ApiResult<Prediction> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.predict(&tensor))
            .await
            .map_err(|e| ApiError::Internal(format!("inference task failed: {}", e)))?
            .map_err(|e| ApiError::Inference(e.to_string()))
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    debug!(from = %stage, to = %next, "Pipeline stage");
    *stage = next;
}
