//! Classification model seam
//!
//! The service talks to its model only through [`Classifier`]. The model is
//! loaded once at startup and shared read-only by all requests.
//!
//! The bundled [`LinearHeadModel`] pools three features per lead from the
//! normalised input (mean |x|, peak |x|, zero-crossing rate) and applies a
//! linear head followed by softmax. Weights are read from JSON:
//!
//! ```json
//! {
//!   "labels": ["NORM", "MI", "STTC", "CD", "HYP"],
//!   "input_channels": 12,
//!   "weights": [[0.1, ...], ...],
//!   "bias": [0.0, ...]
//! }
//! ```
//!
//! `weights` has one row per label, each `input_channels * 3` long, ordered
//! lead by lead.

use ecg_common::NormalizedWaveform;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Pooled features extracted per lead by [`LinearHeadModel`]
pub const FEATURES_PER_LEAD: usize = 3;

/// Model output for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub class_index: usize,
    /// Top-class probability in `[0, 1]`
    pub confidence: f64,
}

/// Single-batch model input, shape `[1, channels, samples]`
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    channels: usize,
    samples: usize,
    data: Vec<f32>,
}

impl InputTensor {
    pub fn from_normalized(waveform: &NormalizedWaveform) -> Self {
        Self {
            channels: waveform.lead_count(),
            samples: waveform.sample_count(),
            data: waveform.to_f32_vec(),
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        [1, self.channels, self.samples]
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.data[index * self.samples..(index + 1) * self.samples]
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file: {0}")]
    Parse(String),

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Input has {actual} channels, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference runtime error: {0}")]
    Runtime(String),
}

/// Inference interface
///
/// Implementations must be safe to call from several requests at once. Wrap
/// a model that is not in [`SerializedClassifier`].
pub trait Classifier: Send + Sync {
    /// Lead count the model was built for
    fn input_channels(&self) -> usize;

    fn predict(&self, input: &InputTensor) -> Result<Prediction, ModelError>;
}

/// Runs every inference call under one lock
pub struct SerializedClassifier<C> {
    inner: Mutex<C>,
    input_channels: usize,
}

impl<C: Classifier> SerializedClassifier<C> {
    pub fn new(inner: C) -> Self {
        let input_channels = inner.input_channels();
        Self {
            inner: Mutex::new(inner),
            input_channels,
        }
    }
}

impl<C: Classifier> Classifier for SerializedClassifier<C> {
    fn input_channels(&self) -> usize {
        self.input_channels
    }

    fn predict(&self, input: &InputTensor) -> Result<Prediction, ModelError> {
        let model = self
            .inner
            .lock()
            .map_err(|_| ModelError::Runtime("inference lock poisoned".to_string()))?;
        model.predict(input)
    }
}

#[derive(Debug, Deserialize)]
struct LinearHeadFile {
    labels: Vec<String>,
    input_channels: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

/// Pooled-feature linear classifier
#[derive(Debug, Clone)]
pub struct LinearHeadModel {
    labels: Vec<String>,
    input_channels: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl LinearHeadModel {
    /// Build and check dimensions
    pub fn new(
        labels: Vec<String>,
        input_channels: usize,
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
    ) -> Result<Self, ModelError> {
        if labels.is_empty() {
            return Err(ModelError::Invalid("no class labels".to_string()));
        }
        if input_channels == 0 {
            return Err(ModelError::Invalid("input_channels must be at least 1".to_string()));
        }
        if weights.len() != labels.len() || bias.len() != labels.len() {
            return Err(ModelError::Invalid(format!(
                "{} labels but {} weight rows and {} biases",
                labels.len(),
                weights.len(),
                bias.len()
            )));
        }
        let row_len = input_channels * FEATURES_PER_LEAD;
        if let Some((class, row)) = weights.iter().enumerate().find(|(_, r)| r.len() != row_len) {
            return Err(ModelError::Invalid(format!(
                "weight row {} has {} entries, expected {}",
                class,
                row.len(),
                row_len
            )));
        }
        if weights.iter().flatten().chain(bias.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::Invalid("non-finite parameter".to_string()));
        }
        Ok(Self {
            labels,
            input_channels,
            weights,
            bias,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Mean |x|, peak |x| and zero-crossing rate of one lead
fn lead_features(lead: &[f32]) -> [f32; FEATURES_PER_LEAD] {
    let n = lead.len().max(1) as f32;
    let mean_abs = lead.iter().map(|v| v.abs()).sum::<f32>() / n;
    let peak_abs = lead.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
    let crossings = lead
        .windows(2)
        .filter(|pair| (pair[0] < 0.0) != (pair[1] < 0.0))
        .count();
    [mean_abs, peak_abs, crossings as f32 / n]
}

/// Numerically stable softmax
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl Classifier for LinearHeadModel {
    fn input_channels(&self) -> usize {
        self.input_channels
    }

    fn predict(&self, input: &InputTensor) -> Result<Prediction, ModelError> {
        if input.channels() != self.input_channels {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_channels,
                actual: input.channels(),
            });
        }

        let features: Vec<f32> = (0..input.channels())
            .flat_map(|c| lead_features(input.channel(c)))
            .collect();

        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&features).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        let probabilities = softmax(&logits);
        let (class_index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        if !confidence.is_finite() {
            return Err(ModelError::Runtime("non-finite class probabilities".to_string()));
        }

        Ok(Prediction {
            label: self.labels[class_index].clone(),
            class_index,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

/// Load the model weights and check the channel count
pub fn load_model(path: &Path, channels: usize) -> Result<LinearHeadModel, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: LinearHeadFile =
        serde_json::from_str(&content).map_err(|e| ModelError::Parse(e.to_string()))?;

    if file.input_channels != channels {
        return Err(ModelError::ShapeMismatch {
            expected: channels,
            actual: file.input_channels,
        });
    }

    LinearHeadModel::new(file.labels, file.input_channels, file.weights, file.bias)
}
