//! Shared test fixtures: a header-driven reader, failing models, and a
//! multipart body builder.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use ecg_classifier::model::{load_model, Classifier, InputTensor, ModelError, Prediction, FEATURES_PER_LEAD};
use ecg_classifier::reader::{ReaderError, SampleMatrix, WaveformReader};
use ecg_classifier::settings::ServiceConfig;
use ecg_classifier::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

pub const BOUNDARY: &str = "ecg-test-boundary-7MA4YWxkTrZu0gW";

/// Reads `<record>.hea` and synthesises the waveform it describes
///
/// The header's first line must be `name num_leads fs num_samples`, the
/// same layout as a WFDB record line. The `.dat` file must exist.
pub struct HeaderDrivenReader;

#[async_trait]
impl WaveformReader for HeaderDrivenReader {
    async fn read(&self, record_path: &Path) -> Result<SampleMatrix, ReaderError> {
        let header_path = record_path.with_extension("hea");
        let header = tokio::fs::read_to_string(&header_path).await.map_err(|e| {
            ReaderError::Record(format!("can't open header file {}: {}", header_path.display(), e))
        })?;
        if !record_path.with_extension("dat").exists() {
            return Err(ReaderError::Record("can't open signal file".to_string()));
        }

        let fields: Vec<&str> = header.lines().next().unwrap_or("").split_whitespace().collect();
        let parsed = match fields.as_slice() {
            [_, leads, _, samples, ..] => leads.parse::<usize>().ok().zip(samples.parse::<usize>().ok()),
            _ => None,
        };
        let (leads, samples) = parsed.ok_or_else(|| {
            ReaderError::Record(format!("malformed record line in header: '{}'", header.trim()))
        })?;

        let frames = (0..samples)
            .map(|i| {
                (0..leads)
                    .map(|lead| 0.8 * ((i as f64) * 0.02 * (lead + 1) as f64).sin() + 0.05 * lead as f64)
                    .collect()
            })
            .collect();
        SampleMatrix::from_frames(frames)
    }
}

/// Model that always raises
pub struct FailingModel;

impl Classifier for FailingModel {
    fn input_channels(&self) -> usize {
        12
    }

    fn predict(&self, _input: &InputTensor) -> Result<Prediction, ModelError> {
        Err(ModelError::Runtime("CUDA error: device-side assert triggered at /srv/models".to_string()))
    }
}

/// Model that panics mid-inference
pub struct PanickingModel;

impl Classifier for PanickingModel {
    fn input_channels(&self) -> usize {
        12
    }

    fn predict(&self, _input: &InputTensor) -> Result<Prediction, ModelError> {
        panic!("index out of bounds in attention head 7");
    }
}

/// Write a 5-class linear-head model file for `channels` leads
pub fn model_file(channels: usize) -> NamedTempFile {
    let row_len = channels * FEATURES_PER_LEAD;
    let weights: Vec<Vec<f32>> = (0..5)
        .map(|class| (0..row_len).map(|i| ((class * 7 + i) % 5) as f32 * 0.1 - 0.2).collect())
        .collect();
    let body = serde_json::json!({
        "labels": ["NORM", "MI", "STTC", "CD", "HYP"],
        "input_channels": channels,
        "weights": weights,
        "bias": [0.1, 0.0, -0.1, 0.05, 0.0],
    });

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.to_string().as_bytes()).unwrap();
    file
}

/// Test application with its own staging root
pub struct TestApp {
    pub router: Router,
    pub staging_root: TempDir,
}

impl TestApp {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self::with_config(model, ServiceConfig::default())
    }

    pub fn with_config(model: Arc<dyn Classifier>, config: ServiceConfig) -> Self {
        let staging_root = TempDir::new().unwrap();
        let config = ServiceConfig {
            staging_dir: Some(staging_root.path().to_path_buf()),
            ..config
        };
        let state = AppState::new(config, Arc::new(HeaderDrivenReader), model);
        Self {
            router: build_router(state),
            staging_root,
        }
    }

    /// App backed by a real linear-head model file
    pub fn with_linear_model() -> Self {
        let file = model_file(12);
        let model = load_model(file.path(), 12).unwrap();
        Self::new(Arc::new(model))
    }

    /// Entries left under the staging root
    pub fn leftover_staging_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_root.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

/// One multipart part
pub struct Part<'a> {
    field: &'a str,
    filename: Option<&'a str>,
    content: &'a [u8],
}

/// File part of the `files` field
pub fn file_part<'a>(filename: &'a str, content: &'a [u8]) -> Part<'a> {
    Part {
        field: "files",
        filename: Some(filename),
        content,
    }
}

/// Plain text form field
pub fn text_part<'a>(field: &'a str, value: &'a str) -> Part<'a> {
    Part {
        field,
        filename: None,
        content: value.as_bytes(),
    }
}

/// Build a multipart/form-data body using [`BOUNDARY`]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match part.filename {
            Some(name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                part.field, name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.field),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST /predict_file with a prepared multipart body
pub fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict_file")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Header and data files for a synthetic record
pub fn record_files(name: &str, leads: usize, samples: usize) -> (String, Vec<u8>, String, Vec<u8>) {
    let header = format!("{} {} 500 {}\n", name, leads, samples);
    let data = vec![0u8; leads * samples * 2];
    (
        format!("{}.hea", name),
        header.into_bytes(),
        format!("{}.dat", name),
        data,
    )
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response should be JSON")
}
