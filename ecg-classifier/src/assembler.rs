//! Waveform assembly
//!
//! Reads a staged record and reorients it lead-major for the rest of the
//! pipeline.

use ecg_common::Waveform;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::reader::{ReaderError, SampleMatrix, WaveformReader};
use crate::staging::StagedRecord;

impl From<ReaderError> for ApiError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::Record(msg) => ApiError::MalformedRecord(msg),
            ReaderError::Unavailable(msg) => ApiError::Internal(msg),
        }
    }
}

/// Transpose `(samples, leads)` into a `(leads, samples)` waveform
pub fn transpose(matrix: &SampleMatrix) -> ApiResult<Waveform> {
    let (samples, leads) = matrix.shape();
    let mut data = Vec::with_capacity(samples * leads);
    for lead in 0..leads {
        data.extend((0..samples).map(|sample| matrix.get(sample, lead)));
    }
    Waveform::new(leads, samples, data).map_err(|e| ApiError::MalformedRecord(e.to_string()))
}

/// Read the staged record and return its lead-major waveform
pub async fn assemble_waveform(
    reader: &dyn WaveformReader,
    record: &StagedRecord,
) -> ApiResult<Waveform> {
    let matrix = reader.read(&record.record_path()).await?;
    let waveform = transpose(&matrix)?;
    info!("ECG data shape: {:?}", waveform.shape());
    Ok(waveform)
}

/// Lead count must equal the model's input channel count
pub fn check_lead_count(waveform: &Waveform, expected: usize) -> ApiResult<()> {
    if waveform.lead_count() != expected {
        return Err(ApiError::LeadCountMismatch {
            expected,
            actual: waveform.lead_count(),
        });
    }
    Ok(())
}

/// Warn when the record length differs from what the model was trained on
pub fn check_signal_length(waveform: &Waveform, expected: usize) {
    if expected > 0 && waveform.sample_count() != expected {
        warn!(
            "Signal length {} differs from expected length {}",
            waveform.sample_count(),
            expected
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct FixedReader(Result<Vec<Vec<f64>>, String>);

    #[async_trait]
    impl WaveformReader for FixedReader {
        async fn read(&self, _record_path: &Path) -> Result<SampleMatrix, ReaderError> {
            match &self.0 {
                Ok(frames) => SampleMatrix::from_frames(frames.clone()),
                Err(msg) => Err(ReaderError::Record(msg.clone())),
            }
        }
    }

    fn record() -> StagedRecord {
        StagedRecord {
            record_name: "100".to_string(),
            directory: PathBuf::from("/tmp/ecg-upload-test"),
        }
    }

    #[test]
    fn test_transpose_to_lead_major() {
        let matrix = SampleMatrix::from_frames(vec![
            vec![1.0, 10.0, 100.0],
            vec![2.0, 20.0, 200.0],
        ])
        .unwrap();
        let waveform = transpose(&matrix).unwrap();
        assert_eq!(waveform.shape(), (3, 2));
        assert_eq!(waveform.lead(0), &[1.0, 2.0]);
        assert_eq!(waveform.lead(2), &[100.0, 200.0]);
    }

    #[test]
    fn test_non_finite_samples_are_malformed() {
        let matrix = SampleMatrix::from_frames(vec![vec![1.0, f64::NAN]]).unwrap();
        assert!(matches!(transpose(&matrix), Err(ApiError::MalformedRecord(_))));
    }

    #[tokio::test]
    async fn test_reader_error_becomes_client_error() {
        let reader = FixedReader(Err("init: can't open header for record 100".to_string()));
        let err = assemble_waveform(&reader, &record()).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
        assert_eq!(
            err.to_string(),
            "Failed to read ECG files: init: can't open header for record 100"
        );
    }

    #[tokio::test]
    async fn test_assemble_shape() {
        let frames = vec![vec![0.5; 12]; 40];
        let waveform = assemble_waveform(&FixedReader(Ok(frames)), &record()).await.unwrap();
        assert_eq!(waveform.shape(), (12, 40));
    }

    #[test]
    fn test_unavailable_reader_is_server_fault() {
        let err = ApiError::from(ReaderError::Unavailable("rdsamp not found".to_string()));
        assert_eq!(err.status().as_u16(), 500);
    }

    #[test]
    fn test_lead_count_check() {
        let waveform = Waveform::from_leads(vec![vec![0.0; 4]; 3]).unwrap();
        assert!(check_lead_count(&waveform, 3).is_ok());
        let err = check_lead_count(&waveform, 12).unwrap_err();
        assert_eq!(err.to_string(), "Record has 3 leads but the model expects 12");
    }
}
