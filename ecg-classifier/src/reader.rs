//! Waveform reader seam
//!
//! A reader turns an extension-less record path into a sample-major matrix
//! (one row per sample, one column per lead). Record parsing itself is left
//! to an external tool.
//!
//! # Default reader
//! [`RdsampReader`] runs `rdsamp` from the PhysioNet WFDB software package:
//!
//! ```bash
//! # Ubuntu/Debian
//! sudo apt-get install wfdb
//!
//! # From source
//! # See: https://physionet.org/content/wfdb/
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Reader errors
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The record could not be read (missing companion, corrupt header or data)
    #[error("{0}")]
    Record(String),

    /// The reader itself could not be run
    #[error("Waveform reader unavailable: {0}")]
    Unavailable(String),
}

/// Sample-major matrix, shape `(sample_count, lead_count)`
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    samples: usize,
    leads: usize,
    data: Vec<f64>,
}

impl SampleMatrix {
    /// Build from row-major data (`data[sample * leads + lead]`)
    pub fn new(samples: usize, leads: usize, data: Vec<f64>) -> Result<Self, ReaderError> {
        if data.len() != samples * leads {
            return Err(ReaderError::Record(format!(
                "expected {} values for {} samples x {} leads, got {}",
                samples * leads,
                samples,
                leads,
                data.len()
            )));
        }
        Ok(Self { samples, leads, data })
    }

    /// Build from one vector per sample frame
    pub fn from_frames(frames: Vec<Vec<f64>>) -> Result<Self, ReaderError> {
        let samples = frames.len();
        let leads = frames.first().map(Vec::len).unwrap_or(0);
        if let Some(index) = frames.iter().position(|f| f.len() != leads) {
            return Err(ReaderError::Record(format!(
                "sample {} has {} values, expected {}",
                index,
                frames[index].len(),
                leads
            )));
        }
        Self::new(samples, leads, frames.into_iter().flatten().collect())
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn lead_count(&self) -> usize {
        self.leads
    }

    /// `(sample_count, lead_count)`
    pub fn shape(&self) -> (usize, usize) {
        (self.samples, self.leads)
    }

    pub fn get(&self, sample: usize, lead: usize) -> f64 {
        self.data[sample * self.leads + lead]
    }
}

/// Reads a staged record
///
/// Must be callable concurrently from several requests.
#[async_trait]
pub trait WaveformReader: Send + Sync {
    /// Read the record at `record_path` (no extension)
    async fn read(&self, record_path: &Path) -> Result<SampleMatrix, ReaderError>;
}

/// Record search path variable read by the WFDB library
const WFDB_PATH_VAR: &str = "WFDB";

/// Reader backed by the WFDB `rdsamp` command
#[derive(Debug, Clone)]
pub struct RdsampReader {
    program: PathBuf,
}

impl RdsampReader {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for RdsampReader {
    fn default() -> Self {
        Self::new("rdsamp")
    }
}

#[async_trait]
impl WaveformReader for RdsampReader {
    async fn read(&self, record_path: &Path) -> Result<SampleMatrix, ReaderError> {
        let record_name = record_path
            .file_name()
            .ok_or_else(|| ReaderError::Record(format!("invalid record path {}", record_path.display())))?;
        let directory = record_path.parent().unwrap_or_else(|| Path::new("."));

        debug!(program = %self.program.display(), record = ?record_name, "Running waveform reader");

        // Records resolve only inside the staging directory
        let output = Command::new(&self.program)
            .arg("-r")
            .arg(record_name)
            .args(["-c", "-p"])
            .current_dir(directory)
            .env(WFDB_PATH_VAR, ".")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ReaderError::Unavailable(format!("failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ReaderError::Record(if stderr.is_empty() {
                format!("reader exited with {}", output.status)
            } else {
                stderr
            }));
        }

        parse_rdsamp_csv(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `rdsamp -c -p` output
///
/// Each line is `time,lead0,lead1,...`. Quoted heading lines are skipped.
/// `-` marks an invalid sample and rejects the record.
pub fn parse_rdsamp_csv(output: &str) -> Result<SampleMatrix, ReaderError> {
    let mut frames = Vec::new();

    for (line_no, line) in output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('\'') {
            continue;
        }

        let frame = line
            .split(',')
            .skip(1)
            .map(|field| {
                let field = field.trim();
                field.parse::<f64>().map_err(|_| {
                    ReaderError::Record(format!(
                        "invalid sample '{}' on output line {}",
                        field,
                        line_no + 1
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        frames.push(frame);
    }

    let matrix = SampleMatrix::from_frames(frames)?;
    if matrix.sample_count() == 0 || matrix.lead_count() == 0 {
        return Err(ReaderError::Record("record contains no samples".to_string()));
    }
    Ok(matrix)
}
