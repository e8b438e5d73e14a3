//! Transient record staging
//!
//! Each request gets its own temporary directory. Uploads are written there
//! under their (sanitised) filenames so the reader can find a record's
//! header and data side by side. The directory is removed when the scope is
//! closed, and by `Drop` on every other exit path (errors, panics, client
//! disconnects dropping the request future).

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::upload::UploadSet;

const STAGING_PREFIX: &str = "ecg-upload-";

/// Factory for per-request staging scopes
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    root: Option<PathBuf>,
}

impl StagingArea {
    /// `root` of `None` stages under the OS temp dir
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Create a fresh isolated directory
    pub fn open(&self) -> ApiResult<StagingScope> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(StagingScope { dir })
    }
}

/// Owns one request's staging directory
#[derive(Debug)]
pub struct StagingScope {
    dir: TempDir,
}

/// Files of one record, colocated in a staging directory
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    /// Record identifier: stem of the first uploaded file
    pub record_name: String,
    pub directory: PathBuf,
}

impl StagedRecord {
    /// `directory/record_name`, the extension-less path readers expect
    pub fn record_path(&self) -> PathBuf {
        self.directory.join(&self.record_name)
    }
}

impl StagingScope {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write every upload verbatim and derive the record identifier
    pub async fn stage(&self, uploads: &UploadSet) -> ApiResult<StagedRecord> {
        let first = uploads.first().ok_or(ApiError::NoFiles)?;

        for file in uploads.iter() {
            let target = self.dir.path().join(&file.filename);
            tokio::fs::write(&target, &file.content).await?;
            info!("Saved file: {}", file.filename);
        }

        Ok(StagedRecord {
            record_name: first.stem(),
            directory: self.dir.path().to_path_buf(),
        })
    }

    /// Remove the directory off the async executor
    pub async fn close(self) {
        let path = self.dir.path().to_path_buf();
        match tokio::task::spawn_blocking(move || self.dir.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to remove staging directory {}: {}", path.display(), e),
            Err(e) => warn!("Staging cleanup task failed for {}: {}", path.display(), e),
        }
    }
}
