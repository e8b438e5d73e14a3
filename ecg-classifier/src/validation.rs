//! Upload gate
//!
//! Runs before anything touches the filesystem. Checks, in order:
//! 1. at least one file was uploaded
//! 2. no file exceeds the per-file cap (first offender is named)
//! 3. at least one file carries an allowed extension
//! 4. with `require_record_pair`, every allowed extension is present
//!
//! Without `require_record_pair` a header-only or data-only upload passes
//! and any problem surfaces later from the reader.

use std::collections::BTreeSet;

use crate::error::{ApiError, ApiResult};
use crate::settings::ServiceConfig;
use crate::upload::UploadSet;

pub fn validate_uploads(uploads: &UploadSet, config: &ServiceConfig) -> ApiResult<()> {
    let first = uploads.first().ok_or(ApiError::NoFiles)?;

    if let Some(oversized) = uploads.iter().find(|f| f.size() > config.max_file_size_bytes) {
        return Err(ApiError::FileTooLarge {
            filename: oversized.filename.clone(),
            max_mb: config.max_file_size_mb(),
        });
    }

    let extensions: BTreeSet<String> = uploads.iter().map(|f| f.extension()).collect();
    if !config.allowed_extensions.iter().any(|ext| extensions.contains(ext)) {
        return Err(ApiError::DisallowedExtensions {
            allowed: config.allowed_extensions_display(),
        });
    }

    if config.require_record_pair {
        let missing: Vec<&str> = config
            .allowed_extensions
            .iter()
            .filter(|ext| !extensions.contains(*ext))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::IncompleteRecord {
                record: first.stem(),
                missing: missing.join(", "),
            });
        }
    }

    Ok(())
}
