//! Resolved service settings
//!
//! Built once in `main` from the bootstrap TOML plus command-line/environment
//! overrides, then shared read-only through `AppState`.

use ecg_common::config::TomlConfig;
use std::path::PathBuf;

/// Values supplied on the command line or through the environment
///
/// `Some` replaces the TOML value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
}

/// Immutable service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,

    pub model_path: PathBuf,
    pub input_channels: usize,
    pub serialize_inference: bool,

    /// Lowercase, dot-prefixed
    pub allowed_extensions: Vec<String>,
    pub max_file_size_bytes: u64,
    pub max_request_size_bytes: usize,
    pub require_record_pair: bool,
    pub expected_signal_length: usize,

    pub reader_command: String,
    pub staging_dir: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn resolve(toml: &TomlConfig, overrides: Overrides) -> Self {
        Self {
            host: overrides.host.unwrap_or_else(|| toml.server.host.clone()),
            port: overrides.port.unwrap_or(toml.server.port),
            model_path: overrides.model_path.unwrap_or_else(|| toml.model.path.clone()),
            input_channels: toml.model.input_channels,
            serialize_inference: toml.model.serialize_inference,
            allowed_extensions: toml.upload.allowed_extensions.clone(),
            max_file_size_bytes: toml.upload.max_file_size_bytes,
            max_request_size_bytes: toml.upload.max_request_size_bytes,
            require_record_pair: toml.upload.require_record_pair,
            expected_signal_length: toml.upload.expected_signal_length,
            reader_command: toml.reader.command.clone(),
            staging_dir: toml.staging_dir.clone(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-file cap in whole MiB, as shown to clients
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }

    /// Allowed extensions joined for error messages
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::resolve(&TomlConfig::default(), Overrides::default())
    }
}
