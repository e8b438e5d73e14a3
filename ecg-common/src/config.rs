//! Bootstrap configuration and config file resolution
//!
//! Configuration is read once at startup and never reloaded. Every key is
//! optional; anything missing falls back to the compiled defaults below.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ECG_CLASSIFIER_CONFIG` environment variable
//! 3. `~/.config/ecg-classifier/config.toml`
//! 4. `/etc/ecg-classifier/config.toml`
//! 5. Compiled defaults (no file)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ECG_CLASSIFIER_CONFIG";

/// Directory name used under the user and system config roots
pub const CONFIG_DIR_NAME: &str = "ecg-classifier";

const MIB: u64 = 1024 * 1024;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub upload: UploadConfig,
    pub reader: ReaderConfig,

    /// Parent directory for per-request staging directories.
    /// `None` uses the OS temp dir.
    pub staging_dir: Option<PathBuf>,

    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Classification model settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the model weights file
    pub path: PathBuf,

    /// Number of input leads the model expects
    pub input_channels: usize,

    /// Funnel every inference call through a single lock
    pub serialize_inference: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/ecg_model.json"),
            input_channels: 12,
            serialize_inference: false,
        }
    }
}

/// Upload acceptance rules
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Allowed filename extensions, e.g. `.dat`, `.hea`
    pub allowed_extensions: Vec<String>,

    /// Per-file size cap
    pub max_file_size_bytes: u64,

    /// Cap on the whole multipart request body
    pub max_request_size_bytes: usize,

    /// Require every allowed extension to be present in one upload
    pub require_record_pair: bool,

    /// Sample count the model was trained on (advisory)
    pub expected_signal_length: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![".dat".to_string(), ".hea".to_string()],
            max_file_size_bytes: 10 * MIB,
            max_request_size_bytes: (64 * MIB) as usize,
            require_record_pair: false,
            expected_signal_length: 5000,
        }
    }
}

/// External waveform reader settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Program used to dump a record as CSV
    pub command: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            command: "rdsamp".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse a config file from disk and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config from a TOML string and validate it
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.upload.allowed_extensions = config
            .upload
            .allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .collect();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.model.input_channels == 0 {
            return Err(Error::Config("model.input_channels must be at least 1".to_string()));
        }
        if self.upload.allowed_extensions.is_empty() {
            return Err(Error::Config("upload.allowed_extensions must not be empty".to_string()));
        }
        if self.upload.max_file_size_bytes == 0 {
            return Err(Error::Config("upload.max_file_size_bytes must be positive".to_string()));
        }
        if (self.upload.max_request_size_bytes as u64) < self.upload.max_file_size_bytes {
            return Err(Error::Config(format!(
                "upload.max_request_size_bytes ({}) is smaller than upload.max_file_size_bytes ({})",
                self.upload.max_request_size_bytes, self.upload.max_file_size_bytes
            )));
        }
        if self.reader.command.trim().is_empty() {
            return Err(Error::Config("reader.command must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Lowercase an extension and make sure it carries a leading dot
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Locates and loads the bootstrap config file
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Explicitly requested config path (CLI, then environment)
    fn explicit_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }
        std::env::var(CONFIG_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Well-known locations checked when nothing was requested explicitly
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join(CONFIG_DIR_NAME).join("config.toml"));
        }
        if cfg!(unix) {
            locations.push(PathBuf::from("/etc").join(CONFIG_DIR_NAME).join("config.toml"));
        }
        locations
    }

    /// Resolve which config file to use, if any
    ///
    /// An explicitly requested file is returned even if it does not exist so
    /// that `load` can report it.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = self.explicit_path() {
            return Some(path);
        }
        Self::default_locations().into_iter().find(|path| path.exists())
    }

    /// Load the bootstrap config
    ///
    /// A missing default-location file yields compiled defaults. A missing
    /// explicitly requested file or an unparsable file is an error.
    pub fn load(&self) -> Result<TomlConfig> {
        match self.locate() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)
            }
            Some(path) => Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}
