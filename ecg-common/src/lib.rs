//! # ECG Common Library
//!
//! Shared code for the ECG classification service:
//! - Error types
//! - Bootstrap configuration loading and config file resolution
//! - Tracing initialisation
//! - Signal domain types (waveform, normalisation, statistics)

pub mod config;
pub mod error;
pub mod logging;
pub mod signal;

pub use error::{Error, Result};
pub use signal::{EcgStats, NormalizedWaveform, Waveform};
