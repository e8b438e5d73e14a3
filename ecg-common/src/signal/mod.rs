//! Multi-lead waveform domain
//!
//! All matrices here are lead-major: one row per lead, one column per sample.

mod normalize;
mod stats;
mod waveform;

pub use normalize::{normalize, NormalizedWaveform, NORMALIZATION_EPSILON};
pub use stats::{compute_stats, EcgStats};
pub use waveform::Waveform;
