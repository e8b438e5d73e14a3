use super::normalize::mean_std;
use super::Waveform;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of a raw waveform
///
/// Amplitude figures are global over every lead and sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcgStats {
    pub num_leads: usize,
    pub signal_length: usize,
    pub mean_amplitude: f64,
    pub std_amplitude: f64,
    pub max_amplitude: f64,
    pub min_amplitude: f64,
}

pub fn compute_stats(waveform: &Waveform) -> EcgStats {
    let values = waveform.as_slice();
    let (mean, std) = mean_std(values);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);

    EcgStats {
        num_leads: waveform.lead_count(),
        signal_length: waveform.sample_count(),
        // Rounding can push the mean of a near-constant signal just outside [min, max]
        mean_amplitude: mean.clamp(min, max),
        std_amplitude: std,
        max_amplitude: max,
        min_amplitude: min,
    }
}
