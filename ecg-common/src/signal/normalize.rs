use super::Waveform;

/// Added to each lead's standard deviation so flat leads divide safely
pub const NORMALIZATION_EPSILON: f64 = 1e-8;

/// Waveform rescaled to zero mean and unit variance per lead
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWaveform {
    leads: usize,
    samples: usize,
    data: Vec<f64>,
}

impl NormalizedWaveform {
    pub fn lead_count(&self) -> usize {
        self.leads
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.leads, self.samples)
    }

    pub fn lead(&self, index: usize) -> &[f64] {
        &self.data[index * self.samples..(index + 1) * self.samples]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Lead-major single-precision copy for model input
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32).collect()
    }
}

/// Mean and population standard deviation of a slice
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Standardise each lead independently: `(x - mean) / (std + 1e-8)`
pub fn normalize(waveform: &Waveform) -> NormalizedWaveform {
    let mut data = Vec::with_capacity(waveform.as_slice().len());
    for lead in waveform.leads() {
        let (mean, std) = mean_std(lead);
        let scale = std + NORMALIZATION_EPSILON;
        data.extend(lead.iter().map(|v| (v - mean) / scale));
    }
    NormalizedWaveform {
        leads: waveform.lead_count(),
        samples: waveform.sample_count(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead_wave(samples: usize, amplitude: f64, offset: f64) -> Vec<f64> {
        (0..samples)
            .map(|i| offset + amplitude * (i as f64 * 0.05).sin())
            .collect()
    }

    #[test]
    fn test_each_lead_zero_mean_unit_std() {
        let w = Waveform::from_leads(vec![
            lead_wave(1000, 1.5, 0.2),
            lead_wave(1000, 0.01, -3.0),
            lead_wave(1000, 250.0, 40.0),
        ])
        .unwrap();

        let n = normalize(&w);
        assert_eq!(n.shape(), w.shape());
        for i in 0..n.lead_count() {
            let (mean, std) = mean_std(n.lead(i));
            assert!(mean.abs() < 1e-9, "lead {} mean {}", i, mean);
            assert!((std - 1.0).abs() < 1e-4, "lead {} std {}", i, std);
        }
    }

    #[test]
    fn test_constant_lead_maps_to_zero() {
        let w = Waveform::from_leads(vec![vec![0.7; 50], lead_wave(50, 1.0, 0.0)]).unwrap();
        let n = normalize(&w);
        assert!(n.lead(0).iter().all(|v| v.abs() < 1e-6));
        assert!(n.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_leads_are_independent() {
        let a = lead_wave(200, 2.0, 1.0);
        let alone = normalize(&Waveform::from_leads(vec![a.clone()]).unwrap());
        let paired = normalize(&Waveform::from_leads(vec![a, vec![1000.0; 200]]).unwrap());
        assert_eq!(alone.lead(0), paired.lead(0));
    }

    #[test]
    fn test_f32_copy_preserves_layout() {
        let w = Waveform::from_leads(vec![vec![1.0, 3.0], vec![10.0, 20.0]]).unwrap();
        let n = normalize(&w);
        let flat = n.to_f32_vec();
        assert_eq!(flat.len(), 4);
        assert!(flat[0] < 0.0 && flat[1] > 0.0);
        assert!(flat[2] < 0.0 && flat[3] > 0.0);
    }
}
