use crate::{Error, Result};

/// Raw multi-lead waveform, shape `(lead_count, sample_count)`
///
/// Both dimensions are non-zero and every sample is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    leads: usize,
    samples: usize,
    data: Vec<f64>,
}

impl Waveform {
    /// Build from lead-major data (`data[lead * samples + sample]`)
    pub fn new(leads: usize, samples: usize, data: Vec<f64>) -> Result<Self> {
        if leads == 0 || samples == 0 {
            return Err(Error::Signal(format!(
                "waveform must have at least one lead and one sample, got ({}, {})",
                leads, samples
            )));
        }
        if data.len() != leads * samples {
            return Err(Error::Signal(format!(
                "expected {} values for shape ({}, {}), got {}",
                leads * samples,
                leads,
                samples,
                data.len()
            )));
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(Error::Signal(format!(
                "non-finite value in lead {} at sample {}",
                index / samples,
                index % samples
            )));
        }
        Ok(Self { leads, samples, data })
    }

    /// Build from one vector per lead
    pub fn from_leads(rows: Vec<Vec<f64>>) -> Result<Self> {
        let leads = rows.len();
        let samples = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((lead, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != samples) {
            return Err(Error::Signal(format!(
                "lead {} has {} samples, lead 0 has {}",
                lead,
                row.len(),
                samples
            )));
        }
        Self::new(leads, samples, rows.into_iter().flatten().collect())
    }

    pub fn lead_count(&self) -> usize {
        self.leads
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// `(lead_count, sample_count)`
    pub fn shape(&self) -> (usize, usize) {
        (self.leads, self.samples)
    }

    /// Samples of one lead
    ///
    /// Panics if `index >= lead_count()`.
    pub fn lead(&self, index: usize) -> &[f64] {
        &self.data[index * self.samples..(index + 1) * self.samples]
    }

    /// Iterate over leads in order
    pub fn leads(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.samples)
    }

    /// Flat lead-major view of all samples
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
