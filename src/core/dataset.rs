// Decoded waveform output shared by both data decoders

use std::collections::HashMap;

use tracing::warn;

use crate::core::error::{ComtradeError, Result};
use crate::core::format::{ConfigDocument, SampleRateSegment};

/// Time base plus labelled channel series. Built once by a decoder and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct WaveformDataset {
    sample_count: usize,
    time_step: f64,
    analog: HashMap<String, Vec<f64>>,
    digital: HashMap<String, Vec<bool>>,
    // declaration order, for listing; one entry per map key
    labels: Vec<String>,
}

impl WaveformDataset {
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn time_vector(&self) -> Vec<f64> {
        (0..self.sample_count)
            .map(|i| i as f64 * self.time_step)
            .collect()
    }

    pub fn analog_channels(&self) -> &HashMap<String, Vec<f64>> {
        &self.analog
    }

    pub fn digital_channels(&self) -> &HashMap<String, Vec<bool>> {
        &self.digital
    }

    /// Analog labels followed by digital labels, in configuration order.
    /// A label declared twice is listed once, at its first position.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Sampling parameters taken from the first sample-rate segment.
pub(crate) fn timing(config: &ConfigDocument) -> Result<SampleRateSegment> {
    let segment = config
        .first_segment()
        .copied()
        .ok_or_else(|| ComtradeError::structural(0, "no sample rate segment declared"))?;
    if !(segment.rate > 0.0) || !segment.rate.is_finite() {
        return Err(ComtradeError::structural(
            0,
            format!("sample rate must be positive, got {}", segment.rate),
        ));
    }
    Ok(segment)
}

/// Collects per-channel series during decode, then freezes them into a
/// `WaveformDataset` keyed by the channel labels.
pub(crate) struct DatasetBuilder<'a> {
    config: &'a ConfigDocument,
    sample_count: usize,
    time_step: f64,
    analog: Vec<Vec<f64>>,
    digital: Vec<Vec<bool>>,
}

impl<'a> DatasetBuilder<'a> {
    pub(crate) fn new(config: &'a ConfigDocument, segment: SampleRateSegment) -> Self {
        let sample_count = segment.end_sample;
        Self {
            config,
            sample_count,
            time_step: 1.0 / segment.rate,
            analog: vec![Vec::with_capacity(sample_count); config.analog.len()],
            digital: vec![Vec::with_capacity(sample_count); config.digital.len()],
        }
    }

    pub(crate) fn push_analog(&mut self, channel: usize, value: f64) {
        self.analog[channel].push(value);
    }

    pub(crate) fn push_digital(&mut self, channel: usize, value: bool) {
        self.digital[channel].push(value);
    }

    pub(crate) fn finish(self) -> WaveformDataset {
        let mut labels: Vec<String> = Vec::with_capacity(self.analog.len() + self.digital.len());
        let mut analog = HashMap::with_capacity(self.analog.len());
        for (descriptor, series) in self.config.analog.iter().zip(self.analog) {
            let label = descriptor.label();
            if analog.insert(label.clone(), series).is_some() {
                warn!("duplicate analog label {}, keeping the later channel", label);
            } else {
                labels.push(label);
            }
        }
        let mut digital = HashMap::with_capacity(self.digital.len());
        for (descriptor, series) in self.config.digital.iter().zip(self.digital) {
            let label = descriptor.label();
            if digital.insert(label.clone(), series).is_some() {
                warn!("duplicate digital label {}, keeping the later channel", label);
            } else if !labels.contains(&label) {
                labels.push(label);
            }
        }
        WaveformDataset {
            sample_count: self.sample_count,
            time_step: self.time_step,
            analog,
            digital,
            labels,
        }
    }
}
