//! Sampled waveform types

use crate::error::FeatureError;

/// Mono audio samples with their sample rate
///
/// Stages never mutate a waveform; each returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform
    ///
    /// # Errors
    ///
    /// Returns `FeatureError::InvalidParameter` if `sample_rate` is 0
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, FeatureError> {
        if sample_rate == 0 {
            return Err(FeatureError::InvalidParameter(
                "Sample rate must be > 0".to_string(),
            ));
        }
        Ok(Self { samples, sample_rate })
    }

    /// Samples, normalized to [-1.0, 1.0] when produced by the decoder
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the waveform holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// A waveform cut down to its non-silent span
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedWaveform {
    /// The retained samples
    pub waveform: Waveform,
    /// First retained sample index in the source waveform
    pub start: usize,
    /// One past the last retained sample index in the source waveform
    pub end: usize,
}

impl TrimmedWaveform {
    /// Number of samples removed from the source
    pub fn samples_removed(&self, source_len: usize) -> usize {
        source_len.saturating_sub(self.end - self.start)
    }
}
