//! Silence detection and trimming
//!
//! Leading and trailing silence is located on a short-time energy envelope:
//!
//! 1. Zero-pad the signal by half a frame on each side (centred frames)
//! 2. Compute mean-square energy per frame
//! 3. Express each frame in dB relative to the loudest frame
//! 4. Keep the span from the first to the last frame louder than `-top_db`
//!
//! # Example
//!
//! ```no_run
//! use speechprint::io::waveform::Waveform;
//! use speechprint::preprocessing::silence::SilenceTrimmer;
//!
//! let waveform = Waveform::new(vec![0.0f32; 16000], 16000)?;
//! match SilenceTrimmer::default().trim(&waveform) {
//!     Ok(trimmed) => println!("kept {}..{}", trimmed.start, trimmed.end),
//!     Err(e) => println!("skipped: {}", e),
//! }
//! # Ok::<(), speechprint::FeatureError>(())
//! ```

use crate::error::FeatureError;
use crate::io::waveform::{TrimmedWaveform, Waveform};

/// Energy floor; frames at or below this are indistinguishable from digital silence
const ENERGY_FLOOR: f64 = 1e-10;

/// Silence trimming configuration
#[derive(Debug, Clone)]
pub struct SilenceTrimmer {
    /// Threshold in dB below the loudest frame (default: 60.0)
    pub top_db: f32,

    /// Frame size for the energy envelope (default: 2048)
    pub frame_length: usize,

    /// Hop between envelope frames (default: 512)
    pub hop_length: usize,
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self {
            top_db: 60.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

impl SilenceTrimmer {
    /// Build a trimmer from the pipeline configuration
    pub fn from_config(config: &crate::config::PipelineConfig) -> Self {
        Self {
            top_db: config.top_db,
            frame_length: config.trim_frame_length,
            hop_length: config.trim_hop_length,
        }
    }

    /// Trim leading and trailing silence
    ///
    /// # Returns
    ///
    /// The retained samples together with their `[start, end)` range in the
    /// source waveform
    ///
    /// # Errors
    ///
    /// - `FeatureError::InsufficientData` if the waveform is empty
    /// - `FeatureError::SilentClip` if no frame rises above the threshold
    /// - `FeatureError::InvalidParameter` if the trimmer is misconfigured
    pub fn trim(&self, waveform: &Waveform) -> Result<TrimmedWaveform, FeatureError> {
        if waveform.is_empty() {
            return Err(FeatureError::InsufficientData(
                "Cannot trim an empty waveform".to_string(),
            ));
        }

        if self.frame_length == 0 || self.hop_length == 0 {
            return Err(FeatureError::InvalidParameter(format!(
                "Trim frame/hop lengths must be > 0, got {} / {}",
                self.frame_length, self.hop_length
            )));
        }

        if !(self.top_db > 0.0) {
            return Err(FeatureError::InvalidParameter(format!(
                "top_db must be > 0, got {}",
                self.top_db
            )));
        }

        let samples = waveform.samples();
        let energies = frame_energies(samples, self.frame_length, self.hop_length);
        let peak = energies.iter().copied().fold(0.0f64, f64::max);

        if peak <= ENERGY_FLOOR {
            log::debug!("No energy above floor in {} samples", samples.len());
            return Err(FeatureError::SilentClip);
        }

        let threshold = -(self.top_db as f64);
        let loud = |e: f64| energy_to_db(e, peak) > threshold;

        let first = energies.iter().position(|&e| loud(e));
        let last = energies.iter().rposition(|&e| loud(e));

        let (first, last) = match (first, last) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(FeatureError::SilentClip),
        };

        let start = first * self.hop_length;
        let end = ((last + 1) * self.hop_length).min(samples.len());

        if start >= end {
            return Err(FeatureError::SilentClip);
        }

        log::debug!(
            "Trimmed {} samples to [{}, {}) at top_db={:.1}",
            samples.len(),
            start,
            end,
            self.top_db
        );

        Ok(TrimmedWaveform {
            waveform: Waveform::new(samples[start..end].to_vec(), waveform.sample_rate())?,
            start,
            end,
        })
    }

    /// Energy envelope in dB relative to its loudest frame
    ///
    /// Frame `i` is centred on sample `i * hop_length`.
    pub fn envelope_db(&self, samples: &[f32]) -> Vec<f32> {
        let energies = frame_energies(samples, self.frame_length, self.hop_length);
        let peak = energies.iter().copied().fold(0.0f64, f64::max);
        energies
            .iter()
            .map(|&e| energy_to_db(e, peak) as f32)
            .collect()
    }
}

/// Mean-square energy of centred, zero-padded frames
fn frame_energies(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    if frame_length == 0 || hop_length == 0 {
        return Vec::new();
    }

    let half = frame_length / 2;
    let num_frames = 1 + samples.len() / hop_length;
    let mut energies = Vec::with_capacity(num_frames);

    for i in 0..num_frames {
        // Frame covers [center - half, center - half + frame_length) in signal coordinates
        let center = i * hop_length;
        let lo = center.saturating_sub(half);
        let hi = (center + frame_length - half).min(samples.len());

        let sum_sq: f64 = if lo < hi {
            samples[lo..hi].iter().map(|&x| (x as f64) * (x as f64)).sum()
        } else {
            0.0
        };
        energies.push(sum_sq / frame_length as f64);
    }

    energies
}

/// Power ratio to dB, both sides floored
fn energy_to_db(energy: f64, reference: f64) -> f64 {
    10.0 * energy.max(ENERGY_FLOOR).log10() - 10.0 * reference.max(ENERGY_FLOOR).log10()
}
