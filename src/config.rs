//! Configuration parameters for the feature pipeline

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};

/// Largest mel filterbank accepted by the featurizer
pub const MAX_MEL_BANDS: usize = 128;

/// MFCC extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfccConfig {
    /// Number of cepstral coefficients to keep (default: 13)
    pub num_coefficients: usize,

    /// Analysis frame length in milliseconds (default: 25.0)
    pub frame_ms: f32,

    /// Hop between frames in milliseconds (default: 10.0)
    pub hop_ms: f32,

    /// Number of triangular mel filters (default: 40)
    pub num_mel_bands: usize,

    /// Lowest filterbank edge in Hz (default: 0.0)
    pub fmin_hz: f32,

    /// Highest filterbank edge in Hz (default: Nyquist)
    pub fmax_hz: Option<f32>,

    /// Floor applied to filterbank energies before the logarithm (default: 1e-10)
    pub log_floor: f64,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            num_coefficients: 13,
            frame_ms: 25.0,
            hop_ms: 10.0,
            num_mel_bands: 40,
            fmin_hz: 0.0,
            fmax_hz: None,
            log_floor: 1e-10,
        }
    }
}

impl MfccConfig {
    /// Check the parameters that do not depend on a particular sample rate
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.num_mel_bands == 0 || self.num_mel_bands > MAX_MEL_BANDS {
            return Err(FeatureError::InvalidParameter(format!(
                "num_mel_bands must be in [1, {}], got {}",
                MAX_MEL_BANDS, self.num_mel_bands
            )));
        }

        if self.num_coefficients == 0 || self.num_coefficients > self.num_mel_bands {
            return Err(FeatureError::InvalidParameter(format!(
                "num_coefficients must be in [1, {}], got {}",
                self.num_mel_bands, self.num_coefficients
            )));
        }

        if !(self.frame_ms > 0.0) || !(self.hop_ms > 0.0) {
            return Err(FeatureError::InvalidParameter(format!(
                "frame_ms and hop_ms must be > 0, got {} / {}",
                self.frame_ms, self.hop_ms
            )));
        }

        if self.fmin_hz < 0.0 {
            return Err(FeatureError::InvalidParameter(format!(
                "fmin_hz must be >= 0, got {}",
                self.fmin_hz
            )));
        }

        if let Some(fmax) = self.fmax_hz {
            if fmax <= self.fmin_hz {
                return Err(FeatureError::InvalidParameter(format!(
                    "fmax_hz ({}) must exceed fmin_hz ({})",
                    fmax, self.fmin_hz
                )));
            }
        }

        if !(self.log_floor > 0.0) {
            return Err(FeatureError::InvalidParameter(format!(
                "log_floor must be > 0, got {}",
                self.log_floor
            )));
        }

        Ok(())
    }

    /// Frame length in samples at the given rate
    pub fn frame_length(&self, sample_rate: u32) -> usize {
        ((sample_rate as f32 * self.frame_ms / 1000.0).round() as usize).max(1)
    }

    /// Hop length in samples at the given rate
    pub fn hop_length(&self, sample_rate: u32) -> usize {
        ((sample_rate as f32 * self.hop_ms / 1000.0).round() as usize).max(1)
    }
}

/// Pipeline configuration
///
/// Everything the batch run needs is passed in through this struct; the
/// library never reads paths or globals on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Silence trimming
    /// Threshold in dB below the loudest frame (default: 60.0)
    /// Frames quieter than this are treated as silence
    pub top_db: f32,

    /// Frame length for the trim energy envelope (default: 2048)
    pub trim_frame_length: usize,

    /// Hop length for the trim energy envelope (default: 512)
    pub trim_hop_length: usize,

    // Spectral features
    /// MFCC parameters
    pub mfcc: MfccConfig,

    // Corpus stages
    /// Number of principal components to keep (default: 2)
    pub num_components: usize,

    /// Number of ranked columns to report (default: all)
    pub top_k: Option<usize>,

    // Ranking
    /// Seed for every random draw in the ranking stage (default: 42)
    pub seed: u64,

    /// Trees in the importance ensemble (default: 100)
    pub num_trees: usize,

    /// Maximum tree depth (default: unlimited)
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node (default: 2)
    pub min_samples_split: usize,

    /// Neighbours used by the mutual information estimator (default: 3)
    pub mi_neighbors: usize,

    // Execution
    /// Process clips on the rayon pool (default: true)
    pub parallel: bool,

    /// Abort the batch on the first per-clip failure (default: false)
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_db: 60.0,
            trim_frame_length: 2048,
            trim_hop_length: 512,
            mfcc: MfccConfig::default(),
            num_components: 2,
            top_k: None,
            seed: 42,
            num_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            mi_neighbors: 3,
            parallel: true,
            fail_fast: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    ///
    /// # Example
    ///
    /// ```
    /// use speechprint::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_json_str(r#"{ "num_components": 3 }"#)?;
    /// assert_eq!(config.num_components, 3);
    /// assert_eq!(config.mfcc.num_coefficients, 13);
    /// # Ok::<(), speechprint::FeatureError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, FeatureError> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| FeatureError::InvalidParameter(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter that can be checked before data arrives
    ///
    /// Corpus-dependent bounds (component count against the number of clips)
    /// are checked again when the corpus stages run.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !(self.top_db > 0.0) {
            return Err(FeatureError::InvalidParameter(format!(
                "top_db must be > 0, got {}",
                self.top_db
            )));
        }

        if self.trim_frame_length == 0 || self.trim_hop_length == 0 {
            return Err(FeatureError::InvalidParameter(format!(
                "trim frame/hop lengths must be > 0, got {} / {}",
                self.trim_frame_length, self.trim_hop_length
            )));
        }

        self.mfcc.validate()?;

        if self.num_components == 0 || self.num_components > self.mfcc.num_coefficients {
            return Err(FeatureError::InvalidParameter(format!(
                "num_components must be in [1, {}], got {}",
                self.mfcc.num_coefficients, self.num_components
            )));
        }

        if self.top_k == Some(0) {
            return Err(FeatureError::InvalidParameter("top_k must be > 0".to_string()));
        }

        if self.num_trees == 0 {
            return Err(FeatureError::InvalidParameter("num_trees must be > 0".to_string()));
        }

        if self.min_samples_split < 2 {
            return Err(FeatureError::InvalidParameter(format!(
                "min_samples_split must be >= 2, got {}",
                self.min_samples_split
            )));
        }

        if self.mi_neighbors == 0 {
            return Err(FeatureError::InvalidParameter("mi_neighbors must be > 0".to_string()));
        }

        Ok(())
    }
}
