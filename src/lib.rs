//! # speechprint
//!
//! Fixed-length spectral fingerprints for short speech clips, and corpus-level
//! analysis over them.
//!
//! ## Features
//!
//! - **Silence trimming**: energy-envelope trim of leading and trailing silence
//! - **MFCC**: framed, windowed, mel-warped cepstral coefficients
//! - **Normalization**: per-coefficient z-scoring across frames
//! - **Aggregation**: temporal mean into one vector per clip
//! - **Corpus analysis**: PCA projection and two independent feature rankings
//!   (random-forest importance and mutual information)
//!
//! ## Quick Start
//!
//! ```no_run
//! use speechprint::{decode_audio, FeaturePipeline, PipelineConfig};
//!
//! let pipeline = FeaturePipeline::new(PipelineConfig::default())?;
//! let clips = vec![
//!     ("one".to_string(), decode_audio("one.wav")?),
//!     ("two".to_string(), decode_audio("two.wav")?),
//!     ("three".to_string(), decode_audio("three.wav")?),
//! ];
//!
//! let batch = pipeline.process_batch(&clips)?;
//! let report = pipeline.process_corpus(&batch.features, None)?;
//!
//! println!("Explained variance: {:?}", report.reduction.explained_variance_ratio);
//! println!("Top column: {:?}", report.importance_ranking.top());
//! # Ok::<(), speechprint::FeatureError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Audio → Trim → MFCC → Normalize → Aggregate → Corpus Matrix → { PCA, Ranking }
//! ```
//!
//! Everything before the corpus matrix runs per clip and in parallel; the
//! corpus stages run once over the whole batch.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod pipeline;
pub mod preprocessing;

// Re-export main types
pub use analysis::corpus::DataMatrix;
pub use analysis::metadata::RunMetadata;
pub use analysis::result::{CorpusReport, RankingMethod, RankingResult, ReductionResult};
pub use config::{MfccConfig, PipelineConfig};
pub use error::{ClipError, FeatureError};
pub use features::aggregation::FeatureVector;
pub use features::mfcc::FeatureMatrix;
pub use features::normalization::NormalizedFeatureMatrix;
pub use io::decoder::decode_audio;
pub use io::sink::{ArtifactSink, MemorySink, NpyDirSink};
pub use io::waveform::{TrimmedWaveform, Waveform};
pub use pipeline::{BatchOutput, ClipFeatures, FeaturePipeline};

/// Extract the fingerprint of a single clip
///
/// Runs trim, MFCC, normalization and aggregation with `config`.
///
/// # Arguments
///
/// * `waveform` - Mono samples with their sample rate
/// * `config` - Pipeline configuration
///
/// # Returns
///
/// One value per cepstral coefficient
///
/// # Errors
///
/// - `FeatureError::SilentClip` if the clip has no energy
/// - `FeatureError::InsufficientData` if the trimmed clip is shorter than one frame
/// - `FeatureError::InvalidParameter` for an invalid configuration
///
/// # Example
///
/// ```no_run
/// use speechprint::{extract_features, PipelineConfig, Waveform};
///
/// let waveform = Waveform::new(vec![0.1f32; 16000], 16000)?;
/// let vector = extract_features(&waveform, &PipelineConfig::default())?;
/// assert_eq!(vector.len(), 13);
/// # Ok::<(), speechprint::FeatureError>(())
/// ```
pub fn extract_features(
    waveform: &Waveform,
    config: &PipelineConfig,
) -> Result<FeatureVector, FeatureError> {
    let pipeline = FeaturePipeline::new(config.clone())?;
    pipeline
        .process_clip("clip", waveform)
        .map(|features| features.vector)
        .map_err(|clip_error| clip_error.error)
}

/// Build the corpus matrix from `vectors` and run PCA and both rankings
///
/// Rows are reported as `clip_0`, `clip_1`, ... in input order.
///
/// # Arguments
///
/// * `vectors` - One fingerprint per clip, all the same length
/// * `labels` - Optional class label per clip; placeholder labels are used when `None`
/// * `config` - Pipeline configuration
///
/// # Errors
///
/// - `FeatureError::InsufficientData` for fewer than 2 clips
/// - `FeatureError::DimensionMismatch` if vector lengths differ
/// - `FeatureError::InvalidParameter` for a bad component count or label length
pub fn analyze_corpus(
    vectors: &[FeatureVector],
    labels: Option<&[usize]>,
    config: &PipelineConfig,
) -> Result<CorpusReport, FeatureError> {
    let pipeline = FeaturePipeline::new(config.clone())?;
    let clip_ids: Vec<String> = (0..vectors.len()).map(|i| format!("clip_{}", i)).collect();
    pipeline.process_vectors(&clip_ids, vectors, labels)
}
