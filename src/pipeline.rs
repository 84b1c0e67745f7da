//! Batch pipeline: per-clip extraction followed by corpus analysis
//!
//! ```text
//! Waveform → trim → MFCC → normalize → aggregate   (per clip, parallel)
//!                                         ↓ join, input order
//!                                  corpus matrix → { PCA, feature ranking }
//! ```
//!
//! Per-clip data problems (silent clip, clip shorter than one frame, a sink
//! write failure) are reported against the clip and the clip is left out of
//! the corpus. Configuration problems stop the run before any clip is touched.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::analysis::corpus::{build, DataMatrix};
use crate::analysis::metadata::RunMetadata;
use crate::analysis::pca::reduce;
use crate::analysis::ranking::{rank_by_importance, rank_by_mutual_information, RankingConfig};
use crate::analysis::result::{CorpusReport, RankingResult, ReductionResult};
use crate::config::PipelineConfig;
use crate::error::{ClipError, FeatureError};
use crate::features::aggregation::{aggregate, FeatureVector};
use crate::features::mfcc::compute_mfcc;
use crate::features::normalization::normalize;
use crate::io::sink::{Artifact, ArtifactSink};
use crate::io::waveform::Waveform;
use crate::preprocessing::silence::SilenceTrimmer;

/// Features extracted from one clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFeatures {
    /// Identifier supplied by the caller
    pub clip_id: String,
    /// Position of the clip in the batch input
    pub index: usize,
    /// Fixed-length summary vector
    pub vector: FeatureVector,
    /// Retained `[start, end)` sample range after trimming
    pub trimmed_range: (usize, usize),
    /// MFCC frames the vector was averaged over
    pub num_frames: usize,
    /// Zero-variance coefficient rows met during normalization
    pub degenerate_rows: Vec<usize>,
}

/// Outcome of a batch: successes and per-clip failures, each in input order
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Clips that produced a feature vector
    pub features: Vec<ClipFeatures>,
    /// Clips that were skipped and why
    pub failures: Vec<ClipError>,
}

impl BatchOutput {
    /// Feature vectors in input order
    pub fn vectors(&self) -> Vec<FeatureVector> {
        self.features.iter().map(|f| f.vector.clone()).collect()
    }
}

/// Feature extraction pipeline
///
/// # Example
///
/// ```no_run
/// use speechprint::{FeaturePipeline, PipelineConfig, Waveform};
///
/// let pipeline = FeaturePipeline::new(PipelineConfig::default())?;
/// let clips = vec![
///     ("a".to_string(), Waveform::new(vec![0.1f32; 16000], 16000)?),
///     ("b".to_string(), Waveform::new(vec![0.2f32; 16000], 16000)?),
/// ];
/// let batch = pipeline.process_batch(&clips)?;
/// let report = pipeline.process_corpus(&batch.features, None)?;
/// println!("{:?}", report.reduction.explained_variance_ratio);
/// # Ok::<(), speechprint::FeatureError>(())
/// ```
#[derive(Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl std::fmt::Debug for FeaturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturePipeline")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl FeaturePipeline {
    /// Create a pipeline
    ///
    /// # Errors
    ///
    /// Returns `FeatureError::InvalidParameter` if the configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self { config, sink: None })
    }

    /// Hand every intermediate artifact to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn store(&self, clip_id: &str, artifact: Artifact<'_>) -> Result<(), FeatureError> {
        match &self.sink {
            Some(sink) => sink.store(clip_id, artifact),
            None => Ok(()),
        }
    }

    /// Run the per-clip stages on one waveform
    ///
    /// Identical input and configuration always yield an identical vector.
    pub fn process_clip(
        &self,
        clip_id: &str,
        waveform: &Waveform,
    ) -> Result<ClipFeatures, ClipError> {
        self.extract(clip_id, 0, waveform).map_err(|error| ClipError {
            clip_id: clip_id.to_string(),
            error,
        })
    }

    fn extract(
        &self,
        clip_id: &str,
        index: usize,
        waveform: &Waveform,
    ) -> Result<ClipFeatures, FeatureError> {
        let trimmed = SilenceTrimmer::from_config(&self.config).trim(waveform)?;
        self.store(clip_id, Artifact::Trimmed(&trimmed))?;

        let mfcc = compute_mfcc(&trimmed.waveform, &self.config.mfcc)?;
        self.store(clip_id, Artifact::Mfcc(&mfcc))?;

        let normalized = normalize(&mfcc);
        self.store(clip_id, Artifact::Normalized(&normalized))?;

        let vector = aggregate(&normalized);

        log::debug!(
            "Clip {}: trimmed to [{}, {}), {} frames, {} coefficients",
            clip_id,
            trimmed.start,
            trimmed.end,
            mfcc.num_frames(),
            vector.len()
        );

        Ok(ClipFeatures {
            clip_id: clip_id.to_string(),
            index,
            vector,
            trimmed_range: (trimmed.start, trimmed.end),
            num_frames: mfcc.num_frames(),
            degenerate_rows: normalized.degenerate_rows().to_vec(),
        })
    }

    /// Run the per-clip stages over a batch
    ///
    /// Clips run on the rayon pool unless `parallel` is off; results come back
    /// in input order either way.
    ///
    /// # Errors
    ///
    /// Returns the first error (in input order) that is not clip-local, such
    /// as an MFCC range that does not fit a clip's sample rate. With
    /// `fail_fast`, any per-clip error aborts the batch.
    pub fn process_batch(&self, clips: &[(String, Waveform)]) -> Result<BatchOutput, FeatureError> {
        self.config.validate()?;

        log::info!(
            "Processing {} clips ({})",
            clips.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let run = |(index, (clip_id, waveform)): (usize, &(String, Waveform))| {
            (clip_id.clone(), self.extract(clip_id, index, waveform))
        };

        let results: Vec<(String, Result<ClipFeatures, FeatureError>)> = if self.config.parallel {
            clips.par_iter().enumerate().map(run).collect()
        } else {
            clips.iter().enumerate().map(run).collect()
        };

        let mut output = BatchOutput::default();
        for (clip_id, result) in results {
            match result {
                Ok(features) => output.features.push(features),
                Err(error) if !error.is_clip_local() || self.config.fail_fast => {
                    log::warn!("Aborting batch at clip {}: {}", clip_id, error);
                    return Err(error);
                }
                Err(error) => {
                    log::warn!("Skipping clip {}: {}", clip_id, error);
                    output.failures.push(ClipError { clip_id, error });
                }
            }
        }

        log::info!(
            "Batch done: {} clips extracted, {} skipped",
            output.features.len(),
            output.failures.len()
        );

        Ok(output)
    }

    /// Assemble the corpus matrix from extracted clips and run reduction and
    /// both rankings
    ///
    /// `labels`, when given, align with `features` (one per element).
    ///
    /// # Errors
    ///
    /// Same as [`FeaturePipeline::process_vectors`]
    pub fn process_corpus(
        &self,
        features: &[ClipFeatures],
        labels: Option<&[usize]>,
    ) -> Result<CorpusReport, FeatureError> {
        let clip_ids: Vec<String> = features.iter().map(|f| f.clip_id.clone()).collect();
        let vectors: Vec<FeatureVector> = features.iter().map(|f| f.vector.clone()).collect();

        let mut report = self.process_vectors(&clip_ids, &vectors, labels)?;
        report.metadata.degenerate_clips =
            features.iter().filter(|f| !f.degenerate_rows.is_empty()).count();
        Ok(report)
    }

    /// Corpus stages over feature vectors in clip order
    ///
    /// # Arguments
    ///
    /// * `clip_ids` - One identifier per vector, reported in row order
    /// * `vectors` - One fingerprint per clip, all the same length
    /// * `labels` - Optional class label per clip; placeholder labels when `None`
    ///
    /// # Errors
    ///
    /// - `FeatureError::InsufficientData` if fewer than 2 clips reach the corpus
    /// - `FeatureError::DimensionMismatch` if vectors differ in length
    /// - `FeatureError::InvalidParameter` if `num_components` exceeds
    ///   `min(num_clips, num_coefficients)`, or ids or labels have the wrong length
    pub fn process_vectors(
        &self,
        clip_ids: &[String],
        vectors: &[FeatureVector],
        labels: Option<&[usize]>,
    ) -> Result<CorpusReport, FeatureError> {
        let start_time = Instant::now();

        if clip_ids.len() != vectors.len() {
            return Err(FeatureError::InvalidParameter(format!(
                "{} clip ids given for {} feature vectors",
                clip_ids.len(),
                vectors.len()
            )));
        }

        let matrix = build(vectors)?;
        let (reduction, importance_ranking, mutual_information_ranking) =
            self.analyze_matrix(&matrix, labels)?;

        let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

        log::info!(
            "Corpus {}x{}: explained variance {:?}, top importance {:?}, top MI {:?}",
            matrix.num_clips(),
            matrix.num_coefficients(),
            reduction.explained_variance_ratio,
            importance_ranking.top(),
            mutual_information_ranking.top()
        );

        Ok(CorpusReport {
            clip_ids: clip_ids.to_vec(),
            matrix_shape: matrix.shape(),
            reduction,
            importance_ranking,
            mutual_information_ranking,
            metadata: RunMetadata {
                clips_used: vectors.len(),
                placeholder_labels: labels.is_none(),
                seed: self.config.seed,
                processing_time_ms,
                ..RunMetadata::default()
            },
        })
    }

    /// Corpus stages on an already assembled matrix
    ///
    /// Returns the reduction, the importance ranking and the mutual information
    /// ranking.
    ///
    /// # Errors
    ///
    /// `FeatureError::InsufficientData` if the matrix has fewer than 2 rows,
    /// before any component count is checked against it
    pub fn analyze_matrix(
        &self,
        matrix: &DataMatrix,
        labels: Option<&[usize]>,
    ) -> Result<(ReductionResult, RankingResult, RankingResult), FeatureError> {
        if matrix.num_clips() < 2 {
            return Err(FeatureError::InsufficientData(format!(
                "Corpus analysis needs at least 2 clips, got {}",
                matrix.num_clips()
            )));
        }

        let reduction = reduce(matrix, self.config.num_components)?;
        let ranking_config = RankingConfig::from_config(&self.config);
        let importance = rank_by_importance(matrix, labels, &ranking_config)?;
        let mutual_information = rank_by_mutual_information(matrix, labels, &ranking_config)?;
        Ok((reduction, importance, mutual_information))
    }

    /// Batch then corpus in one call
    ///
    /// `labels`, when given, align with `clips`; labels of skipped clips are
    /// dropped along with the clips.
    pub fn run(
        &self,
        clips: &[(String, Waveform)],
        labels: Option<&[usize]>,
    ) -> Result<(CorpusReport, Vec<ClipError>), FeatureError> {
        if let Some(labels) = labels {
            if labels.len() != clips.len() {
                return Err(FeatureError::InvalidParameter(format!(
                    "Label sequence has {} entries but {} clips were given",
                    labels.len(),
                    clips.len()
                )));
            }
        }

        let batch = self.process_batch(clips)?;
        let kept_labels: Option<Vec<usize>> =
            labels.map(|labels| batch.features.iter().map(|f| labels[f.index]).collect());

        let mut report = self.process_corpus(&batch.features, kept_labels.as_deref())?;
        report.metadata.clips_failed = batch.failures.len();
        Ok((report, batch.failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sink::MemorySink;

    fn tone(freq: f32, seconds: f32, sample_rate: u32) -> Waveform {
        let len = (seconds * sample_rate as f32) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.4 * (2.0 * std::f32::consts::PI * freq * t).sin()
                    + 0.1 * (2.0 * std::f32::consts::PI * freq * 2.7 * t).sin()
            })
            .collect();
        Waveform::new(samples, sample_rate).unwrap()
    }

    fn sequential() -> PipelineConfig {
        PipelineConfig { parallel: false, num_trees: 10, ..Default::default() }
    }

    #[test]
    fn test_process_clip_is_idempotent() {
        let pipeline = FeaturePipeline::new(PipelineConfig::default()).unwrap();
        let waveform = tone(300.0, 1.0, 16000);
        let a = pipeline.process_clip("x", &waveform).unwrap();
        let b = pipeline.process_clip("x", &waveform).unwrap();
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.vector.len(), 13);
    }

    #[test]
    fn test_silent_clip_reported_not_fatal() {
        let pipeline = FeaturePipeline::new(sequential()).unwrap();
        let clips = vec![
            ("loud".to_string(), tone(300.0, 0.5, 16000)),
            ("quiet".to_string(), Waveform::new(vec![0.0; 8000], 16000).unwrap()),
            ("short".to_string(), tone(300.0, 0.01, 16000)),
            ("loud2".to_string(), tone(500.0, 0.5, 16000)),
        ];
        let batch = pipeline.process_batch(&clips).unwrap();

        let ids: Vec<&str> = batch.features.iter().map(|f| f.clip_id.as_str()).collect();
        assert_eq!(ids, vec!["loud", "loud2"]);
        assert_eq!(batch.features[1].index, 3);

        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].clip_id, "quiet");
        assert_eq!(batch.failures[0].error, FeatureError::SilentClip);
        assert_eq!(batch.failures[1].clip_id, "short");
        assert!(matches!(batch.failures[1].error, FeatureError::InsufficientData(_)));
    }

    #[test]
    fn test_fail_fast_aborts() {
        let config = PipelineConfig { fail_fast: true, ..sequential() };
        let pipeline = FeaturePipeline::new(config).unwrap();
        let clips = vec![
            ("loud".to_string(), tone(300.0, 0.5, 16000)),
            ("quiet".to_string(), Waveform::new(vec![0.0; 8000], 16000).unwrap()),
        ];
        assert_eq!(pipeline.process_batch(&clips).unwrap_err(), FeatureError::SilentClip);
    }

    #[test]
    fn test_parameter_error_fails_whole_run() {
        let mut config = sequential();
        config.mfcc.fmax_hz = Some(7000.0);
        let pipeline = FeaturePipeline::new(config).unwrap();
        // 8 kHz clip: 7 kHz is above Nyquist
        let clips = vec![
            ("ok".to_string(), tone(300.0, 0.5, 16000)),
            ("narrow".to_string(), tone(300.0, 0.5, 8000)),
        ];
        assert!(matches!(
            pipeline.process_batch(&clips),
            Err(FeatureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = PipelineConfig { num_components: 0, ..Default::default() };
        assert!(matches!(FeaturePipeline::new(config), Err(FeatureError::InvalidParameter(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let clips: Vec<(String, Waveform)> = (0..6)
            .map(|i| (format!("c{}", i), tone(200.0 + 90.0 * i as f32, 0.4, 16000)))
            .collect();

        let seq = FeaturePipeline::new(sequential()).unwrap().process_batch(&clips).unwrap();
        let par = FeaturePipeline::new(PipelineConfig { parallel: true, ..sequential() })
            .unwrap()
            .process_batch(&clips)
            .unwrap();

        assert_eq!(seq.features, par.features);
    }

    #[test]
    fn test_sink_receives_three_artifacts_per_clip() {
        let sink = Arc::new(MemorySink::new());
        let pipeline = FeaturePipeline::new(sequential()).unwrap().with_sink(sink.clone());
        pipeline.process_clip("a", &tone(300.0, 0.3, 16000)).unwrap();

        let kinds: Vec<&str> = sink.take().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec!["trimmed", "mfcc", "normalized"]);
    }

    #[test]
    fn test_single_surviving_clip_is_insufficient_data() {
        let pipeline = FeaturePipeline::new(sequential()).unwrap();
        let clips = vec![
            ("loud".to_string(), tone(300.0, 0.5, 16000)),
            ("quiet1".to_string(), Waveform::new(vec![0.0; 8000], 16000).unwrap()),
            ("quiet2".to_string(), Waveform::new(vec![0.0; 8000], 16000).unwrap()),
        ];
        assert!(matches!(
            pipeline.run(&clips, None),
            Err(FeatureError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_process_vectors_checks_ids() {
        let pipeline = FeaturePipeline::new(sequential()).unwrap();
        let vectors = vec![
            FeatureVector::new((0..13).map(|i| i as f64).collect()),
            FeatureVector::new((0..13).map(|i| (i * i) as f64).collect()),
            FeatureVector::new((0..13).map(|i| (13 - i) as f64).collect()),
        ];
        let ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];

        let report = pipeline.process_vectors(&ids, &vectors, None).unwrap();
        assert_eq!(report.clip_ids, ids);
        assert_eq!(report.matrix_shape, (3, 13));
        assert_eq!(report.metadata.degenerate_clips, 0);

        assert!(matches!(
            pipeline.process_vectors(&ids[..2], &vectors, None),
            Err(FeatureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_realigns_labels() {
        let pipeline = FeaturePipeline::new(sequential()).unwrap();
        let clips = vec![
            ("a".to_string(), tone(250.0, 0.5, 16000)),
            ("silent".to_string(), Waveform::new(vec![0.0; 8000], 16000).unwrap()),
            ("b".to_string(), tone(400.0, 0.5, 16000)),
            ("c".to_string(), tone(650.0, 0.5, 16000)),
        ];
        let (report, failures) = pipeline.run(&clips, Some(&[0, 9, 1, 1])).unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(report.clip_ids, vec!["a", "b", "c"]);
        assert_eq!(report.matrix_shape, (3, 13));
        assert_eq!(report.metadata.clips_failed, 1);
        assert!(!report.metadata.placeholder_labels);

        assert!(matches!(
            pipeline.run(&clips, Some(&[0, 1])),
            Err(FeatureError::InvalidParameter(_))
        ));
    }
}
