//! Integration tests for the speech fingerprint pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use speechprint::{
    analyze_corpus, decode_audio, extract_features, FeatureError, FeaturePipeline, NpyDirSink,
    PipelineConfig, Waveform,
};

/// Synthetic voiced clip: harmonics of `f0` under a slow amplitude envelope,
/// padded with `pad_seconds` of silence on both sides
fn voiced_clip(f0: f32, seconds: f32, pad_seconds: f32, sample_rate: u32) -> Vec<f32> {
    let pad = (pad_seconds * sample_rate as f32) as usize;
    let body = (seconds * sample_rate as f32) as usize;
    let mut samples = vec![0.0f32; pad];
    samples.extend((0..body).map(|i| {
        let t = i as f32 / sample_rate as f32;
        let envelope = 0.5 + 0.5 * (2.0 * std::f32::consts::PI * 3.0 * t).sin().abs();
        let voice: f32 = (1..=5)
            .map(|h| (2.0 * std::f32::consts::PI * f0 * h as f32 * t).sin() / h as f32)
            .sum();
        0.3 * envelope * voice
    }));
    samples.extend(std::iter::repeat(0.0).take(pad));
    samples
}

/// Write mono or interleaved samples as a 16-bit WAV
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for &s in samples {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

fn write_corpus(dir: &Path, pitches: &[f32]) -> Vec<PathBuf> {
    pitches
        .iter()
        .enumerate()
        .map(|(i, &f0)| {
            let path = dir.join(format!("clip_{}.wav", i));
            write_wav(&path, &voiced_clip(f0, 1.0, 0.25, 16000), 16000, 1);
            path
        })
        .collect()
}

fn load(paths: &[PathBuf]) -> Vec<(String, Waveform)> {
    paths
        .iter()
        .map(|p| {
            let id = p.file_stem().unwrap().to_string_lossy().into_owned();
            (id, decode_audio(p).expect("Failed to decode"))
        })
        .collect()
}

#[test]
fn test_decode_round_trips_sample_rate_and_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let samples = voiced_clip(200.0, 0.5, 0.0, 16000);
    write_wav(&path, &samples, 16000, 1);

    let waveform = decode_audio(&path).unwrap();
    assert_eq!(waveform.sample_rate(), 16000);
    assert_eq!(waveform.len(), samples.len());
    assert!(waveform.samples().iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn test_stereo_file_is_downmixed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let mono = voiced_clip(180.0, 0.5, 0.0, 16000);
    let interleaved: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
    write_wav(&path, &interleaved, 16000, 2);

    let waveform = decode_audio(&path).unwrap();
    assert_eq!(waveform.len(), mono.len());
}

#[test]
fn test_three_clip_corpus_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let clips = load(&write_corpus(dir.path(), &[120.0, 210.0, 330.0]));

    let pipeline = FeaturePipeline::new(PipelineConfig::default()).unwrap();
    let batch = pipeline.process_batch(&clips).unwrap();
    assert!(batch.failures.is_empty());
    assert_eq!(batch.features.len(), 3);

    for features in &batch.features {
        assert_eq!(features.vector.len(), 13);
        // Padding is trimmed away (25% lead-in, allow for frame granularity)
        assert!(features.trimmed_range.0 > 0);
        assert!(features.trimmed_range.1 < clips[features.index].1.len());
        // 1 s of speech in 10 ms hops
        assert!(features.num_frames >= 95, "frames={}", features.num_frames);
    }

    let report = pipeline.process_corpus(&batch.features, None).unwrap();
    assert_eq!(report.matrix_shape, (3, 13));
    assert_eq!(report.clip_ids, vec!["clip_0", "clip_1", "clip_2"]);

    let ratios = &report.reduction.explained_variance_ratio;
    assert_eq!(ratios.len(), 2);
    assert!(ratios[0] >= ratios[1]);
    assert!(ratios.iter().all(|&r| r >= 0.0));
    assert!(report.reduction.total_explained() <= 1.0 + 1e-9);
    assert_eq!(report.reduction.projections.dim(), (3, 2));

    assert_eq!(report.importance_ranking.indices.len(), 13);
    assert_eq!(report.mutual_information_ranking.indices.len(), 13);
    assert!(report.metadata.placeholder_labels);
    assert_eq!(report.metadata.clips_used, 3);
}

#[test]
fn test_extraction_is_idempotent() {
    let waveform = Waveform::new(voiced_clip(150.0, 0.6, 0.1, 16000), 16000).unwrap();
    let config = PipelineConfig::default();
    let first = extract_features(&waveform, &config).unwrap();
    let second = extract_features(&waveform, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_corpus_report_is_reproducible() {
    let clips: Vec<(String, Waveform)> = [110.0, 170.0, 240.0, 300.0, 390.0, 480.0]
        .iter()
        .enumerate()
        .map(|(i, &f0)| {
            let samples = voiced_clip(f0, 0.4, 0.05, 16000);
            (format!("c{}", i), Waveform::new(samples, 16000).unwrap())
        })
        .collect();
    let labels = [0, 0, 0, 1, 1, 1];
    let config = PipelineConfig { num_trees: 25, ..Default::default() };
    let pipeline = FeaturePipeline::new(config).unwrap();

    let (a, _) = pipeline.run(&clips, Some(&labels)).unwrap();
    let (b, _) = pipeline.run(&clips, Some(&labels)).unwrap();
    assert_eq!(a.reduction, b.reduction);
    assert_eq!(a.importance_ranking, b.importance_ranking);
    assert_eq!(a.mutual_information_ranking, b.mutual_information_ranking);
    assert!(!a.metadata.placeholder_labels);
}

#[test]
fn test_silent_file_reported_per_clip() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_corpus(dir.path(), &[140.0, 260.0]);
    let silent = dir.path().join("silent.wav");
    write_wav(&silent, &vec![0.0; 16000], 16000, 1);
    paths.insert(1, silent);

    let clips = load(&paths);
    let pipeline = FeaturePipeline::new(PipelineConfig::default()).unwrap();
    let (report, failures) = pipeline.run(&clips, None).unwrap();

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].clip_id, "silent");
    assert_eq!(failures[0].error, FeatureError::SilentClip);
    assert_eq!(report.matrix_shape, (2, 13));
    assert_eq!(report.metadata.clips_failed, 1);
}

#[test]
fn test_npy_artifacts_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("artifacts");
    let sink = Arc::new(NpyDirSink::new(&out).unwrap());
    let pipeline = FeaturePipeline::new(PipelineConfig::default())
        .unwrap()
        .with_sink(sink.clone());

    let waveform = Waveform::new(voiced_clip(200.0, 0.5, 0.1, 16000), 16000).unwrap();
    pipeline.process_clip("spk1/utt1", &waveform).unwrap();

    for kind in ["trimmed", "mfcc", "normalized"] {
        let path = sink.path_for("spk1/utt1", kind);
        let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        assert_eq!(&bytes[..6], b"\x93NUMPY");
    }
}

#[test]
fn test_invalid_config_fails_before_processing() {
    let json = r#"{ "num_components": 20 }"#;
    assert!(matches!(
        PipelineConfig::from_json_str(json),
        Err(FeatureError::InvalidParameter(_))
    ));

    let config = PipelineConfig { top_db: -5.0, ..Default::default() };
    assert!(matches!(FeaturePipeline::new(config), Err(FeatureError::InvalidParameter(_))));
}

#[test]
fn test_analyze_corpus_rejects_ragged_vectors() {
    use speechprint::FeatureVector;

    let vectors = vec![
        FeatureVector::new(vec![0.0; 13]),
        FeatureVector::new(vec![0.0; 13]),
        FeatureVector::new(vec![0.0; 12]),
    ];
    let result = analyze_corpus(&vectors, None, &PipelineConfig::default());
    assert!(matches!(
        result,
        Err(FeatureError::DimensionMismatch { index: 2, expected: 13, found: 12 })
    ));
}

#[test]
fn test_too_many_components_for_corpus() {
    let vectors = vec![
        speechprint::FeatureVector::new((0..13).map(|i| i as f64).collect()),
        speechprint::FeatureVector::new((0..13).map(|i| (i * i) as f64).collect()),
    ];
    let config = PipelineConfig { num_components: 3, ..Default::default() };
    assert!(matches!(
        analyze_corpus(&vectors, None, &config),
        Err(FeatureError::InvalidParameter(_))
    ));
}
