//! Example: Extract the fingerprint of each audio file
//!
//! Usage:
//!   cargo run --release --example extract_features -- [--artifacts DIR] [--json] <file1> <file2> ...
//!
//! Each file is decoded, trimmed and reduced to one MFCC summary vector.
//! With `--artifacts DIR` the trimmed waveform and both MFCC matrices of each
//! clip are written to DIR as `.npy` files.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use speechprint::{decode_audio, FeaturePipeline, NpyDirSink, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut artifacts: Option<String> = None;
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--artifacts" => {
                let dir = args.first().ok_or("--artifacts requires a directory")?.clone();
                args.remove(0);
                artifacts = Some(dir);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: extract_features [--artifacts DIR] [--json] <file1> <file2> ...\n\
                     \n\
                     --artifacts DIR   Write per-clip .npy artifacts to DIR\n\
                     --json            Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let mut pipeline = FeaturePipeline::new(PipelineConfig::default())?;
    if let Some(dir) = artifacts {
        pipeline = pipeline.with_sink(Arc::new(NpyDirSink::new(dir)?));
    }

    let t0 = Instant::now();
    for path in &paths {
        let clip_id = Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());

        let waveform = match decode_audio(path) {
            Ok(w) => w,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                continue;
            }
        };

        match pipeline.process_clip(&clip_id, &waveform) {
            Ok(features) if json => {
                let line = serde_json::json!({
                    "clip_id": features.clip_id,
                    "trimmed_range": [features.trimmed_range.0, features.trimmed_range.1],
                    "num_frames": features.num_frames,
                    "degenerate_rows": features.degenerate_rows,
                    "vector": features.vector,
                });
                println!("{}", line);
            }
            Ok(features) => {
                println!(
                    "{}: {:.2}s, {} frames, kept [{}, {})",
                    clip_id,
                    waveform.duration_seconds(),
                    features.num_frames,
                    features.trimmed_range.0,
                    features.trimmed_range.1
                );
                let formatted: Vec<String> =
                    features.vector.values().iter().map(|v| format!("{:+.3}", v)).collect();
                println!("  [{}]", formatted.join(", "));
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    eprintln!("Done: {} files in {:.1} ms", paths.len(), t0.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}
