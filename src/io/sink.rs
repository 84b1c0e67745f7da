//! Persistence of intermediate per-clip artifacts
//!
//! The pipeline hands each clip's trimmed waveform, MFCC matrix and
//! normalized matrix to an [`ArtifactSink`]. Where they end up is the
//! caller's business; two sinks ship with the crate:
//!
//! - [`NpyDirSink`] writes NumPy `.npy` (format 1.0) files into a directory
//! - [`MemorySink`] keeps everything in memory

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;

use crate::error::FeatureError;
use crate::features::mfcc::FeatureMatrix;
use crate::features::normalization::NormalizedFeatureMatrix;
use crate::io::waveform::TrimmedWaveform;

/// A per-clip intermediate result
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    /// Waveform after silence trimming
    Trimmed(&'a TrimmedWaveform),
    /// Raw MFCC matrix
    Mfcc(&'a FeatureMatrix),
    /// Z-scored MFCC matrix
    Normalized(&'a NormalizedFeatureMatrix),
}

impl Artifact<'_> {
    /// Short name used in file names and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Trimmed(_) => "trimmed",
            Artifact::Mfcc(_) => "mfcc",
            Artifact::Normalized(_) => "normalized",
        }
    }

    /// Serialize to `.npy` bytes
    pub fn to_npy(&self) -> Vec<u8> {
        match self {
            Artifact::Trimmed(t) => encode_npy_f32(t.waveform.samples()),
            Artifact::Mfcc(m) => encode_npy_f64(m.data()),
            Artifact::Normalized(m) => encode_npy_f64(m.data()),
        }
    }
}

/// Destination for per-clip artifacts
///
/// Called from worker threads when the batch runs in parallel.
pub trait ArtifactSink: Send + Sync {
    /// Persist one artifact of one clip
    fn store(&self, clip_id: &str, artifact: Artifact<'_>) -> Result<(), FeatureError>;
}

/// Build an `.npy` v1.0 header for the given dtype and shape
fn npy_header(descr: &str, shape: &[usize]) -> Vec<u8> {
    let shape_str = match shape {
        [n] => format!("({},)", n),
        dims => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    };
    let mut dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr, shape_str
    );

    // magic(6) + version(2) + len(2) + dict + '\n' padded to a multiple of 64
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');

    let mut out = Vec::with_capacity(10 + dict.len());
    out.extend_from_slice(b"\x93NUMPY");
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out
}

/// Encode a 1-D `f32` array as `.npy`
pub fn encode_npy_f32(values: &[f32]) -> Vec<u8> {
    let mut out = npy_header("<f4", &[values.len()]);
    out.reserve(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Encode a 2-D `f64` array as C-ordered `.npy`
pub fn encode_npy_f64(values: &Array2<f64>) -> Vec<u8> {
    let (rows, cols) = values.dim();
    let mut out = npy_header("<f8", &[rows, cols]);
    out.reserve(rows * cols * 8);
    // Logical iteration order is row-major regardless of memory layout
    for v in values.iter() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Make a clip identifier safe to use as a file name stem
fn file_stem(clip_id: &str) -> String {
    clip_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Writes `<dir>/<clip>_<kind>.npy` for every artifact
#[derive(Debug, Clone)]
pub struct NpyDirSink {
    dir: PathBuf,
}

impl NpyDirSink {
    /// Create the sink, creating `dir` if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, FeatureError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path an artifact of `clip_id` is written to
    pub fn path_for(&self, clip_id: &str, kind: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.npy", file_stem(clip_id), kind))
    }
}

impl ArtifactSink for NpyDirSink {
    fn store(&self, clip_id: &str, artifact: Artifact<'_>) -> Result<(), FeatureError> {
        let path = self.path_for(clip_id, artifact.kind());
        fs::write(&path, artifact.to_npy())
            .map_err(|e| FeatureError::Io(format!("{}: {}", path.display(), e)))?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// A stored artifact held by [`MemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    /// Clip identifier
    pub clip_id: String,
    /// Artifact kind (`trimmed`, `mfcc`, `normalized`)
    pub kind: &'static str,
    /// `.npy` encoded payload
    pub bytes: Vec<u8>,
}

/// Keeps every artifact in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Mutex<Vec<StoredArtifact>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything stored so far
    pub fn take(&self) -> Vec<StoredArtifact> {
        match self.stored.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ArtifactSink for MemorySink {
    fn store(&self, clip_id: &str, artifact: Artifact<'_>) -> Result<(), FeatureError> {
        let entry = StoredArtifact {
            clip_id: clip_id.to_string(),
            kind: artifact.kind(),
            bytes: artifact.to_npy(),
        };
        self.stored
            .lock()
            .map_err(|_| FeatureError::Io("memory sink lock poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::waveform::Waveform;
    use ndarray::array;

    fn header_len(bytes: &[u8]) -> usize {
        u16::from_le_bytes([bytes[8], bytes[9]]) as usize
    }

    #[test]
    fn test_npy_header_layout() {
        let bytes = encode_npy_f64(&array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(&bytes[..6], b"\x93NUMPY");
        assert_eq!(&bytes[6..8], &[1, 0]);

        let hlen = header_len(&bytes);
        assert_eq!((10 + hlen) % 64, 0);
        let header = std::str::from_utf8(&bytes[10..10 + hlen]).unwrap();
        assert!(header.contains("'descr': '<f8'"));
        assert!(header.contains("'shape': (2, 3)"));
        assert!(header.ends_with('\n'));

        assert_eq!(bytes.len(), 10 + hlen + 6 * 8);
        let second = f64::from_le_bytes(bytes[10 + hlen + 8..10 + hlen + 16].try_into().unwrap());
        assert_eq!(second, 2.0);
    }

    #[test]
    fn test_npy_vector_shape() {
        let bytes = encode_npy_f32(&[0.5, -0.5]);
        let hlen = header_len(&bytes);
        let header = std::str::from_utf8(&bytes[10..10 + hlen]).unwrap();
        assert!(header.contains("'shape': (2,)"));
        assert!(header.contains("'<f4'"));
        assert_eq!(bytes.len(), 10 + hlen + 8);
    }

    #[test]
    fn test_dir_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = NpyDirSink::new(dir.path().join("artifacts")).unwrap();
        let matrix = FeatureMatrix::new(array![[1.0, 2.0], [3.0, 4.0]]);

        sink.store("speaker/clip 01", Artifact::Mfcc(&matrix)).unwrap();

        let path = sink.path_for("speaker/clip 01", "mfcc");
        assert!(path.ends_with("speaker_clip_01_mfcc.npy"));
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..6], b"\x93NUMPY");
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        let trimmed = TrimmedWaveform {
            waveform: Waveform::new(vec![0.1, 0.2], 16000).unwrap(),
            start: 3,
            end: 5,
        };
        sink.store("a", Artifact::Trimmed(&trimmed)).unwrap();

        let stored = sink.take();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].clip_id, "a");
        assert_eq!(stored[0].kind, "trimmed");
        assert!(sink.take().is_empty());
    }
}
