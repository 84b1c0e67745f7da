//! Error types for the feature extraction pipeline

use std::fmt;

/// Errors that can occur while extracting or analysing features
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Not enough data to run a stage (waveform shorter than one frame,
    /// corpus too small for ranking, ...)
    InsufficientData(String),

    /// Out-of-range configuration value (coefficient count, component count, ...)
    InvalidParameter(String),

    /// A row or label sequence whose length disagrees with the rest of the corpus
    DimensionMismatch {
        /// Position of the offending item in the input sequence
        index: usize,
        /// Length every item is expected to have
        expected: usize,
        /// Length actually found
        found: usize,
    },

    /// No frame of the clip rises above the trim threshold
    SilentClip,

    /// Audio decoding error
    Decoding(String),

    /// Filesystem error while reading audio or persisting artifacts
    Io(String),
}

impl FeatureError {
    /// Whether this error belongs to a single clip and should be reported
    /// per clip instead of aborting the batch.
    pub fn is_clip_local(&self) -> bool {
        matches!(
            self,
            FeatureError::InsufficientData(_)
                | FeatureError::SilentClip
                | FeatureError::Decoding(_)
                | FeatureError::Io(_)
        )
    }
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            FeatureError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            FeatureError::DimensionMismatch { index, expected, found } => write!(
                f,
                "Dimension mismatch at index {}: expected length {}, found {}",
                index, expected, found
            ),
            FeatureError::SilentClip => write!(f, "Clip is silent: no frame above trim threshold"),
            FeatureError::Decoding(msg) => write!(f, "Decoding error: {}", msg),
            FeatureError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FeatureError {}

impl From<std::io::Error> for FeatureError {
    fn from(err: std::io::Error) -> Self {
        FeatureError::Io(err.to_string())
    }
}

/// A failure attached to the clip that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ClipError {
    /// Identifier supplied by the collaborator
    pub clip_id: String,
    /// What went wrong
    pub error: FeatureError,
}

impl fmt::Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.clip_id, self.error)
    }
}

impl std::error::Error for ClipError {}
