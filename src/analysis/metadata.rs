//! Run metadata structures

use serde::{Deserialize, Serialize};

/// Bookkeeping for one corpus run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Crate version that produced the report
    pub algorithm_version: String,

    /// Clips that reached the corpus matrix
    pub clips_used: usize,

    /// Clips excluded by per-clip failures
    pub clips_failed: usize,

    /// Clips that had at least one zero-variance coefficient row
    pub degenerate_clips: usize,

    /// Whether placeholder labels stood in for real ones
    pub placeholder_labels: bool,

    /// Seed used for every random draw in the ranking stage
    pub seed: u64,

    /// Wall-clock time for the corpus stages in milliseconds
    pub processing_time_ms: f32,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            clips_used: 0,
            clips_failed: 0,
            degenerate_clips: 0,
            placeholder_labels: true,
            seed: 0,
            processing_time_ms: 0.0,
        }
    }
}
