//! Per-coefficient z-score normalization across frames
//!
//! Each row of a [`FeatureMatrix`] is shifted to zero mean and scaled to unit
//! (population) standard deviation. A row whose standard deviation is zero
//! cannot be scaled; it is mean-subtracted only, which leaves it all zeros, and
//! its index is recorded in [`NormalizedFeatureMatrix::degenerate_rows`].

use ndarray::{Array2, Axis};

use super::mfcc::FeatureMatrix;

/// Rows with a standard deviation at or below this are treated as constant
pub const ZERO_VARIANCE_EPSILON: f64 = 1e-12;

/// Row-normalized feature matrix, same shape as its source
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeatureMatrix {
    data: Array2<f64>,
    degenerate_rows: Vec<usize>,
}

impl NormalizedFeatureMatrix {
    /// Underlying array, rows = coefficients, columns = frames
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Rows that had zero variance and were left at zero
    ///
    /// Non-empty means a numeric degeneracy was encountered; the pipeline
    /// carries on with the zeroed rows.
    pub fn degenerate_rows(&self) -> &[usize] {
        &self.degenerate_rows
    }

    /// Number of coefficient rows
    pub fn num_coefficients(&self) -> usize {
        self.data.nrows()
    }

    /// Number of frame columns
    pub fn num_frames(&self) -> usize {
        self.data.ncols()
    }
}

/// Z-score every coefficient row across frames
///
/// Never produces `NaN` or infinite values from finite input.
pub fn normalize(matrix: &FeatureMatrix) -> NormalizedFeatureMatrix {
    let source = matrix.data();
    let mut data = source.to_owned();
    let mut degenerate_rows = Vec::new();

    if source.ncols() == 0 {
        return NormalizedFeatureMatrix { data, degenerate_rows };
    }

    for (i, mut row) in data.axis_iter_mut(Axis(0)).enumerate() {
        let n = row.len() as f64;
        let mean = row.sum() / n;
        let variance = row.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n;
        let std = variance.sqrt();

        if std <= ZERO_VARIANCE_EPSILON {
            row.fill(0.0);
            degenerate_rows.push(i);
        } else {
            row.mapv_inplace(|x| (x - mean) / std);
        }
    }

    if !degenerate_rows.is_empty() {
        log::warn!(
            "Zero-variance coefficient rows {:?} across {} frames; left at zero",
            degenerate_rows,
            source.ncols()
        );
    }

    NormalizedFeatureMatrix { data, degenerate_rows }
}
