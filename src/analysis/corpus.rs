//! Corpus matrix assembly
//!
//! Per-clip vectors are stacked in input order, so row `i` always belongs to
//! the `i`-th clip handed in. Downstream rankings and labels are matched back
//! to clips by that position.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::features::aggregation::FeatureVector;

/// Corpus data matrix, shape (num_clips, num_coefficients)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMatrix {
    data: Array2<f64>,
}

impl DataMatrix {
    /// Wrap a (clips x coefficients) array
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Underlying array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of clip rows
    pub fn num_clips(&self) -> usize {
        self.data.nrows()
    }

    /// Number of coefficient columns
    pub fn num_coefficients(&self) -> usize {
        self.data.ncols()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Stack feature vectors into a data matrix
///
/// # Errors
///
/// - `FeatureError::InsufficientData` if `vectors` is empty
/// - `FeatureError::DimensionMismatch` naming the first vector whose length
///   differs from `vectors[0]`; nothing is padded or truncated
pub fn build(vectors: &[FeatureVector]) -> Result<DataMatrix, FeatureError> {
    let first = vectors.first().ok_or_else(|| {
        FeatureError::InsufficientData("Cannot build a corpus matrix from zero clips".to_string())
    })?;
    let width = first.len();

    if let Some((index, bad)) = vectors.iter().enumerate().find(|(_, v)| v.len() != width) {
        return Err(FeatureError::DimensionMismatch {
            index,
            expected: width,
            found: bad.len(),
        });
    }

    let mut data = Array2::<f64>::zeros((vectors.len(), width));
    for (mut row, vector) in data.rows_mut().into_iter().zip(vectors) {
        for (slot, &value) in row.iter_mut().zip(vector.values()) {
            *slot = value;
        }
    }

    log::debug!("Built corpus matrix: {} clips x {} coefficients", vectors.len(), width);

    Ok(DataMatrix::new(data))
}
