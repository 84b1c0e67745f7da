//! Temporal aggregation of a normalized matrix into one vector per clip

use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use super::normalization::NormalizedFeatureMatrix;

/// Fixed-length per-clip summary, one value per coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap raw coefficient values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Coefficient values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Array1<f64>> for FeatureVector {
    fn from(values: Array1<f64>) -> Self {
        Self::new(values.to_vec())
    }
}

/// Mean of each coefficient over time
///
/// Transposes to (frames x coefficients) and averages down each column, so the
/// output length is always the coefficient count whatever the clip duration.
/// A matrix with no frames yields zeros.
pub fn aggregate(matrix: &NormalizedFeatureMatrix) -> FeatureVector {
    let by_frame = matrix.data().t();
    match by_frame.mean_axis(Axis(0)) {
        Some(means) => FeatureVector::from(means),
        None => FeatureVector::new(vec![0.0; matrix.num_coefficients()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mfcc::FeatureMatrix;
    use crate::features::normalization::normalize;
    use ndarray::{array, Array2};

    #[test]
    fn test_length_independent_of_duration() {
        for frames in [1usize, 2, 17, 500] {
            let matrix = FeatureMatrix::new(Array2::from_shape_fn((13, frames), |(i, j)| {
                ((i + 1) * (j + 3)) as f64 % 7.0
            }));
            let vector = aggregate(&normalize(&matrix));
            assert_eq!(vector.len(), 13, "frames={}", frames);
        }
    }

    #[test]
    fn test_column_means() {
        let matrix = FeatureMatrix::new(array![[1.0, 3.0], [10.0, 10.0]]);
        let normalized = normalize(&matrix);
        // Row 0 becomes [-1, 1], row 1 is constant and zeroed
        let vector = aggregate(&normalized);
        assert_eq!(vector.values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_empty_frames_yield_zeros() {
        let matrix = FeatureMatrix::new(Array2::zeros((5, 0)));
        let vector = aggregate(&normalize(&matrix));
        assert_eq!(vector.values(), &[0.0; 5]);
    }
}
