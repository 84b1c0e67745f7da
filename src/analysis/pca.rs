//! Principal component analysis of the corpus matrix
//!
//! Columns are mean-centred, the sample covariance is eigendecomposed with
//! nalgebra's `SymmetricEigen`, and the leading eigenvectors become the
//! retained axes. Each axis is oriented so that its largest-magnitude loading
//! is positive; the decomposition itself only defines axes up to sign.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};

use super::corpus::DataMatrix;
use super::result::ReductionResult;
use crate::error::FeatureError;

/// Project the corpus onto its `num_components` leading principal axes
///
/// # Errors
///
/// - `FeatureError::InsufficientData` if the matrix has no rows or columns
/// - `FeatureError::InvalidParameter` if `num_components` is outside
///   `[1, min(num_clips, num_coefficients)]`
pub fn reduce(matrix: &DataMatrix, num_components: usize) -> Result<ReductionResult, FeatureError> {
    let (n, p) = matrix.shape();

    if n == 0 || p == 0 {
        return Err(FeatureError::InsufficientData(format!(
            "Cannot reduce a {} x {} matrix",
            n, p
        )));
    }

    let max_components = n.min(p);
    if num_components == 0 || num_components > max_components {
        return Err(FeatureError::InvalidParameter(format!(
            "num_components must be in [1, {}] for a {} x {} matrix, got {}",
            max_components, n, p, num_components
        )));
    }

    log::debug!("PCA: {} clips x {} coefficients -> {} components", n, p, num_components);

    let data = matrix.data();
    let mean = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
    let centered = data - &mean;

    let dof = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let covariance = centered.t().dot(&centered) / dof;

    let eigen = SymmetricEigen::new(DMatrix::from_fn(p, p, |i, j| covariance[[i, j]]));

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let eigenvalues: Vec<f64> = order.iter().map(|&i| eigen.eigenvalues[i].max(0.0)).collect();
    let total: f64 = eigenvalues.iter().sum();

    let explained_variance: Vec<f64> = eigenvalues[..num_components].to_vec();
    let explained_variance_ratio: Vec<f64> = explained_variance
        .iter()
        .map(|&v| if total > 0.0 { v / total } else { 0.0 })
        .collect();

    let mut components = Array2::<f64>::zeros((num_components, p));
    for (c, &idx) in order.iter().take(num_components).enumerate() {
        let axis = eigen.eigenvectors.column(idx);
        let pivot = (0..p).fold(0, |best, j| {
            if axis[j].abs() > axis[best].abs() {
                j
            } else {
                best
            }
        });
        let sign = if axis[pivot] < 0.0 { -1.0 } else { 1.0 };
        for j in 0..p {
            components[[c, j]] = sign * axis[j];
        }
    }

    let projections = centered.dot(&components.t());

    log::debug!("PCA explained variance ratio: {:?}", explained_variance_ratio);

    Ok(ReductionResult {
        projections,
        components,
        explained_variance,
        explained_variance_ratio,
    })
}
