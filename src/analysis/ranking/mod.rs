//! Feature ranking over the corpus matrix
//!
//! Two independent scorers rank the coefficient columns:
//! - Ensemble importance: mean decrease in Gini impurity over a seeded random forest
//! - Mutual information: k-nearest-neighbour estimate of I(column; label)
//!
//! Labels are optional. Without them every clip gets the placeholder label
//! `0`; the scores are still computed deterministically (and come out as all
//! zeros, since a constant label carries no information).
//!
//! # Example
//!
//! ```no_run
//! use speechprint::analysis::corpus::DataMatrix;
//! use speechprint::analysis::ranking::{rank_by_mutual_information, RankingConfig};
//! use ndarray::Array2;
//!
//! let matrix = DataMatrix::new(Array2::zeros((10, 13)));
//! let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
//! let ranking = rank_by_mutual_information(&matrix, Some(&labels), &RankingConfig::default())?;
//! println!("best column: {:?}", ranking.top());
//! # Ok::<(), speechprint::FeatureError>(())
//! ```

pub mod forest;
pub mod mutual_info;

use std::borrow::Cow;

use super::corpus::DataMatrix;
use super::result::{RankingMethod, RankingResult};
use crate::config::PipelineConfig;
use crate::error::FeatureError;

/// Ranking parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    /// Seed for every random draw (default: 42)
    pub seed: u64,
    /// Trees in the forest (default: 100)
    pub num_trees: usize,
    /// Maximum tree depth (default: unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node (default: 2)
    pub min_samples_split: usize,
    /// Neighbours for the mutual information estimator (default: 3)
    pub mi_neighbors: usize,
    /// Number of ranked columns to return (default: all)
    pub top_k: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RankingConfig {
    /// Extract the ranking parameters from the pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            seed: config.seed,
            num_trees: config.num_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            mi_neighbors: config.mi_neighbors,
            top_k: config.top_k,
        }
    }

    fn validate(&self) -> Result<(), FeatureError> {
        if self.num_trees == 0 {
            return Err(FeatureError::InvalidParameter("num_trees must be > 0".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(FeatureError::InvalidParameter(format!(
                "min_samples_split must be >= 2, got {}",
                self.min_samples_split
            )));
        }
        if self.mi_neighbors == 0 {
            return Err(FeatureError::InvalidParameter("mi_neighbors must be > 0".to_string()));
        }
        if self.top_k == Some(0) {
            return Err(FeatureError::InvalidParameter("top_k must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Check corpus size and label length; substitute placeholder labels if none given
fn resolve_labels<'a>(
    matrix: &DataMatrix,
    labels: Option<&'a [usize]>,
) -> Result<Cow<'a, [usize]>, FeatureError> {
    let n = matrix.num_clips();
    if n < 2 {
        return Err(FeatureError::InsufficientData(format!(
            "Feature ranking needs at least 2 clips, got {}",
            n
        )));
    }

    match labels {
        Some(labels) if labels.len() != n => Err(FeatureError::InvalidParameter(format!(
            "Label sequence has {} entries but the corpus has {} clips",
            labels.len(),
            n
        ))),
        Some(labels) => Ok(Cow::Borrowed(labels)),
        None => Ok(Cow::Owned(vec![0; n])),
    }
}

/// Rank columns by random-forest impurity importance
///
/// # Errors
///
/// - `FeatureError::InsufficientData` if the corpus has fewer than 2 clips
/// - `FeatureError::InvalidParameter` for a bad label length or configuration
pub fn rank_by_importance(
    matrix: &DataMatrix,
    labels: Option<&[usize]>,
    config: &RankingConfig,
) -> Result<RankingResult, FeatureError> {
    config.validate()?;
    let labels = resolve_labels(matrix, labels)?;

    log::debug!(
        "Ranking {} columns by forest importance: {} trees, seed={}",
        matrix.num_coefficients(),
        config.num_trees,
        config.seed
    );

    let params = forest::ForestParams {
        num_trees: config.num_trees,
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        seed: config.seed,
    };
    let scores = forest::feature_importances(matrix.data(), &labels, &params);

    Ok(RankingResult::from_scores(
        RankingMethod::EnsembleImportance,
        &scores,
        config.top_k,
    ))
}

/// Rank columns by estimated mutual information with the labels
///
/// # Errors
///
/// - `FeatureError::InsufficientData` if the corpus has fewer than 2 clips
/// - `FeatureError::InvalidParameter` for a bad label length or configuration
pub fn rank_by_mutual_information(
    matrix: &DataMatrix,
    labels: Option<&[usize]>,
    config: &RankingConfig,
) -> Result<RankingResult, FeatureError> {
    config.validate()?;
    let labels = resolve_labels(matrix, labels)?;

    log::debug!(
        "Ranking {} columns by mutual information: k={}, seed={}",
        matrix.num_coefficients(),
        config.mi_neighbors,
        config.seed
    );

    let scores = mutual_info::mutual_information(
        matrix.data(),
        &labels,
        config.mi_neighbors,
        config.seed,
    );

    Ok(RankingResult::from_scores(
        RankingMethod::MutualInformation,
        &scores,
        config.top_k,
    ))
}
