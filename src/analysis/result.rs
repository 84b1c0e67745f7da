//! Corpus analysis result types

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::metadata::RunMetadata;

/// Output of the dimensionality reduction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionResult {
    /// Clip coordinates on the retained axes, shape (num_clips, k)
    pub projections: Array2<f64>,

    /// Retained axes as rows, shape (k, num_coefficients)
    ///
    /// Each axis is only defined up to sign; compare with `abs()` when testing.
    pub components: Array2<f64>,

    /// Variance along each retained axis, descending
    pub explained_variance: Vec<f64>,

    /// Fraction of total variance along each retained axis, descending, sum <= 1
    pub explained_variance_ratio: Vec<f64>,
}

impl ReductionResult {
    /// Number of retained components
    pub fn num_components(&self) -> usize {
        self.explained_variance_ratio.len()
    }

    /// Total fraction of variance retained
    pub fn total_explained(&self) -> f64 {
        self.explained_variance_ratio.iter().sum()
    }
}

/// How a ranking was scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMethod {
    /// Mean decrease in impurity over a random forest
    EnsembleImportance,
    /// k-nearest-neighbour mutual information with the labels
    MutualInformation,
}

/// Columns ordered by descending score
///
/// Equal scores keep ascending column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Scoring method
    pub method: RankingMethod,

    /// Column indices, best first
    pub indices: Vec<usize>,

    /// Score of each entry in `indices`
    pub scores: Vec<f64>,
}

impl RankingResult {
    /// Rank every column score and keep the best `top_k` (all when `None`)
    ///
    /// `top_k` larger than the number of columns keeps every column.
    pub fn from_scores(method: RankingMethod, column_scores: &[f64], top_k: Option<usize>) -> Self {
        let mut order: Vec<usize> = (0..column_scores.len()).collect();
        // Stable: ties stay in ascending column order
        order.sort_by(|&a, &b| column_scores[b].total_cmp(&column_scores[a]));

        let keep = top_k.unwrap_or(order.len()).min(order.len());
        order.truncate(keep);

        let scores = order.iter().map(|&i| column_scores[i]).collect();
        Self {
            method,
            indices: order,
            scores,
        }
    }

    /// Best-ranked column, if any
    pub fn top(&self) -> Option<(usize, f64)> {
        self.indices.first().copied().zip(self.scores.first().copied())
    }
}

/// Everything computed over one corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusReport {
    /// Clip identifiers in row order of the data matrix
    pub clip_ids: Vec<String>,

    /// (num_clips, num_coefficients)
    pub matrix_shape: (usize, usize),

    /// Principal component projection
    pub reduction: ReductionResult,

    /// Random-forest importance ranking
    pub importance_ranking: RankingResult,

    /// Mutual information ranking
    pub mutual_information_ranking: RankingResult,

    /// Run bookkeeping
    pub metadata: RunMetadata,
}
