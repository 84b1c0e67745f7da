//! Random-forest impurity importance
//!
//! Each tree is a CART classifier grown on a bootstrap sample, trying
//! `floor(sqrt(p))` randomly chosen columns at every split and choosing the
//! threshold with the largest Gini impurity decrease. A column's importance in
//! a tree is the total sample-weighted decrease of the splits that used it,
//! normalised to sum to one; the forest averages the trees.
//!
//! Trees are grown in parallel on the rayon pool. Tree `t` draws from its own
//! generator seeded with `seed + t`, so the result does not depend on the
//! number of threads.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Forest hyper-parameters
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of trees
    pub num_trees: usize,
    /// Maximum depth (root is depth 0); `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Base seed
    pub seed: u64,
}

/// Best split found at a node
struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// Map arbitrary label values to dense class indices `0..num_classes`
fn encode_labels(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut classes: Vec<usize> = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    let encoded = labels
        .iter()
        .map(|l| classes.binary_search(l).unwrap_or(0))
        .collect();
    (encoded, classes.len())
}

/// Gini impurity times node size: `n - sum(c^2) / n`
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sum_sq / n as f64
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    num_classes: usize,
    params: &'a ForestParams,
    max_features: usize,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, rows: &mut [usize], depth: usize, rng: &mut StdRng) {
        let n = rows.len();
        if n < self.params.min_samples_split {
            return;
        }
        if self.params.max_depth.is_some_and(|max| depth >= max) {
            return;
        }

        let mut counts = vec![0usize; self.num_classes];
        for &r in rows.iter() {
            counts[self.y[r]] += 1;
        }
        let parent = weighted_gini(&counts, n);
        if parent <= 0.0 {
            return;
        }

        let split = match self.best_split(rows, &counts, parent, rng) {
            Some(split) => split,
            None => return,
        };

        self.importances[split.feature] += split.decrease;

        let mut boundary = 0;
        for i in 0..n {
            if self.x[[rows[i], split.feature]] <= split.threshold {
                rows.swap(i, boundary);
                boundary += 1;
            }
        }

        let (left, right) = rows.split_at_mut(boundary);
        self.grow(left, depth + 1, rng);
        self.grow(right, depth + 1, rng);
    }

    fn best_split(
        &self,
        rows: &[usize],
        counts: &[usize],
        parent: f64,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let n = rows.len();
        let num_features = self.x.ncols();
        let mut best: Option<Split> = None;

        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);
        let mut left = vec![0usize; self.num_classes];
        let mut right = vec![0usize; self.num_classes];

        for feature in sample(rng, num_features, self.max_features).into_iter() {
            sorted.clear();
            sorted.extend(rows.iter().map(|&r| (self.x[[r, feature]], self.y[r])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            left.iter_mut().for_each(|c| *c = 0);
            right.copy_from_slice(counts);

            for i in 0..n - 1 {
                let class = sorted[i].1;
                left[class] += 1;
                right[class] -= 1;

                // Only cut between distinct values
                if sorted[i].0 >= sorted[i + 1].0 {
                    continue;
                }

                let n_left = i + 1;
                let decrease =
                    parent - weighted_gini(&left, n_left) - weighted_gini(&right, n - n_left);
                if decrease > best.as_ref().map_or(0.0, |b| b.decrease) {
                    best = Some(Split {
                        feature,
                        threshold: 0.5 * (sorted[i].0 + sorted[i + 1].0),
                        decrease,
                    });
                }
            }
        }

        best
    }
}

/// Grow one tree and return its normalised importances
fn tree_importances(
    x: &Array2<f64>,
    y: &[usize],
    num_classes: usize,
    params: &ForestParams,
    tree_index: usize,
) -> Vec<f64> {
    let n = x.nrows();
    let p = x.ncols();
    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(tree_index as u64));

    let mut rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

    let mut builder = TreeBuilder {
        x,
        y,
        num_classes,
        params,
        max_features: ((p as f64).sqrt() as usize).clamp(1, p),
        importances: vec![0.0; p],
    };
    builder.grow(&mut rows, 0, &mut rng);

    let mut importances = builder.importances;
    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    }
    importances
}

/// Mean decrease in impurity per column, summing to one (or all zeros when
/// no tree could split, e.g. with a constant label)
pub fn feature_importances(x: &Array2<f64>, labels: &[usize], params: &ForestParams) -> Vec<f64> {
    let p = x.ncols();
    if x.nrows() == 0 || p == 0 || params.num_trees == 0 {
        return vec![0.0; p];
    }

    let (y, num_classes) = encode_labels(labels);

    let per_tree: Vec<Vec<f64>> = (0..params.num_trees)
        .into_par_iter()
        .map(|t| tree_importances(x, &y, num_classes, params, t))
        .collect();

    let mut importances = vec![0.0; p];
    for tree in &per_tree {
        for (acc, &v) in importances.iter_mut().zip(tree) {
            *acc += v;
        }
    }

    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        importances.iter_mut().for_each(|v| *v /= total);
    }
    importances
}
