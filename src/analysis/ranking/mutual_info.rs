//! Mutual information between continuous columns and a discrete label
//!
//! Uses the nearest-neighbour estimator of Ross (2014), "Mutual Information
//! between Discrete and Continuous Data Sets", PLoS ONE 9(2):
//!
//! ```text
//! I = psi(N) + <psi(k)> - <psi(N_c)> - <psi(m)>
//! ```
//!
//! where for each sample `N_c` is the size of its class, `k` the neighbour
//! count used within that class, and `m` the number of samples of any class
//! within the distance to its `k`-th same-class neighbour. Samples whose class
//! has a single member are left out. Each column is scaled to unit variance
//! and given a tiny seeded jitter so that repeated values do not collapse
//! neighbour distances to zero.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Relative jitter added to scaled columns
const JITTER: f64 = 1e-10;

/// Digamma function for `x > 0`
pub fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    // Recurrence psi(x) = psi(x + 1) - 1 / x until the asymptotic series is accurate
    while x < 10.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln() - 0.5 * inv
        - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 * (1.0 / 252.0 - inv2 * (1.0 / 240.0))))
}

/// Largest float strictly below `r` (for `r > 0`), so that the `k`-th
/// neighbour itself falls outside the counting radius
fn just_below(r: f64) -> f64 {
    if r > 0.0 {
        f64::from_bits(r.to_bits() - 1)
    } else {
        r
    }
}

/// Scale to unit variance and add seeded jitter
fn prepare_column(column: ArrayView1<'_, f64>, rng: &mut StdRng) -> Vec<f64> {
    let n = column.len() as f64;
    let mean = column.sum() / n;
    let std = (column.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();
    let scale = if std > 0.0 { 1.0 / std } else { 1.0 };

    let scaled: Vec<f64> = column.iter().map(|&v| v * scale).collect();
    let mean_abs = scaled.iter().map(|v| v.abs()).sum::<f64>() / n;
    let amplitude = JITTER * mean_abs.max(1.0);

    scaled
        .into_iter()
        .map(|v| v + amplitude * rng.gen_range(-1.0..1.0))
        .collect()
}

/// Estimate I(x; y) for one continuous column
fn column_mutual_information(x: &[f64], y: &[usize], num_neighbors: usize) -> f64 {
    let mut classes: Vec<usize> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return 0.0;
    }

    // Members of each class
    let members: Vec<Vec<usize>> = classes
        .iter()
        .map(|c| (0..y.len()).filter(|&i| y[i] == *c).collect())
        .collect();

    let mut kept: Vec<usize> = Vec::new();
    let mut radius: Vec<f64> = Vec::new();
    let mut k_used: Vec<usize> = Vec::new();
    let mut class_size: Vec<usize> = Vec::new();

    for group in members.iter().filter(|g| g.len() > 1) {
        let k = num_neighbors.min(group.len() - 1);
        for &i in group {
            let mut distances: Vec<f64> = group
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (x[j] - x[i]).abs())
                .collect();
            distances.sort_by(|a, b| a.total_cmp(b));

            kept.push(i);
            radius.push(just_below(distances[k - 1]));
            k_used.push(k);
            class_size.push(group.len());
        }
    }

    let n = kept.len();
    if n == 0 {
        return 0.0;
    }

    let mut sum_psi_k = 0.0;
    let mut sum_psi_class = 0.0;
    let mut sum_psi_m = 0.0;

    for (slot, &i) in kept.iter().enumerate() {
        let r = radius[slot];
        // Kept samples of any class within r, self included. Distances are
        // computed the same way as above so the k-th neighbour stays outside.
        let m = kept.iter().filter(|&&j| (x[j] - x[i]).abs() <= r).count().max(1);

        sum_psi_k += digamma(k_used[slot] as f64);
        sum_psi_class += digamma(class_size[slot] as f64);
        sum_psi_m += digamma(m as f64);
    }

    let nf = n as f64;
    let mi = digamma(nf) + (sum_psi_k - sum_psi_class - sum_psi_m) / nf;
    mi.max(0.0)
}

/// Mutual information of every column of `x` with `labels`, in nats
///
/// Columns draw their jitter from one generator seeded with `seed`, in column
/// order, so results are reproducible.
pub fn mutual_information(
    x: &Array2<f64>,
    labels: &[usize],
    num_neighbors: usize,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    x.columns()
        .into_iter()
        .map(|column| {
            let prepared = prepare_column(column, &mut rng);
            column_mutual_information(&prepared, labels, num_neighbors.max(1))
        })
        .collect()
}
