//! Validation metrics for overlapping, non-exhaustive clusterings.
//!
//! All metrics take **indicator matrices** (`Array2<u8>`, rows = objects,
//! columns = clusters or labels, `1` = member), so an object may belong to
//! several clusters or to none.
//!
//! | Metric | Range | Best | Needs truth |
//! |--------|-------|------|-------------|
//! | [`silhouette`] | [-1, 1] | 1 | no |
//! | [`purity`] | [0, 1] | 1 | yes |
//! | [`f1`] | [0, 1] | 1 | yes |
//!
//! Mismatched shapes or empty input give `0.0`.
//!
//! # Example
//!
//! ```rust
//! use ndarray::array;
//! use neokmedoids::metrics::{f1, purity};
//!
//! let truth = array![[1u8, 0], [1, 0], [0, 1], [0, 1]];
//! let pred = array![[0u8, 1], [0, 1], [1, 0], [1, 0]];
//!
//! assert!((purity(&truth, &pred) - 1.0).abs() < 1e-12);
//! assert!((f1(&truth, &pred) - 1.0).abs() < 1e-12);
//! ```

use ndarray::{Array1, Array2, ArrayView2, AsArray, Axis, Ix2};

fn to_f64(m: &Array2<u8>) -> Array2<f64> {
    m.mapv(f64::from)
}

/// Label × cluster counts: entry `[l, c]` is the number of objects carrying
/// label `l` and assigned to cluster `c`.
fn contingency(truth: &Array2<u8>, pred: &Array2<u8>) -> Array2<f64> {
    to_f64(truth).t().dot(&to_f64(pred))
}

/// Mean silhouette over overlapping clusters.
///
/// For object `i` in cluster `c`:
///
/// ```text
/// a(i, c) = Σ_{j ∈ c} d(i, j) / (|c| - 1)
/// b(i)    = min_{c' ∌ i} Σ_{j ∈ c'} d(i, j) / |c'|
/// s(i, c) = (b(i) - a(i, c)) / max(a(i, c), b(i))
/// ```
///
/// Zero or undefined `a` and `b` values (singleton clusters, objects
/// belonging to every cluster, coincident points) are skipped. Scores are
/// averaged per cluster, then across clusters with at least one score.
/// Outliers contribute nothing.
///
/// `distances` may be an owned matrix or a view, as for
/// [`NeoKMedoids::cluster`](crate::NeoKMedoids::cluster).
pub fn silhouette<'a, V>(assignment: &Array2<u8>, distances: V) -> f64
where
    V: AsArray<'a, f64, Ix2>,
{
    let distances: ArrayView2<'a, f64> = distances.into();
    let (n, k) = assignment.dim();
    if n == 0 || k == 0 || distances.dim() != (n, n) {
        return 0.0;
    }

    let members = to_f64(assignment);
    let sums = distances.dot(&members);
    let sizes: Array1<f64> = members.sum_axis(Axis(0));

    let nearest_other: Vec<Option<f64>> = (0..n)
        .map(|i| {
            (0..k)
                .filter(|&c| assignment[[i, c]] == 0 && sizes[c] > 0.0)
                .map(|c| sums[[i, c]] / sizes[c])
                .filter(|&b| b != 0.0)
                .min_by(f64::total_cmp)
        })
        .collect();

    let mut cluster_means = Vec::with_capacity(k);
    for c in 0..k {
        if sizes[c] < 2.0 {
            continue;
        }
        let scores: Vec<f64> = (0..n)
            .filter(|&i| assignment[[i, c]] != 0)
            .filter_map(|i| {
                let a = sums[[i, c]] / (sizes[c] - 1.0);
                let b = nearest_other[i]?;
                (a != 0.0).then(|| (b - a) / a.max(b))
            })
            .collect();
        if !scores.is_empty() {
            cluster_means.push(scores.iter().sum::<f64>() / scores.len() as f64);
        }
    }

    if cluster_means.is_empty() {
        return 0.0;
    }
    cluster_means.iter().sum::<f64>() / cluster_means.len() as f64
}

/// Purity of an overlapping clustering.
///
/// Each cluster is credited with its most common true label; purity is
/// the credited count over all predicted assignments:
///
/// ```text
/// purity = Σ_c max_l |c ∩ l| / Σ_c |c|
/// ```
///
/// `truth` is `n × labels`, `pred` is `n × clusters`.
pub fn purity(truth: &Array2<u8>, pred: &Array2<u8>) -> f64 {
    if truth.nrows() != pred.nrows() || truth.is_empty() || pred.is_empty() {
        return 0.0;
    }

    let total: f64 = pred.iter().map(|&a| f64::from(a)).sum();
    if total == 0.0 {
        return 0.0;
    }

    let table = contingency(truth, pred);
    let credited: f64 = table
        .columns()
        .into_iter()
        .map(|col| col.iter().copied().fold(0.0, f64::max))
        .sum();
    credited / total
}

/// Mean best-match F1 over true labels.
///
/// For label `l` and cluster `c`, precision is `|c ∩ l| / |c|` and recall
/// `|c ∩ l| / |l|`. Each label takes the F1 of its best-matching cluster;
/// the result is the mean over labels that have at least one member.
pub fn f1(truth: &Array2<u8>, pred: &Array2<u8>) -> f64 {
    if truth.nrows() != pred.nrows() || truth.is_empty() || pred.is_empty() {
        return 0.0;
    }

    let table = contingency(truth, pred);
    let label_sizes = to_f64(truth).sum_axis(Axis(0));
    let cluster_sizes = to_f64(pred).sum_axis(Axis(0));

    let best: Vec<f64> = table
        .rows()
        .into_iter()
        .zip(label_sizes.iter())
        .filter(|&(_, &size)| size > 0.0)
        .map(|(row, &label_size)| {
            row.iter()
                .zip(cluster_sizes.iter())
                .map(|(&overlap, &cluster_size)| {
                    if overlap == 0.0 || cluster_size == 0.0 {
                        return 0.0;
                    }
                    let precision = overlap / cluster_size;
                    let recall = overlap / label_size;
                    2.0 * precision * recall / (precision + recall)
                })
                .fold(0.0, f64::max)
        })
        .collect();

    if best.is_empty() {
        return 0.0;
    }
    best.iter().sum::<f64>() / best.len() as f64
}
