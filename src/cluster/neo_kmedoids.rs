//! Neo-k-medoids: overlapping, non-exhaustive k-medoids.
//!
//! Works directly on a precomputed `n × n` distance matrix. Two fractions
//! control the shape of the result:
//!
//! - **beta** (outliers): the primary pass places only the `⌈n − βn⌉`
//!   objects whose nearest medoid is closest; the rest start unassigned.
//! - **alpha** (overlap): the overlap pass keeps filling (object, cluster)
//!   slots in ascending distance until `⌈n + αn⌉` assignments exist.
//!
//! `alpha = -beta` gives a plain partition with outliers; `alpha = k - 1`,
//! `beta = 0` puts every object in every cluster.
//!
//! # Objective
//!
//! ```text
//! D = Σ_c Σ_{i ∈ C_c} d(x_i, m_c)
//! ```
//!
//! # Refinement
//!
//! Each iteration rebuilds the assignment from the current medoids, then
//! applies at most one medoid swap: the candidate (object, cluster) pair
//! with the most negative change in that cluster's deviation, skipping
//! objects that are already medoids. The loop stops once the deviation
//! improvement lies in `[0, tolerance]`.
//!
//! Both passes walk (distance, object, cluster) tuples in a stable sorted
//! order, so ties always resolve towards lower object then lower cluster
//! index.
//!
//! # Restarts
//!
//! Local search finds a local optimum only, so the whole procedure is run
//! `c_max` times from random medoid sets and the lowest-deviation result
//! is kept. Restart `r` draws from `StdRng::seed_from_u64(seed + r)`,
//! which makes results independent of whether restarts run sequentially
//! or (with the `parallel` feature) on rayon's pool.
//!
//! # References
//!
//! Whang, Dhillon & Gleich (2015). "Non-exhaustive, Overlapping k-means."
//! SDM 2015 (NEO-K-Means, of which this is the medoid variant).

use super::solution::{RestartSummary, Solution};
use crate::error::{Error, Result};
use crate::matrix::validate_distances;
use log::{debug, trace, warn};
use ndarray::{Array2, ArrayView2, AsArray, Ix2};
use rand::prelude::*;
use rand::seq::index;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of primary (nearest-medoid) assignments allowed for `n` objects
/// and outlier fraction `beta`.
pub fn primary_cap(n: usize, beta: f64) -> usize {
    slot_count(n as f64 - beta * n as f64, n)
}

/// Total number of assignments allowed for `n` objects, `k` clusters and
/// overlap fraction `alpha`.
pub fn total_cap(n: usize, k: usize, alpha: f64) -> usize {
    slot_count(n as f64 + alpha * n as f64, n * k)
}

/// Smallest count reaching `target`, clamped to `[0, limit]`.
fn slot_count(target: f64, limit: usize) -> usize {
    if target <= 0.0 {
        0
    } else {
        (target.ceil() as usize).min(limit)
    }
}

/// Neo-k-medoids solver.
///
/// Holds configuration, the best solution of the last [`cluster`] call,
/// and a log of every restart ever run on this instance.
///
/// [`cluster`]: NeoKMedoids::cluster
///
/// ```rust
/// use ndarray::array;
/// use neokmedoids::NeoKMedoids;
///
/// let d = array![
///     [0.0, 1.0, 10.0, 10.0],
///     [1.0, 0.0, 10.0, 10.0],
///     [10.0, 10.0, 0.0, 1.0],
///     [10.0, 10.0, 1.0, 0.0],
/// ];
///
/// let mut solver = NeoKMedoids::new().with_seed(7).with_c_max(10);
/// let clusters = solver.cluster(&d, 2, 0.0, 0.0).unwrap();
///
/// assert_eq!(clusters.row(0), clusters.row(1));
/// assert_ne!(clusters.row(0), clusters.row(2));
/// assert_eq!(solver.total_deviation(), Some(2.0));
/// ```
#[derive(Debug, Clone)]
pub struct NeoKMedoids {
    /// Maximum refinement iterations per restart.
    iter_max: usize,
    /// Number of random restarts.
    c_max: usize,
    /// Convergence tolerance on deviation improvement.
    tolerance: f64,
    /// A swap must improve deviation by more than this.
    swap_threshold: f64,
    /// Deviation increases larger than this are reported.
    regression_threshold: f64,
    /// Base random seed.
    seed: Option<u64>,
    /// Best solution of the last successful call.
    best: Option<Solution>,
    /// Every restart run on this instance, oldest first.
    restart_log: Vec<RestartSummary>,
}

impl Default for NeoKMedoids {
    fn default() -> Self {
        Self::new()
    }
}

impl NeoKMedoids {
    /// Create a solver with default settings.
    pub fn new() -> Self {
        Self {
            iter_max: 10_000,
            c_max: 100,
            tolerance: 1e-3,
            swap_threshold: 0.0,
            regression_threshold: 1e-5,
            seed: None,
            best: None,
            restart_log: Vec::new(),
        }
    }

    /// Set maximum refinement iterations per restart.
    pub fn with_iter_max(mut self, iter_max: usize) -> Self {
        self.iter_max = iter_max;
        self
    }

    /// Set number of random restarts.
    pub fn with_c_max(mut self, c_max: usize) -> Self {
        self.c_max = c_max;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the minimum deviation decrease a medoid swap must achieve.
    ///
    /// Independent of the convergence tolerance. `0.0` accepts any strict
    /// decrease.
    pub fn with_swap_threshold(mut self, swap_threshold: f64) -> Self {
        self.swap_threshold = swap_threshold;
        self
    }

    /// Set the deviation increase treated as numerical noise.
    pub fn with_regression_threshold(mut self, regression_threshold: f64) -> Self {
        self.regression_threshold = regression_threshold;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Best assignment matrix of the last successful call.
    pub fn clusters(&self) -> Option<&Array2<u8>> {
        self.best.as_ref().map(|s| &s.assignment)
    }

    /// Best medoids of the last successful call.
    pub fn medoids(&self) -> Option<&[usize]> {
        self.best.as_ref().map(|s| s.medoids.as_slice())
    }

    /// Best total deviation of the last successful call.
    pub fn total_deviation(&self) -> Option<f64> {
        self.best.as_ref().map(|s| s.total_deviation)
    }

    /// Best solution of the last successful call.
    pub fn solution(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    /// Every restart run on this instance, across all calls.
    pub fn restart_log(&self) -> &[RestartSummary] {
        &self.restart_log
    }

    /// Final deviation of every restart run on this instance.
    pub fn all_total_deviations(&self) -> Vec<f64> {
        self.restart_log.iter().map(|r| r.total_deviation).collect()
    }

    /// Forget the best solution and the restart log.
    pub fn reset(&mut self) {
        self.best = None;
        self.restart_log.clear();
    }

    /// Cluster `n` objects into `k` possibly overlapping clusters.
    ///
    /// Returns the `n × k` indicator matrix of the best restart; medoids
    /// and deviation are available through the accessors afterwards.
    ///
    /// # Errors
    ///
    /// Fails before touching any state if `distances` is not square or
    /// has non-finite entries, if `k` is not in `1..=n`, if `beta` is not
    /// in `[0, 1]`, if `alpha` is not in `[-beta, k - 1]`, or if the
    /// solver configuration is invalid.
    pub fn cluster<'a, V>(
        &mut self,
        distances: V,
        k: usize,
        alpha: f64,
        beta: f64,
    ) -> Result<Array2<u8>>
    where
        V: AsArray<'a, f64, Ix2>,
    {
        let distances: ArrayView2<'a, f64> = distances.into();
        let n = validate_distances(distances)?;
        self.validate(n, k, alpha, beta)?;

        let primary = primary_cap(n, beta);
        let total = total_cap(n, k, alpha);
        let base_seed = self.seed.unwrap_or_else(|| rand::rng().random());
        debug!(
            "neo-k-medoids: n={n} k={k} alpha={alpha} beta={beta} primary_cap={primary} total_cap={total} restarts={}",
            self.c_max
        );

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(Solution, RestartSummary)> = (0..self.c_max)
            .into_par_iter()
            .map(|r| self.restart(distances, k, primary, total, &mut restart_rng(base_seed, r)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(Solution, RestartSummary)> = (0..self.c_max)
            .map(|r| self.restart(distances, k, primary, total, &mut restart_rng(base_seed, r)))
            .collect();

        let mut best: Option<Solution> = None;
        for (r, (solution, summary)) in outcomes.into_iter().enumerate() {
            debug!(
                "restart {r}: deviation={} iterations={} converged={}",
                summary.total_deviation, summary.iterations, summary.converged
            );
            self.restart_log.push(summary);

            let improves = best
                .as_ref()
                .map_or(true, |b| solution.total_deviation < b.total_deviation);
            if improves {
                debug!("restart {r}: new best deviation {}", solution.total_deviation);
                best = Some(solution);
            }
        }

        self.best = best;
        Ok(self
            .clusters()
            .cloned()
            .unwrap_or_else(|| Array2::zeros((n, k))))
    }

    fn validate(&self, n: usize, k: usize, alpha: f64, beta: f64) -> Result<()> {
        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        if !(0.0..=1.0).contains(&beta) {
            return Err(Error::InvalidParameter {
                name: "beta",
                message: format!("must lie in [0, 1], got {beta}"),
            });
        }
        let max_alpha = (k - 1) as f64;
        if !(alpha >= -beta && alpha <= max_alpha) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                message: format!("must lie in [{}, {max_alpha}], got {alpha}", -beta),
            });
        }
        if self.c_max == 0 {
            return Err(Error::InvalidParameter {
                name: "c_max",
                message: "must be at least 1".into(),
            });
        }
        if self.iter_max == 0 {
            return Err(Error::InvalidParameter {
                name: "iter_max",
                message: "must be at least 1".into(),
            });
        }
        for (name, value) in [
            ("tolerance", self.tolerance),
            ("swap_threshold", self.swap_threshold),
            ("regression_threshold", self.regression_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidParameter {
                    name,
                    message: format!("must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// One restart: random medoids, then refine.
    fn restart(
        &self,
        distances: ArrayView2<'_, f64>,
        k: usize,
        primary: usize,
        total: usize,
        rng: &mut StdRng,
    ) -> (Solution, RestartSummary) {
        let medoids = index::sample(rng, distances.nrows(), k).into_vec();
        self.refine(distances, medoids, primary, total)
    }

    /// Refine `medoids` until convergence or `iter_max`.
    fn refine(
        &self,
        distances: ArrayView2<'_, f64>,
        mut medoids: Vec<usize>,
        primary: usize,
        total: usize,
    ) -> (Solution, RestartSummary) {
        let mut assignment = Array2::zeros((distances.nrows(), medoids.len()));
        let mut history: Vec<f64> = Vec::new();
        let mut converged = false;

        for _iter in 0..self.iter_max {
            assignment = assign(distances, &medoids, primary, total);
            self.swap_medoid(distances, &mut medoids, &assignment);

            history.push(deviation(distances, &medoids, &assignment));
            if self.has_converged(&history) {
                converged = true;
                break;
            }
        }

        if !converged {
            self.report_exhausted(&history);
        }

        let total_deviation = history.last().copied().unwrap_or(0.0);
        let summary = RestartSummary {
            total_deviation,
            iterations: history.len(),
            converged,
        };
        let solution = Solution {
            medoids,
            assignment,
            total_deviation,
        };
        (solution, summary)
    }

    /// Whether the last step improved deviation by at most `tolerance`.
    /// Warns when deviation rose beyond the noise threshold.
    fn has_converged(&self, history: &[f64]) -> bool {
        let [.., prev, last] = history else {
            return false;
        };
        let improvement = prev - last;
        if improvement < -self.regression_threshold {
            warn!("negative deviation improvement: {improvement}");
            false
        } else {
            (0.0..=self.tolerance).contains(&improvement)
        }
    }

    /// Warn about an exhausted iteration budget; silent with fewer than
    /// two recorded deviations.
    fn report_exhausted(&self, history: &[f64]) {
        if let [.., prev, last] = history {
            warn!(
                "did not converge in {} iterations; last improvement: {}",
                self.iter_max,
                prev - last
            );
        }
    }

    /// Apply the best improving swap whose candidate is not already a
    /// medoid. Returns whether a swap happened.
    fn swap_medoid(
        &self,
        distances: ArrayView2<'_, f64>,
        medoids: &mut [usize],
        assignment: &Array2<u8>,
    ) -> bool {
        let n = distances.nrows();
        let k = medoids.len();

        let current: Vec<f64> = (0..k)
            .map(|c| {
                (0..n)
                    .filter(|&i| assignment[[i, c]] != 0)
                    .map(|i| distances[[i, medoids[c]]])
                    .sum()
            })
            .collect();

        // hypothetical[[p, c]]: deviation of cluster c with p as its medoid
        let hypothetical = distances.dot(&assignment.mapv(f64::from));
        let mut candidates: Vec<(f64, usize, usize)> = hypothetical
            .indexed_iter()
            .map(|((p, c), &h)| (h - current[c], p, c))
            .collect();
        sort_ranking(&mut candidates);

        for (improvement, p, c) in candidates {
            if improvement >= -self.swap_threshold {
                break;
            }
            if !medoids.contains(&p) {
                trace!("swap medoid of cluster {c}: {} -> {p} ({improvement})", medoids[c]);
                medoids[c] = p;
                return true;
            }
        }
        false
    }
}

fn restart_rng(base_seed: u64, restart: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed.wrapping_add(restart as u64))
}

/// Sort (value, object, cluster) tuples ascending, ties by object then
/// cluster index.
fn sort_ranking(ranking: &mut [(f64, usize, usize)]) {
    ranking.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });
}

/// Build the indicator matrix for `medoids`: primary pass over nearest
/// clusters up to `primary` assignments, then the overlap pass over all
/// pairs up to `total`.
fn assign(
    distances: ArrayView2<'_, f64>,
    medoids: &[usize],
    primary: usize,
    total: usize,
) -> Array2<u8> {
    let n = distances.nrows();
    let k = medoids.len();

    let mut ranking: Vec<(f64, usize, usize)> = Vec::with_capacity(n * k);
    let mut nearest = vec![0usize; n];
    for i in 0..n {
        let mut best_dist = f64::INFINITY;
        for (c, &m) in medoids.iter().enumerate() {
            let d = distances[[i, m]];
            ranking.push((d, i, c));
            if d < best_dist {
                best_dist = d;
                nearest[i] = c;
            }
        }
    }
    sort_ranking(&mut ranking);

    let mut assignment = Array2::zeros((n, k));
    let mut assignments = 0usize;

    for &(_, i, c) in ranking.iter().filter(|&&(_, i, c)| nearest[i] == c) {
        if assignments >= primary {
            break;
        }
        assignment[[i, c]] = 1;
        assignments += 1;
    }

    for &(_, i, c) in &ranking {
        if assignments >= total {
            break;
        }
        if assignment[[i, c]] != 0 {
            continue;
        }
        assignment[[i, c]] = 1;
        assignments += 1;
    }

    assignment
}

/// Total deviation of `assignment` with respect to `medoids`.
fn deviation(distances: ArrayView2<'_, f64>, medoids: &[usize], assignment: &Array2<u8>) -> f64 {
    assignment
        .indexed_iter()
        .filter(|&(_, &a)| a != 0)
        .map(|((i, c), _)| distances[[i, medoids[c]]])
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    fn two_pairs() -> Array2<f64> {
        array![
            [0.0, 1.0, 10.0, 10.0],
            [1.0, 0.0, 10.0, 10.0],
            [10.0, 10.0, 0.0, 1.0],
            [10.0, 10.0, 1.0, 0.0],
        ]
    }

    /// Points on a line; distance is absolute difference.
    fn line(points: &[f64]) -> Array2<f64> {
        let n = points.len();
        Array2::from_shape_fn((n, n), |(i, j)| (points[i] - points[j]).abs())
    }

    fn row_sums(a: &Array2<u8>) -> Vec<usize> {
        a.rows()
            .into_iter()
            .map(|r| r.iter().map(|&x| x as usize).sum())
            .collect()
    }

    #[test]
    fn test_caps() {
        assert_eq!(primary_cap(4, 0.0), 4);
        assert_eq!(primary_cap(4, 0.5), 2);
        assert_eq!(primary_cap(5, 0.5), 3);
        assert_eq!(primary_cap(4, 1.0), 0);
        assert_eq!(total_cap(4, 2, 0.0), 4);
        assert_eq!(total_cap(4, 2, 1.0), 8);
        assert_eq!(total_cap(4, 2, -0.5), 2);
        assert_eq!(total_cap(5, 3, 0.3), 7);
    }

    #[test]
    fn test_assign_primary_respects_outlier_cap() {
        let d = line(&[0.0, 1.0, 2.0, 10.0, 11.0, 30.0]);
        let a = assign(d.view(), &[1, 4], 5, 5);
        // Object 5 is farthest from both medoids.
        assert_eq!(row_sums(&a), vec![1, 1, 1, 1, 1, 0]);
        assert_eq!(a[[0, 0]], 1);
        assert_eq!(a[[3, 1]], 1);
    }

    #[test]
    fn test_assign_overlap_backfills_by_distance() {
        let d = line(&[0.0, 1.0, 2.0, 10.0, 11.0, 30.0]);
        // Primary places 4; overlap adds the two closest unassigned pairs.
        let a = assign(d.view(), &[1, 4], 4, 6);
        assert_eq!(a.iter().map(|&x| x as usize).sum::<usize>(), 6);
        // Primary: 1->c0 (0), 4->c1 (0), 0->c0 (1), 2->c0 (1). Next nearest
        // pairs: 3->c1 (1), then 2->c1 (9).
        assert_eq!(a[[3, 1]], 1);
        assert_eq!(a[[2, 1]], 1);
        assert_eq!(row_sums(&a), vec![1, 1, 2, 1, 1, 0]);
    }

    #[test]
    fn test_assign_ties_prefer_lower_cluster() {
        let d = array![[0.0, 5.0, 5.0], [5.0, 0.0, 5.0], [5.0, 5.0, 0.0]];
        let a = assign(d.view(), &[0, 1], 3, 3);
        assert_eq!(a.row(2), array![1u8, 0]);
    }

    #[test]
    fn test_swap_moves_medoid_to_group() {
        let d = two_pairs();
        let mut medoids = vec![0, 1];
        let a = assign(d.view(), &medoids, 4, 4);
        let solver = NeoKMedoids::new();
        assert!(solver.swap_medoid(d.view(), &mut medoids, &a));
        assert_eq!(medoids, vec![2, 1]);
    }

    #[test]
    fn test_swap_rejects_non_improving() {
        let d = two_pairs();
        let mut medoids = vec![0, 2];
        let a = assign(d.view(), &medoids, 4, 4);
        let solver = NeoKMedoids::new();
        assert!(!solver.swap_medoid(d.view(), &mut medoids, &a));
        assert_eq!(medoids, vec![0, 2]);
    }

    #[test]
    fn test_swap_threshold_blocks_small_gains() {
        let d = line(&[0.0, 1.0, 2.0, 3.0]);
        let mut medoids = vec![0];
        let a = assign(d.view(), &medoids, 4, 4);
        // Moving the medoid to 1 or 2 saves 2.
        let strict = NeoKMedoids::new().with_swap_threshold(2.5);
        assert!(!strict.swap_medoid(d.view(), &mut medoids, &a));
        let loose = NeoKMedoids::new();
        assert!(loose.swap_medoid(d.view(), &mut medoids, &a));
        assert_eq!(medoids, vec![1]);
    }

    #[test]
    fn test_two_pairs_scenario() {
        let d = two_pairs();
        let mut solver = NeoKMedoids::new().with_seed(42);
        let a = solver.cluster(&d, 2, 0.0, 0.0).unwrap();

        assert_eq!(a.dim(), (4, 2));
        assert_eq!(row_sums(&a), vec![1, 1, 1, 1]);
        assert_eq!(a.row(0), a.row(1));
        assert_eq!(a.row(2), a.row(3));
        assert_ne!(a.row(0), a.row(2));
        assert_eq!(solver.total_deviation(), Some(2.0));

        let medoids = solver.medoids().unwrap();
        let mut groups: Vec<usize> = medoids.iter().map(|&m| m / 2).collect();
        groups.sort_unstable();
        assert_eq!(groups, vec![0, 1]);
    }

    #[test]
    fn test_outlier_fraction_never_worse() {
        let d = two_pairs();
        let mut base = NeoKMedoids::new().with_seed(1);
        base.cluster(&d, 2, 0.0, 0.0).unwrap();
        let mut with_outliers = NeoKMedoids::new().with_seed(1);
        with_outliers.cluster(&d, 2, 0.0, 0.5).unwrap();
        assert!(with_outliers.total_deviation().unwrap() <= base.total_deviation().unwrap());

        let mut partition = NeoKMedoids::new().with_seed(1);
        let a = partition.cluster(&d, 2, -0.5, 0.5).unwrap();
        assert_eq!(a.iter().map(|&x| x as usize).sum::<usize>(), 2);
        assert_eq!(partition.total_deviation(), Some(0.0));
    }

    #[test]
    fn test_full_overlap() {
        let d = line(&[0.0, 3.0, 4.0, 9.0, 20.0]);
        let mut solver = NeoKMedoids::new().with_seed(3).with_c_max(5);
        let a = solver.cluster(&d, 3, 2.0, 0.0).unwrap();
        assert!(a.iter().all(|&x| x == 1));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let d = line(&[0.0, 0.5, 1.0, 7.0, 7.2, 7.9, 15.0, 15.1, 40.0]);
        let mut s1 = NeoKMedoids::new().with_seed(99).with_c_max(8);
        let mut s2 = NeoKMedoids::new().with_seed(99).with_c_max(8);
        let a1 = s1.cluster(&d, 3, 0.2, 0.1).unwrap();
        let a2 = s2.cluster(&d, 3, 0.2, 0.1).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(s1.medoids(), s2.medoids());
        assert_eq!(s1.all_total_deviations(), s2.all_total_deviations());
    }

    #[test]
    fn test_restart_log_accumulates_until_reset() {
        let d = two_pairs();
        let mut solver = NeoKMedoids::new().with_seed(5).with_c_max(4);
        solver.cluster(&d, 2, 0.0, 0.0).unwrap();
        solver.cluster(&d, 2, 0.0, 0.0).unwrap();
        assert_eq!(solver.restart_log().len(), 8);
        assert!(solver.restart_log().iter().all(|r| r.iterations >= 1));

        solver.reset();
        assert!(solver.restart_log().is_empty());
        assert!(solver.solution().is_none());
    }

    #[test]
    fn test_single_iteration_reports_not_converged() {
        let d = two_pairs();
        let mut solver = NeoKMedoids::new().with_seed(5).with_c_max(3).with_iter_max(1);
        solver.cluster(&d, 2, 0.0, 0.0).unwrap();
        assert!(solver
            .restart_log()
            .iter()
            .all(|r| r.iterations == 1 && !r.converged));
    }

    /// Records warnings per thread so concurrently running tests don't see
    /// each other's output.
    mod capture {
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::sync::{Mutex, Once};
        use std::thread::{self, ThreadId};

        struct CaptureLogger {
            records: Mutex<Vec<(ThreadId, String)>>,
        }

        impl Log for CaptureLogger {
            fn enabled(&self, metadata: &Metadata<'_>) -> bool {
                metadata.level() <= Level::Warn
            }

            fn log(&self, record: &Record<'_>) {
                if self.enabled(record.metadata()) {
                    if let Ok(mut records) = self.records.lock() {
                        records.push((thread::current().id(), record.args().to_string()));
                    }
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: CaptureLogger = CaptureLogger {
            records: Mutex::new(Vec::new()),
        };
        static INIT: Once = Once::new();

        /// Install the logger and drop anything this thread logged so far.
        pub(super) fn start() {
            INIT.call_once(|| {
                if log::set_logger(&LOGGER).is_ok() {
                    log::set_max_level(LevelFilter::Warn);
                }
            });
            let _ = take();
        }

        /// Warnings logged on this thread since the last call.
        pub(super) fn take() -> Vec<String> {
            let id = thread::current().id();
            let mut records = LOGGER.records.lock().unwrap();
            let (mine, rest): (Vec<_>, Vec<_>) =
                records.drain(..).partition(|(tid, _)| *tid == id);
            *records = rest;
            mine.into_iter().map(|(_, msg)| msg).collect()
        }
    }

    #[test]
    fn test_regression_warns_beyond_threshold() {
        capture::start();
        let solver = NeoKMedoids::new();

        assert!(!solver.has_converged(&[2.0, 2.5]));
        assert_eq!(capture::take(), vec!["negative deviation improvement: -0.5"]);

        // Within numerical noise: neither a warning nor convergence.
        assert!(!solver.has_converged(&[2.0, 2.000001]));
        assert!(capture::take().is_empty());

        assert!(solver.has_converged(&[2.0, 2.0]));
        assert!(solver.has_converged(&[2.0005, 2.0]));
        assert!(!solver.has_converged(&[3.0, 2.0]));
        assert!(!solver.has_converged(&[2.0]));
        assert!(capture::take().is_empty());
    }

    #[test]
    fn test_exhausted_budget_warns_with_last_improvement() {
        capture::start();
        let d = two_pairs();
        // Both medoids in the first pair: deviation goes 11 -> 2 -> 2.
        let solver = NeoKMedoids::new().with_iter_max(2);
        let (solution, summary) = solver.refine(d.view(), vec![0, 1], 4, 4);

        assert!(!summary.converged);
        assert_eq!(summary.iterations, 2);
        assert_eq!(solution.total_deviation, 2.0);
        assert_eq!(
            capture::take(),
            vec!["did not converge in 2 iterations; last improvement: 9"]
        );

        let solver = NeoKMedoids::new().with_iter_max(3);
        let (_, summary) = solver.refine(d.view(), vec![0, 1], 4, 4);
        assert!(summary.converged);
        assert!(capture::take().is_empty());
    }

    #[test]
    fn test_single_iteration_budget_is_silent() {
        capture::start();
        let d = two_pairs();
        let solver = NeoKMedoids::new().with_iter_max(1);
        let (_, summary) = solver.refine(d.view(), vec![0, 1], 4, 4);

        assert!(!summary.converged);
        assert_eq!(summary.iterations, 1);
        assert!(capture::take().is_empty());
    }

    #[test]
    fn test_k_equals_n() {
        let d = line(&[0.0, 1.0, 5.0]);
        let mut solver = NeoKMedoids::new().with_seed(11).with_c_max(3);
        let a = solver.cluster(&d, 3, 0.0, 0.0).unwrap();
        assert_eq!(row_sums(&a), vec![1, 1, 1]);
        assert_eq!(solver.total_deviation(), Some(0.0));
    }

    #[test]
    fn test_validation_errors() {
        let d = two_pairs();
        let mut solver = NeoKMedoids::new().with_seed(1).with_c_max(2);

        let rect = Array2::<f64>::zeros((3, 4));
        assert!(solver.cluster(&rect, 2, 0.0, 0.0).unwrap_err().is_shape_error());
        assert_eq!(
            solver.cluster(&d, 5, 0.0, 0.0),
            Err(Error::InvalidClusterCount {
                requested: 5,
                n_items: 4
            })
        );
        assert!(solver.cluster(&d, 0, 0.0, 0.0).unwrap_err().is_constraint_error());
        assert!(solver.cluster(&d, 2, 0.0, 1.5).unwrap_err().is_constraint_error());
        assert!(solver.cluster(&d, 2, 0.0, -0.1).unwrap_err().is_constraint_error());
        assert!(solver.cluster(&d, 2, -0.6, 0.5).unwrap_err().is_constraint_error());
        assert!(solver.cluster(&d, 2, 1.5, 0.0).unwrap_err().is_constraint_error());
        assert!(solver.cluster(&d, 2, f64::NAN, 0.0).unwrap_err().is_constraint_error());

        let mut bad = NeoKMedoids::new().with_c_max(0);
        assert!(bad.cluster(&d, 2, 0.0, 0.0).is_err());
        let mut bad = NeoKMedoids::new().with_tolerance(-1.0);
        assert!(bad.cluster(&d, 2, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_failed_call_keeps_previous_state() {
        let d = two_pairs();
        let mut solver = NeoKMedoids::new().with_seed(8).with_c_max(5);
        solver.cluster(&d, 2, 0.0, 0.0).unwrap();
        let before = solver.solution().cloned();
        let log_len = solver.restart_log().len();

        assert!(solver.cluster(&d, 9, 0.0, 0.0).is_err());
        assert!(solver.cluster(&d, 2, 0.0, 2.0).is_err());

        assert_eq!(solver.solution().cloned(), before);
        assert_eq!(solver.restart_log().len(), log_len);
    }

    fn instance() -> impl Strategy<Value = (Array2<f64>, usize, f64, f64)> {
        (2usize..8)
            .prop_flat_map(|n| {
                (
                    proptest::collection::vec(0.0f64..100.0, n),
                    proptest::collection::vec(0.0f64..100.0, n),
                    1..=n,
                    0.0f64..=1.0,
                    0.0f64..=1.0,
                )
            })
            .prop_map(|(xs, ys, k, beta, t)| {
                let n = xs.len();
                let d = Array2::from_shape_fn((n, n), |(i, j)| {
                    ((xs[i] - xs[j]).powi(2) + (ys[i] - ys[j]).powi(2)).sqrt()
                });
                // alpha interpolated over [-beta, k - 1]
                let alpha = (-beta + t * ((k - 1) as f64 + beta)).min((k - 1) as f64);
                (d, k, alpha, beta)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_shape_and_caps((d, k, alpha, beta) in instance(), seed in any::<u64>()) {
            let n = d.nrows();
            let mut solver = NeoKMedoids::new().with_seed(seed).with_c_max(4).with_iter_max(200);
            let a = solver.cluster(&d, k, alpha, beta).unwrap();

            prop_assert_eq!(a.dim(), (n, k));
            prop_assert!(a.iter().all(|&x| x <= 1));
            let assigned: usize = a.iter().map(|&x| x as usize).sum();
            prop_assert_eq!(assigned, total_cap(n, k, alpha));

            let medoids = solver.medoids().unwrap();
            let mut distinct = medoids.to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), k);
        }

        #[test]
        fn prop_best_is_minimum_of_restarts((d, k, alpha, beta) in instance(), seed in any::<u64>()) {
            let mut solver = NeoKMedoids::new().with_seed(seed).with_c_max(6).with_iter_max(200);
            solver.cluster(&d, k, alpha, beta).unwrap();
            let best = solver.total_deviation().unwrap();
            let logged = solver.all_total_deviations();
            prop_assert_eq!(logged.len(), 6);
            prop_assert!(logged.iter().all(|&dev| best <= dev));
            prop_assert!(logged.iter().any(|&dev| dev == best));
        }

        #[test]
        fn prop_no_overlap_when_alpha_is_minus_beta((d, k, _alpha, beta) in instance(), seed in any::<u64>()) {
            let n = d.nrows();
            let mut solver = NeoKMedoids::new().with_seed(seed).with_c_max(3).with_iter_max(200);
            let a = solver.cluster(&d, k, -beta, beta).unwrap();
            let sums = row_sums(&a);
            prop_assert!(sums.iter().all(|&s| s <= 1));
            let outliers = sums.iter().filter(|&&s| s == 0).count();
            prop_assert_eq!(outliers, n - primary_cap(n, beta));
        }

        #[test]
        fn prop_full_matrix_when_alpha_is_k_minus_one((d, k, _alpha, _beta) in instance(), seed in any::<u64>()) {
            let mut solver = NeoKMedoids::new().with_seed(seed).with_c_max(2).with_iter_max(200);
            let a = solver.cluster(&d, k, (k - 1) as f64, 0.0).unwrap();
            prop_assert!(a.iter().all(|&x| x == 1));
        }
    }
}
