//! Solver output and per-restart diagnostics.

use ndarray::Array2;

/// A clustering produced by one restart (or the best of several).
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Medoid object index per cluster; distinct.
    pub medoids: Vec<usize>,
    /// `n × k` indicator matrix; `assignment[[i, c]] == 1` iff object `i`
    /// belongs to cluster `c`.
    pub assignment: Array2<u8>,
    /// Sum of distances over all assigned (object, cluster) pairs.
    pub total_deviation: f64,
}

impl Solution {
    /// Number of objects.
    pub fn n_items(&self) -> usize {
        self.assignment.nrows()
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.assignment.ncols()
    }

    /// Total number of (object, cluster) assignments.
    pub fn n_assignments(&self) -> usize {
        self.assignment.iter().map(|&a| a as usize).sum()
    }

    /// Objects assigned to no cluster.
    pub fn outliers(&self) -> Vec<usize> {
        self.rows_where(|count| count == 0)
    }

    /// Objects assigned to more than one cluster.
    pub fn overlapping(&self) -> Vec<usize> {
        self.rows_where(|count| count > 1)
    }

    /// Members of cluster `c`, in object order.
    pub fn members(&self, c: usize) -> Vec<usize> {
        self.assignment
            .column(c)
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a != 0)
            .map(|(i, _)| i)
            .collect()
    }

    fn rows_where(&self, pred: impl Fn(usize) -> bool) -> Vec<usize> {
        self.assignment
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| pred(row.iter().filter(|&&a| a != 0).count()))
            .map(|(i, _)| i)
            .collect()
    }
}

/// What one restart ended with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestartSummary {
    /// Final total deviation of the restart.
    pub total_deviation: f64,
    /// Refinement iterations performed.
    pub iterations: usize,
    /// Whether the improvement fell within tolerance before `iter_max`.
    pub converged: bool,
}
