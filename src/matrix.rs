//! Distance-matrix intake and indicator-matrix helpers.
//!
//! The solver works on `ndarray::Array2<f64>` distance matrices and
//! produces `Array2<u8>` indicator matrices (`1` = member). These helpers
//! convert from plain row vectors and from flat label vectors.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Build a distance matrix from rows, rejecting ragged or non-square input.
///
/// ```rust
/// use neokmedoids::matrix::from_rows;
///
/// let d = from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
/// assert_eq!(d.dim(), (2, 2));
///
/// assert!(from_rows(&[vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 3.0]]).is_err());
/// ```
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n = rows.len();
    let mut flat: Vec<f64> = Vec::with_capacity(n * n);
    for row in rows {
        if row.len() != n {
            return Err(Error::NotSquare {
                rows: n,
                cols: row.len(),
            });
        }
        flat.extend(row);
    }
    Array2::from_shape_vec((n, n), flat).map_err(|_| Error::NotSquare { rows: n, cols: n })
}

/// Check that `distances` is square with finite entries; returns `n`.
pub fn validate_distances(distances: ArrayView2<'_, f64>) -> Result<usize> {
    let (rows, cols) = distances.dim();
    if rows != cols {
        return Err(Error::NotSquare { rows, cols });
    }
    if let Some(((row, col), _)) = distances.indexed_iter().find(|(_, d)| !d.is_finite()) {
        return Err(Error::NonFiniteDistance { row, col });
    }
    Ok(rows)
}

/// One-hot encode hard labels into an `n × n_labels` indicator matrix.
///
/// Labels `>= n_labels` (e.g. a noise marker) produce an all-zero row.
pub fn one_hot(labels: &[usize], n_labels: usize) -> Array2<u8> {
    let mut out = Array2::zeros((labels.len(), n_labels));
    for (i, &l) in labels.iter().enumerate() {
        if l < n_labels {
            out[[i, l]] = 1;
        }
    }
    out
}

/// Cluster memberships of each object, read off an indicator matrix.
///
/// An empty vector marks an outlier; more than one entry marks overlap.
pub fn memberships(assignment: &Array2<u8>) -> Vec<Vec<usize>> {
    assignment
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .filter(|&(_, &a)| a != 0)
                .map(|(c, _)| c)
                .collect()
        })
        .collect()
}
