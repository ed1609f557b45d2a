//! Overlapping, non-exhaustive medoid clustering.
//!
//! ## Exhaustive vs Non-exhaustive, Disjoint vs Overlapping
//!
//! Classic k-medoids (PAM and friends) is **exhaustive** and **disjoint**:
//! every object lands in exactly one cluster. Real data rarely cooperates.
//! A document can be about two topics; a sensor reading can be garbage.
//!
//! Neo-k-medoids relaxes both constraints with two fractions:
//!
//! | Parameter | Range | Effect |
//! |-----------|-------|--------|
//! | `beta` | [0, 1] | up to `βn` objects may be left out as outliers |
//! | `alpha` | [-β, k-1] | `αn` extra assignments beyond one per object |
//!
//! | Setting | Result |
//! |---------|--------|
//! | `alpha = 0, beta = 0` | partition (every object in exactly one cluster) |
//! | `alpha = -beta` | partition of the inliers, no overlap |
//! | `alpha > 0` | some objects in several clusters |
//! | `alpha = k-1, beta = 0` | every object in every cluster |
//!
//! ## Why Medoids?
//!
//! Medoids are actual objects, so only a distance matrix is needed: no
//! vector space, no means. Any dissimilarity works (edit distance, DTW,
//! Jaccard, ...), symmetric or not.
//!
//! ## Usage
//!
//! ```rust
//! use neokmedoids::cluster::NeoKMedoids;
//! use neokmedoids::matrix::from_rows;
//!
//! let d = from_rows(&[
//!     vec![0.0, 1.0, 10.0, 10.0],
//!     vec![1.0, 0.0, 10.0, 10.0],
//!     vec![10.0, 10.0, 0.0, 1.0],
//!     vec![10.0, 10.0, 1.0, 0.0],
//! ])
//! .unwrap();
//!
//! let mut solver = NeoKMedoids::new().with_seed(42);
//! // Allow one extra assignment (alpha = 0.25 of 4 objects).
//! let clusters = solver.cluster(&d, 2, 0.25, 0.0).unwrap();
//! assert_eq!(clusters.sum(), 5);
//! ```

mod neo_kmedoids;
mod solution;

pub use neo_kmedoids::{primary_cap, total_cap, NeoKMedoids};
pub use solution::{RestartSummary, Solution};
