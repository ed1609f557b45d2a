//! # neokmedoids
//!
//! Neo-k-medoids clustering over a precomputed distance matrix: k-medoids
//! with controlled **overlap** (objects in several clusters) and controlled
//! **outlier exclusion** (objects in no cluster).
//!
//! Restarts run sequentially by default; enable the `parallel` feature to
//! spread them over rayon's thread pool (results are identical).

pub mod cluster;
/// Error types used across `neokmedoids`.
pub mod error;
pub mod matrix;
pub mod metrics;


pub use cluster::{NeoKMedoids, RestartSummary, Solution};
pub use error::{Error, Result};
pub use metrics::{f1, purity, silhouette};
