//! Numerical helpers for the Monte Carlo kernel.
//!
//! - [`cholesky`]: flat-correlation matrix and its lower-triangular factor
//! - [`stats`]: mergeable running moments, percentiles, trailing ring window

pub mod cholesky;
pub mod stats;

pub use cholesky::{flat_correlation_cholesky, flat_correlation_matrix, LowerTriangular};
pub use stats::{percentile, RingWindow, RunningMoments};
