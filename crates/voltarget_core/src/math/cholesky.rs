//! Flat-correlation Cholesky factorisation.
//!
//! A flat correlation matrix `C = (1 − ρ) I + ρ 11ᵀ` has eigenvalues
//! `1 + (n − 1)ρ` (once) and `1 − ρ` (n − 1 times), so it is positive
//! semi-definite exactly when `−1/(n − 1) ≤ ρ ≤ 1`. The boundaries
//! produce a semi-definite matrix; the factorisation below handles the
//! resulting zero pivots by zeroing the dependent column.

use crate::types::ConfigError;

/// Pivots with absolute value below this are treated as zero.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Maximum number of names supported by the dense factorisation.
pub const MAX_NAMES: usize = 4_096;

/// Dense lower-triangular factor `L` with `L Lᵀ = C`.
#[derive(Clone, Debug, PartialEq)]
pub struct LowerTriangular {
    n: usize,
    /// Row-major `n × n` storage (upper triangle is zero).
    data: Vec<f64>,
}

impl LowerTriangular {
    /// Dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Writes `L z` into `out`.
    ///
    /// Both slices must have length [`dim`](Self::dim).
    #[inline]
    pub fn apply(&self, z: &[f64], out: &mut [f64]) {
        debug_assert_eq!(z.len(), self.n);
        debug_assert_eq!(out.len(), self.n);
        for (i, o) in out.iter_mut().enumerate() {
            let row = &self.data[i * self.n..i * self.n + i + 1];
            *o = row.iter().zip(z).map(|(l, x)| l * x).sum();
        }
    }

    /// Reconstructs `L Lᵀ` (used by tests and diagnostics).
    pub fn reconstruct(&self) -> Vec<f64> {
        let n = self.n;
        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                out[i * n + j] = (0..=i.min(j)).map(|k| self.get(i, k) * self.get(j, k)).sum();
            }
        }
        out
    }
}

/// Builds the dense `n × n` flat correlation matrix (row-major).
pub fn flat_correlation_matrix(n: usize, rho: f64) -> Vec<f64> {
    let mut m = vec![rho; n * n];
    for i in 0..n {
        m[i * n + i] = 1.0;
    }
    m
}

/// Factors the flat correlation matrix for `n` names.
///
/// # Errors
///
/// - `InvalidParameter` if `n` is zero or above [`MAX_NAMES`]
/// - [`ConfigError::CorrelationOutOfRange`] if `ρ ∉ [−1, 1]`
/// - [`ConfigError::CorrelationInfeasible`] if `ρ < −1/(n − 1)`
/// - [`ConfigError::NotPositiveSemiDefinite`] if a negative pivot appears
///
/// # Examples
///
/// ```rust
/// use voltarget_core::math::flat_correlation_cholesky;
///
/// let l = flat_correlation_cholesky(2, 0.8).unwrap();
/// assert_eq!(l.get(0, 0), 1.0);
/// assert!((l.get(1, 0) - 0.8).abs() < 1e-15);
/// assert!((l.get(1, 1) - 0.6).abs() < 1e-15);
/// ```
pub fn flat_correlation_cholesky(n: usize, rho: f64) -> Result<LowerTriangular, ConfigError> {
    if n == 0 || n > MAX_NAMES {
        return Err(ConfigError::invalid(
            "n_names",
            format!("{} outside [1, {}]", n, MAX_NAMES),
        ));
    }
    if !rho.is_finite() || rho.abs() > 1.0 {
        return Err(ConfigError::CorrelationOutOfRange(rho));
    }
    if n > 1 {
        let minimum = -1.0 / (n - 1) as f64;
        if rho < minimum - 1e-12 {
            return Err(ConfigError::CorrelationInfeasible {
                rho,
                n_names: n,
                minimum,
            });
        }
    }

    let a = flat_correlation_matrix(n, rho);
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let s: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            let residual = a[i * n + j] - s;

            if i == j {
                if residual < -PIVOT_TOLERANCE {
                    return Err(ConfigError::NotPositiveSemiDefinite {
                        row: i,
                        pivot: residual,
                    });
                }
                l[i * n + i] = residual.max(0.0).sqrt();
            } else {
                let pivot = l[j * n + j];
                if pivot > PIVOT_TOLERANCE {
                    l[i * n + j] = residual / pivot;
                } else if residual.abs() > PIVOT_TOLERANCE {
                    return Err(ConfigError::NotPositiveSemiDefinite { row: i, pivot });
                }
            }
        }
    }

    Ok(LowerTriangular { n, data: l })
}
