//! Correlated daily log-return increments for the basket names.
//!
//! # Model
//!
//! Each name follows a risk-neutral GBM with a flat correlation:
//! ```text
//! x_{i,t} = (r − q_i − σ_i²/2)·dt + σ_i·√dt·(L z_t)_i
//! ```
//! where `L` is the Cholesky factor of the flat correlation matrix and
//! `z_t` holds `n` independent standard normals.
//!
//! # Memory Layout
//!
//! [`PathBundle`] is path-major, day-major, name-minor:
//! `data[(p * days + t) * n_names + i]`.

use std::ops::Range;

use voltarget_core::math::{flat_correlation_cholesky, LowerTriangular};
use voltarget_core::types::{
    ConfigError, Horizon, NameQuote, NumericalError, NumericalStage, MAX_TRADING_DAYS,
};

use crate::rng::PathRng;

/// Increments for a contiguous range of paths.
#[derive(Clone, Debug)]
pub struct PathBundle {
    first_path: usize,
    n_paths: usize,
    days: usize,
    n_names: usize,
    data: Vec<f64>,
}

impl PathBundle {
    /// Global index of the first path.
    #[inline]
    pub fn first_path(&self) -> usize {
        self.first_path
    }

    /// Number of paths held.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Trading days per path.
    #[inline]
    pub fn days(&self) -> usize {
        self.days
    }

    /// Basket size.
    #[inline]
    pub fn n_names(&self) -> usize {
        self.n_names
    }

    /// Increments of the `k`-th path in the bundle (`days × n_names`).
    #[inline]
    pub fn path(&self, k: usize) -> &[f64] {
        let stride = self.days * self.n_names;
        &self.data[k * stride..(k + 1) * stride]
    }

    /// Iterates `(global_path_index, increments)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> + '_ {
        (0..self.n_paths).map(move |k| (self.first_path + k, self.path(k)))
    }
}

/// Generates deterministic correlated increments per path index.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::types::{Maturity, NameQuote};
/// use voltarget_pricing::mc::PathGenerator;
///
/// let quotes = [NameQuote::new(100.0, 0.2), NameQuote::new(50.0, 0.3)];
/// let horizon = Maturity::TradingDays(10).horizon().unwrap();
/// let generator = PathGenerator::new(&quotes, 0.5, 0.03, horizon, 42).unwrap();
///
/// let bundle = generator.generate(0..4).unwrap();
/// assert_eq!(bundle.n_paths(), 4);
/// assert_eq!(bundle.path(0).len(), 10 * 2);
/// ```
#[derive(Clone, Debug)]
pub struct PathGenerator {
    cholesky: LowerTriangular,
    drift: Vec<f64>,
    diffusion: Vec<f64>,
    days: usize,
    seed: u64,
}

impl PathGenerator {
    /// Creates a generator for the given quotes (in basket order).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the horizon is out of range, the basket is
    /// empty, the correlation is infeasible for the basket size, or a
    /// drift/diffusion coefficient is not finite.
    pub fn new(
        quotes: &[NameQuote],
        correlation: f64,
        rate: f64,
        horizon: Horizon,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if horizon.days < 1 {
            return Err(ConfigError::HorizonTooShort {
                years: horizon.years,
                days: horizon.days,
            });
        }
        if horizon.days > MAX_TRADING_DAYS {
            return Err(ConfigError::HorizonTooLong {
                years: horizon.years,
                maximum: MAX_TRADING_DAYS,
            });
        }
        let cholesky = flat_correlation_cholesky(quotes.len(), correlation)?;

        let dt = horizon.dt;
        let sqrt_dt = dt.sqrt();
        let drift: Vec<f64> = quotes
            .iter()
            .map(|q| (rate - q.dividend_yield - 0.5 * q.vol * q.vol) * dt)
            .collect();
        let diffusion: Vec<f64> = quotes.iter().map(|q| q.vol * sqrt_dt).collect();

        if let Some(bad) = drift.iter().chain(&diffusion).find(|v| !v.is_finite()) {
            return Err(ConfigError::invalid("drift", format!("{}", bad)));
        }

        Ok(Self {
            cholesky,
            drift,
            diffusion,
            days: horizon.days,
            seed,
        })
    }

    /// Basket size.
    #[inline]
    pub fn n_names(&self) -> usize {
        self.drift.len()
    }

    /// Trading days per path.
    #[inline]
    pub fn days(&self) -> usize {
        self.days
    }

    /// Length of one path's increment slice.
    #[inline]
    pub fn path_len(&self) -> usize {
        self.days * self.n_names()
    }

    /// Writes the increments of `path` into `out`.
    ///
    /// `normals` is scratch space of length [`n_names`](Self::n_names).
    /// Draws are consumed day by day, name by name, so the same path index
    /// yields the same normals under any market.
    pub fn fill_path(
        &self,
        path: usize,
        out: &mut [f64],
        normals: &mut [f64],
    ) -> Result<(), NumericalError> {
        let n = self.n_names();
        debug_assert_eq!(out.len(), self.path_len());
        debug_assert_eq!(normals.len(), n);

        let mut rng = PathRng::for_path(self.seed, path as u64);
        for (t, day) in out.chunks_exact_mut(n).enumerate() {
            rng.fill_normal(normals);
            self.cholesky.apply(normals, day);
            for (i, x) in day.iter_mut().enumerate() {
                *x = self.drift[i] + self.diffusion[i] * *x;
                if !x.is_finite() {
                    return Err(NumericalError::new(
                        NumericalStage::PathGeneration,
                        path,
                        Some(t + 1),
                        *x,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Generates the bundle for a contiguous range of path indices.
    pub fn generate(&self, paths: Range<usize>) -> Result<PathBundle, NumericalError> {
        let n_paths = paths.len();
        let stride = self.path_len();
        let mut data = vec![0.0; n_paths * stride];
        let mut normals = vec![0.0; self.n_names()];

        for (k, path) in paths.clone().enumerate() {
            self.fill_path(path, &mut data[k * stride..(k + 1) * stride], &mut normals)?;
        }

        Ok(PathBundle {
            first_path: paths.start,
            n_paths,
            days: self.days,
            n_names: self.n_names(),
            data,
        })
    }
}
