//! Counter-keyed pseudo-random number generator for per-path streams.
//!
//! This module provides [`PathRng`], a ChaCha8 generator whose key is the
//! run seed and whose stream id is the path index.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Random stream of a single simulated path.
///
/// # Examples
///
/// ```rust
/// use voltarget_pricing::rng::PathRng;
///
/// let mut rng = PathRng::for_path(42, 0);
/// let mut buffer = vec![0.0; 8];
/// rng.fill_normal(&mut buffer);
/// assert_eq!(rng.path(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct PathRng {
    inner: ChaCha8Rng,
    seed: u64,
    path: u64,
}

impl PathRng {
    /// Opens the stream for `path` under `seed`.
    #[inline]
    pub fn for_path(seed: u64, path: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(path);
        Self { inner, seed, path }
    }

    /// Run seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Path index (stream id).
    #[inline]
    pub fn path(&self) -> u64 {
        self.path
    }

    /// Generates a single standard normal variate.
    ///
    /// Uses the Ziggurat sampler behind `rand_distr::StandardNormal`.
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills the buffer with standard normal variates.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }
}
