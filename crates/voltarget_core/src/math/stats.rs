//! Streaming statistics used by the aggregation and strategy layers.

use serde::{Deserialize, Serialize};

/// Welford running mean and second central moment.
///
/// Two accumulators built over disjoint samples combine exactly with
/// [`merge`](Self::merge) (Chan et al.), so per-block partials reduced in
/// a fixed order give a deterministic result.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::math::RunningMoments;
///
/// let mut left = RunningMoments::new();
/// let mut right = RunningMoments::new();
/// for x in [1.0, 2.0] { left.push(x); }
/// for x in [3.0, 4.0] { right.push(x); }
/// left.merge(&right);
///
/// assert_eq!(left.count(), 4);
/// assert!((left.mean() - 2.5).abs() < 1e-15);
/// assert!((left.sample_variance() - 5.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMoments {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningMoments {
    /// Empty accumulator.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one observation.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
    }

    /// Number of observations.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean (0 when empty).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance (0 with fewer than two observations).
    #[inline]
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    /// Sample standard deviation.
    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// Standard error of the mean: `s / √n`.
    #[inline]
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }
}

/// Linear-interpolation percentile of an ascending slice.
///
/// `q` is a fraction in [0, 1]. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Fixed-capacity window over the most recent observations.
///
/// The variance is evaluated two-pass over the held values, so a window of
/// identical values has a variance of exactly zero (up to the rounding of
/// the mean, which enters squared).
#[derive(Clone, Debug)]
pub struct RingWindow {
    buf: Vec<f64>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl RingWindow {
    /// Creates an empty window holding at most `capacity` values.
    ///
    /// A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: vec![0.0; capacity],
            capacity,
            head: 0,
            len: 0,
        }
    }

    /// Clears the window, keeping its allocation.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Window capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the window holds `capacity` values.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Pushes a value, evicting the oldest one when full.
    pub fn push(&mut self, x: f64) {
        self.buf[self.head] = x;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Unbiased variance of the held values, `None` with fewer than two.
    pub fn sample_variance(&self) -> Option<f64> {
        if self.len < 2 {
            return None;
        }
        let held = &self.buf[..self.len];
        let n = self.len as f64;
        let mean = held.iter().sum::<f64>() / n;
        let ss: f64 = held.iter().map(|x| (x - mean) * (x - mean)).sum();
        Some(ss / (n - 1.0))
    }

    /// Sample standard deviation, `None` with fewer than two values.
    #[inline]
    pub fn sample_std(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}
