//! Monte Carlo simulation configuration.
//!
//! This module provides configuration types and builders for the
//! vol-target index simulation and its bump-and-reevaluate Greeks.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::trade::positive_finite;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Finite-difference scheme for Greeks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpScheme {
    /// One up-bump per factor: `(V(x+h) − V(x)) / h`.
    #[default]
    Forward,
    /// Up and down bumps: `(V(x+h) − V(x−h)) / 2h`.
    Central,
}

/// Bump sizes and scheme for Greeks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreeksSettings {
    /// Whether Greeks are computed at all.
    pub enabled: bool,
    /// Finite-difference scheme.
    pub scheme: BumpScheme,
    /// Relative spot bump (0.01 = 1%).
    pub spot_bump_rel: f64,
    /// Absolute vol bump (0.01 = 1 vol point).
    pub vol_bump_abs: f64,
    /// Absolute rate bump (0.0001 = 1bp).
    pub rate_bump_abs: f64,
    /// Also bump all vols together.
    pub parallel_vega: bool,
}

impl Default for GreeksSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            scheme: BumpScheme::Forward,
            spot_bump_rel: 0.01,
            vol_bump_abs: 0.01,
            rate_bump_abs: 0.0001,
            parallel_vega: true,
        }
    }
}

impl GreeksSettings {
    /// Greeks switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Validates bump sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_finite("spot_bump_rel", self.spot_bump_rel)?;
        positive_finite("vol_bump_abs", self.vol_bump_abs)?;
        positive_finite("rate_bump_abs", self.rate_bump_abs)?;
        if self.spot_bump_rel >= 1.0 {
            return Err(ConfigError::invalid("spot_bump_rel", "must be below 1"));
        }
        Ok(())
    }
}

/// Simulation configuration.
///
/// Use [`SimulationConfigBuilder`] to construct validated instances; a
/// deserialised value must pass [`SimulationConfig::validate`] before use.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::types::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .paths(10_000)
///     .seed(42)
///     .lookback_bd(40)
///     .target_vol(0.10)
///     .step_cap(0.20)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.paths, 10_000);
/// assert_eq!(config.lookback_bd, 40);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of simulation paths.
    pub paths: usize,
    /// Seed of the per-path random streams.
    pub seed: u64,
    /// Realised-vol lookback window in trading days.
    pub lookback_bd: usize,
    /// Target annualised volatility.
    pub target_vol: f64,
    /// Maximum leverage change per day.
    pub step_cap: f64,
    /// Optional upper bound on leverage.
    pub max_leverage: Option<f64>,
    /// Notional used for the reported premium amount.
    pub notional_scale: f64,
    /// Convergence warning threshold: stderr / premium.
    pub stderr_warning_fraction: f64,
    /// Worker thread count; `None` uses the global rayon pool.
    pub workers: Option<usize>,
    /// Optional wall-clock budget in milliseconds.
    pub time_budget_ms: Option<u64>,
    /// Greeks settings.
    pub greeks: GreeksSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            paths: 10_000,
            seed: 42,
            lookback_bd: 40,
            target_vol: 0.10,
            step_cap: 0.20,
            max_leverage: None,
            notional_scale: 1.0,
            stderr_warning_fraction: 0.05,
            workers: None,
            time_budget_ms: None,
            greeks: GreeksSettings::default(),
        }
    }
}

impl SimulationConfig {
    /// Creates a new configuration builder seeded with defaults.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `paths` is 0 or greater than [`MAX_PATHS`]
    /// - `lookback_bd` is 0
    /// - `target_vol` or `step_cap` is not positive and finite
    /// - `max_leverage`, `notional_scale` or `workers` is not positive
    /// - `stderr_warning_fraction` is negative
    /// - any Greek bump size is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths == 0 || self.paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.paths));
        }
        if self.lookback_bd == 0 {
            return Err(ConfigError::InvalidLookback(self.lookback_bd));
        }
        positive_finite("target_vol", self.target_vol)?;
        positive_finite("step_cap", self.step_cap)?;
        positive_finite("notional_scale", self.notional_scale)?;
        if let Some(cap) = self.max_leverage {
            positive_finite("max_leverage", cap)?;
        }
        if !(self.stderr_warning_fraction.is_finite() && self.stderr_warning_fraction >= 0.0) {
            return Err(ConfigError::invalid(
                "stderr_warning_fraction",
                format!("{} must be non-negative", self.stderr_warning_fraction),
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::invalid("workers", "must be at least 1"));
        }
        if self.greeks.enabled {
            self.greeks.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`].
///
/// Starts from [`SimulationConfig::default`] and validates at build time.
#[derive(Clone, Debug, Default)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfigBuilder {
    /// Sets the number of simulation paths.
    #[inline]
    pub fn paths(mut self, paths: usize) -> Self {
        self.config.paths = paths;
        self
    }

    /// Sets the seed for reproducibility.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the realised-vol lookback in trading days.
    #[inline]
    pub fn lookback_bd(mut self, lookback: usize) -> Self {
        self.config.lookback_bd = lookback;
        self
    }

    /// Sets the target annualised volatility.
    #[inline]
    pub fn target_vol(mut self, vol: f64) -> Self {
        self.config.target_vol = vol;
        self
    }

    /// Sets the per-day leverage step cap.
    #[inline]
    pub fn step_cap(mut self, cap: f64) -> Self {
        self.config.step_cap = cap;
        self
    }

    /// Caps leverage from above.
    #[inline]
    pub fn max_leverage(mut self, cap: f64) -> Self {
        self.config.max_leverage = Some(cap);
        self
    }

    /// Sets the reporting notional.
    #[inline]
    pub fn notional_scale(mut self, scale: f64) -> Self {
        self.config.notional_scale = scale;
        self
    }

    /// Sets the convergence warning threshold.
    #[inline]
    pub fn stderr_warning_fraction(mut self, fraction: f64) -> Self {
        self.config.stderr_warning_fraction = fraction;
        self
    }

    /// Runs on a dedicated pool with `n` workers.
    #[inline]
    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = Some(n);
        self
    }

    /// Sets a wall-clock budget.
    #[inline]
    pub fn time_budget_ms(mut self, ms: u64) -> Self {
        self.config.time_budget_ms = Some(ms);
        self
    }

    /// Replaces the Greeks settings.
    #[inline]
    pub fn greeks(mut self, greeks: GreeksSettings) -> Self {
        self.config.greeks = greeks;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if [`SimulationConfig::validate`] fails.
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
