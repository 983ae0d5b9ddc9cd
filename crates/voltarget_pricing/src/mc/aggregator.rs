//! Reduction of discounted payoffs into the premium estimate.

use serde::{Deserialize, Serialize};

use voltarget_core::math::RunningMoments;
use voltarget_core::types::{NumericalError, NumericalStage, SimulationConfig, TradeSpec};

/// Premium scale of the per-100 convention.
pub const PER_100: f64 = 100.0;

/// Monte Carlo premium estimate.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::math::RunningMoments;
/// use voltarget_core::types::{Maturity, SimulationConfig, TradeSpec};
/// use voltarget_pricing::mc::PricingAggregator;
///
/// let trade = TradeSpec::builder()
///     .constituent("AAA", 1.0)
///     .strike(100.0)
///     .maturity(Maturity::Years(1.0))
///     .build()
///     .unwrap();
/// let config = SimulationConfig::builder().paths(4).build().unwrap();
///
/// let mut moments = RunningMoments::new();
/// for x in [2.0, 4.0, 6.0, 8.0] {
///     moments.push(x);
/// }
/// let result = PricingAggregator::new(&trade, &config).finalise(&moments, false).unwrap();
///
/// assert!((result.premium_rate - 0.05).abs() < 1e-15);
/// assert!((result.premium_per_100 - 5.0).abs() < 1e-12);
/// assert!(!result.partial);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Premium as a fraction of notional.
    pub premium_rate: f64,
    /// Premium per 100 notional.
    pub premium_per_100: f64,
    /// Premium in reporting units: `premium_rate × notional_scale`.
    pub premium_amount: f64,
    /// Standard error of `premium_rate`.
    pub stderr_rate: f64,
    /// Standard error per 100 notional.
    pub stderr_per_100: f64,
    /// Configured path count.
    pub paths_requested: usize,
    /// Paths actually simulated.
    pub paths_used: usize,
    /// Whether the run stopped before all paths completed.
    pub partial: bool,
    /// Configuration echo.
    pub config: SimulationConfig,
}

impl PricingResult {
    /// 95% confidence half-width of `premium_rate`.
    #[inline]
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.stderr_rate
    }

    /// 99% confidence half-width of `premium_rate`.
    #[inline]
    pub fn confidence_99(&self) -> f64 {
        2.576 * self.stderr_rate
    }

    #[cfg(test)]
    pub(crate) fn for_tests(premium_rate: f64, stderr_rate: f64, paths: usize) -> Self {
        Self {
            premium_rate,
            premium_per_100: premium_rate * PER_100,
            premium_amount: premium_rate,
            stderr_rate,
            stderr_per_100: stderr_rate * PER_100,
            paths_requested: paths,
            paths_used: paths,
            partial: false,
            config: SimulationConfig::default(),
        }
    }
}

/// Turns payoff moments into a [`PricingResult`].
#[derive(Clone, Debug)]
pub struct PricingAggregator {
    notional: f64,
    notional_scale: f64,
    config: SimulationConfig,
}

impl PricingAggregator {
    /// Creates the aggregator for a trade and run configuration.
    pub fn new(trade: &TradeSpec, config: &SimulationConfig) -> Self {
        Self {
            notional: trade.notional,
            notional_scale: config.notional_scale,
            config: config.clone(),
        }
    }

    /// Finalises the estimate.
    ///
    /// A run that stopped early (`cancelled`) or simulated fewer paths than
    /// configured is marked `partial`. With zero paths the premium is
    /// reported as zero.
    ///
    /// # Errors
    ///
    /// Returns a [`NumericalError`] at stage `Aggregation` if the mean or
    /// standard error is non-finite.
    pub fn finalise(
        &self,
        moments: &RunningMoments,
        cancelled: bool,
    ) -> Result<PricingResult, NumericalError> {
        let paths_used = moments.count() as usize;
        let premium_rate = moments.mean() / self.notional;
        let stderr_rate = moments.std_error() / self.notional;

        for value in [premium_rate, stderr_rate] {
            if !value.is_finite() {
                return Err(NumericalError::new(
                    NumericalStage::Aggregation,
                    paths_used,
                    None,
                    value,
                ));
            }
        }

        Ok(PricingResult {
            premium_rate,
            premium_per_100: premium_rate * PER_100,
            premium_amount: premium_rate * self.notional_scale,
            stderr_rate,
            stderr_per_100: stderr_rate * PER_100,
            paths_requested: self.config.paths,
            paths_used,
            partial: cancelled || paths_used < self.config.paths,
            config: self.config.clone(),
        })
    }
}
