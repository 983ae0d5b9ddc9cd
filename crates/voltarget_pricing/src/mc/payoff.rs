//! Discounted European call payoff on the strategy index.

use voltarget_core::types::{Horizon, NumericalError, NumericalStage, TradeSpec};

/// Payoff `max(notional·I_T/I_0 − strike, 0)·exp(−r·T)`.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::types::{Maturity, TradeSpec};
/// use voltarget_pricing::mc::PayoffEngine;
///
/// let trade = TradeSpec::builder()
///     .constituent("AAA", 1.0)
///     .strike(100.0)
///     .maturity(Maturity::Years(1.0))
///     .build()
///     .unwrap();
/// let payoff = PayoffEngine::new(&trade, 0.0, trade.horizon().unwrap());
///
/// assert_eq!(payoff.discounted_payoff(110.0), 10.0);
/// assert_eq!(payoff.discounted_payoff(90.0), 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayoffEngine {
    notional: f64,
    strike: f64,
    base_level: f64,
    discount_factor: f64,
}

impl PayoffEngine {
    /// Creates the payoff for a trade discounted at the flat rate.
    pub fn new(trade: &TradeSpec, rate: f64, horizon: Horizon) -> Self {
        Self {
            notional: trade.notional,
            strike: trade.strike,
            base_level: trade.base_level,
            discount_factor: (-rate * horizon.years).exp(),
        }
    }

    /// Discount factor to maturity.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Discounted payoff for a terminal index level.
    #[inline]
    pub fn discounted_payoff(&self, terminal_level: f64) -> f64 {
        let intrinsic = self.notional * terminal_level / self.base_level - self.strike;
        intrinsic.max(0.0) * self.discount_factor
    }

    /// As [`discounted_payoff`](Self::discounted_payoff), rejecting
    /// non-finite results.
    #[inline]
    pub fn evaluate(&self, path: usize, terminal_level: f64) -> Result<f64, NumericalError> {
        let value = self.discounted_payoff(terminal_level);
        if value.is_finite() && terminal_level.is_finite() {
            Ok(value)
        } else {
            Err(NumericalError::new(NumericalStage::Payoff, path, None, value))
        }
    }
}
