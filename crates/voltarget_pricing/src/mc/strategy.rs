//! Vol-target strategy index construction.
//!
//! Per path, per trading day `t`:
//!
//! 1. basket simple return `r_t` and log return `ln(1 + r_t)`
//! 2. realised vol `σ̂_t` over the trailing `lookback_bd` log returns
//!    (day `t` included), annualised with √252
//! 3. desired leverage `L*_t = target_vol / σ̂_t`, or `L_{t−1}` while the
//!    window is filling or when `σ̂_t` is zero
//! 4. `L_t = L_{t−1} + clamp(L*_t − L_{t−1}, ±step_cap)`, then the
//!    optional leverage cap
//! 5. strategy return `L_t·r_t − (L_t − 1)·r·dt`
//! 6. `I_t = max(I_{t−1}·(1 + strategy return), 0)`; an index that reaches
//!    zero stays there
//!
//! The day loop is a fold carrying a [`LeverageState`].

use serde::{Deserialize, Serialize};

use voltarget_core::math::RingWindow;
use voltarget_core::types::{
    BasketWeighting, Horizon, NameQuote, NumericalError, NumericalStage, SimulationConfig,
    TradeSpec, TRADING_DAYS_PER_YEAR,
};

use super::paths::PathBundle;

/// Realised vols below this are treated as zero.
pub const ZERO_VOL_THRESHOLD: f64 = 1e-12;

/// Initial (day 0) leverage.
pub const INITIAL_LEVERAGE: f64 = 1.0;

/// Leverage-control parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeverageRule {
    /// Target annualised vol.
    pub target_vol: f64,
    /// Maximum daily leverage change.
    pub step_cap: f64,
    /// Optional leverage ceiling.
    pub max_leverage: Option<f64>,
    /// Realised-vol window length.
    pub lookback_bd: usize,
}

impl LeverageRule {
    /// Extracts the rule from a simulation config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            target_vol: config.target_vol,
            step_cap: config.step_cap,
            max_leverage: config.max_leverage,
            lookback_bd: config.lookback_bd,
        }
    }
}

/// Outcome of one [`LeverageState::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeverageStep {
    /// Applied leverage for the day.
    pub leverage: f64,
    /// Annualised realised vol, when the window is full.
    pub realized_vol: Option<f64>,
}

/// Loop state of the leverage recursion: previous leverage plus the
/// trailing window of basket log returns.
///
/// # Examples
///
/// ```rust
/// use voltarget_pricing::mc::{LeverageRule, LeverageState};
///
/// let rule = LeverageRule { target_vol: 0.1, step_cap: 0.2, max_leverage: None, lookback_bd: 2 };
/// let mut state = LeverageState::new(rule);
///
/// // Warm-up: window not full, leverage holds at 1.
/// assert_eq!(state.step(0.01).leverage, 1.0);
///
/// // Window full: realised vol is large, leverage falls by at most the cap.
/// let step = state.step(-0.03);
/// assert!(step.realized_vol.is_some());
/// assert!((step.leverage - 0.8).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct LeverageState {
    rule: LeverageRule,
    leverage: f64,
    window: RingWindow,
}

impl LeverageState {
    /// Fresh state at [`INITIAL_LEVERAGE`] with an empty window.
    pub fn new(rule: LeverageRule) -> Self {
        Self {
            rule,
            leverage: INITIAL_LEVERAGE,
            window: RingWindow::new(rule.lookback_bd),
        }
    }

    /// Resets to day 0, keeping the window allocation.
    pub fn reset(&mut self) {
        self.leverage = INITIAL_LEVERAGE;
        self.window.reset();
    }

    /// Leverage applied on the last stepped day.
    #[inline]
    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Advances one day given the day's basket log return.
    pub fn step(&mut self, log_return: f64) -> LeverageStep {
        self.window.push(log_return);

        let realized_vol = if self.window.is_full() {
            self.window
                .sample_std()
                .map(|s| s * TRADING_DAYS_PER_YEAR.sqrt())
        } else {
            None
        };

        let prev = self.leverage;
        let desired = match realized_vol {
            Some(vol) if vol >= ZERO_VOL_THRESHOLD => self.rule.target_vol / vol,
            _ => prev,
        };

        let cap = self.rule.step_cap;
        let mut leverage = prev + (desired - prev).clamp(-cap, cap);
        if let Some(ceiling) = self.rule.max_leverage {
            if leverage > ceiling {
                leverage = ceiling.max(prev - cap);
            }
        }

        self.leverage = leverage;
        LeverageStep {
            leverage,
            realized_vol,
        }
    }
}

/// Strategy index path with its diagnostic trajectories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyPath {
    /// Index levels, `days + 1` entries starting at the base level.
    pub levels: Vec<f64>,
    /// Applied leverage per day (`days` entries).
    pub leverage: Vec<f64>,
    /// Annualised realised vol per day, `None` during warm-up.
    pub realized_vol: Vec<Option<f64>>,
}

impl StrategyPath {
    /// Level at inception.
    #[inline]
    pub fn base_level(&self) -> f64 {
        self.levels[0]
    }

    /// Level at maturity.
    #[inline]
    pub fn terminal_level(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// `I_T / I_0`.
    #[inline]
    pub fn terminal_ratio(&self) -> f64 {
        self.terminal_level() / self.base_level()
    }
}

#[derive(Clone, Debug)]
enum BasketState {
    FixedUnits {
        units: Vec<f64>,
        spots: Vec<f64>,
    },
    ConstantWeights {
        weights: Vec<f64>,
    },
}

impl BasketState {
    /// Simple basket return of one day.
    fn simple_return(&self, day: &[f64], levels: &mut [f64]) -> f64 {
        match self {
            BasketState::FixedUnits { units, .. } => {
                let before: f64 = units.iter().zip(levels.iter()).map(|(u, s)| u * s).sum();
                for (s, x) in levels.iter_mut().zip(day) {
                    *s *= x.exp();
                }
                let after: f64 = units.iter().zip(levels.iter()).map(|(u, s)| u * s).sum();
                after / before - 1.0
            }
            BasketState::ConstantWeights { weights } => weights
                .iter()
                .zip(day)
                .map(|(w, x)| w * x.exp_m1())
                .sum(),
        }
    }

    fn initial_levels(&self) -> Vec<f64> {
        match self {
            BasketState::FixedUnits { spots, .. } => spots.clone(),
            BasketState::ConstantWeights { weights } => vec![1.0; weights.len()],
        }
    }
}

/// Turns per-path increments into strategy index paths.
#[derive(Clone, Debug)]
pub struct StrategyIndexEngine {
    basket: BasketState,
    rule: LeverageRule,
    financing_per_day: f64,
    base_level: f64,
    days: usize,
}

impl StrategyIndexEngine {
    /// Creates an engine for a trade, its aligned quotes and the flat rate.
    pub fn new(
        trade: &TradeSpec,
        quotes: &[NameQuote],
        rate: f64,
        horizon: Horizon,
        rule: LeverageRule,
    ) -> Self {
        let weights = trade.weights();
        let basket = match trade.weighting {
            BasketWeighting::FixedUnits => BasketState::FixedUnits {
                units: weights,
                spots: quotes.iter().map(|q| q.spot).collect(),
            },
            BasketWeighting::ConstantWeights => BasketState::ConstantWeights { weights },
        };
        Self {
            basket,
            rule,
            financing_per_day: rate * horizon.dt,
            base_level: trade.base_level,
            days: horizon.days,
        }
    }

    /// Leverage rule in force.
    #[inline]
    pub fn rule(&self) -> LeverageRule {
        self.rule
    }

    /// Builds the strategy path of one simulated path.
    ///
    /// `increments` is the path's `days × n_names` log-return slice.
    ///
    /// # Errors
    ///
    /// Returns a [`NumericalError`] at stage `IndexConstruction` if a
    /// basket return, leverage or index level becomes non-finite.
    pub fn build_path(
        &self,
        path_index: usize,
        increments: &[f64],
    ) -> Result<StrategyPath, NumericalError> {
        let mut state = LeverageState::new(self.rule);
        self.build_path_with(path_index, increments, &mut state)
    }

    /// As [`build_path`](Self::build_path), reusing a caller-owned state.
    pub fn build_path_with(
        &self,
        path_index: usize,
        increments: &[f64],
        state: &mut LeverageState,
    ) -> Result<StrategyPath, NumericalError> {
        state.reset();
        let n = self.n_names();
        let mut name_levels = self.basket.initial_levels();

        let mut levels = Vec::with_capacity(self.days + 1);
        let mut leverage = Vec::with_capacity(self.days);
        let mut realized_vol = Vec::with_capacity(self.days);
        let mut level = self.base_level;
        levels.push(level);

        let fail = |day: usize, value: f64| {
            NumericalError::new(NumericalStage::IndexConstruction, path_index, Some(day), value)
        };

        for (t, day) in increments.chunks_exact(n).enumerate() {
            let r = self.basket.simple_return(day, &mut name_levels);
            let log_r = r.ln_1p();
            if !log_r.is_finite() {
                return Err(fail(t + 1, log_r));
            }

            let step = state.step(log_r);
            let strategy_return =
                step.leverage * r - (step.leverage - 1.0) * self.financing_per_day;
            if level > 0.0 {
                level = (level * (1.0 + strategy_return)).max(0.0);
            }
            if !level.is_finite() {
                return Err(fail(t + 1, level));
            }

            levels.push(level);
            leverage.push(step.leverage);
            realized_vol.push(step.realized_vol);
        }

        Ok(StrategyPath {
            levels,
            leverage,
            realized_vol,
        })
    }

    /// Builds every path of a bundle, in bundle order.
    pub fn build(&self, bundle: &PathBundle) -> Result<Vec<StrategyPath>, NumericalError> {
        let mut state = LeverageState::new(self.rule);
        bundle
            .iter()
            .map(|(p, incs)| self.build_path_with(p, incs, &mut state))
            .collect()
    }

    fn n_names(&self) -> usize {
        match &self.basket {
            BasketState::FixedUnits { units, .. } => units.len(),
            BasketState::ConstantWeights { weights } => weights.len(),
        }
    }
}
