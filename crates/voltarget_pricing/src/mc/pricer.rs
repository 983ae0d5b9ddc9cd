//! Parallel Monte Carlo driver.
//!
//! # Overview
//!
//! The [`MonteCarloPricer`] coordinates, for every path index:
//! 1. increments from the [`PathGenerator`]
//! 2. the strategy path from the [`StrategyIndexEngine`]
//! 3. the discounted payoff from the [`PayoffEngine`]
//!
//! # Determinism
//!
//! Paths are grouped into fixed blocks of [`BLOCK_SIZE`] contiguous
//! indices. Blocks run in parallel on rayon, but their accumulators are
//! collected and merged in block order, so the result does not depend on
//! the worker count or scheduling.
//!
//! # Cancellation
//!
//! The [`RunBudget`] is checked before every path. A stopped run returns
//! the paths completed so far with `cancelled` set.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::debug;

use voltarget_core::math::RunningMoments;
use voltarget_core::types::{ConfigError, MarketSpec, NumericalError, SimulationConfig, TradeSpec};

use super::cancel::RunBudget;
use super::paths::PathGenerator;
use super::payoff::PayoffEngine;
use super::strategy::{LeverageRule, LeverageState, StrategyIndexEngine};
use crate::diagnostics::DiagnosticsCollector;

/// Number of contiguous paths per work unit.
pub const BLOCK_SIZE: usize = 64;

/// Where and for how long a simulation may run.
#[derive(Clone, Copy, Debug)]
pub struct RunContext<'a> {
    /// Stop condition.
    pub budget: &'a RunBudget,
    /// Dedicated pool; `None` runs on the global rayon pool.
    pub pool: Option<&'a ThreadPool>,
}

/// Raw output of one simulation.
#[derive(Clone, Debug)]
pub struct SimulationOutcome {
    /// Moments of the discounted payoffs.
    pub moments: RunningMoments,
    /// Discounted payoffs in path order (only when diagnostics are collected).
    pub payoffs: Vec<f64>,
    /// Path diagnostics (only when requested).
    pub diagnostics: Option<DiagnosticsCollector>,
    /// Whether the run stopped early.
    pub cancelled: bool,
}

impl SimulationOutcome {
    /// Paths completed.
    #[inline]
    pub fn paths_used(&self) -> usize {
        self.moments.count() as usize
    }
}

struct BlockOutcome {
    moments: RunningMoments,
    payoffs: Vec<f64>,
    diagnostics: Option<DiagnosticsCollector>,
    cancelled: bool,
}

/// Monte Carlo pricer for one (trade, market, config) triple.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::types::{MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec};
/// use voltarget_pricing::mc::{CancellationToken, MonteCarloPricer, RunBudget, RunContext};
///
/// let trade = TradeSpec::builder()
///     .constituent("AAA", 1.0)
///     .strike(100.0)
///     .maturity(Maturity::TradingDays(20))
///     .build()
///     .unwrap();
/// let market = MarketSpec::builder()
///     .quote("AAA", NameQuote::new(100.0, 0.2))
///     .build()
///     .unwrap();
/// let config = SimulationConfig::builder().paths(500).lookback_bd(5).build().unwrap();
///
/// let pricer = MonteCarloPricer::new(&trade, &market, &config).unwrap();
/// let budget = RunBudget::unbounded(CancellationToken::new());
/// let outcome = pricer
///     .run(&RunContext { budget: &budget, pool: None }, false)
///     .unwrap();
///
/// assert_eq!(outcome.paths_used(), 500);
/// assert!(outcome.moments.mean() > 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct MonteCarloPricer {
    generator: PathGenerator,
    strategy: StrategyIndexEngine,
    payoff: PayoffEngine,
    paths: usize,
}

impl MonteCarloPricer {
    /// Builds the pipeline for validated inputs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing quote, an infeasible correlation
    /// or an invalid horizon.
    pub fn new(
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
    ) -> Result<Self, ConfigError> {
        let horizon = trade.horizon()?;
        let quotes = market.aligned_quotes(trade)?;
        let generator =
            PathGenerator::new(&quotes, market.correlation, market.rate, horizon, config.seed)?;
        let strategy = StrategyIndexEngine::new(
            trade,
            &quotes,
            market.rate,
            horizon,
            LeverageRule::from_config(config),
        );
        let payoff = PayoffEngine::new(trade, market.rate, horizon);

        Ok(Self {
            generator,
            strategy,
            payoff,
            paths: config.paths,
        })
    }

    /// Path generator in use.
    #[inline]
    pub fn generator(&self) -> &PathGenerator {
        &self.generator
    }

    /// Strategy engine in use.
    #[inline]
    pub fn strategy(&self) -> &StrategyIndexEngine {
        &self.strategy
    }

    /// Payoff in use.
    #[inline]
    pub fn payoff(&self) -> &PayoffEngine {
        &self.payoff
    }

    /// Simulates all configured paths.
    ///
    /// With `collect_diagnostics` the outcome also carries the ordered
    /// payoffs and a merged [`DiagnosticsCollector`].
    ///
    /// # Errors
    ///
    /// Returns the first [`NumericalError`] raised by any path; the run is
    /// aborted and no partial outcome is produced.
    pub fn run(
        &self,
        ctx: &RunContext<'_>,
        collect_diagnostics: bool,
    ) -> Result<SimulationOutcome, NumericalError> {
        let n_blocks = self.paths.div_ceil(BLOCK_SIZE);
        let budget = ctx.budget;

        let simulate = || {
            (0..n_blocks)
                .into_par_iter()
                .map(|block| self.run_block(block, budget, collect_diagnostics))
                .collect::<Result<Vec<_>, _>>()
        };
        let blocks = match ctx.pool {
            Some(pool) => pool.install(simulate),
            None => simulate(),
        }?;

        let mut outcome = SimulationOutcome {
            moments: RunningMoments::new(),
            payoffs: Vec::new(),
            diagnostics: collect_diagnostics
                .then(|| DiagnosticsCollector::new(self.generator.days())),
            cancelled: false,
        };
        if collect_diagnostics {
            outcome.payoffs.reserve(self.paths);
        }

        for block in blocks {
            outcome.moments.merge(&block.moments);
            outcome.payoffs.extend(block.payoffs);
            if let (Some(total), Some(part)) = (outcome.diagnostics.as_mut(), block.diagnostics) {
                total.merge(part);
            }
            outcome.cancelled |= block.cancelled;
        }

        debug!(
            blocks = n_blocks,
            paths = outcome.paths_used(),
            cancelled = outcome.cancelled,
            "simulation finished"
        );
        Ok(outcome)
    }

    fn run_block(
        &self,
        block: usize,
        budget: &RunBudget,
        collect_diagnostics: bool,
    ) -> Result<BlockOutcome, NumericalError> {
        let start = block * BLOCK_SIZE;
        let end = (start + BLOCK_SIZE).min(self.paths);

        let mut increments = vec![0.0; self.generator.path_len()];
        let mut normals = vec![0.0; self.generator.n_names()];
        let mut state = LeverageState::new(self.strategy.rule());

        let mut out = BlockOutcome {
            moments: RunningMoments::new(),
            payoffs: Vec::with_capacity(if collect_diagnostics { end - start } else { 0 }),
            diagnostics: collect_diagnostics
                .then(|| DiagnosticsCollector::new(self.generator.days())),
            cancelled: false,
        };

        for path in start..end {
            if budget.should_stop() {
                out.cancelled = true;
                break;
            }
            self.generator.fill_path(path, &mut increments, &mut normals)?;
            let strategy_path = self.strategy.build_path_with(path, &increments, &mut state)?;
            let value = self.payoff.evaluate(path, strategy_path.terminal_level())?;

            out.moments.push(value);
            if let Some(diagnostics) = out.diagnostics.as_mut() {
                diagnostics.observe(path, &strategy_path);
                out.payoffs.push(value);
            }
        }
        Ok(out)
    }
}
