//! Monte Carlo pipeline for the vol-target index call.
//!
//! This module provides:
//! - Correlated increments ([`PathGenerator`], [`PathBundle`])
//! - The leverage recursion and index paths ([`StrategyIndexEngine`],
//!   [`LeverageState`], [`StrategyPath`])
//! - The discounted payoff ([`PayoffEngine`])
//! - Premium reduction ([`PricingAggregator`], [`PricingResult`])
//! - Parallel, cancellable orchestration ([`MonteCarloPricer`],
//!   [`CancellationToken`], [`RunBudget`])
//!
//! Data flows strictly forward: generator → strategy → payoff → aggregator.

pub mod aggregator;
pub mod cancel;
pub mod paths;
pub mod payoff;
pub mod pricer;
pub mod strategy;

pub use aggregator::{PricingAggregator, PricingResult, PER_100};
pub use cancel::{CancellationToken, RunBudget};
pub use paths::{PathBundle, PathGenerator};
pub use payoff::PayoffEngine;
pub use pricer::{MonteCarloPricer, RunContext, SimulationOutcome, BLOCK_SIZE};
pub use strategy::{
    LeverageRule, LeverageState, LeverageStep, StrategyIndexEngine, StrategyPath,
    INITIAL_LEVERAGE, ZERO_VOL_THRESHOLD,
};
