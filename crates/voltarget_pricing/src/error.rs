//! Engine errors carrying the inputs of the failed run.
//!
//! Every error wraps the underlying [`ConfigError`] or [`NumericalError`]
//! together with a [`RunSnapshot`] of the trade, market, config and seed,
//! so a failure can be reproduced exactly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use voltarget_core::types::{ConfigError, MarketSpec, NumericalError, SimulationConfig, TradeSpec};

/// Inputs of the run that failed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Trade.
    pub trade: TradeSpec,
    /// Market (the bumped market when a Greek revaluation failed).
    pub market: MarketSpec,
    /// Simulation configuration.
    pub config: SimulationConfig,
    /// Seed of the run.
    pub seed: u64,
}

impl RunSnapshot {
    /// Captures the inputs.
    pub fn capture(trade: &TradeSpec, market: &MarketSpec, config: &SimulationConfig) -> Self {
        Self {
            trade: trade.clone(),
            market: market.clone(),
            config: config.clone(),
            seed: config.seed,
        }
    }
}

/// Pricing engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid inputs; no simulation work was done.
    #[error("Invalid configuration (seed {}): {}", .context.seed, .source)]
    Config {
        /// Underlying validation failure.
        #[source]
        source: ConfigError,
        /// Inputs of the run.
        context: Box<RunSnapshot>,
    },

    /// Non-finite value during simulation; the run was aborted.
    #[error("Numerical failure (seed {}): {}", .context.seed, .source)]
    Numerical {
        /// Underlying numerical failure.
        #[source]
        source: NumericalError,
        /// Inputs of the run.
        context: Box<RunSnapshot>,
    },
}

impl EngineError {
    /// Wraps a [`ConfigError`].
    pub fn config(
        source: ConfigError,
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
    ) -> Self {
        Self::Config {
            source,
            context: Box::new(RunSnapshot::capture(trade, market, config)),
        }
    }

    /// Wraps a [`NumericalError`].
    pub fn numerical(
        source: NumericalError,
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
    ) -> Self {
        Self::Numerical {
            source,
            context: Box::new(RunSnapshot::capture(trade, market, config)),
        }
    }

    /// Inputs of the failed run.
    pub fn snapshot(&self) -> &RunSnapshot {
        match self {
            Self::Config { context, .. } | Self::Numerical { context, .. } => context,
        }
    }

    /// Whether the inputs were rejected before simulating.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
