//! Run request loading and override merging.
//!
//! A request is a TOML file with `[trade]`, `[market]` and an optional
//! `[config]` table. Values are resolved in priority order:
//!
//! 1. command-line flags
//! 2. environment variables (`VOLTARGET_PATHS`, `VOLTARGET_SEED`,
//!    `VOLTARGET_RHO`, `VOLTARGET_RATE`, `VOLTARGET_WORKERS`)
//! 3. the request file
//! 4. [`SimulationConfig::default`]
//!
//! Flags and environment variables are both read by clap, so [`Overrides`]
//! already holds the winner of (1) and (2).

use std::path::Path;

use clap::Args;
use serde::{Deserialize, Serialize};
use voltarget_core::types::{GreeksSettings, MarketSpec, SimulationConfig, TradeSpec};

use crate::error::{CliError, Result};

/// Inputs of one pricing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub trade: TradeSpec,
    pub market: MarketSpec,
    #[serde(default)]
    pub config: SimulationConfig,
}

impl RunRequest {
    /// Reads and parses a request file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates every part of the request.
    pub fn validate(&self) -> Result<()> {
        self.trade.validate()?;
        self.market.validate_for(&self.trade)?;
        self.config.validate()?;
        Ok(())
    }
}

/// Overrides taken from flags or their environment variables.
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    /// Number of Monte Carlo paths
    #[arg(short = 'n', long, env = "VOLTARGET_PATHS")]
    pub paths: Option<usize>,

    /// Seed of the random streams
    #[arg(short, long, env = "VOLTARGET_SEED")]
    pub seed: Option<u64>,

    /// Flat pairwise correlation
    #[arg(long, env = "VOLTARGET_RHO", allow_negative_numbers = true)]
    pub rho: Option<f64>,

    /// Flat discount / financing rate
    #[arg(long, env = "VOLTARGET_RATE", allow_negative_numbers = true)]
    pub rate: Option<f64>,

    /// Worker threads (default: global pool)
    #[arg(short, long, env = "VOLTARGET_WORKERS")]
    pub workers: Option<usize>,

    /// Wall-clock budget in milliseconds
    #[arg(long)]
    pub time_budget_ms: Option<u64>,

    /// Skip Greeks
    #[arg(long)]
    pub no_greeks: bool,
}

impl Overrides {
    /// Applies the set overrides on top of the request.
    pub fn apply(&self, request: &mut RunRequest) {
        if let Some(paths) = self.paths {
            request.config.paths = paths;
        }
        if let Some(seed) = self.seed {
            request.config.seed = seed;
        }
        if let Some(rho) = self.rho {
            request.market.correlation = rho;
        }
        if let Some(rate) = self.rate {
            request.market.rate = rate;
        }
        if self.workers.is_some() {
            request.config.workers = self.workers;
        }
        if self.time_budget_ms.is_some() {
            request.config.time_budget_ms = self.time_budget_ms;
        }
        if self.no_greeks {
            request.config.greeks = GreeksSettings::disabled();
        }
    }
}

/// Loads a request, applies overrides and validates the result.
pub fn resolve(path: &Path, overrides: &Overrides) -> Result<RunRequest> {
    let mut request = RunRequest::load(path)?;
    overrides.apply(&mut request);
    request.validate()?;
    Ok(request)
}
