//! Single entry point of the pricing kernel.
//!
//! [`PricingEngine::price`] validates the inputs, runs the Monte Carlo
//! simulation, aggregates the premium, collects diagnostics, revalues the
//! Greeks and captures the [`RunManifest`]. It holds no state between
//! calls; cancellation is scoped to the call that receives the token.

use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{info, warn};

use voltarget_core::types::{
    ConfigError, MarketSpec, NumericalError, RunManifest, SimulationConfig, TradeSpec,
};

use crate::diagnostics::{DiagnosticsCollector, DiagnosticsRecord};
use crate::error::EngineError;
use crate::greeks::{GreeksCalculator, GreeksResult};
use crate::mc::{
    CancellationToken, MonteCarloPricer, PricingAggregator, PricingResult, RunBudget, RunContext,
};

/// Version recorded in every manifest.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything one pricing run produces.
#[derive(Clone, Debug, Serialize)]
pub struct PricingOutput {
    /// Premium estimate.
    pub result: PricingResult,
    /// Greeks, absent when disabled, skipped on a partial run or cut short.
    pub greeks: Option<GreeksResult>,
    /// Path and convergence diagnostics.
    pub diagnostics: DiagnosticsRecord,
    /// Reproducibility snapshot.
    pub manifest: RunManifest,
}

/// Prices European calls on the vol-target strategy index.
///
/// # Examples
///
/// ```rust
/// use voltarget_core::types::{GreeksSettings, MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec};
/// use voltarget_pricing::PricingEngine;
///
/// let trade = TradeSpec::builder()
///     .constituent("AAA", 0.5)
///     .constituent("BBB", 0.5)
///     .strike(100.0)
///     .maturity(Maturity::TradingDays(60))
///     .build()
///     .unwrap();
/// let market = MarketSpec::builder()
///     .quote("AAA", NameQuote::new(100.0, 0.2))
///     .quote("BBB", NameQuote::new(100.0, 0.2))
///     .correlation(0.8)
///     .rate(0.0366)
///     .build()
///     .unwrap();
/// let config = SimulationConfig::builder()
///     .paths(1_000)
///     .lookback_bd(20)
///     .greeks(GreeksSettings::disabled())
///     .build()
///     .unwrap();
///
/// let output = PricingEngine::new().price(&trade, &market, &config).unwrap();
/// assert!(output.result.premium_rate >= 0.0);
/// assert!(output.greeks.is_none());
/// assert!(output.manifest.verify());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PricingEngine;

impl PricingEngine {
    /// Creates an engine.
    pub fn new() -> Self {
        Self
    }

    /// Prices one trade with no external cancellation.
    ///
    /// See [`price_cancellable`](Self::price_cancellable).
    pub fn price(
        &self,
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
    ) -> Result<PricingOutput, EngineError> {
        self.price_cancellable(trade, market, config, &CancellationToken::new())
    }

    /// Prices one trade, stopping early once `token` is cancelled.
    ///
    /// The time budget of `config` covers the base run and every Greek
    /// revaluation. A base run that stops early returns a `partial` result
    /// without Greeks.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Config`] if any input fails validation or the
    ///   worker pool cannot be built; no simulation work is done.
    /// - [`EngineError::Numerical`] if a non-finite value appears; the run
    ///   is aborted.
    pub fn price_cancellable(
        &self,
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
        token: &CancellationToken,
    ) -> Result<PricingOutput, EngineError> {
        let config_err = |e: ConfigError| EngineError::config(e, trade, market, config);
        let numerical_err = |e: NumericalError| EngineError::numerical(e, trade, market, config);

        trade.validate().map_err(config_err)?;
        market.validate_for(trade).map_err(config_err)?;
        config.validate().map_err(config_err)?;

        let pricer = MonteCarloPricer::new(trade, market, config).map_err(config_err)?;
        let pool = build_pool(config.workers).map_err(config_err)?;
        let budget = RunBudget::with_time_limit(token.clone(), config.time_budget_ms);
        let ctx = RunContext {
            budget: &budget,
            pool: pool.as_ref(),
        };

        let started = Instant::now();
        info!(
            paths = config.paths,
            days = pricer.generator().days(),
            names = trade.n_names(),
            seed = config.seed,
            "pricing started"
        );

        let outcome = pricer.run(&ctx, true).map_err(numerical_err)?;
        let result = PricingAggregator::new(trade, config)
            .finalise(&outcome.moments, outcome.cancelled)
            .map_err(numerical_err)?;

        if result.partial {
            warn!(
                paths_used = result.paths_used,
                paths_requested = result.paths_requested,
                "run stopped early, result is partial"
            );
        }

        let diagnostics = outcome
            .diagnostics
            .unwrap_or_else(|| DiagnosticsCollector::new(pricer.generator().days()))
            .finalise(
                &outcome.payoffs,
                trade.notional,
                &result,
                config.stderr_warning_fraction,
            );
        if let Some(message) = &diagnostics.convergence_warning {
            warn!(%message, "convergence warning");
        }

        let greeks = if !config.greeks.enabled {
            None
        } else if result.partial {
            warn!("greeks skipped: base run is partial");
            None
        } else {
            let greeks = GreeksCalculator::new(trade, market, config).compute(&result, &ctx)?;
            if greeks.is_none() {
                warn!("greeks skipped: run budget expired during revaluation");
            }
            greeks
        };

        info!(
            premium_rate = result.premium_rate,
            stderr_rate = result.stderr_rate,
            paths_used = result.paths_used,
            greeks = greeks.as_ref().map_or(0, GreeksResult::len),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pricing finished"
        );

        Ok(PricingOutput {
            result,
            greeks,
            diagnostics,
            manifest: RunManifest::capture(trade, market, config, ENGINE_VERSION),
        })
    }
}

fn build_pool(workers: Option<usize>) -> Result<Option<ThreadPool>, ConfigError> {
    let Some(n) = workers else {
        return Ok(None);
    };
    ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map(Some)
        .map_err(|e| ConfigError::invalid("workers", e.to_string()))
}
