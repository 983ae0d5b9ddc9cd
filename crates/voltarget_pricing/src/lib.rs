//! # Voltarget Pricing (Layer 2: Monte Carlo Kernel)
//!
//! Monte Carlo pricer for European calls on a vol-target strategy index.
//!
//! The kernel is a pipeline of pure, separately testable stages:
//!
//! - [`rng`]: per-path ChaCha streams keyed by `(seed, path_index)`
//! - [`mc::PathGenerator`]: correlated GBM log-return increments
//! - [`mc::StrategyIndexEngine`]: realised vol, capped leverage and the
//!   strategy index recursion
//! - [`mc::PayoffEngine`]: discounted call payoff on the index
//! - [`mc::MonteCarloPricer`] / [`mc::PricingAggregator`]: parallel,
//!   cancellable simulation and premium estimate
//! - [`greeks`]: bump-and-revalue sensitivities under common random numbers
//! - [`diagnostics`]: leverage, realised vol and convergence summaries
//!
//! [`PricingEngine::price`] wires them together and is the only call an
//! adapter needs.
//!
//! ## Determinism
//!
//! Every path draws from its own stream, and paths are reduced in fixed
//! blocks merged in block order. The same inputs and seed therefore give
//! the same result for any worker count.
//!
//! ## Usage Example
//!
//! ```rust
//! use voltarget_core::types::{MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec};
//! use voltarget_pricing::PricingEngine;
//!
//! let trade = TradeSpec::builder()
//!     .constituent("AAA", 1.0)
//!     .strike(100.0)
//!     .maturity(Maturity::TradingDays(40))
//!     .build()
//!     .unwrap();
//! let market = MarketSpec::builder()
//!     .quote("AAA", NameQuote::new(100.0, 0.25))
//!     .rate(0.01)
//!     .build()
//!     .unwrap();
//! let config = SimulationConfig::builder().paths(500).lookback_bd(10).build().unwrap();
//!
//! let output = PricingEngine::new().price(&trade, &market, &config).unwrap();
//! println!("premium per 100: {:.4}", output.result.premium_per_100);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod greeks;
pub mod mc;
pub mod rng;

pub use diagnostics::{DiagnosticRow, DiagnosticsRecord};
pub use engine::{PricingEngine, PricingOutput, ENGINE_VERSION};
pub use error::{EngineError, RunSnapshot};
pub use greeks::{BumpDirection, GreekRow, GreeksResult, RiskFactorId};
pub use mc::{CancellationToken, PricingResult};
