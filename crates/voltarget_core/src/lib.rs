//! # Voltarget Core (Layer 1: Foundation)
//!
//! Foundation layer for the vol-target strategy index option pricer.
//!
//! This crate owns the immutable inputs of a pricing run and the small
//! numerical toolkit the Monte Carlo kernel is built on:
//!
//! - [`types`]: [`TradeSpec`], [`MarketSpec`], [`SimulationConfig`],
//!   [`RunManifest`] and the structured error types
//! - [`math`]: flat-correlation Cholesky factorisation, mergeable running
//!   moments, percentiles and the trailing-return ring window
//!
//! All inputs are validated once at construction (or via an explicit
//! `validate` call after deserialisation) and are then passed by reference
//! through the pipeline.
//!
//! ## Usage Example
//!
//! ```rust
//! use voltarget_core::types::{MarketSpec, NameQuote, SimulationConfig, TradeSpec, Maturity};
//!
//! let trade = TradeSpec::builder()
//!     .constituent("AAA", 0.5)
//!     .constituent("BBB", 0.5)
//!     .strike(100.0)
//!     .notional(100.0)
//!     .maturity(Maturity::Years(1.0))
//!     .min_basket_size(2)
//!     .build()
//!     .unwrap();
//!
//! let market = MarketSpec::builder()
//!     .quote("AAA", NameQuote::new(100.0, 0.2))
//!     .quote("BBB", NameQuote::new(50.0, 0.2))
//!     .correlation(0.8)
//!     .rate(0.0366)
//!     .build()
//!     .unwrap();
//! market.validate_for(&trade).unwrap();
//!
//! let config = SimulationConfig::builder().paths(1_000).seed(7).build().unwrap();
//! assert_eq!(config.paths, 1_000);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod types;

pub use types::{
    BasketConstituent, BasketWeighting, BumpScheme, ConfigError, GreeksSettings, Horizon,
    MarketSpec, Maturity, NameQuote, NumericalError, NumericalStage, RunManifest,
    SimulationConfig, TradeSpec, MAX_TRADING_DAYS, TRADING_DAYS_PER_YEAR,
};
