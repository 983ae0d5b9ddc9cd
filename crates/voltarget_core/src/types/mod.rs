//! Core data model for a pricing run.
//!
//! This module provides:
//! - [`TradeSpec`]: basket definition and option terms
//! - [`MarketSpec`]: per-name quotes, flat correlation, flat rate
//! - [`SimulationConfig`]: Monte Carlo and vol-target parameters
//! - [`RunManifest`]: reproducibility snapshot with content fingerprint
//! - [`ConfigError`] / [`NumericalError`]: structured error types

pub mod config;
pub mod error;
pub mod manifest;
pub mod market;
pub mod trade;

pub use config::{
    BumpScheme, GreeksSettings, SimulationConfig, SimulationConfigBuilder, MAX_PATHS,
};
pub use error::{ConfigError, NumericalError, NumericalStage};
pub use manifest::RunManifest;
pub use market::{MarketSpec, MarketSpecBuilder, NameQuote};
pub use trade::{
    BasketConstituent, BasketWeighting, Horizon, Maturity, TradeSpec, TradeSpecBuilder,
    MAX_TRADING_DAYS, TRADING_DAYS_PER_YEAR,
};
