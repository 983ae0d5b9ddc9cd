//! Error types for structured error handling.
//!
//! This module provides:
//! - `ConfigError`: invalid trade, market or simulation inputs, raised
//!   before any simulation work starts
//! - `NumericalError`: a non-finite value surfaced while simulating; the
//!   run is aborted and no partial result is produced

use std::fmt;
use thiserror::Error;

/// Invalid run inputs.
///
/// # Examples
/// ```
/// use voltarget_core::types::ConfigError;
///
/// let err = ConfigError::InvalidPathCount(0);
/// assert!(err.to_string().contains("Invalid path count 0"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Basket weights do not sum to one.
    #[error("Basket weights sum to {sum}, expected 1 (tolerance {tolerance:e})")]
    WeightsDoNotSumToOne {
        /// Observed sum of weights.
        sum: f64,
        /// Allowed absolute deviation.
        tolerance: f64,
    },

    /// Fewer constituents than the required minimum.
    #[error("Basket has {actual} names, at least {minimum} required")]
    BasketTooSmall {
        /// Number of constituents supplied.
        actual: usize,
        /// Required minimum.
        minimum: usize,
    },

    /// Same name listed twice in the basket.
    #[error("Duplicate basket name: {0}")]
    DuplicateName(String),

    /// Weight is negative or non-finite.
    #[error("Invalid weight {weight} for {name}")]
    InvalidWeight {
        /// Constituent name.
        name: String,
        /// Offending weight.
        weight: f64,
    },

    /// Weight exceeds the single-name concentration limit.
    #[error("Weight {weight} for {name} exceeds maximum single weight {limit}")]
    WeightAboveLimit {
        /// Constituent name.
        name: String,
        /// Offending weight.
        weight: f64,
        /// Configured limit.
        limit: f64,
    },

    /// A basket name has no market quote.
    #[error("Missing market data for {0}")]
    MissingMarketData(String),

    /// Spot or volatility is not representable.
    #[error("Invalid quote for {name}: spot={spot}, vol={vol}")]
    InvalidQuote {
        /// Name with the bad quote.
        name: String,
        /// Spot level.
        spot: f64,
        /// Annualised volatility.
        vol: f64,
    },

    /// Correlation outside [-1, 1] or non-finite.
    #[error("Correlation {0} outside [-1, 1]")]
    CorrelationOutOfRange(f64),

    /// Flat correlation too negative for the basket size.
    #[error("Flat correlation {rho} infeasible for {n_names} names (minimum {minimum})")]
    CorrelationInfeasible {
        /// Requested flat correlation.
        rho: f64,
        /// Basket size.
        n_names: usize,
        /// Smallest admissible correlation, -1/(n-1).
        minimum: f64,
    },

    /// Cholesky factorisation met a negative pivot.
    #[error("Correlation matrix not positive semi-definite: pivot {pivot} at row {row}")]
    NotPositiveSemiDefinite {
        /// Row where factorisation failed.
        row: usize,
        /// Negative pivot encountered.
        pivot: f64,
    },

    /// Path count outside [1, MAX_PATHS].
    #[error("Invalid path count {0}: must be in range [1, 10_000_000]")]
    InvalidPathCount(usize),

    /// Lookback window shorter than one day.
    #[error("Invalid lookback {0}: must be at least 1 trading day")]
    InvalidLookback(usize),

    /// Maturity shorter than one trading day.
    #[error("Horizon of {years} years yields {days} trading days, at least 1 required")]
    HorizonTooShort {
        /// Maturity in years.
        years: f64,
        /// Derived trading day count.
        days: usize,
    },

    /// Maturity longer than [`MAX_TRADING_DAYS`](super::trade::MAX_TRADING_DAYS).
    #[error("Horizon of {years} years exceeds the maximum of {maximum} trading days")]
    HorizonTooLong {
        /// Maturity in years.
        years: f64,
        /// Largest accepted trading day count.
        maximum: usize,
    },

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidParameter`].
    pub fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}

/// Pipeline stage where a non-finite value appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NumericalStage {
    /// Correlated log-return increments.
    PathGeneration,
    /// Leverage recursion and index compounding.
    IndexConstruction,
    /// Discounted option payoff.
    Payoff,
    /// Cross-path reduction.
    Aggregation,
}

impl fmt::Display for NumericalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PathGeneration => "path generation",
            Self::IndexConstruction => "index construction",
            Self::Payoff => "payoff",
            Self::Aggregation => "aggregation",
        };
        f.write_str(label)
    }
}

/// Non-finite value during simulation.
///
/// # Examples
/// ```
/// use voltarget_core::types::{NumericalError, NumericalStage};
///
/// let err = NumericalError::new(NumericalStage::Payoff, 12, None, f64::NAN);
/// assert!(err.to_string().contains("path 12"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Non-finite value {value} during {stage} at path {path}{}", day_suffix(.day))]
pub struct NumericalError {
    /// Stage that produced the value.
    pub stage: NumericalStage,
    /// Global path index.
    pub path: usize,
    /// Trading day, when applicable.
    pub day: Option<usize>,
    /// The offending value.
    pub value: f64,
}

fn day_suffix(day: &Option<usize>) -> String {
    match day {
        Some(d) => format!(", day {}", d),
        None => String::new(),
    }
}

impl NumericalError {
    /// Creates a new numerical error.
    pub fn new(stage: NumericalStage, path: usize, day: Option<usize>, value: f64) -> Self {
        Self {
            stage,
            path,
            day,
            value,
        }
    }
}
