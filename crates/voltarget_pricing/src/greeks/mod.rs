//! Bump-and-revalue sensitivities.
//!
//! - [`RiskFactorId`]: per-name spot and vol, parallel vol, flat rate
//! - [`GreeksResult`]: rows keyed by `(factor, direction)`
//! - [`GreeksCalculator`]: reruns the pipeline on bumped markets with
//!   common random numbers

mod calculator;
mod result;

pub use calculator::GreeksCalculator;
pub use result::{BumpDirection, GreekRow, GreeksResult, RiskFactorId};
