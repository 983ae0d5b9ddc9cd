//! Reproducibility manifest for a pricing run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::config::SimulationConfig;
use super::market::MarketSpec;
use super::trade::TradeSpec;

/// Snapshot of every input of a run plus a content fingerprint.
///
/// The fingerprint is the SHA-256 of the canonical JSON encoding of
/// `(trade, market, config)`; it excludes the creation timestamp and the
/// engine version so identical inputs always fingerprint identically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Trade snapshot.
    pub trade: TradeSpec,
    /// Market snapshot.
    pub market: MarketSpec,
    /// Simulation configuration snapshot.
    pub config: SimulationConfig,
    /// Hex-encoded SHA-256 of the inputs.
    pub fingerprint: String,
    /// Version of the engine that produced the run.
    pub engine_version: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl RunManifest {
    /// Captures a manifest for the given inputs.
    pub fn capture(
        trade: &TradeSpec,
        market: &MarketSpec,
        config: &SimulationConfig,
        engine_version: impl Into<String>,
    ) -> Self {
        Self {
            trade: trade.clone(),
            market: market.clone(),
            config: config.clone(),
            fingerprint: fingerprint(trade, market, config),
            engine_version: engine_version.into(),
            created_at: Utc::now(),
        }
    }

    /// Recomputes the fingerprint and compares it with the stored one.
    pub fn verify(&self) -> bool {
        fingerprint(&self.trade, &self.market, &self.config) == self.fingerprint
    }
}

/// SHA-256 fingerprint of the run inputs.
pub fn fingerprint(trade: &TradeSpec, market: &MarketSpec, config: &SimulationConfig) -> String {
    let mut hasher = Sha256::new();
    for part in [
        serde_json::to_vec(trade),
        serde_json::to_vec(market),
        serde_json::to_vec(config),
    ] {
        hasher.update(part.unwrap_or_default());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
