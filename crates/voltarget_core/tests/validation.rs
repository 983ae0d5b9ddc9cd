//! Integration tests for input validation across trade, market and config.

use voltarget_core::math::flat_correlation_cholesky;
use voltarget_core::types::{
    BasketWeighting, ConfigError, MarketSpec, Maturity, NameQuote, RunManifest, SimulationConfig,
    TradeSpec,
};

// ============================================================================
// Fixtures
// ============================================================================

fn basket(n: usize) -> TradeSpec {
    let w = 1.0 / n as f64;
    let mut builder = TradeSpec::builder()
        .strike(100.0)
        .notional(100.0)
        .maturity(Maturity::Years(1.0));
    for i in 0..n {
        builder = builder.constituent(format!("N{:03}", i), w);
    }
    builder.build().unwrap()
}

fn market(n: usize, rho: f64) -> MarketSpec {
    let mut builder = MarketSpec::builder().correlation(rho).rate(0.0366);
    for i in 0..n {
        builder = builder.quote(format!("N{:03}", i), NameQuote::new(100.0, 0.2));
    }
    builder.build().unwrap()
}

// ============================================================================
// Trade / market consistency
// ============================================================================

#[test]
fn test_market_covers_trade() {
    let trade = basket(5);
    assert!(market(5, 0.3).validate_for(&trade).is_ok());
    assert_eq!(
        market(4, 0.3).validate_for(&trade),
        Err(ConfigError::MissingMarketData("N004".to_string()))
    );
}

#[test]
fn test_extra_quotes_are_ignored() {
    let trade = basket(2);
    let quotes = market(10, 0.0).aligned_quotes(&trade).unwrap();
    assert_eq!(quotes.len(), 2);
}

#[test]
fn test_negative_flat_correlation_feasibility_depends_on_size() {
    // -0.3 is feasible for 4 names (minimum -1/3) but not for 5 (minimum -1/4).
    let m4 = market(4, -0.3);
    assert!(flat_correlation_cholesky(basket(4).n_names(), m4.correlation).is_ok());

    let m5 = market(5, -0.3);
    assert!(matches!(
        flat_correlation_cholesky(basket(5).n_names(), m5.correlation),
        Err(ConfigError::CorrelationInfeasible { n_names: 5, .. })
    ));
}

// ============================================================================
// Deserialised inputs
// ============================================================================

#[test]
fn test_deserialised_trade_is_revalidated() {
    let json = r#"{
        "basket": [{"name": "AAA", "weight": 0.7}, {"name": "BBB", "weight": 0.7}],
        "strike": 100.0,
        "notional": 100.0,
        "maturity": {"years": 1.0}
    }"#;
    let trade: TradeSpec = serde_json::from_str(json).unwrap();
    assert!(matches!(
        trade.validate(),
        Err(ConfigError::WeightsDoNotSumToOne { .. })
    ));
}

#[test]
fn test_deserialised_constant_weights_trade() {
    let json = r#"{
        "basket": [{"name": "AAA", "weight": 1.0}],
        "strike": 95.0,
        "notional": 100.0,
        "maturity": {"dates": {"start": "2026-01-02", "end": "2026-07-02"}},
        "weighting": "constant_weights"
    }"#;
    let trade: TradeSpec = serde_json::from_str(json).unwrap();
    assert_eq!(trade.weighting, BasketWeighting::ConstantWeights);
    let h = trade.horizon().unwrap();
    assert_eq!(h.days, (181.0f64 / 365.0 * 252.0).round() as usize);
}

#[test]
fn test_deserialised_config_is_revalidated() {
    let config: SimulationConfig =
        serde_json::from_str(r#"{"paths": 100, "target_vol": -0.1}"#).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidParameter {
            name: "target_vol",
            ..
        })
    ));
}

// ============================================================================
// Manifest
// ============================================================================

#[test]
fn test_manifest_round_trips_through_json() {
    let trade = basket(3);
    let market = market(3, 0.5);
    let config = SimulationConfig::builder().paths(2_000).build().unwrap();

    let manifest = RunManifest::capture(&trade, &market, &config, "0.1.0");
    let json = serde_json::to_string(&manifest).unwrap();
    let back: RunManifest = serde_json::from_str(&json).unwrap();

    assert_eq!(back.fingerprint, manifest.fingerprint);
    assert!(back.verify());
}

#[test]
fn test_manifest_fingerprint_ignores_quote_insertion_order() {
    let trade = basket(2);
    let a = MarketSpec::builder()
        .quote("N000", NameQuote::new(100.0, 0.2))
        .quote("N001", NameQuote::new(50.0, 0.3))
        .build()
        .unwrap();
    let b = MarketSpec::builder()
        .quote("N001", NameQuote::new(50.0, 0.3))
        .quote("N000", NameQuote::new(100.0, 0.2))
        .build()
        .unwrap();
    let config = SimulationConfig::default();
    assert_eq!(
        RunManifest::capture(&trade, &a, &config, "x").fingerprint,
        RunManifest::capture(&trade, &b, &config, "y").fingerprint
    );
}
