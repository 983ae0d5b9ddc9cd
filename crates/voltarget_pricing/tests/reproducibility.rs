//! Reproducibility across runs and worker counts.

use approx::assert_relative_eq;
use voltarget_core::types::{
    BumpScheme, GreeksSettings, MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec,
};
use voltarget_pricing::{PricingEngine, RiskFactorId};

fn trade() -> TradeSpec {
    TradeSpec::builder()
        .constituent("AAA", 0.4)
        .constituent("BBB", 0.35)
        .constituent("CCC", 0.25)
        .strike(100.0)
        .maturity(Maturity::TradingDays(63))
        .build()
        .unwrap()
}

fn market() -> MarketSpec {
    MarketSpec::builder()
        .quote("AAA", NameQuote::new(100.0, 0.2))
        .quote("BBB", NameQuote::new(45.0, 0.3))
        .quote("CCC", NameQuote::new(210.0, 0.15).with_dividend_yield(0.02))
        .correlation(0.5)
        .rate(0.03)
        .build()
        .unwrap()
}

fn config(workers: Option<usize>, greeks: GreeksSettings) -> SimulationConfig {
    let mut config = SimulationConfig::builder()
        .paths(3_000)
        .seed(2024)
        .lookback_bd(20)
        .greeks(greeks)
        .build()
        .unwrap();
    config.workers = workers;
    config
}

#[test]
fn test_two_runs_are_identical() {
    let engine = PricingEngine::new();
    let c = config(None, GreeksSettings::disabled());
    let a = engine.price(&trade(), &market(), &c).unwrap();
    let b = engine.price(&trade(), &market(), &c).unwrap();
    assert_eq!(a.result, b.result);
    assert_eq!(a.diagnostics, b.diagnostics);
    assert_eq!(a.manifest.fingerprint, b.manifest.fingerprint);
}

#[test]
fn test_worker_count_does_not_change_result() {
    let engine = PricingEngine::new();
    let single = engine
        .price(&trade(), &market(), &config(Some(1), GreeksSettings::disabled()))
        .unwrap();
    for workers in [2, 4, 7] {
        let parallel = engine
            .price(&trade(), &market(), &config(Some(workers), GreeksSettings::disabled()))
            .unwrap();
        assert_relative_eq!(
            single.result.premium_rate,
            parallel.result.premium_rate,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            single.result.stderr_rate,
            parallel.result.stderr_rate,
            max_relative = 1e-12
        );
        assert_eq!(single.diagnostics.convergence, parallel.diagnostics.convergence);
    }
}

#[test]
fn test_greeks_reproduce_across_worker_counts() {
    let greeks = GreeksSettings {
        scheme: BumpScheme::Central,
        ..GreeksSettings::default()
    };
    let engine = PricingEngine::new();
    let one = engine
        .price(&trade(), &market(), &config(Some(1), greeks.clone()))
        .unwrap()
        .greeks
        .unwrap();
    let four = engine
        .price(&trade(), &market(), &config(Some(4), greeks))
        .unwrap()
        .greeks
        .unwrap();
    assert_eq!(one.len(), four.len());
    for factor in [RiskFactorId::spot("BBB"), RiskFactorId::vol("CCC"), RiskFactorId::Rate] {
        assert_relative_eq!(
            one.sensitivity(&factor).unwrap(),
            four.sensitivity(&factor).unwrap(),
            max_relative = 1e-9
        );
    }
}

#[test]
fn test_seed_changes_result() {
    let engine = PricingEngine::new();
    let base = config(None, GreeksSettings::disabled());
    let mut other = base.clone();
    other.seed += 1;
    let a = engine.price(&trade(), &market(), &base).unwrap();
    let b = engine.price(&trade(), &market(), &other).unwrap();
    assert_ne!(a.result.premium_rate, b.result.premium_rate);
    assert_ne!(a.manifest.fingerprint, b.manifest.fingerprint);
}

#[test]
fn test_manifest_verifies_after_round_trip() {
    let output = PricingEngine::new()
        .price(&trade(), &market(), &config(None, GreeksSettings::disabled()))
        .unwrap();
    let json = serde_json::to_string(&output.manifest).unwrap();
    let restored: voltarget_core::RunManifest = serde_json::from_str(&json).unwrap();
    assert!(restored.verify());
    assert_eq!(restored.trade, trade());
}
