//! End-to-end pricing scenarios.
//!
//! # Test Coverage
//!
//! - Two-name reference scenario with Greeks
//! - Single-name cross-check against a direct leverage recursion
//! - Leverage cap and basket weighting conventions
//! - Tabular outputs and JSON serialisation

use approx::assert_relative_eq;
use voltarget_core::types::{
    BasketWeighting, GreeksSettings, MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec,
    TRADING_DAYS_PER_YEAR,
};
use voltarget_pricing::mc::PathGenerator;
use voltarget_pricing::{BumpDirection, PricingEngine, RiskFactorId};

/// Two names, equal vols, high correlation, 10% target.
fn reference_scenario() -> (TradeSpec, MarketSpec, SimulationConfig) {
    let trade = TradeSpec::builder()
        .constituent("AAA", 0.5)
        .constituent("BBB", 0.5)
        .strike(100.0)
        .notional(100.0)
        .maturity(Maturity::Years(1.0))
        .min_basket_size(2)
        .build()
        .unwrap();
    let market = MarketSpec::builder()
        .quote("AAA", NameQuote::new(100.0, 0.2))
        .quote("BBB", NameQuote::new(100.0, 0.2))
        .correlation(0.8)
        .rate(0.0366)
        .build()
        .unwrap();
    let config = SimulationConfig::builder()
        .paths(10_000)
        .seed(42)
        .lookback_bd(40)
        .target_vol(0.1)
        .step_cap(0.2)
        .build()
        .unwrap();
    (trade, market, config)
}

#[test]
fn e2e_reference_scenario() {
    let (trade, market, config) = reference_scenario();
    let output = PricingEngine::new().price(&trade, &market, &config).unwrap();
    let result = &output.result;

    assert!(result.premium_rate.is_finite());
    assert!(result.premium_rate >= 0.0);
    assert!(!result.partial);
    assert_eq!(result.paths_used, 10_000);

    let max_ratio = output.diagnostics.terminal_ratio.as_ref().unwrap().max;
    assert!(result.premium_rate < max_ratio, "premium must be below the best path");
    assert_relative_eq!(result.premium_per_100, result.premium_rate * 100.0, max_relative = 1e-12);

    // Basket vol is about 19%, so the strategy deleverages towards 0.5.
    let mean_leverage = output.diagnostics.path_mean_leverage.as_ref().unwrap().mean;
    assert!(mean_leverage < 1.0 && mean_leverage > 0.4, "mean leverage {}", mean_leverage);
    let mean_vol = output.diagnostics.mean_realized_vol.unwrap();
    assert!((0.14..0.24).contains(&mean_vol), "mean realised vol {}", mean_vol);

    let greeks = output.greeks.unwrap();
    assert_eq!(greeks.len(), 6);
    assert!(greeks.sensitivity(&RiskFactorId::Rate).unwrap().is_finite());
    assert!(greeks.sensitivity(&RiskFactorId::ParallelVol).unwrap().is_finite());
}

#[test]
fn e2e_single_name_matches_direct_recursion() {
    let trade = TradeSpec::builder()
        .constituent("AAA", 1.0)
        .strike(98.0)
        .maturity(Maturity::TradingDays(30))
        .build()
        .unwrap();
    let quote = NameQuote::new(100.0, 0.3);
    let market = MarketSpec::builder()
        .quote("AAA", quote)
        .rate(0.04)
        .build()
        .unwrap();
    let config = SimulationConfig::builder()
        .paths(400)
        .seed(5)
        .lookback_bd(5)
        .target_vol(0.15)
        .step_cap(0.1)
        .greeks(GreeksSettings::disabled())
        .build()
        .unwrap();
    let output = PricingEngine::new().price(&trade, &market, &config).unwrap();

    let horizon = trade.horizon().unwrap();
    let generator =
        PathGenerator::new(&[quote], market.correlation, market.rate, horizon, config.seed)
            .unwrap();
    let bundle = generator.generate(0..config.paths).unwrap();

    let mut total = 0.0;
    for (_, increments) in bundle.iter() {
        let mut level = 100.0;
        let mut leverage: f64 = 1.0;
        let mut history: Vec<f64> = Vec::new();
        for &x in increments {
            let r = x.exp_m1();
            history.push(r.ln_1p());
            if history.len() >= config.lookback_bd {
                let window = &history[history.len() - config.lookback_bd..];
                let n = window.len() as f64;
                let mean = window.iter().sum::<f64>() / n;
                let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                let vol = var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
                if vol >= 1e-12 {
                    let desired = config.target_vol / vol;
                    leverage += (desired - leverage).clamp(-config.step_cap, config.step_cap);
                }
            }
            let growth = 1.0 + leverage * r - (leverage - 1.0) * market.rate * horizon.dt;
            level = (level * growth).max(0.0);
        }
        let payoff = (trade.notional * level / 100.0 - trade.strike).max(0.0);
        total += payoff * (-market.rate * horizon.years).exp();
    }
    let expected = total / config.paths as f64 / trade.notional;

    assert_relative_eq!(output.result.premium_rate, expected, max_relative = 1e-9);
}

#[test]
fn e2e_leverage_cap_limits_exposure() {
    let (trade, mut market, mut config) = reference_scenario();
    // Low vols push the desired leverage well above one.
    for quote in market.quotes.values_mut() {
        quote.vol = 0.04;
    }
    config.paths = 1_000;
    config.greeks = GreeksSettings::disabled();

    let uncapped = PricingEngine::new().price(&trade, &market, &config).unwrap();
    config.max_leverage = Some(1.0);
    let capped = PricingEngine::new().price(&trade, &market, &config).unwrap();

    assert!(uncapped.diagnostics.max_leverage.unwrap() > 1.5);
    assert!(capped.diagnostics.max_leverage.unwrap() <= 1.0 + 1e-12);
    assert!(capped.result.premium_rate < uncapped.result.premium_rate);
}

#[test]
fn e2e_weighting_conventions_price_close() {
    let (trade, market, mut config) = reference_scenario();
    config.paths = 500;
    config.greeks = GreeksSettings::disabled();
    let mut constant = trade.clone();
    constant.weighting = BasketWeighting::ConstantWeights;

    let a = PricingEngine::new().price(&trade, &market, &config).unwrap();
    let b = PricingEngine::new().price(&constant, &market, &config).unwrap();

    // Baskets drift apart without rebalancing, but only slightly over one year.
    assert!(b.result.premium_rate.is_finite());
    assert!((a.result.premium_rate - b.result.premium_rate).abs() < 0.2 * a.result.premium_rate);
    assert_ne!(a.manifest.fingerprint, b.manifest.fingerprint);
}

#[test]
fn e2e_tabular_outputs_serialise() {
    let (trade, market, mut config) = reference_scenario();
    config.paths = 300;
    let output = PricingEngine::new().price(&trade, &market, &config).unwrap();

    let rows = output.diagnostics.rows();
    assert!(rows.iter().any(|r| r.section == "terminal_ratio"));
    assert!(rows.iter().any(|r| r.section == "convergence"));

    let greeks = output.greeks.as_ref().unwrap();
    let labels: Vec<String> = greeks.rows().map(|r| r.factor.to_string()).collect();
    assert!(labels.contains(&"Vol:Parallel".to_string()));
    assert!(greeks.rows().all(|r| r.direction == BumpDirection::Up));

    let json = serde_json::to_value(&output).unwrap();
    assert!(json["result"]["premium_rate"].is_number());
    assert!(json["greeks"]["rows"].is_array());
    assert!(json["manifest"]["fingerprint"].is_string());
}
