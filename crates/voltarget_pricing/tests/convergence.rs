//! Standard error follows the square-root law in the path count.

use voltarget_core::types::{GreeksSettings, MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec};
use voltarget_pricing::PricingEngine;

const BASE_PATHS: usize = 1_500;

fn stderr_at(paths: usize) -> f64 {
    let trade = TradeSpec::builder()
        .constituent("AAA", 0.5)
        .constituent("BBB", 0.5)
        .strike(100.0)
        .maturity(Maturity::TradingDays(60))
        .build()
        .unwrap();
    let market = MarketSpec::builder()
        .quote("AAA", NameQuote::new(100.0, 0.25))
        .quote("BBB", NameQuote::new(100.0, 0.2))
        .correlation(0.6)
        .rate(0.02)
        .build()
        .unwrap();
    let config = SimulationConfig::builder()
        .paths(paths)
        .seed(99)
        .lookback_bd(20)
        .greeks(GreeksSettings::disabled())
        .build()
        .unwrap();
    PricingEngine::new()
        .price(&trade, &market, &config)
        .unwrap()
        .result
        .stderr_rate
}

#[test]
fn test_stderr_shrinks_with_square_root_of_paths() {
    let s1 = stderr_at(BASE_PATHS);
    let s4 = stderr_at(4 * BASE_PATHS);
    let s16 = stderr_at(16 * BASE_PATHS);
    assert!(s1 > 0.0 && s4 > 0.0 && s16 > 0.0);

    let r4 = s1 / s4;
    let r16 = s1 / s16;
    assert!((1.6..=2.5).contains(&r4), "N/4N stderr ratio {}", r4);
    assert!((3.2..=5.0).contains(&r16), "N/16N stderr ratio {}", r16);
}

#[test]
fn test_convergence_curve_tracks_final_estimate() {
    let trade = TradeSpec::builder()
        .constituent("AAA", 1.0)
        .strike(95.0)
        .maturity(Maturity::TradingDays(40))
        .build()
        .unwrap();
    let market = MarketSpec::builder()
        .quote("AAA", NameQuote::new(100.0, 0.3))
        .rate(0.01)
        .build()
        .unwrap();
    let config = SimulationConfig::builder()
        .paths(1_000)
        .lookback_bd(10)
        .greeks(GreeksSettings::disabled())
        .build()
        .unwrap();
    let output = PricingEngine::new().price(&trade, &market, &config).unwrap();

    let curve = &output.diagnostics.convergence;
    let counts: Vec<usize> = curve.iter().map(|p| p.paths).collect();
    assert_eq!(counts, vec![100, 200, 400, 800, 1_000]);

    let last = curve.last().unwrap();
    assert!((last.premium_rate - output.result.premium_rate).abs() < 1e-12);
    assert!((last.stderr_rate - output.result.stderr_rate).abs() < 1e-12);
}
