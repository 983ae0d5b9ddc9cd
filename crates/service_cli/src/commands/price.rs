//! Price command implementation
//!
//! Prices the requested trade with the voltarget_pricing engine and prints
//! the premium, Greeks and diagnostics to stdout.

use std::path::Path;

use tracing::info;
use voltarget_pricing::{PricingEngine, PricingOutput};

use super::OutputFormat;
use crate::config::{resolve, Overrides};
use crate::Result;

/// Run the price command
pub fn run(request: &Path, overrides: &Overrides, format: OutputFormat) -> Result<()> {
    let request = resolve(request, overrides)?;
    info!(
        names = request.trade.n_names(),
        paths = request.config.paths,
        seed = request.config.seed,
        "request resolved"
    );

    let output = PricingEngine::new().price(&request.trade, &request.market, &request.config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => print!("{}", render_table(&output)),
    }
    Ok(())
}

/// Plain-text report of one run.
pub fn render_table(output: &PricingOutput) -> String {
    let r = &output.result;
    let mut lines = vec![
        "Premium".to_string(),
        format!("  rate            {:>14.8}", r.premium_rate),
        format!("  per 100         {:>14.6}", r.premium_per_100),
        format!("  amount          {:>14.6}", r.premium_amount),
        format!("  stderr per 100  {:>14.6}", r.stderr_per_100),
        format!("  95% half-width  {:>14.6}", r.confidence_95() * 100.0),
        format!(
            "  paths           {:>14}{}",
            format!("{}/{}", r.paths_used, r.paths_requested),
            if r.partial { "  (partial)" } else { "" }
        ),
    ];

    if let Some(greeks) = &output.greeks {
        lines.push(format!("\nGreeks ({:?})", greeks.scheme()));
        lines.push(format!(
            "  {:<16} {:<8} {:>10} {:>14} {:>14}",
            "factor", "dir", "bump", "bumped", "sensitivity"
        ));
        lines.extend(greeks.rows().map(|row| {
            format!(
                "  {:<16} {:<8} {:>10.6} {:>14.8} {:>14.8}",
                row.factor.to_string(),
                row.direction.to_string(),
                row.bump,
                row.bumped,
                row.sensitivity
            )
        }));
    }

    lines.push("\nDiagnostics".to_string());
    lines.extend(
        output
            .diagnostics
            .rows()
            .into_iter()
            .map(|row| format!("  {:<20} {:<24} {:>14.6}", row.section, row.metric, row.value)),
    );
    if let Some(warning) = &output.diagnostics.convergence_warning {
        lines.push(format!("\nWarning: {}", warning));
    }

    lines.push(format!("\nFingerprint {}", output.manifest.fingerprint));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltarget_core::types::{MarketSpec, Maturity, NameQuote, SimulationConfig, TradeSpec};

    #[test]
    fn test_table_lists_premium_greeks_and_fingerprint() {
        let trade = TradeSpec::builder()
            .constituent("AAA", 1.0)
            .strike(100.0)
            .maturity(Maturity::TradingDays(20))
            .build()
            .unwrap();
        let market = MarketSpec::builder()
            .quote("AAA", NameQuote::new(100.0, 0.2))
            .build()
            .unwrap();
        let config = SimulationConfig::builder()
            .paths(200)
            .lookback_bd(5)
            .build()
            .unwrap();
        let output = PricingEngine::new().price(&trade, &market, &config).unwrap();

        let table = render_table(&output);
        assert!(table.contains("per 100"));
        assert!(table.contains("Spot:AAA"));
        assert!(table.contains("Vol:Parallel"));
        assert!(table.contains(&output.manifest.fingerprint));
        assert!(!table.contains("(partial)"));
        assert!(table.starts_with("Premium\n"));
        assert!(table.ends_with(&format!("Fingerprint {}\n", output.manifest.fingerprint)));
    }
}
