//! Check command implementation
//!
//! Validates a request and reports the resolved horizon and basket without
//! pricing it.

use std::path::Path;

use tracing::info;
use voltarget_core::math::flat_correlation_cholesky;

use crate::config::{resolve, Overrides, RunRequest};
use crate::Result;

/// Run the check command
pub fn run(request: &Path, overrides: &Overrides) -> Result<()> {
    let request = resolve(request, overrides)?;
    print!("{}", summary(&request)?);
    info!("request is valid");
    Ok(())
}

/// Human-readable summary of a validated request.
pub fn summary(request: &RunRequest) -> Result<String> {
    let horizon = request.trade.horizon()?;
    flat_correlation_cholesky(request.trade.n_names(), request.market.correlation)?;

    let mut lines = vec![
        format!(
            "Trade: {} names, strike {}, notional {}, {:?} weighting",
            request.trade.n_names(),
            request.trade.strike,
            request.trade.notional,
            request.trade.weighting
        ),
        format!(
            "Horizon: {:.4} years, {} trading days, dt {:.6}",
            horizon.years, horizon.days, horizon.dt
        ),
        format!(
            "Market: correlation {}, rate {}",
            request.market.correlation, request.market.rate
        ),
    ];
    for c in &request.trade.basket {
        if let Some(q) = request.market.quote(&c.name) {
            lines.push(format!(
                "  {:<12} weight {:>8.4}  spot {:>12.4}  vol {:>7.4}  div {:>7.4}",
                c.name, c.weight, q.spot, q.vol, q.dividend_yield
            ));
        }
    }
    let cfg = &request.config;
    lines.push(format!(
        "Simulation: {} paths, seed {}, lookback {}, target vol {}, step cap {}",
        cfg.paths, cfg.seed, cfg.lookback_bd, cfg.target_vol, cfg.step_cap
    ));
    if horizon.days < cfg.lookback_bd {
        lines.push(format!(
            "Note: lookback {} exceeds the horizon of {} days; leverage stays at 1",
            cfg.lookback_bd, horizon.days
        ));
    }
    lines.push("OK".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}
