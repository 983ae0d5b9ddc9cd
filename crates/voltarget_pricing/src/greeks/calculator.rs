//! Bump-and-revalue Greeks with common random numbers.
//!
//! Each bumped revaluation rebuilds the full pipeline on a bumped
//! [`MarketSpec`] with the same seed. Per-path streams are keyed by path
//! index, so every bumped run sees exactly the draws of the base run.
//!
//! A down bump that would push a volatility below zero is skipped; the
//! factor then reports only the up difference.

use tracing::debug;

use voltarget_core::types::{BumpScheme, MarketSpec, SimulationConfig, TradeSpec};

use super::result::{BumpDirection, GreekRow, GreeksResult, RiskFactorId};
use crate::error::EngineError;
use crate::mc::{MonteCarloPricer, PricingAggregator, PricingResult, RunContext};

/// Up and (optional) down market for one factor.
struct BumpPair {
    up: MarketSpec,
    down: Option<MarketSpec>,
    size: f64,
}

/// Computes [`GreeksResult`] for one run.
pub struct GreeksCalculator<'a> {
    trade: &'a TradeSpec,
    market: &'a MarketSpec,
    config: &'a SimulationConfig,
}

impl<'a> GreeksCalculator<'a> {
    /// Creates a calculator over validated inputs.
    pub fn new(trade: &'a TradeSpec, market: &'a MarketSpec, config: &'a SimulationConfig) -> Self {
        Self {
            trade,
            market,
            config,
        }
    }

    /// Factors in report order: spots, vols, parallel vol, rate.
    pub fn factors(&self) -> Vec<RiskFactorId> {
        let names: Vec<&str> = self.trade.names().collect();
        let mut factors: Vec<RiskFactorId> = names.iter().map(|n| RiskFactorId::spot(*n)).collect();
        factors.extend(names.iter().map(|n| RiskFactorId::vol(*n)));
        if self.config.greeks.parallel_vega {
            factors.push(RiskFactorId::ParallelVol);
        }
        factors.push(RiskFactorId::Rate);
        factors
    }

    /// Revalues every factor against the base result.
    ///
    /// Returns `Ok(None)` if the run budget expires during a revaluation;
    /// a partial set of Greeks is never reported.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a bumped market is rejected or a bumped
    /// run hits a non-finite value. The error snapshot holds the bumped
    /// market.
    pub fn compute(
        &self,
        base: &PricingResult,
        ctx: &RunContext<'_>,
    ) -> Result<Option<GreeksResult>, EngineError> {
        let settings = &self.config.greeks;
        let mut greeks = GreeksResult::new(settings.scheme);

        for factor in self.factors() {
            let pair = self.bump(&factor);

            let Some(up) = self.revalue(&pair.up, ctx)? else {
                return Ok(None);
            };
            let h = pair.size;
            greeks.insert(GreekRow {
                factor: factor.clone(),
                direction: BumpDirection::Up,
                bump: h,
                base: base.premium_rate,
                bumped: up,
                bumped_down: None,
                sensitivity: (up - base.premium_rate) / h,
            });

            let down_market = match (settings.scheme, &pair.down) {
                (BumpScheme::Central, Some(m)) => m,
                (BumpScheme::Central, None) => {
                    debug!(factor = %factor, "down bump unavailable, forward difference only");
                    continue;
                }
                (BumpScheme::Forward, _) => {
                    debug!(factor = %factor, bump = h, up, "greek revalued");
                    continue;
                }
            };

            let Some(down) = self.revalue(down_market, ctx)? else {
                return Ok(None);
            };
            greeks.insert(GreekRow {
                factor: factor.clone(),
                direction: BumpDirection::Down,
                bump: h,
                base: base.premium_rate,
                bumped: down,
                bumped_down: None,
                sensitivity: (base.premium_rate - down) / h,
            });
            greeks.insert(GreekRow {
                factor: factor.clone(),
                direction: BumpDirection::Central,
                bump: h,
                base: base.premium_rate,
                bumped: up,
                bumped_down: Some(down),
                sensitivity: (up - down) / (2.0 * h),
            });
            debug!(factor = %factor, bump = h, up, down, "greek revalued");
        }

        Ok(Some(greeks))
    }

    fn bump(&self, factor: &RiskFactorId) -> BumpPair {
        let s = &self.config.greeks;
        let m = self.market;
        match factor {
            RiskFactorId::Spot(name) => BumpPair {
                up: m.with_spot_scaled(name, 1.0 + s.spot_bump_rel),
                down: Some(m.with_spot_scaled(name, 1.0 - s.spot_bump_rel)),
                size: s.spot_bump_rel,
            },
            RiskFactorId::Vol(name) => {
                let h = s.vol_bump_abs;
                let room = m.quote(name).is_some_and(|q| q.vol >= h);
                BumpPair {
                    up: m.with_vol_shifted(name, h),
                    down: room.then(|| m.with_vol_shifted(name, -h)),
                    size: h,
                }
            }
            RiskFactorId::ParallelVol => {
                let h = s.vol_bump_abs;
                let room = self
                    .trade
                    .names()
                    .all(|name| m.quote(name).is_some_and(|q| q.vol >= h));
                BumpPair {
                    up: m.with_all_vols_shifted(h),
                    down: room.then(|| m.with_all_vols_shifted(-h)),
                    size: h,
                }
            }
            RiskFactorId::Rate => BumpPair {
                up: m.with_rate_shifted(s.rate_bump_abs),
                down: Some(m.with_rate_shifted(-s.rate_bump_abs)),
                size: s.rate_bump_abs,
            },
        }
    }

    /// Premium rate under `market`, `None` if the run was cut short.
    fn revalue(&self, market: &MarketSpec, ctx: &RunContext<'_>) -> Result<Option<f64>, EngineError> {
        let pricer = MonteCarloPricer::new(self.trade, market, self.config)
            .map_err(|e| EngineError::config(e, self.trade, market, self.config))?;
        let outcome = pricer
            .run(ctx, false)
            .map_err(|e| EngineError::numerical(e, self.trade, market, self.config))?;
        if outcome.cancelled {
            return Ok(None);
        }
        let result = PricingAggregator::new(self.trade, self.config)
            .finalise(&outcome.moments, outcome.cancelled)
            .map_err(|e| EngineError::numerical(e, self.trade, market, self.config))?;
        Ok(Some(result.premium_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::{CancellationToken, RunBudget};
    use voltarget_core::types::{GreeksSettings, Maturity, NameQuote};

    fn inputs(scheme: BumpScheme, vol_b: f64) -> (TradeSpec, MarketSpec, SimulationConfig) {
        let trade = TradeSpec::builder()
            .constituent("AAA", 0.5)
            .constituent("BBB", 0.5)
            .strike(100.0)
            .maturity(Maturity::TradingDays(40))
            .build()
            .unwrap();
        let market = MarketSpec::builder()
            .quote("AAA", NameQuote::new(100.0, 0.2))
            .quote("BBB", NameQuote::new(100.0, vol_b))
            .correlation(0.5)
            .rate(0.02)
            .build()
            .unwrap();
        let config = SimulationConfig::builder()
            .paths(2_000)
            .lookback_bd(10)
            .greeks(GreeksSettings {
                scheme,
                ..GreeksSettings::default()
            })
            .build()
            .unwrap();
        (trade, market, config)
    }

    fn compute(t: &TradeSpec, m: &MarketSpec, c: &SimulationConfig) -> Option<GreeksResult> {
        let budget = RunBudget::unbounded(CancellationToken::new());
        let ctx = RunContext {
            budget: &budget,
            pool: None,
        };
        let pricer = MonteCarloPricer::new(t, m, c).unwrap();
        let outcome = pricer.run(&ctx, false).unwrap();
        let base = PricingAggregator::new(t, c)
            .finalise(&outcome.moments, false)
            .unwrap();
        GreeksCalculator::new(t, m, c).compute(&base, &ctx).unwrap()
    }

    #[test]
    fn test_factor_order() {
        let (t, m, c) = inputs(BumpScheme::Forward, 0.2);
        let labels: Vec<String> = GreeksCalculator::new(&t, &m, &c)
            .factors()
            .iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(
            labels,
            vec!["Spot:AAA", "Spot:BBB", "Vol:AAA", "Vol:BBB", "Vol:Parallel", "Rate"]
        );
    }

    #[test]
    fn test_forward_greeks_one_row_per_factor() {
        let (t, m, c) = inputs(BumpScheme::Forward, 0.2);
        let greeks = compute(&t, &m, &c).unwrap();
        assert_eq!(greeks.len(), 6);
        assert!(greeks.rows().all(|r| r.direction == BumpDirection::Up));
        assert!(greeks.rows().all(|r| r.sensitivity.is_finite()));
        assert!(greeks.get(&RiskFactorId::Rate, BumpDirection::Central).is_none());
    }

    #[test]
    fn test_uniform_spot_scaling_cancels() {
        // The index is normalised to its base level, so scaling every spot
        // by the same factor leaves each path unchanged.
        let (t, m, c) = inputs(BumpScheme::Forward, 0.3);
        let greeks = compute(&t, &m, &c).unwrap();
        let both = m
            .with_spot_scaled("AAA", 1.01)
            .with_spot_scaled("BBB", 1.01);
        let budget = RunBudget::unbounded(CancellationToken::new());
        let ctx = RunContext {
            budget: &budget,
            pool: None,
        };
        let calc = GreeksCalculator::new(&t, &m, &c);
        let scaled = calc.revalue(&both, &ctx).unwrap().unwrap();
        let base = greeks.rows().next().unwrap().base;
        assert!((scaled - base).abs() < 1e-12);
    }

    #[test]
    fn test_central_rows_are_consistent() {
        let (t, m, c) = inputs(BumpScheme::Central, 0.2);
        let greeks = compute(&t, &m, &c).unwrap();
        assert_eq!(greeks.len(), 18);
        for row in greeks.rows().filter(|r| r.direction == BumpDirection::Central) {
            let up = greeks.get(&row.factor, BumpDirection::Up).unwrap();
            let down = greeks.get(&row.factor, BumpDirection::Down).unwrap();
            assert!((row.sensitivity - 0.5 * (up + down)).abs() < 1e-9);
            assert!(row.bumped_down.is_some());
        }
    }

    #[test]
    fn test_zero_vol_name_skips_down_bump() {
        let (t, m, c) = inputs(BumpScheme::Central, 0.0);
        let greeks = compute(&t, &m, &c).unwrap();
        let vol_b = RiskFactorId::vol("BBB");
        assert!(greeks.get(&vol_b, BumpDirection::Up).is_some());
        assert!(greeks.get(&vol_b, BumpDirection::Central).is_none());
        assert!(greeks
            .get(&RiskFactorId::ParallelVol, BumpDirection::Central)
            .is_none());
        assert!(greeks
            .get(&RiskFactorId::vol("AAA"), BumpDirection::Central)
            .is_some());
    }

    #[test]
    fn test_cancelled_budget_yields_none() {
        let (t, m, c) = inputs(BumpScheme::Forward, 0.2);
        let base = PricingResult::for_tests(0.05, 0.001, 2_000);
        let token = CancellationToken::new();
        token.cancel();
        let budget = RunBudget::unbounded(token);
        let ctx = RunContext {
            budget: &budget,
            pool: None,
        };
        assert!(GreeksCalculator::new(&t, &m, &c)
            .compute(&base, &ctx)
            .unwrap()
            .is_none());
    }
}
