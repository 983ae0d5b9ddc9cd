//! Trade definition: basket constituents and option terms.
//!
//! A [`TradeSpec`] is immutable once built. Validation runs in
//! [`TradeSpecBuilder::build`] and again via [`TradeSpec::validate`] for
//! values obtained through deserialisation.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Trading days per year used for horizons and vol annualisation.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Longest simulated horizon, 100 years of trading days.
pub const MAX_TRADING_DAYS: usize = 25_200;

/// Tolerance for the weights-sum-to-one check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One basket name and its fixed weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasketConstituent {
    /// Ticker / name, matched against [`MarketSpec`](super::MarketSpec) quotes.
    pub name: String,
    /// Basket weight.
    pub weight: f64,
}

/// How basket weights turn name returns into a basket return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketWeighting {
    /// Weights are fixed units: `B_t = Σ wᵢ Sᵢ,t`, never rebalanced.
    #[default]
    FixedUnits,
    /// Weights are fixed return shares: `r_t = Σ wᵢ (e^{xᵢ,t} − 1)`.
    ConstantWeights,
}

/// Option maturity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    /// Year fraction.
    Years(f64),
    /// Number of trading days.
    TradingDays(usize),
    /// Calendar dates, ACT/365F year fraction.
    Dates {
        /// Initial valuation date.
        start: NaiveDate,
        /// Final valuation date.
        end: NaiveDate,
    },
}

/// Simulation horizon derived from a [`Maturity`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    /// Maturity in years (discounting).
    pub years: f64,
    /// Number of simulated trading days.
    pub days: usize,
    /// Daily time step in years.
    pub dt: f64,
}

impl Maturity {
    /// Resolves the maturity into a simulation horizon.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HorizonTooShort`] if fewer than one trading
    /// day results, [`ConfigError::HorizonTooLong`] above
    /// [`MAX_TRADING_DAYS`], or `InvalidParameter` for a non-finite year
    /// fraction.
    pub fn horizon(&self) -> Result<Horizon, ConfigError> {
        let (years, days) = match *self {
            Maturity::Years(years) => {
                if !years.is_finite() || years <= 0.0 {
                    return Err(ConfigError::invalid("maturity", format!("{} years", years)));
                }
                (years, year_fraction_days(years)?)
            }
            Maturity::TradingDays(days) => {
                let years = days as f64 / TRADING_DAYS_PER_YEAR;
                if days > MAX_TRADING_DAYS {
                    return Err(ConfigError::HorizonTooLong {
                        years,
                        maximum: MAX_TRADING_DAYS,
                    });
                }
                (years, days)
            }
            Maturity::Dates { start, end } => {
                let years = (end - start).num_days() as f64 / 365.0;
                if years <= 0.0 {
                    return Err(ConfigError::invalid(
                        "maturity",
                        format!("end {} not after start {}", end, start),
                    ));
                }
                (years, year_fraction_days(years)?)
            }
        };

        if days < 1 {
            return Err(ConfigError::HorizonTooShort { years, days });
        }

        Ok(Horizon {
            years,
            days,
            dt: years / days as f64,
        })
    }
}

/// Rounds a year fraction to trading days, rejecting counts the cast would saturate.
fn year_fraction_days(years: f64) -> Result<usize, ConfigError> {
    let days = (years * TRADING_DAYS_PER_YEAR).round();
    if !days.is_finite() || days > MAX_TRADING_DAYS as f64 {
        return Err(ConfigError::HorizonTooLong {
            years,
            maximum: MAX_TRADING_DAYS,
        });
    }
    Ok(days as usize)
}

fn default_base_level() -> f64 {
    100.0
}

fn default_min_basket_size() -> usize {
    1
}

/// Basket option trade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeSpec {
    /// Ordered basket constituents.
    pub basket: Vec<BasketConstituent>,
    /// Strike in notional units (`strike == notional` is at-the-money).
    pub strike: f64,
    /// Option notional.
    pub notional: f64,
    /// Option maturity.
    pub maturity: Maturity,
    /// Minimum number of basket names.
    #[serde(default = "default_min_basket_size")]
    pub min_basket_size: usize,
    /// Optional single-name concentration limit.
    #[serde(default)]
    pub max_single_weight: Option<f64>,
    /// Strategy index level at inception.
    #[serde(default = "default_base_level")]
    pub base_level: f64,
    /// Basket return convention.
    #[serde(default)]
    pub weighting: BasketWeighting,
}

impl TradeSpec {
    /// Creates a new trade builder.
    pub fn builder() -> TradeSpecBuilder {
        TradeSpecBuilder::default()
    }

    /// Number of basket names.
    #[inline]
    pub fn n_names(&self) -> usize {
        self.basket.len()
    }

    /// Basket weights in basket order.
    pub fn weights(&self) -> Vec<f64> {
        self.basket.iter().map(|c| c.weight).collect()
    }

    /// Basket names in basket order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.basket.iter().map(|c| c.name.as_str())
    }

    /// Resolves the simulation horizon.
    pub fn horizon(&self) -> Result<Horizon, ConfigError> {
        self.maturity.horizon()
    }

    /// Validates the trade.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the basket is smaller than `min_basket_size` (or empty)
    /// - a name repeats, or a weight is negative / non-finite / above the cap
    /// - weights do not sum to 1 within [`WEIGHT_SUM_TOLERANCE`]
    /// - strike, notional or base level are not positive and finite
    /// - the maturity yields less than one trading day
    pub fn validate(&self) -> Result<(), ConfigError> {
        let minimum = self.min_basket_size.max(1);
        if self.basket.len() < minimum {
            return Err(ConfigError::BasketTooSmall {
                actual: self.basket.len(),
                minimum,
            });
        }

        let mut seen = HashSet::with_capacity(self.basket.len());
        for c in &self.basket {
            if !seen.insert(c.name.as_str()) {
                return Err(ConfigError::DuplicateName(c.name.clone()));
            }
            if !c.weight.is_finite() || c.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: c.name.clone(),
                    weight: c.weight,
                });
            }
            if let Some(limit) = self.max_single_weight {
                if c.weight > limit {
                    return Err(ConfigError::WeightAboveLimit {
                        name: c.name.clone(),
                        weight: c.weight,
                        limit,
                    });
                }
            }
        }

        let sum: f64 = self.basket.iter().map(|c| c.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne {
                sum,
                tolerance: WEIGHT_SUM_TOLERANCE,
            });
        }

        positive_finite("strike", self.strike)?;
        positive_finite("notional", self.notional)?;
        positive_finite("base_level", self.base_level)?;
        self.horizon()?;
        Ok(())
    }
}

pub(crate) fn positive_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("{} must be positive and finite", value)))
    }
}

/// Builder for [`TradeSpec`].
#[derive(Clone, Debug)]
pub struct TradeSpecBuilder {
    basket: Vec<BasketConstituent>,
    strike: Option<f64>,
    notional: f64,
    maturity: Option<Maturity>,
    min_basket_size: usize,
    max_single_weight: Option<f64>,
    base_level: f64,
    weighting: BasketWeighting,
}

impl Default for TradeSpecBuilder {
    fn default() -> Self {
        Self {
            basket: Vec::new(),
            strike: None,
            notional: 100.0,
            maturity: None,
            min_basket_size: default_min_basket_size(),
            max_single_weight: None,
            base_level: default_base_level(),
            weighting: BasketWeighting::default(),
        }
    }
}

impl TradeSpecBuilder {
    /// Appends a basket constituent.
    pub fn constituent(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.basket.push(BasketConstituent {
            name: name.into(),
            weight,
        });
        self
    }

    /// Sets the strike (notional units).
    pub fn strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Sets the notional (default 100).
    pub fn notional(mut self, notional: f64) -> Self {
        self.notional = notional;
        self
    }

    /// Sets the maturity.
    pub fn maturity(mut self, maturity: Maturity) -> Self {
        self.maturity = Some(maturity);
        self
    }

    /// Sets the minimum basket size (default 1).
    pub fn min_basket_size(mut self, n: usize) -> Self {
        self.min_basket_size = n;
        self
    }

    /// Sets a single-name weight limit.
    pub fn max_single_weight(mut self, limit: f64) -> Self {
        self.max_single_weight = Some(limit);
        self
    }

    /// Sets the index base level (default 100).
    pub fn base_level(mut self, level: f64) -> Self {
        self.base_level = level;
        self
    }

    /// Sets the basket weighting convention.
    pub fn weighting(mut self, weighting: BasketWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Builds and validates the trade.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if strike or maturity is missing, or if
    /// [`TradeSpec::validate`] fails.
    pub fn build(self) -> Result<TradeSpec, ConfigError> {
        let strike = self
            .strike
            .ok_or_else(|| ConfigError::invalid("strike", "must be specified"))?;
        let maturity = self
            .maturity
            .ok_or_else(|| ConfigError::invalid("maturity", "must be specified"))?;

        let trade = TradeSpec {
            basket: self.basket,
            strike,
            notional: self.notional,
            maturity,
            min_basket_size: self.min_basket_size,
            max_single_weight: self.max_single_weight,
            base_level: self.base_level,
            weighting: self.weighting,
        };
        trade.validate()?;
        Ok(trade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_name() -> TradeSpecBuilder {
        TradeSpec::builder()
            .constituent("AAA", 0.5)
            .constituent("BBB", 0.5)
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
    }

    #[test]
    fn test_trade_builder_valid() {
        let trade = two_name().min_basket_size(2).build().unwrap();
        assert_eq!(trade.n_names(), 2);
        assert_eq!(trade.weights(), vec![0.5, 0.5]);
        assert_eq!(trade.base_level, 100.0);
        assert_eq!(trade.weighting, BasketWeighting::FixedUnits);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let result = TradeSpec::builder()
            .constituent("AAA", 0.5)
            .constituent("BBB", 0.4)
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn test_weights_sum_within_tolerance() {
        let trade = TradeSpec::builder()
            .constituent("AAA", 1.0 / 3.0)
            .constituent("BBB", 1.0 / 3.0)
            .constituent("CCC", 1.0 / 3.0)
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
            .build();
        assert!(trade.is_ok());
    }

    #[test]
    fn test_minimum_basket_size() {
        let result = two_name().min_basket_size(3).build();
        assert_eq!(
            result,
            Err(ConfigError::BasketTooSmall {
                actual: 2,
                minimum: 3
            })
        );
    }

    #[test]
    fn test_empty_basket_rejected() {
        let result = TradeSpec::builder()
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
            .min_basket_size(0)
            .build();
        assert!(matches!(result, Err(ConfigError::BasketTooSmall { .. })));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = TradeSpec::builder()
            .constituent("AAA", 0.5)
            .constituent("AAA", 0.5)
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
            .build();
        assert_eq!(result, Err(ConfigError::DuplicateName("AAA".to_string())));
    }

    #[test]
    fn test_max_single_weight() {
        let result = two_name().max_single_weight(0.07).build();
        assert!(matches!(result, Err(ConfigError::WeightAboveLimit { .. })));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let result = TradeSpec::builder()
            .constituent("AAA", 1.5)
            .constituent("BBB", -0.5)
            .strike(100.0)
            .maturity(Maturity::Years(1.0))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidWeight { .. })));
    }

    #[test]
    fn test_missing_strike() {
        let result = TradeSpec::builder()
            .constituent("AAA", 1.0)
            .maturity(Maturity::Years(1.0))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "strike", .. })
        ));
    }

    #[test]
    fn test_horizon_from_years() {
        let h = Maturity::Years(1.0).horizon().unwrap();
        assert_eq!(h.days, 252);
        assert_relative_eq!(h.dt, 1.0 / 252.0, epsilon = 1e-15);
    }

    #[test]
    fn test_horizon_from_trading_days() {
        let h = Maturity::TradingDays(63).horizon().unwrap();
        assert_eq!(h.days, 63);
        assert_relative_eq!(h.years, 0.25, epsilon = 1e-15);
        assert_relative_eq!(h.dt, 1.0 / 252.0, epsilon = 1e-15);
    }

    #[test]
    fn test_horizon_from_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 23).unwrap();
        let end = NaiveDate::from_ymd_opt(2027, 2, 23).unwrap();
        let h = Maturity::Dates { start, end }.horizon().unwrap();
        assert_relative_eq!(h.years, 1.0, epsilon = 1e-12);
        assert_eq!(h.days, 252);
    }

    #[test]
    fn test_horizon_too_short() {
        assert!(matches!(
            Maturity::TradingDays(0).horizon(),
            Err(ConfigError::HorizonTooShort { days: 0, .. })
        ));
        assert!(matches!(
            Maturity::Years(0.001).horizon(),
            Err(ConfigError::HorizonTooShort { .. })
        ));
    }

    #[test]
    fn test_horizon_too_long() {
        assert!(Maturity::TradingDays(MAX_TRADING_DAYS).horizon().is_ok());
        assert!(matches!(
            Maturity::TradingDays(MAX_TRADING_DAYS + 1).horizon(),
            Err(ConfigError::HorizonTooLong { .. })
        ));
        assert!(matches!(
            Maturity::TradingDays(usize::MAX).horizon(),
            Err(ConfigError::HorizonTooLong { .. })
        ));
        assert!(matches!(
            Maturity::Years(1e300).horizon(),
            Err(ConfigError::HorizonTooLong { .. })
        ));
        assert!(matches!(
            Maturity::Years(101.0).horizon(),
            Err(ConfigError::HorizonTooLong { .. })
        ));
        assert_eq!(Maturity::Years(100.0).horizon().unwrap().days, MAX_TRADING_DAYS);
    }

    #[test]
    fn test_trade_json_defaults() {
        let json = r#"{
            "basket": [{"name": "AAA", "weight": 1.0}],
            "strike": 100.0,
            "notional": 100.0,
            "maturity": {"trading_days": 10}
        }"#;
        let trade: TradeSpec = serde_json::from_str(json).unwrap();
        assert_eq!(trade.base_level, 100.0);
        assert_eq!(trade.min_basket_size, 1);
        assert!(trade.validate().is_ok());
    }
}
