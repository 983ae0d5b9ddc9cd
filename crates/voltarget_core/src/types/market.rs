//! Market snapshot: per-name quotes, flat correlation and flat rate.
//!
//! Quotes are held in a `BTreeMap` so serialisation (and therefore the
//! run fingerprint) is independent of insertion order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::trade::TradeSpec;

/// Spot, volatility and dividend yield for one name.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NameQuote {
    /// Spot level.
    pub spot: f64,
    /// Annualised volatility.
    pub vol: f64,
    /// Continuous dividend yield.
    #[serde(default)]
    pub dividend_yield: f64,
}

impl NameQuote {
    /// Creates a quote with zero dividend yield.
    #[inline]
    pub fn new(spot: f64, vol: f64) -> Self {
        Self {
            spot,
            vol,
            dividend_yield: 0.0,
        }
    }

    /// Sets the dividend yield.
    #[inline]
    pub fn with_dividend_yield(mut self, q: f64) -> Self {
        self.dividend_yield = q;
        self
    }

    fn is_valid(&self) -> bool {
        self.spot.is_finite()
            && self.spot > 0.0
            && self.vol.is_finite()
            && self.vol >= 0.0
            && self.dividend_yield.is_finite()
    }
}

/// Market snapshot consumed read-only by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSpec {
    /// Quotes keyed by name.
    pub quotes: BTreeMap<String, NameQuote>,
    /// Flat pairwise correlation.
    pub correlation: f64,
    /// Flat annualised discount / financing rate (continuous).
    pub rate: f64,
}

impl MarketSpec {
    /// Creates a new market builder.
    pub fn builder() -> MarketSpecBuilder {
        MarketSpecBuilder::default()
    }

    /// Looks up a quote by name.
    #[inline]
    pub fn quote(&self, name: &str) -> Option<&NameQuote> {
        self.quotes.get(name)
    }

    /// Validates the snapshot on its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a quote has non-positive spot, negative vol
    /// or non-finite fields, if the correlation lies outside [-1, 1], or if
    /// the rate is non-finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, q) in &self.quotes {
            if !q.is_valid() {
                return Err(ConfigError::InvalidQuote {
                    name: name.clone(),
                    spot: q.spot,
                    vol: q.vol,
                });
            }
        }
        if !self.correlation.is_finite() || self.correlation.abs() > 1.0 {
            return Err(ConfigError::CorrelationOutOfRange(self.correlation));
        }
        if !self.rate.is_finite() {
            return Err(ConfigError::invalid("rate", format!("{}", self.rate)));
        }
        Ok(())
    }

    /// Validates the snapshot against a trade: every basket name must be
    /// quoted.
    pub fn validate_for(&self, trade: &TradeSpec) -> Result<(), ConfigError> {
        self.validate()?;
        for name in trade.names() {
            if !self.quotes.contains_key(name) {
                return Err(ConfigError::MissingMarketData(name.to_string()));
            }
        }
        Ok(())
    }

    /// Quotes aligned to the trade's basket order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingMarketData`] for an unquoted name.
    pub fn aligned_quotes(&self, trade: &TradeSpec) -> Result<Vec<NameQuote>, ConfigError> {
        trade
            .names()
            .map(|name| {
                self.quotes
                    .get(name)
                    .copied()
                    .ok_or_else(|| ConfigError::MissingMarketData(name.to_string()))
            })
            .collect()
    }

    /// Copy with one name's spot multiplied by `factor`.
    pub fn with_spot_scaled(&self, name: &str, factor: f64) -> Self {
        let mut bumped = self.clone();
        if let Some(q) = bumped.quotes.get_mut(name) {
            q.spot *= factor;
        }
        bumped
    }

    /// Copy with one name's vol shifted by `shift`, floored at zero.
    pub fn with_vol_shifted(&self, name: &str, shift: f64) -> Self {
        let mut bumped = self.clone();
        if let Some(q) = bumped.quotes.get_mut(name) {
            q.vol = (q.vol + shift).max(0.0);
        }
        bumped
    }

    /// Copy with every vol shifted by `shift`, floored at zero.
    pub fn with_all_vols_shifted(&self, shift: f64) -> Self {
        let mut bumped = self.clone();
        for q in bumped.quotes.values_mut() {
            q.vol = (q.vol + shift).max(0.0);
        }
        bumped
    }

    /// Copy with the flat rate shifted by `shift`.
    pub fn with_rate_shifted(&self, shift: f64) -> Self {
        Self {
            rate: self.rate + shift,
            ..self.clone()
        }
    }
}

/// Builder for [`MarketSpec`].
#[derive(Clone, Debug, Default)]
pub struct MarketSpecBuilder {
    quotes: BTreeMap<String, NameQuote>,
    correlation: f64,
    rate: f64,
}

impl MarketSpecBuilder {
    /// Adds (or replaces) a quote.
    pub fn quote(mut self, name: impl Into<String>, quote: NameQuote) -> Self {
        self.quotes.insert(name.into(), quote);
        self
    }

    /// Sets the flat correlation (default 0).
    pub fn correlation(mut self, rho: f64) -> Self {
        self.correlation = rho;
        self
    }

    /// Sets the flat rate (default 0).
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Builds and validates the snapshot.
    pub fn build(self) -> Result<MarketSpec, ConfigError> {
        let market = MarketSpec {
            quotes: self.quotes,
            correlation: self.correlation,
            rate: self.rate,
        };
        market.validate()?;
        Ok(market)
    }
}
