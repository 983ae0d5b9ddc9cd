//! Greeks result keyed by risk factor and bump direction.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use voltarget_core::types::BumpScheme;

/// Market input a Greek is taken against.
///
/// # Examples
///
/// ```rust
/// use voltarget_pricing::greeks::RiskFactorId;
///
/// assert_eq!(RiskFactorId::spot("AAA").to_string(), "Spot:AAA");
/// assert_eq!(RiskFactorId::Rate.to_string(), "Rate");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorId {
    /// One name's spot (relative bump).
    Spot(String),
    /// One name's volatility (absolute bump).
    Vol(String),
    /// Every name's volatility together.
    ParallelVol,
    /// The flat discount / financing rate.
    Rate,
}

impl RiskFactorId {
    /// Spot factor for `name`.
    #[inline]
    pub fn spot(name: impl Into<String>) -> Self {
        Self::Spot(name.into())
    }

    /// Volatility factor for `name`.
    #[inline]
    pub fn vol(name: impl Into<String>) -> Self {
        Self::Vol(name.into())
    }

    /// Conventional Greek name.
    pub fn greek(&self) -> &'static str {
        match self {
            Self::Spot(_) => "delta",
            Self::Vol(_) => "vega",
            Self::ParallelVol => "parallel_vega",
            Self::Rate => "rho",
        }
    }
}

impl fmt::Display for RiskFactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spot(name) => write!(f, "Spot:{}", name),
            Self::Vol(name) => write!(f, "Vol:{}", name),
            Self::ParallelVol => write!(f, "Vol:Parallel"),
            Self::Rate => write!(f, "Rate"),
        }
    }
}

/// Finite-difference direction of a Greek row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpDirection {
    /// `(V(x+h) − V(x)) / h`.
    Up,
    /// `(V(x) − V(x−h)) / h`.
    Down,
    /// `(V(x+h) − V(x−h)) / 2h`.
    Central,
}

impl fmt::Display for BumpDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Central => "central",
        })
    }
}

/// One sensitivity with the premiums it was computed from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GreekRow {
    /// Risk factor.
    pub factor: RiskFactorId,
    /// Difference direction.
    pub direction: BumpDirection,
    /// Bump size (relative for spot, absolute otherwise).
    pub bump: f64,
    /// Base premium rate.
    pub base: f64,
    /// Premium rate under the bump (the up bump for central rows).
    pub bumped: f64,
    /// Premium rate under the down bump, for central rows.
    pub bumped_down: Option<f64>,
    /// Sensitivity of the premium rate per unit of bump.
    pub sensitivity: f64,
}

/// Bump-and-revalue sensitivities keyed by `(factor, direction)`.
#[derive(Clone, Debug, PartialEq)]
pub struct GreeksResult {
    scheme: BumpScheme,
    entries: BTreeMap<(RiskFactorId, BumpDirection), GreekRow>,
}

impl GreeksResult {
    /// Empty result for a scheme.
    pub fn new(scheme: BumpScheme) -> Self {
        Self {
            scheme,
            entries: BTreeMap::new(),
        }
    }

    /// Scheme requested for the run.
    #[inline]
    pub fn scheme(&self) -> BumpScheme {
        self.scheme
    }

    /// Inserts (or replaces) a row.
    pub fn insert(&mut self, row: GreekRow) {
        self.entries
            .insert((row.factor.clone(), row.direction), row);
    }

    /// Sensitivity for an exact `(factor, direction)` key.
    pub fn get(&self, factor: &RiskFactorId, direction: BumpDirection) -> Option<f64> {
        self.entries
            .get(&(factor.clone(), direction))
            .map(|row| row.sensitivity)
    }

    /// Preferred sensitivity for a factor: central when available,
    /// otherwise the up difference.
    pub fn sensitivity(&self, factor: &RiskFactorId) -> Option<f64> {
        self.get(factor, BumpDirection::Central)
            .or_else(|| self.get(factor, BumpDirection::Up))
    }

    /// Rows in key order.
    pub fn rows(&self) -> impl Iterator<Item = &GreekRow> {
        self.entries.values()
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for GreeksResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<&GreekRow> = self.rows().collect();
        let mut state = serializer.serialize_struct("GreeksResult", 2)?;
        state.serialize_field("scheme", &self.scheme)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(factor: RiskFactorId, direction: BumpDirection, sensitivity: f64) -> GreekRow {
        GreekRow {
            factor,
            direction,
            bump: 0.01,
            base: 0.05,
            bumped: 0.05 + sensitivity * 0.01,
            bumped_down: None,
            sensitivity,
        }
    }

    #[test]
    fn test_factor_display_and_greek_names() {
        assert_eq!(RiskFactorId::vol("BBB").to_string(), "Vol:BBB");
        assert_eq!(RiskFactorId::ParallelVol.to_string(), "Vol:Parallel");
        assert_eq!(RiskFactorId::spot("AAA").greek(), "delta");
        assert_eq!(RiskFactorId::Rate.greek(), "rho");
        assert_eq!(BumpDirection::Central.to_string(), "central");
    }

    #[test]
    fn test_lookup_prefers_central() {
        let mut greeks = GreeksResult::new(BumpScheme::Central);
        let aaa = RiskFactorId::spot("AAA");
        greeks.insert(row(aaa.clone(), BumpDirection::Up, 0.6));
        assert_eq!(greeks.sensitivity(&aaa), Some(0.6));
        greeks.insert(row(aaa.clone(), BumpDirection::Central, 0.55));
        assert_eq!(greeks.sensitivity(&aaa), Some(0.55));
        assert_eq!(greeks.get(&aaa, BumpDirection::Down), None);
        assert_eq!(greeks.len(), 2);
    }

    #[test]
    fn test_rows_are_ordered_by_factor() {
        let mut greeks = GreeksResult::new(BumpScheme::Forward);
        greeks.insert(row(RiskFactorId::Rate, BumpDirection::Up, 1.0));
        greeks.insert(row(RiskFactorId::vol("AAA"), BumpDirection::Up, 2.0));
        greeks.insert(row(RiskFactorId::spot("BBB"), BumpDirection::Up, 3.0));
        greeks.insert(row(RiskFactorId::spot("AAA"), BumpDirection::Up, 4.0));
        let order: Vec<String> = greeks.rows().map(|r| r.factor.to_string()).collect();
        assert_eq!(order, vec!["Spot:AAA", "Spot:BBB", "Vol:AAA", "Rate"]);
    }

    #[test]
    fn test_serialises_as_rows() {
        let mut greeks = GreeksResult::new(BumpScheme::Forward);
        greeks.insert(row(RiskFactorId::Rate, BumpDirection::Up, 1.5));
        let json = serde_json::to_value(&greeks).unwrap();
        assert_eq!(json["scheme"], "forward");
        assert_eq!(json["rows"][0]["factor"], "rate");
        assert_eq!(json["rows"][0]["sensitivity"], 1.5);
    }
}
