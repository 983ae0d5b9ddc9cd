//! Run diagnostics gathered alongside the premium.
//!
//! [`DiagnosticsCollector`] is a passive consumer of [`StrategyPath`]s.
//! Each simulation block owns one; blocks are merged in path order so the
//! record is identical for any worker count.
//!
//! The finalised [`DiagnosticsRecord`] holds:
//! - percentiles of the terminal index ratio `I_T / I_0`
//! - percentiles of each path's mean leverage, and the overall leverage range
//! - mean realised vol and the per-day cross-sectional mean trajectories
//! - a convergence curve (premium and stderr at geometric path counts)
//! - an advisory warning when stderr is large relative to the premium

use serde::{Deserialize, Serialize};

use voltarget_core::math::{percentile, RunningMoments};

use crate::mc::{PricingResult, StrategyPath};

/// First checkpoint of the convergence curve.
pub const CONVERGENCE_FIRST_CHECKPOINT: usize = 100;

/// Quantile summary of a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    /// Sample mean.
    pub mean: f64,
    /// Minimum.
    pub min: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 95th percentile.
    pub p95: f64,
    /// Maximum.
    pub max: f64,
}

impl PercentileSummary {
    /// Summarises `values` (sorted in place). `None` when empty.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let q = |p: f64| percentile(values, p).unwrap_or(f64::NAN);
        Some(Self {
            mean: values.iter().sum::<f64>() / values.len() as f64,
            min: values[0],
            p5: q(0.05),
            p25: q(0.25),
            p50: q(0.50),
            p75: q(0.75),
            p95: q(0.95),
            max: values[values.len() - 1],
        })
    }

    fn labelled(&self) -> [(&'static str, f64); 8] {
        [
            ("mean", self.mean),
            ("min", self.min),
            ("p5", self.p5),
            ("p25", self.p25),
            ("p50", self.p50),
            ("p75", self.p75),
            ("p95", self.p95),
            ("max", self.max),
        ]
    }
}

/// Path with an extreme terminal ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathExtreme {
    /// Global path index.
    pub path: usize,
    /// `I_T / I_0` of that path.
    pub terminal_ratio: f64,
}

/// One point of the convergence curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// Number of paths in the prefix.
    pub paths: usize,
    /// Premium rate over the prefix.
    pub premium_rate: f64,
    /// Standard error of the premium rate over the prefix.
    pub stderr_rate: f64,
}

/// Tabular diagnostic row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRow {
    /// Group, e.g. `terminal_ratio` or `convergence`.
    pub section: String,
    /// Metric within the group.
    pub metric: String,
    /// Value.
    pub value: f64,
}

impl DiagnosticRow {
    fn new(section: &str, metric: impl Into<String>, value: f64) -> Self {
        Self {
            section: section.to_string(),
            metric: metric.into(),
            value,
        }
    }
}

/// Finalised diagnostics of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsRecord {
    /// Paths observed.
    pub paths_observed: usize,
    /// Terminal `I_T / I_0` distribution.
    pub terminal_ratio: Option<PercentileSummary>,
    /// Distribution of per-path mean leverage.
    pub path_mean_leverage: Option<PercentileSummary>,
    /// Smallest leverage applied on any path and day.
    pub min_leverage: Option<f64>,
    /// Largest leverage applied on any path and day.
    pub max_leverage: Option<f64>,
    /// Mean annualised realised vol over all defined (path, day) pairs.
    pub mean_realized_vol: Option<f64>,
    /// Cross-sectional mean leverage per day.
    pub leverage_by_day: Vec<f64>,
    /// Cross-sectional mean realised vol per day (`None` during warm-up).
    pub realized_vol_by_day: Vec<Option<f64>>,
    /// Lowest terminal ratio.
    pub worst_path: Option<PathExtreme>,
    /// Highest terminal ratio.
    pub best_path: Option<PathExtreme>,
    /// Premium and stderr at geometric path-count checkpoints.
    pub convergence: Vec<ConvergencePoint>,
    /// Advisory convergence warning.
    pub convergence_warning: Option<String>,
}

impl DiagnosticsRecord {
    /// Flattens the record into `(section, metric, value)` rows.
    ///
    /// Per-day trajectories are not included; read them from the fields.
    pub fn rows(&self) -> Vec<DiagnosticRow> {
        let mut rows = vec![DiagnosticRow::new(
            "run",
            "paths_observed",
            self.paths_observed as f64,
        )];

        for (section, summary) in [
            ("terminal_ratio", &self.terminal_ratio),
            ("path_mean_leverage", &self.path_mean_leverage),
        ] {
            if let Some(summary) = summary {
                rows.extend(
                    summary
                        .labelled()
                        .into_iter()
                        .map(|(metric, value)| DiagnosticRow::new(section, metric, value)),
                );
            }
        }

        for (metric, value) in [
            ("min", self.min_leverage),
            ("max", self.max_leverage),
        ] {
            if let Some(v) = value {
                rows.push(DiagnosticRow::new("leverage", metric, v));
            }
        }
        if let Some(v) = self.mean_realized_vol {
            rows.push(DiagnosticRow::new("realized_vol", "mean", v));
        }
        for (metric, extreme) in [("worst", self.worst_path), ("best", self.best_path)] {
            if let Some(e) = extreme {
                rows.push(DiagnosticRow::new("path", format!("{}_index", metric), e.path as f64));
                rows.push(DiagnosticRow::new(
                    "path",
                    format!("{}_terminal_ratio", metric),
                    e.terminal_ratio,
                ));
            }
        }
        for point in &self.convergence {
            rows.push(DiagnosticRow::new(
                "convergence",
                format!("premium_rate@{}", point.paths),
                point.premium_rate,
            ));
            rows.push(DiagnosticRow::new(
                "convergence",
                format!("stderr_rate@{}", point.paths),
                point.stderr_rate,
            ));
        }
        rows.push(DiagnosticRow::new(
            "convergence",
            "warning",
            if self.convergence_warning.is_some() { 1.0 } else { 0.0 },
        ));
        rows
    }
}

/// Mergeable accumulator over strategy paths.
#[derive(Clone, Debug)]
pub struct DiagnosticsCollector {
    terminal_ratios: Vec<f64>,
    path_mean_leverage: Vec<f64>,
    min_leverage: f64,
    max_leverage: f64,
    leverage_sum_by_day: Vec<f64>,
    vol_sum_by_day: Vec<f64>,
    vol_count_by_day: Vec<u64>,
    realized_vol: RunningMoments,
    worst: Option<PathExtreme>,
    best: Option<PathExtreme>,
}

impl DiagnosticsCollector {
    /// Empty collector for paths of `days` trading days.
    pub fn new(days: usize) -> Self {
        Self {
            terminal_ratios: Vec::new(),
            path_mean_leverage: Vec::new(),
            min_leverage: f64::INFINITY,
            max_leverage: f64::NEG_INFINITY,
            leverage_sum_by_day: vec![0.0; days],
            vol_sum_by_day: vec![0.0; days],
            vol_count_by_day: vec![0; days],
            realized_vol: RunningMoments::new(),
            worst: None,
            best: None,
        }
    }

    /// Number of observed paths.
    #[inline]
    pub fn len(&self) -> usize {
        self.terminal_ratios.len()
    }

    /// Whether no path was observed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terminal_ratios.is_empty()
    }

    /// Records one path.
    pub fn observe(&mut self, path_index: usize, path: &StrategyPath) {
        let ratio = path.terminal_ratio();
        self.terminal_ratios.push(ratio);
        let candidate = PathExtreme {
            path: path_index,
            terminal_ratio: ratio,
        };
        if self.worst.map_or(true, |w| ratio < w.terminal_ratio) {
            self.worst = Some(candidate);
        }
        if self.best.map_or(true, |b| ratio > b.terminal_ratio) {
            self.best = Some(candidate);
        }

        if !path.leverage.is_empty() {
            let mean = path.leverage.iter().sum::<f64>() / path.leverage.len() as f64;
            self.path_mean_leverage.push(mean);
        }
        for (t, &l) in path.leverage.iter().enumerate() {
            self.min_leverage = self.min_leverage.min(l);
            self.max_leverage = self.max_leverage.max(l);
            if let Some(sum) = self.leverage_sum_by_day.get_mut(t) {
                *sum += l;
            }
        }
        for (t, vol) in path.realized_vol.iter().enumerate() {
            if let Some(v) = *vol {
                self.realized_vol.push(v);
                if t < self.vol_sum_by_day.len() {
                    self.vol_sum_by_day[t] += v;
                    self.vol_count_by_day[t] += 1;
                }
            }
        }
    }

    /// Appends a collector covering the paths that follow this one's.
    pub fn merge(&mut self, other: DiagnosticsCollector) {
        self.terminal_ratios.extend(other.terminal_ratios);
        self.path_mean_leverage.extend(other.path_mean_leverage);
        self.min_leverage = self.min_leverage.min(other.min_leverage);
        self.max_leverage = self.max_leverage.max(other.max_leverage);
        for (a, b) in self.leverage_sum_by_day.iter_mut().zip(other.leverage_sum_by_day) {
            *a += b;
        }
        for (a, b) in self.vol_sum_by_day.iter_mut().zip(other.vol_sum_by_day) {
            *a += b;
        }
        for (a, b) in self.vol_count_by_day.iter_mut().zip(other.vol_count_by_day) {
            *a += b;
        }
        self.realized_vol.merge(&other.realized_vol);
        if let Some(w) = other.worst {
            if self.worst.map_or(true, |s| w.terminal_ratio < s.terminal_ratio) {
                self.worst = Some(w);
            }
        }
        if let Some(b) = other.best {
            if self.best.map_or(true, |s| b.terminal_ratio > s.terminal_ratio) {
                self.best = Some(b);
            }
        }
    }

    /// Produces the record.
    ///
    /// `payoffs` are the discounted payoffs in path order, `notional` the
    /// premium-rate normaliser and `warning_fraction` the stderr/premium
    /// threshold of the convergence warning.
    pub fn finalise(
        mut self,
        payoffs: &[f64],
        notional: f64,
        result: &PricingResult,
        warning_fraction: f64,
    ) -> DiagnosticsRecord {
        let paths_observed = self.len();
        let n = paths_observed as f64;
        let leverage_by_day = self
            .leverage_sum_by_day
            .iter()
            .map(|s| if paths_observed > 0 { s / n } else { f64::NAN })
            .collect();
        let realized_vol_by_day = self
            .vol_sum_by_day
            .iter()
            .zip(&self.vol_count_by_day)
            .map(|(s, &c)| (c > 0).then(|| s / c as f64))
            .collect();

        let convergence_warning = convergence_warning(result, warning_fraction);

        DiagnosticsRecord {
            paths_observed,
            terminal_ratio: PercentileSummary::from_values(&mut self.terminal_ratios),
            path_mean_leverage: PercentileSummary::from_values(&mut self.path_mean_leverage),
            min_leverage: self.min_leverage.is_finite().then_some(self.min_leverage),
            max_leverage: self.max_leverage.is_finite().then_some(self.max_leverage),
            mean_realized_vol: (self.realized_vol.count() > 0).then(|| self.realized_vol.mean()),
            leverage_by_day,
            realized_vol_by_day,
            worst_path: self.worst,
            best_path: self.best,
            convergence: convergence_curve(payoffs, notional),
            convergence_warning,
        }
    }
}

/// Premium and stderr over prefixes of `payoffs` at 100, 200, 400, …
/// paths, plus the full count.
pub fn convergence_curve(payoffs: &[f64], notional: f64) -> Vec<ConvergencePoint> {
    let mut curve = Vec::new();
    let mut moments = RunningMoments::new();
    let mut next = CONVERGENCE_FIRST_CHECKPOINT.min(payoffs.len());

    for (k, &x) in payoffs.iter().enumerate() {
        moments.push(x);
        let seen = k + 1;
        if seen == next || seen == payoffs.len() {
            curve.push(ConvergencePoint {
                paths: seen,
                premium_rate: moments.mean() / notional,
                stderr_rate: moments.std_error() / notional,
            });
            next = seen * 2;
        }
    }
    curve
}

fn convergence_warning(result: &PricingResult, fraction: f64) -> Option<String> {
    if result.premium_rate > 0.0 && result.stderr_rate > fraction * result.premium_rate {
        Some(format!(
            "stderr {:.6} exceeds {:.1}% of premium {:.6} after {} paths",
            result.stderr_rate,
            fraction * 100.0,
            result.premium_rate,
            result.paths_used
        ))
    } else {
        None
    }
}
