//! Progress Evaluator
//!
//! Per-metric deltas between two ordered scans. Severity metrics: a negative
//! delta is an improvement. A zero baseline leaves the percent change
//! undefined; such deltas are flagged and never significant.

use crate::config::ProgressConfig;
use crate::error::EngineError;
use crate::types::{Metric, SkinMetricSet};
use serde::{Deserialize, Serialize};

/// Direction of change for one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

/// Change of one metric between two scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub metric: Metric,
    pub previous: f64,
    pub current: f64,
    /// `current - previous`
    pub delta: f64,
    /// `delta / previous * 100`; `None` when previous is 0
    pub percent_change: Option<f64>,
    pub improvement: bool,
    pub is_significant: bool,
    pub undefined_baseline: bool,
    pub trend: Trend,
    pub days_elapsed: i64,
}

impl ScoreDelta {
    /// Compute a delta for one metric
    #[must_use]
    pub fn compute(metric: Metric, previous: f64, current: f64, days_elapsed: i64, threshold: f64) -> Self {
        let delta = current - previous;
        let undefined_baseline = previous == 0.0;
        let percent_change = (!undefined_baseline).then(|| delta / previous * 100.0);
        let is_significant = percent_change.is_some_and(|p| p.abs() > threshold);
        let trend = match (is_significant, delta < 0.0) {
            (true, true) => Trend::Improving,
            (true, false) => Trend::Worsening,
            (false, _) => Trend::Stable,
        };
        Self {
            metric,
            previous,
            current,
            delta,
            percent_change,
            improvement: delta < 0.0,
            is_significant,
            undefined_baseline,
            trend,
            days_elapsed,
        }
    }

    /// Percent worsening, if defined (positive means worse)
    #[inline]
    #[must_use]
    pub fn worsening_percent(&self) -> Option<f64> {
        self.percent_change.filter(|p| *p > 0.0)
    }

    /// One-line summary, e.g. "Acne improved by 12.5%"
    #[must_use]
    pub fn describe(&self) -> String {
        let label = self.metric.label();
        match self.percent_change {
            None if self.delta == 0.0 => format!("{label} unchanged"),
            None => format!("{label} rose from a zero baseline to {:.0}", self.current),
            Some(p) if p == 0.0 => format!("{label} unchanged"),
            Some(p) if p < 0.0 => format!("{label} improved by {:.1}%", p.abs()),
            Some(p) => format!("{label} worsened by {p:.1}%"),
        }
    }
}

/// Aggregate view of a delta set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub improving: usize,
    pub worsening: usize,
    pub stable: usize,
    pub most_improved: Option<Metric>,
    pub most_worsened: Option<Metric>,
    pub overall: Trend,
}

/// Summarize a delta set
#[must_use]
pub fn summarize(deltas: &[ScoreDelta]) -> ProgressSummary {
    let count = |trend: Trend| deltas.iter().filter(|d| d.trend == trend).count();
    let improving = count(Trend::Improving);
    let worsening = count(Trend::Worsening);

    let defined = || deltas.iter().filter_map(|d| d.percent_change.map(|p| (d.metric, p)));
    let most_improved = defined()
        .filter(|(_, p)| *p < 0.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m);
    let most_worsened = defined()
        .filter(|(_, p)| *p > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m);

    let overall = match improving.cmp(&worsening) {
        std::cmp::Ordering::Greater => Trend::Improving,
        std::cmp::Ordering::Less => Trend::Worsening,
        std::cmp::Ordering::Equal => Trend::Stable,
    };

    ProgressSummary {
        improving,
        worsening,
        stable: count(Trend::Stable),
        most_improved,
        most_worsened,
        overall,
    }
}

/// Compares two scans of the same user
#[derive(Debug, Clone, Default)]
pub struct ProgressEvaluator {
    config: ProgressConfig,
}

impl ProgressEvaluator {
    /// Create evaluator
    #[inline]
    #[must_use]
    pub fn new(config: ProgressConfig) -> Self {
        Self { config }
    }

    /// Deltas for every metric measured in both scans, in vocabulary order
    pub fn evaluate(&self, previous: &SkinMetricSet, current: &SkinMetricSet) -> Result<Vec<ScoreDelta>, EngineError> {
        if current.captured_at() <= previous.captured_at() {
            return Err(EngineError::validation("current scan must be captured after the previous scan"));
        }
        let days = (current.captured_at() - previous.captured_at()).num_days();
        if days < self.config.min_scan_interval_days {
            return Err(EngineError::validation(format!(
                "scans are {days} days apart; at least {} required",
                self.config.min_scan_interval_days
            )));
        }

        let deltas: Vec<ScoreDelta> = Metric::ALL
            .iter()
            .filter_map(|m| {
                let prev = previous.score(*m)?;
                let curr = current.score(*m)?;
                Some(ScoreDelta::compute(*m, prev, curr, days, self.config.significance_threshold))
            })
            .collect();

        tracing::debug!(
            days,
            significant = deltas.iter().filter(|d| d.is_significant).count(),
            "progress evaluated"
        );
        Ok(deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acne_rise_is_significant_worsening() {
        let delta = ScoreDelta::compute(Metric::Acne, 30.0, 55.0, 8, 10.0);
        assert_eq!(delta.delta, 25.0);
        assert!((delta.percent_change.unwrap() - 83.333).abs() < 0.01);
        assert!(!delta.improvement);
        assert_eq!(delta.trend, Trend::Worsening);
    }

    #[test]
    fn zero_baseline_is_flagged_not_significant() {
        let delta = ScoreDelta::compute(Metric::Redness, 0.0, 40.0, 10, 10.0);
        assert!(delta.undefined_baseline);
        assert_eq!(delta.percent_change, None);
        assert!(!delta.is_significant);
        assert_eq!(delta.trend, Trend::Stable);
    }

    #[test]
    fn threshold_is_exclusive() {
        let delta = ScoreDelta::compute(Metric::Texture, 50.0, 55.0, 7, 10.0);
        assert!(!delta.is_significant);
    }

    #[test]
    fn describe_reads_naturally() {
        assert_eq!(
            ScoreDelta::compute(Metric::Acne, 40.0, 35.0, 7, 10.0).describe(),
            "Acne improved by 12.5%"
        );
        assert_eq!(
            ScoreDelta::compute(Metric::DarkSpots, 20.0, 25.0, 7, 10.0).describe(),
            "Dark spots worsened by 25.0%"
        );
    }

    #[test]
    fn summary_picks_extremes() {
        let deltas = vec![
            ScoreDelta::compute(Metric::Acne, 40.0, 20.0, 14, 10.0),
            ScoreDelta::compute(Metric::Redness, 40.0, 36.0, 14, 10.0),
            ScoreDelta::compute(Metric::Dryness, 20.0, 30.0, 14, 10.0),
            ScoreDelta::compute(Metric::Texture, 50.0, 51.0, 14, 10.0),
        ];
        let summary = summarize(&deltas);
        assert_eq!(summary.improving, 1);
        assert_eq!(summary.worsening, 1);
        assert_eq!(summary.stable, 2);
        assert_eq!(summary.most_improved, Some(Metric::Acne));
        assert_eq!(summary.most_worsened, Some(Metric::Dryness));
        assert_eq!(summary.overall, Trend::Stable);
    }
}
