//! Metric Normalizer
//!
//! Turns an untrusted [`RawMetricVector`] into a bounded [`SkinMetricSet`].
//! Structural problems (non-finite or missing values) are validation errors;
//! low confidence or a retake flag is a quality error carrying reasons.

use crate::config::NormalizerConfig;
use crate::error::EngineError;
use crate::types::{RawMetricVector, ScanId, SkinMetricSet};

/// Stateless normalizer over a configuration
#[derive(Debug, Clone, Default)]
pub struct MetricNormalizer {
    config: NormalizerConfig,
}

impl MetricNormalizer {
    /// Create normalizer
    #[inline]
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Validate, gate on quality, and clamp
    pub fn normalize(&self, scan_id: ScanId, raw: RawMetricVector) -> Result<SkinMetricSet, EngineError> {
        self.validate(&raw)?;

        let set = SkinMetricSet::new(scan_id, raw.scores, raw.confidence, raw.quality, raw.captured_at)
            .with_summary(raw.summary);
        self.check_quality(&set)?;

        tracing::debug!(
            scan_id = %scan_id,
            overall = set.overall_score(),
            confidence = set.confidence(),
            "metrics normalized"
        );
        Ok(set)
    }

    /// Structural checks: finite values, required metrics present
    pub fn validate(&self, raw: &RawMetricVector) -> Result<(), EngineError> {
        if !raw.confidence.is_finite() {
            return Err(EngineError::validation("confidence is not a finite number"));
        }
        if let Some((metric, _)) = raw.scores.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::validation(format!(
                "metric {metric} is not a finite number"
            )));
        }
        let missing: Vec<&str> = self
            .config
            .required_metrics
            .iter()
            .filter(|m| !raw.scores.contains_key(m))
            .map(|m| m.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::validation(format!(
                "missing required metrics: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Quality gate on an already-bounded metric set
    pub fn check_quality(&self, set: &SkinMetricSet) -> Result<(), EngineError> {
        let mut reasons = Vec::new();
        if set.quality().retake_required {
            if set.quality().reasons.is_empty() {
                reasons.push("image quality check failed".to_string());
            } else {
                reasons.extend(set.quality().reasons.iter().cloned());
            }
        }
        if set.confidence() < self.config.confidence_floor {
            reasons.push(format!(
                "analysis confidence {:.0} below {:.0}",
                set.confidence(),
                self.config.confidence_floor
            ));
        }
        if reasons.is_empty() {
            return Ok(());
        }
        tracing::info!(scan_id = %set.scan_id(), ?reasons, "scan rejected, retake required");
        Err(EngineError::Quality { reasons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Metric, QualitySignal};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn raw(values: &[(Metric, f64)], confidence: f64) -> RawMetricVector {
        RawMetricVector {
            scores: values.iter().copied().collect::<BTreeMap<_, _>>(),
            confidence,
            quality: QualitySignal::pass(),
            captured_at: Utc::now(),
            summary: Some("opaque text".to_string()),
        }
    }

    fn full(value: f64) -> Vec<(Metric, f64)> {
        Metric::ALL.iter().map(|m| (*m, value)).collect()
    }

    #[test]
    fn clamps_out_of_range_values() {
        let mut values = full(50.0);
        values[0].1 = 250.0;
        values[1].1 = -3.0;
        let set = MetricNormalizer::default().normalize(ScanId::new(), raw(&values, 90.0)).unwrap();
        assert_eq!(set.score(Metric::Acne), Some(100.0));
        assert_eq!(set.score(Metric::Redness), Some(0.0));
        assert_eq!(set.summary(), Some("opaque text"));
    }

    #[test]
    fn rejects_non_finite_value() {
        let mut values = full(50.0);
        values[2].1 = f64::NAN;
        let err = MetricNormalizer::default().normalize(ScanId::new(), raw(&values, 90.0)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn rejects_missing_required_metric() {
        let err = MetricNormalizer::default()
            .normalize(ScanId::new(), raw(&[(Metric::Acne, 40.0)], 90.0))
            .unwrap_err();
        assert!(err.to_string().contains("redness"));
    }

    #[test]
    fn optional_metrics_may_be_absent() {
        let values: Vec<_> = full(30.0)
            .into_iter()
            .filter(|(m, _)| !matches!(m, Metric::Pores | Metric::DarkSpots))
            .collect();
        assert!(MetricNormalizer::default().normalize(ScanId::new(), raw(&values, 90.0)).is_ok());
    }

    #[test]
    fn low_confidence_is_retake() {
        let err = MetricNormalizer::default()
            .normalize(ScanId::new(), raw(&full(40.0), 20.0))
            .unwrap_err();
        assert!(err.is_retake());
    }

    #[test]
    fn retake_flag_carries_reasons() {
        let mut input = raw(&full(40.0), 95.0);
        input.quality = QualitySignal::retake(["blurry", "too dark"]);
        match MetricNormalizer::default().normalize(ScanId::new(), input) {
            Err(EngineError::Quality { reasons }) => {
                assert_eq!(reasons, vec!["blurry".to_string(), "too dark".to_string()]);
            }
            other => panic!("expected quality error, got {other:?}"),
        }
    }
}
