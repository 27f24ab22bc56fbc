//! Engine configuration
//!
//! Every threshold the pipeline consults lives here. Defaults match the
//! production settings; a TOML file may override any subset of fields.

use crate::error::EngineError;
use crate::types::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Metric Normalizer settings
    pub normalizer: NormalizerConfig,
    /// Ingredient Selector settings
    pub selection: SelectionConfig,
    /// Conflict Resolver settings
    pub conflicts: ConflictConfig,
    /// Plan lock window
    pub lock: LockConfig,
    /// Progress Evaluator settings
    pub progress: ProgressConfig,
    /// Adjustment trigger thresholds
    pub triggers: TriggerConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With lock bounds and default duration
    #[inline]
    #[must_use]
    pub fn with_lock(mut self, min_days: u32, max_days: u32, default_days: u32) -> Self {
        self.lock = LockConfig {
            min_days,
            max_days,
            default_days,
            ..self.lock
        };
        self
    }

    /// With minimum scan interval
    #[inline]
    #[must_use]
    pub fn with_min_scan_interval(mut self, days: i64) -> Self {
        self.progress.min_scan_interval_days = days;
        self
    }

    /// With maximum number of metric-driven concerns
    #[inline]
    #[must_use]
    pub fn with_max_metric_concerns(mut self, n: usize) -> Self {
        self.selection.max_metric_concerns = n;
        self
    }

    /// With weekly slot capacity
    #[inline]
    #[must_use]
    pub fn with_weekly_capacity(mut self, capacity: usize) -> Self {
        self.conflicts.weekly_capacity = capacity;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Check internal consistency of the bounds
    pub fn validate(&self) -> Result<(), EngineError> {
        let lock = &self.lock;
        if lock.min_days == 0 || lock.min_days > lock.max_days {
            return Err(EngineError::Config(format!(
                "lock bounds invalid: min={} max={}",
                lock.min_days, lock.max_days
            )));
        }
        if !lock.contains(lock.default_days) {
            return Err(EngineError::Config(format!(
                "default lock {} outside [{}, {}]",
                lock.default_days, lock.min_days, lock.max_days
            )));
        }
        if !(0.0..=100.0).contains(&self.normalizer.confidence_floor) {
            return Err(EngineError::Config(format!(
                "confidence floor {} outside [0, 100]",
                self.normalizer.confidence_floor
            )));
        }
        if !(0.0..=100.0).contains(&self.selection.severity_threshold) {
            return Err(EngineError::Config(format!(
                "severity threshold {} outside [0, 100]",
                self.selection.severity_threshold
            )));
        }
        if self.progress.min_scan_interval_days < 0 {
            return Err(EngineError::Config("min scan interval must be >= 0".to_string()));
        }
        if self.triggers.severe_irritation_percent < self.triggers.decline_percent {
            return Err(EngineError::Config(format!(
                "severe irritation threshold {} below decline threshold {}",
                self.triggers.severe_irritation_percent, self.triggers.decline_percent
            )));
        }
        Ok(())
    }
}

/// Metric Normalizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Metrics that must be present in every scan
    pub required_metrics: Vec<Metric>,
    /// Minimum analysis confidence (0-100)
    pub confidence_floor: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            required_metrics: vec![
                Metric::Acne,
                Metric::Redness,
                Metric::Oiliness,
                Metric::Dryness,
                Metric::Texture,
            ],
            confidence_floor: 45.0,
        }
    }
}

/// Ingredient Selector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Severity at or above which a metric drives a selection
    pub severity_threshold: f64,
    /// Metric-driven concerns kept besides the primary concern
    pub max_metric_concerns: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            severity_threshold: 45.0,
            max_metric_concerns: 2,
        }
    }
}

/// Conflict Resolver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Actives the weekly (alternate-night) slot can hold
    pub weekly_capacity: usize,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self { weekly_capacity: 2 }
    }
}

/// Plan lock window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Shortest allowed lock
    pub min_days: u32,
    /// Longest allowed lock
    pub max_days: u32,
    /// Lock used when the caller does not ask for one
    pub default_days: u32,
    /// Earliest day a confirmed decline may unlock a plan
    pub min_early_review_days: i64,
}

impl LockConfig {
    /// Whether a duration lies in `[min_days, max_days]`
    #[inline]
    #[must_use]
    pub fn contains(&self, days: u32) -> bool {
        (self.min_days..=self.max_days).contains(&days)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            min_days: 14,
            max_days: 28,
            default_days: 14,
            min_early_review_days: 7,
        }
    }
}

/// Progress Evaluator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Minimum days between two compared scans
    pub min_scan_interval_days: i64,
    /// |percent change| above which a delta is significant
    pub significance_threshold: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            min_scan_interval_days: 7,
            significance_threshold: 10.0,
        }
    }
}

/// Adjustment trigger thresholds (percent worsening)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Any metric worsening above this unlocks immediately
    pub severe_irritation_percent: f64,
    /// Primary-concern worsening above this unlocks after early review
    pub decline_percent: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            severe_irritation_percent: 20.0,
            decline_percent: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lock.min_days, 14);
        assert_eq!(config.lock.max_days, 28);
        assert_eq!(config.selection.max_metric_concerns, 2);
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [lock]
            default_days = 21

            [progress]
            min_scan_interval_days = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.lock.default_days, 21);
        assert_eq!(config.lock.min_days, 14);
        assert_eq!(config.progress.min_scan_interval_days, 3);
        assert_eq!(config.progress.significance_threshold, 10.0);
    }

    #[test]
    fn rejects_default_outside_bounds() {
        let err = EngineConfig::from_toml_str("[lock]\ndefault_days = 40\n").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let config = EngineConfig::new().with_lock(28, 14, 14);
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[selection]\nmax_metric_concerns = 3").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.selection.max_metric_concerns, 3);
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let config = EngineConfig::new().with_weekly_capacity(1);
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
