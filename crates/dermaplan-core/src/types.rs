//! Core domain types
//!
//! Scan-side inputs of the engine:
//! - identifiers (`UserId`, `ScanId`)
//! - the fixed metric vocabulary and concern tags
//! - `SkinMetricSet`, the immutable per-scan severity vector
//! - `SkinProfile`, the user-supplied context for a scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate new user ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique scan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScanId(pub Uuid);

impl ScanId {
    /// Generate new scan ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Skin metric vocabulary. Every score is a severity: higher is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Acne,
    Redness,
    Oiliness,
    Dryness,
    Texture,
    #[serde(alias = "pore_size")]
    Pores,
    DarkSpots,
}

impl Metric {
    /// All metrics in vocabulary order
    pub const ALL: [Metric; 7] = [
        Metric::Acne,
        Metric::Redness,
        Metric::Oiliness,
        Metric::Dryness,
        Metric::Texture,
        Metric::Pores,
        Metric::DarkSpots,
    ];

    /// Stable wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Acne => "acne",
            Metric::Redness => "redness",
            Metric::Oiliness => "oiliness",
            Metric::Dryness => "dryness",
            Metric::Texture => "texture",
            Metric::Pores => "pores",
            Metric::DarkSpots => "dark_spots",
        }
    }

    /// Position in the vocabulary, used as the last tie-break
    #[inline]
    #[must_use]
    pub fn vocabulary_index(self) -> usize {
        Metric::ALL.iter().position(|m| *m == self).unwrap_or(usize::MAX)
    }

    /// Display label ("Dark spots")
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Metric::Acne => "Acne",
            Metric::Redness => "Redness",
            Metric::Oiliness => "Oiliness",
            Metric::Dryness => "Dryness",
            Metric::Texture => "Texture",
            Metric::Pores => "Pores",
            Metric::DarkSpots => "Dark spots",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acne" => Ok(Metric::Acne),
            "redness" => Ok(Metric::Redness),
            "oiliness" => Ok(Metric::Oiliness),
            "dryness" => Ok(Metric::Dryness),
            "texture" => Ok(Metric::Texture),
            "pores" | "pore_size" => Ok(Metric::Pores),
            "dark_spots" => Ok(Metric::DarkSpots),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// User-facing concern tag. Each concern tracks exactly one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    Acne,
    Redness,
    Oiliness,
    #[serde(alias = "barrier")]
    Dryness,
    Texture,
    #[serde(alias = "pore_size")]
    Pores,
    DarkSpots,
}

impl Concern {
    /// Metric this concern is measured by
    #[inline]
    #[must_use]
    pub fn metric(self) -> Metric {
        match self {
            Concern::Acne => Metric::Acne,
            Concern::Redness => Metric::Redness,
            Concern::Oiliness => Metric::Oiliness,
            Concern::Dryness => Metric::Dryness,
            Concern::Texture => Metric::Texture,
            Concern::Pores => Metric::Pores,
            Concern::DarkSpots => Metric::DarkSpots,
        }
    }

    /// Concern raised by a metric
    #[inline]
    #[must_use]
    pub fn from_metric(metric: Metric) -> Self {
        match metric {
            Metric::Acne => Concern::Acne,
            Metric::Redness => Concern::Redness,
            Metric::Oiliness => Concern::Oiliness,
            Metric::Dryness => Concern::Dryness,
            Metric::Texture => Concern::Texture,
            Metric::Pores => Concern::Pores,
            Metric::DarkSpots => Concern::DarkSpots,
        }
    }
}

impl std::fmt::Display for Concern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.metric().as_str())
    }
}

impl FromStr for Concern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "barrier" {
            return Ok(Concern::Dryness);
        }
        Metric::from_str(s)
            .map(Concern::from_metric)
            .map_err(|_| format!("unknown concern: {s}"))
    }
}

/// Skin type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinType {
    Oily,
    Dry,
    Combination,
    Normal,
}

/// Self-reported or derived sensitivity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    Moderate,
    High,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity::Low
    }
}

/// Pass/fail image quality signal from the vision collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySignal {
    /// Collaborator asked for new photos
    pub retake_required: bool,
    /// Human-readable reasons (blurry, poor lighting, ...)
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl QualitySignal {
    /// Passing signal
    #[inline]
    #[must_use]
    pub fn pass() -> Self {
        Self::default()
    }

    /// Failing signal with reasons
    #[must_use]
    pub fn retake<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retake_required: true,
            reasons: reasons.into_iter().map(Into::into).collect(),
        }
    }
}

/// Unvalidated metric vector as produced by the vision collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricVector {
    /// Raw scores; may be out of range or incomplete
    pub scores: BTreeMap<Metric, f64>,
    /// Analysis confidence (0-100)
    pub confidence: f64,
    /// Image quality signal
    #[serde(default)]
    pub quality: QualitySignal,
    /// Capture time of the photos
    pub captured_at: DateTime<Utc>,
    /// Opaque narrative text from the collaborator
    #[serde(default)]
    pub summary: Option<String>,
}

/// Immutable per-scan severity vector
///
/// Scores and confidence are bounded to `[0, 100]` at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinMetricSet {
    scan_id: ScanId,
    scores: BTreeMap<Metric, f64>,
    confidence: f64,
    quality: QualitySignal,
    captured_at: DateTime<Utc>,
    overall_score: f64,
    summary: Option<String>,
}

impl SkinMetricSet {
    /// Build a metric set, clamping every value into `[0, 100]`
    ///
    /// Non-finite values are not rejected here; callers that accept
    /// untrusted input go through [`crate::normalizer::MetricNormalizer`].
    #[must_use]
    pub fn new(
        scan_id: ScanId,
        scores: BTreeMap<Metric, f64>,
        confidence: f64,
        quality: QualitySignal,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let scores: BTreeMap<Metric, f64> = scores
            .into_iter()
            .map(|(metric, value)| (metric, clamp_score(value)))
            .collect();
        let overall_score = overall_from(&scores);
        Self {
            scan_id,
            scores,
            confidence: clamp_score(confidence),
            quality,
            captured_at,
            overall_score,
            summary: None,
        }
    }

    /// Attach the collaborator's narrative summary (carried untouched)
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    /// Scan identifier
    #[inline]
    #[must_use]
    pub fn scan_id(&self) -> ScanId {
        self.scan_id
    }

    /// Severity for one metric, if measured
    #[inline]
    #[must_use]
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.scores.get(&metric).copied()
    }

    /// Severity, treating an unmeasured metric as 0
    #[inline]
    #[must_use]
    pub fn severity(&self, metric: Metric) -> f64 {
        self.score(metric).unwrap_or(0.0)
    }

    /// All measured scores
    #[inline]
    #[must_use]
    pub fn scores(&self) -> &BTreeMap<Metric, f64> {
        &self.scores
    }

    /// Analysis confidence (0-100)
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Quality signal
    #[inline]
    #[must_use]
    pub fn quality(&self) -> &QualitySignal {
        &self.quality
    }

    /// Capture timestamp
    #[inline]
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// `100 - mean(severity)`; higher is healthier
    #[inline]
    #[must_use]
    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    /// Opaque narrative summary
    #[inline]
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn overall_from(scores: &BTreeMap<Metric, f64>) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    let mean = scores.values().sum::<f64>() / scores.len() as f64;
    100.0 - mean
}

/// User-supplied context for one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinProfile {
    /// Skin type
    pub skin_type: SkinType,
    /// Sensitivity level
    #[serde(default)]
    pub sensitivity: Sensitivity,
    /// Selected concerns in declaration order
    #[serde(default)]
    pub concerns: Vec<Concern>,
    /// Concern that wins ingredient precedence
    pub primary_concern: Concern,
    /// Irritation reported or derived for this scan
    #[serde(default)]
    pub irritation_flag: bool,
}

impl SkinProfile {
    /// Create profile with a primary concern
    #[inline]
    #[must_use]
    pub fn new(skin_type: SkinType, primary_concern: Concern) -> Self {
        Self {
            skin_type,
            sensitivity: Sensitivity::Low,
            concerns: vec![primary_concern],
            primary_concern,
            irritation_flag: false,
        }
    }

    /// With sensitivity level
    #[inline]
    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// With additional declared concerns (appended in order)
    #[must_use]
    pub fn with_concerns(mut self, concerns: impl IntoIterator<Item = Concern>) -> Self {
        self.concerns.extend(concerns);
        self
    }

    /// With irritation flag
    #[inline]
    #[must_use]
    pub fn with_irritation(mut self, flag: bool) -> Self {
        self.irritation_flag = flag;
        self
    }

    /// Declaration position of a concern (`None` if not declared)
    #[must_use]
    pub fn declaration_index(&self, concern: Concern) -> Option<usize> {
        self.concerns.iter().position(|c| *c == concern)
    }

    /// Whether cadence should be moderated for this profile
    #[inline]
    #[must_use]
    pub fn needs_gentle_cadence(&self) -> bool {
        self.sensitivity == Sensitivity::High || self.irritation_flag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(Metric, f64)]) -> BTreeMap<Metric, f64> {
        values.iter().copied().collect()
    }

    #[test]
    fn metric_set_clamps_and_scores_overall() {
        let set = SkinMetricSet::new(
            ScanId::new(),
            scores(&[(Metric::Acne, 140.0), (Metric::Redness, -5.0), (Metric::Dryness, 40.0)]),
            120.0,
            QualitySignal::pass(),
            Utc::now(),
        );

        assert_eq!(set.score(Metric::Acne), Some(100.0));
        assert_eq!(set.score(Metric::Redness), Some(0.0));
        assert_eq!(set.confidence(), 100.0);
        assert!((set.overall_score() - (100.0 - 140.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn concern_parses_barrier_alias() {
        assert_eq!("barrier".parse::<Concern>().unwrap(), Concern::Dryness);
        assert_eq!("pore_size".parse::<Metric>().unwrap(), Metric::Pores);
        assert!("wrinkles".parse::<Concern>().is_err());
    }

    #[test]
    fn concern_serde_accepts_alias() {
        let c: Concern = serde_json::from_str("\"barrier\"").unwrap();
        assert_eq!(c, Concern::Dryness);
        assert_eq!(serde_json::to_string(&Metric::DarkSpots).unwrap(), "\"dark_spots\"");
    }

    #[test]
    fn gentle_cadence_for_high_sensitivity_or_irritation() {
        let base = SkinProfile::new(SkinType::Normal, Concern::Acne);
        assert!(!base.needs_gentle_cadence());
        assert!(base.clone().with_sensitivity(Sensitivity::High).needs_gentle_cadence());
        assert!(base.with_irritation(true).needs_gentle_cadence());
    }
}
