//! Profile derivation from a scan and the onboarding questionnaire

use crate::types::{Concern, Metric, Sensitivity, SkinMetricSet, SkinProfile, SkinType};
use serde::{Deserialize, Serialize};

const MAX_CONCERNS: usize = 4;

/// Self-reported breakout frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakoutFrequency {
    Never,
    #[default]
    Sometimes,
    Often,
}

/// Onboarding questionnaire answers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Questionnaire {
    /// User reports sensitive skin
    pub sensitive: bool,
    /// Skin feels tight after washing
    pub tight_after_washing: bool,
    pub breakout_frequency: BreakoutFrequency,
    /// Concern the user cares about most
    pub priority: Option<Concern>,
}

/// Derived irritation risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrritationRisk {
    Low,
    Medium,
    High,
}

/// Irritation risk from the scan and self-reported sensitivity
#[must_use]
pub fn irritation_risk(metrics: &SkinMetricSet, sensitive: bool) -> IrritationRisk {
    let redness = metrics.severity(Metric::Redness);
    let dryness = metrics.severity(Metric::Dryness);
    if sensitive && (redness >= 60.0 || dryness >= 60.0) {
        IrritationRisk::High
    } else if sensitive || redness >= 60.0 {
        IrritationRisk::Medium
    } else {
        IrritationRisk::Low
    }
}

/// Skin type from oiliness and dryness
#[must_use]
pub fn skin_type(metrics: &SkinMetricSet) -> SkinType {
    let oiliness = metrics.severity(Metric::Oiliness);
    let dryness = metrics.severity(Metric::Dryness);
    if oiliness >= 60.0 && dryness < 50.0 {
        SkinType::Oily
    } else if dryness >= 60.0 && oiliness < 50.0 {
        SkinType::Dry
    } else if oiliness >= 55.0 && dryness >= 55.0 {
        SkinType::Combination
    } else {
        SkinType::Normal
    }
}

/// Build a [`SkinProfile`] for a scan
///
/// The priority concern goes first; without one, the first derived concern
/// is used, and failing that the most severe metric.
#[must_use]
pub fn derive_profile(metrics: &SkinMetricSet, answers: &Questionnaire) -> SkinProfile {
    let mut concerns = Vec::new();
    if metrics.severity(Metric::Acne) >= 55.0 || answers.breakout_frequency == BreakoutFrequency::Often {
        concerns.push(Concern::Acne);
    }
    if metrics.severity(Metric::Redness) >= 55.0 {
        concerns.push(Concern::Redness);
    }
    if metrics.severity(Metric::Dryness) >= 55.0 || answers.tight_after_washing {
        concerns.push(Concern::Dryness);
    }
    if metrics.severity(Metric::Texture) >= 55.0 {
        concerns.push(Concern::Texture);
    }

    let primary = answers
        .priority
        .or_else(|| concerns.first().copied())
        .unwrap_or_else(|| most_severe(metrics));
    concerns.retain(|c| *c != primary);
    concerns.insert(0, primary);
    concerns.truncate(MAX_CONCERNS);

    let risk = irritation_risk(metrics, answers.sensitive);
    let sensitivity = match risk {
        IrritationRisk::Low => Sensitivity::Low,
        IrritationRisk::Medium => Sensitivity::Moderate,
        IrritationRisk::High => Sensitivity::High,
    };

    SkinProfile {
        skin_type: skin_type(metrics),
        sensitivity,
        concerns,
        primary_concern: primary,
        irritation_flag: risk == IrritationRisk::High,
    }
}

fn most_severe(metrics: &SkinMetricSet) -> Concern {
    Metric::ALL
        .iter()
        .copied()
        .fold(None::<(Metric, f64)>, |best, m| match (best, metrics.score(m)) {
            (Some((_, b)), Some(s)) if s > b => Some((m, s)),
            (None, Some(s)) => Some((m, s)),
            (best, _) => best,
        })
        .map_or(Concern::Acne, |(m, _)| Concern::from_metric(m))
}
