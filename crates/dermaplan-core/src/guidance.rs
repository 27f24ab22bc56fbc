//! Plan guidance: introduction ramp, combinations to avoid, warnings

use crate::types::{Sensitivity, SkinProfile};
use serde::{Deserialize, Serialize};

/// Shown on every plan
pub const IRRITATION_WARNING: &str =
    "Discontinue if you experience severe irritation or allergic reactions.";

/// Shown on every plan
pub const DISCLAIMER: &str =
    "Not medical advice. If severe, painful, or worsening symptoms occur, consult a dermatologist.";

/// Instruction for one week of the introduction ramp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampWeek {
    /// 1-based week number
    pub week: u8,
    /// What to do that week
    pub instruction: String,
}

/// Combination or habit to avoid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidItem {
    /// What to avoid
    pub combo: String,
    /// Why
    pub why: String,
}

impl AvoidItem {
    fn new(combo: &str, why: &str) -> Self {
        Self {
            combo: combo.to_string(),
            why: why.to_string(),
        }
    }
}

/// User-facing guidance attached to a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGuidance {
    /// Four-week introduction ramp
    pub ramp: Vec<RampWeek>,
    /// Combinations to avoid
    pub avoid: Vec<AvoidItem>,
    /// Stop-use warning
    pub warning: String,
    /// Not-medical-advice disclaimer
    pub disclaimer: String,
}

impl PlanGuidance {
    /// Ramp instruction for a given week (weeks past the ramp use the last entry)
    #[must_use]
    pub fn instruction_for_week(&self, week: i64) -> Option<&str> {
        let week = u8::try_from(week.max(1)).unwrap_or(u8::MAX);
        self.ramp
            .iter()
            .rev()
            .find(|w| w.week <= week)
            .map(|w| w.instruction.as_str())
    }
}

/// Build guidance for a profile
#[must_use]
pub fn build_guidance(profile: &SkinProfile) -> PlanGuidance {
    let ramp = [
        "Stick to gentle cleanser, moisturizer and sunscreen. If an active exists, use it 2 nights only.",
        "If no irritation, increase the active to 3 nights per week.",
        "Maintain the schedule. Do not add new actives yet.",
        "Re-scan and adjust only if metrics improved or irritation is present.",
    ]
    .iter()
    .zip(1u8..)
    .map(|(instruction, week)| RampWeek {
        week,
        instruction: (*instruction).to_string(),
    })
    .collect();

    let mut avoid = vec![
        AvoidItem::new(
            "stacking multiple strong actives",
            "Increases irritation risk, especially early.",
        ),
        AvoidItem::new(
            "introducing new products every few days",
            "Hard to identify what causes irritation.",
        ),
    ];
    if profile.irritation_flag || profile.sensitivity >= Sensitivity::Moderate {
        avoid.push(AvoidItem::new(
            "retinoids/strong acids early",
            "Higher sensitivity signals detected.",
        ));
    }

    PlanGuidance {
        ramp,
        avoid,
        warning: IRRITATION_WARNING.to_string(),
        disclaimer: DISCLAIMER.to_string(),
    }
}
