//! Selection rule tables
//!
//! Data only: which ingredient answers which concern, and which supportive
//! ingredients each skin type receives.

use crate::ingredient::{Frequency, Ingredient, TimeSlot};
use crate::types::{Concern, SkinType};

/// Ingredient placement proposed by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Ingredient
    pub ingredient: Ingredient,
    /// Slot
    pub slot: TimeSlot,
    /// Starting cadence
    pub frequency: Frequency,
}

const fn place(ingredient: Ingredient, slot: TimeSlot, frequency: Frequency) -> Placement {
    Placement {
        ingredient,
        slot,
        frequency,
    }
}

/// Concern → active ingredient rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcernRule {
    /// Concern the rule answers
    pub concern: Concern,
    /// Active for the concern
    pub active: Placement,
    /// Supportive companion, if the concern calls for one
    pub companion: Option<Placement>,
}

/// Concern → ingredient rule table
pub static CONCERN_RULES: [ConcernRule; 7] = [
    ConcernRule {
        concern: Concern::Acne,
        active: place(Ingredient::SalicylicAcid, TimeSlot::Pm, Frequency::TwoToThreeWeekly),
        companion: None,
    },
    ConcernRule {
        concern: Concern::Redness,
        active: place(Ingredient::Niacinamide, TimeSlot::Am, Frequency::Daily),
        companion: None,
    },
    ConcernRule {
        concern: Concern::Oiliness,
        active: place(Ingredient::Zinc, TimeSlot::Am, Frequency::Daily),
        companion: None,
    },
    ConcernRule {
        concern: Concern::Dryness,
        active: place(Ingredient::HyaluronicAcid, TimeSlot::Am, Frequency::Daily),
        companion: Some(place(Ingredient::Ceramides, TimeSlot::Pm, Frequency::Daily)),
    },
    ConcernRule {
        concern: Concern::Texture,
        active: place(Ingredient::LacticAcid, TimeSlot::Pm, Frequency::TwoToThreeWeekly),
        companion: None,
    },
    ConcernRule {
        concern: Concern::Pores,
        active: place(Ingredient::Retinoid, TimeSlot::Pm, Frequency::TwoToThreeWeekly),
        companion: None,
    },
    ConcernRule {
        concern: Concern::DarkSpots,
        active: place(Ingredient::VitaminC, TimeSlot::Am, Frequency::Daily),
        companion: None,
    },
];

/// Rule for a concern
#[must_use]
pub fn rule_for(concern: Concern) -> &'static ConcernRule {
    // Table is keyed by every Concern variant; see `every_concern_has_a_rule`.
    CONCERN_RULES
        .iter()
        .find(|rule| rule.concern == concern)
        .unwrap_or(&CONCERN_RULES[0])
}

static DRY_SUPPORT: [Placement; 2] = [
    place(Ingredient::Ceramides, TimeSlot::Pm, Frequency::Daily),
    place(Ingredient::Squalane, TimeSlot::Pm, Frequency::Daily),
];
static OILY_SUPPORT: [Placement; 1] = [place(Ingredient::ClayMask, TimeSlot::Weekly, Frequency::OnceWeekly)];
static BALANCED_SUPPORT: [Placement; 1] =
    [place(Ingredient::HyaluronicAcid, TimeSlot::Am, Frequency::Daily)];

/// Supportive ingredients by skin type
#[must_use]
pub fn skin_type_support(skin_type: SkinType) -> &'static [Placement] {
    match skin_type {
        SkinType::Dry => &DRY_SUPPORT,
        SkinType::Oily => &OILY_SUPPORT,
        SkinType::Combination | SkinType::Normal => &BALANCED_SUPPORT,
    }
}

/// Soothing support added for high sensitivity
pub const SENSITIVE_SUPPORT: Placement =
    place(Ingredient::CentellaAsiatica, TimeSlot::Am, Frequency::Daily);
