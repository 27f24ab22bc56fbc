//! Ingredient vocabulary and per-ingredient properties
//!
//! The properties here are fixed data consulted by every pipeline stage:
//! priority rank (conflict resolution), irritant class (frequency moderation),
//! viscosity rank (step ordering) and product category (assembly).

use crate::types::{Concern, Metric, SkinType};
use serde::{Deserialize, Serialize};

/// Active or supportive skincare compound
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ingredient {
    Retinoid,
    BenzoylPeroxide,
    SalicylicAcid,
    GlycolicAcid,
    LacticAcid,
    VitaminC,
    Niacinamide,
    Zinc,
    HyaluronicAcid,
    CentellaAsiatica,
    Ceramides,
    Panthenol,
    Squalane,
    ClayMask,
}

/// Coarse ingredient class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientClass {
    Retinoid,
    StrongAcid,
    BenzoylPeroxide,
    Antioxidant,
    OilControl,
    Hydrator,
    Soothing,
    Barrier,
    Mask,
}

/// Step category a routine step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Cleanser,
    Serum,
    Treatment,
    Cream,
    Oil,
    Moisturizer,
    Sunscreen,
    Exfoliant,
    Mask,
}

impl Ingredient {
    /// Ingredient class
    #[must_use]
    pub fn class(self) -> IngredientClass {
        use Ingredient::*;
        match self {
            Retinoid => IngredientClass::Retinoid,
            BenzoylPeroxide => IngredientClass::BenzoylPeroxide,
            SalicylicAcid | GlycolicAcid | LacticAcid => IngredientClass::StrongAcid,
            VitaminC => IngredientClass::Antioxidant,
            Niacinamide | Zinc => IngredientClass::OilControl,
            HyaluronicAcid => IngredientClass::Hydrator,
            CentellaAsiatica | Panthenol => IngredientClass::Soothing,
            Ceramides | Squalane => IngredientClass::Barrier,
            ClayMask => IngredientClass::Mask,
        }
    }

    /// Whether repeated application carries irritation risk
    #[inline]
    #[must_use]
    pub fn is_irritant(self) -> bool {
        matches!(
            self.class(),
            IngredientClass::Retinoid
                | IngredientClass::StrongAcid
                | IngredientClass::BenzoylPeroxide
                | IngredientClass::Antioxidant
        )
    }

    /// Fixed priority rank; lower wins a same-slot conflict.
    /// Retinoid outranks every other active.
    #[must_use]
    pub fn priority_rank(self) -> u8 {
        use Ingredient::*;
        match self {
            Retinoid => 0,
            BenzoylPeroxide => 1,
            SalicylicAcid => 2,
            GlycolicAcid => 3,
            LacticAcid => 4,
            VitaminC => 5,
            Niacinamide => 6,
            Zinc => 7,
            HyaluronicAcid => 8,
            CentellaAsiatica => 9,
            Ceramides => 10,
            Panthenol => 11,
            Squalane => 12,
            ClayMask => 13,
        }
    }

    /// Consistency rank, thinnest first (serum before cream before oil)
    #[must_use]
    pub fn viscosity_rank(self) -> u8 {
        use Ingredient::*;
        match self {
            VitaminC => 1,
            GlycolicAcid | LacticAcid => 2,
            HyaluronicAcid => 2,
            SalicylicAcid => 3,
            Niacinamide => 3,
            Zinc | CentellaAsiatica => 4,
            Retinoid => 5,
            BenzoylPeroxide => 6,
            Panthenol => 6,
            Ceramides => 7,
            Squalane => 8,
            ClayMask => 9,
        }
    }

    /// Product category for AM/PM steps
    #[must_use]
    pub fn product_type(self) -> ProductType {
        use Ingredient::*;
        match self {
            VitaminC | Niacinamide | Zinc | HyaluronicAcid | CentellaAsiatica => ProductType::Serum,
            Retinoid | BenzoylPeroxide | SalicylicAcid | GlycolicAcid | LacticAcid => {
                ProductType::Treatment
            }
            Ceramides | Panthenol => ProductType::Cream,
            Squalane => ProductType::Oil,
            ClayMask => ProductType::Mask,
        }
    }

    /// Product category when scheduled on the weekly slot
    #[must_use]
    pub fn weekly_product_type(self) -> ProductType {
        match self.class() {
            IngredientClass::StrongAcid => ProductType::Exfoliant,
            IngredientClass::Mask => ProductType::Mask,
            _ => self.product_type(),
        }
    }

    /// Minutes to wait after applying before the next step
    #[must_use]
    pub fn wait_minutes(self) -> u32 {
        match self.product_type() {
            ProductType::Treatment => 5,
            ProductType::Serum => 1,
            _ => 0,
        }
    }

    /// Display name
    #[must_use]
    pub fn display_name(self) -> &'static str {
        use Ingredient::*;
        match self {
            Retinoid => "Retinoid",
            BenzoylPeroxide => "Benzoyl peroxide",
            SalicylicAcid => "Salicylic acid (BHA)",
            GlycolicAcid => "Glycolic acid (AHA)",
            LacticAcid => "Lactic acid (AHA)",
            VitaminC => "Vitamin C",
            Niacinamide => "Niacinamide",
            Zinc => "Zinc",
            HyaluronicAcid => "Hyaluronic acid",
            CentellaAsiatica => "Centella asiatica",
            Ceramides => "Ceramides",
            Panthenol => "Panthenol",
            Squalane => "Squalane",
            ClayMask => "Clay mask",
        }
    }

    /// Application guidance used in step instructions
    #[must_use]
    pub fn usage(self) -> &'static str {
        use Ingredient::*;
        match self {
            Retinoid => "Apply a pea-sized amount to dry skin; build up slowly.",
            BenzoylPeroxide => "Apply a thin layer to breakout-prone areas only.",
            SalicylicAcid => "Apply to oily or congested areas to unclog pores.",
            GlycolicAcid | LacticAcid => "Apply evenly, avoiding the eye area.",
            VitaminC => "Apply a few drops before moisturizer for antioxidant protection.",
            Niacinamide => "Apply a few drops to calm redness and balance oil.",
            Zinc => "Apply to the T-zone to regulate oil.",
            HyaluronicAcid => "Apply to slightly damp skin to draw in hydration.",
            CentellaAsiatica => "Pat gently onto irritated areas to soothe.",
            Ceramides => "Apply to support and repair the skin barrier.",
            Panthenol => "Apply to dry patches to soothe and hydrate.",
            Squalane => "Press a few drops in to lock in moisture.",
            ClayMask => "Apply a thin layer, leave for 10 minutes, rinse with lukewarm water.",
        }
    }
}

impl std::fmt::Display for Ingredient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Role of an ingredient within a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primary,
    Supportive,
}

/// Time-of-day slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "weekly")]
    Weekly,
}

impl TimeSlot {
    /// Every slot in schedule order
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Am, TimeSlot::Pm, TimeSlot::Weekly];
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeSlot::Am => "AM",
            TimeSlot::Pm => "PM",
            TimeSlot::Weekly => "weekly",
        })
    }
}

/// Application cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "1x/week")]
    OnceWeekly,
    #[serde(rename = "2-3x/week")]
    TwoToThreeWeekly,
    #[serde(rename = "3x/week")]
    ThreeWeekly,
    #[serde(rename = "daily")]
    Daily,
}

impl Frequency {
    /// Applied more than once a week
    #[inline]
    #[must_use]
    pub fn is_multi_weekly(self) -> bool {
        self != Frequency::OnceWeekly
    }

    /// Cadence halved, never below once a week
    #[must_use]
    pub fn halved(self) -> Self {
        match self {
            Frequency::Daily => Frequency::ThreeWeekly,
            Frequency::ThreeWeekly | Frequency::TwoToThreeWeekly | Frequency::OnceWeekly => {
                Frequency::OnceWeekly
            }
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::ThreeWeekly => "3x/week",
            Frequency::TwoToThreeWeekly => "2-3x/week",
            Frequency::OnceWeekly => "1x/week",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an ingredient was selected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionSource {
    /// The user's declared primary concern
    PrimaryConcern { concern: Concern },
    /// A metric above the severity threshold
    MetricSeverity { metric: Metric, severity: f64 },
    /// Companion ingredient of a concern rule
    Companion { concern: Concern },
    /// Secondary table keyed by skin type
    SkinType { skin_type: SkinType },
    /// Soothing support for sensitive skin
    Sensitivity,
    /// Minimal safe routine after an unresolvable conflict
    Fallback,
}

/// One ingredient scheduled in a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngredientSelection {
    /// Ingredient
    pub ingredient: Ingredient,
    /// Primary or supportive
    pub role: Role,
    /// Time slot
    pub slot: TimeSlot,
    /// Cadence
    pub frequency: Frequency,
    /// Selection provenance
    pub source: SelectionSource,
}

impl IngredientSelection {
    /// Create selection
    #[inline]
    #[must_use]
    pub fn new(
        ingredient: Ingredient,
        role: Role,
        slot: TimeSlot,
        frequency: Frequency,
        source: SelectionSource,
    ) -> Self {
        Self {
            ingredient,
            role,
            slot,
            frequency,
            source,
        }
    }

    /// Sort key for same-slot precedence: primary role first, then the
    /// ingredient's fixed rank
    #[inline]
    #[must_use]
    pub fn precedence(&self) -> (u8, u8) {
        let role = match self.role {
            Role::Primary => 0,
            Role::Supportive => 1,
        };
        (role, self.ingredient.priority_rank())
    }
}
