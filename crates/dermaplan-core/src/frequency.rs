//! Frequency Adjuster
//!
//! Halves the cadence of every multi-weekly selection for sensitive or
//! irritated skin. Never removes a selection.

use crate::ingredient::IngredientSelection;
use crate::plan::{Annotation, AnnotationAction, AnnotationReason};
use crate::types::{Sensitivity, SkinProfile};

/// Moderate cadence in place; returns one annotation per change
pub fn moderate_frequencies(selections: &mut [IngredientSelection], profile: &SkinProfile) -> Vec<Annotation> {
    if !profile.needs_gentle_cadence() {
        return Vec::new();
    }
    let reason = if profile.sensitivity == Sensitivity::High {
        AnnotationReason::HighSensitivity
    } else {
        AnnotationReason::IrritationFlag
    };

    let mut annotations = Vec::new();
    for selection in selections
        .iter_mut()
        .filter(|s| s.frequency.is_multi_weekly())
    {
        let from = selection.frequency;
        selection.frequency = from.halved();
        tracing::debug!(
            ingredient = %selection.ingredient,
            %from,
            to = %selection.frequency,
            "frequency reduced"
        );
        annotations.push(Annotation::new(
            selection.ingredient,
            AnnotationAction::FrequencyReduced,
            reason,
            format!("{} reduced from {} to {}", selection.ingredient, from, selection.frequency),
        ));
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::{Frequency, Ingredient, Role, SelectionSource, TimeSlot};
    use crate::types::{Concern, SkinType};

    fn selection(ingredient: Ingredient, frequency: Frequency) -> IngredientSelection {
        IngredientSelection::new(
            ingredient,
            Role::Primary,
            TimeSlot::Pm,
            frequency,
            SelectionSource::PrimaryConcern { concern: Concern::Acne },
        )
    }

    #[test]
    fn high_sensitivity_halves_every_multi_weekly_selection() {
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne).with_sensitivity(Sensitivity::High);
        let mut selections = vec![
            selection(Ingredient::SalicylicAcid, Frequency::TwoToThreeWeekly),
            selection(Ingredient::VitaminC, Frequency::Daily),
            selection(Ingredient::HyaluronicAcid, Frequency::Daily),
            selection(Ingredient::ClayMask, Frequency::OnceWeekly),
        ];
        let notes = moderate_frequencies(&mut selections, &profile);

        assert_eq!(selections[0].frequency, Frequency::OnceWeekly);
        assert_eq!(selections[1].frequency, Frequency::ThreeWeekly);
        assert_eq!(selections[2].frequency, Frequency::ThreeWeekly);
        assert_eq!(selections[3].frequency, Frequency::OnceWeekly);
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|n| n.reason == AnnotationReason::HighSensitivity));
    }

    #[test]
    fn non_irritant_primary_is_slowed_too() {
        let profile = SkinProfile::new(SkinType::Dry, Concern::Redness).with_sensitivity(Sensitivity::High);
        let mut selections = vec![selection(Ingredient::Niacinamide, Frequency::Daily)];
        let notes = moderate_frequencies(&mut selections, &profile);

        assert_eq!(selections[0].frequency, Frequency::ThreeWeekly);
        assert_eq!(notes[0].ingredient, Some(Ingredient::Niacinamide));
        assert_eq!(notes[0].action, AnnotationAction::FrequencyReduced);
    }

    #[test]
    fn once_weekly_is_the_floor() {
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne).with_irritation(true);
        let mut selections = vec![selection(Ingredient::Retinoid, Frequency::OnceWeekly)];
        assert!(moderate_frequencies(&mut selections, &profile).is_empty());
        assert_eq!(selections[0].frequency, Frequency::OnceWeekly);
    }

    #[test]
    fn low_sensitivity_is_untouched() {
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne);
        let mut selections = vec![selection(Ingredient::SalicylicAcid, Frequency::TwoToThreeWeekly)];
        assert!(moderate_frequencies(&mut selections, &profile).is_empty());
        assert_eq!(selections[0].frequency, Frequency::TwoToThreeWeekly);
    }
}
