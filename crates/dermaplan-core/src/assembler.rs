//! Routine Assembler
//!
//! Skeleton per slot: cleanse, treatments (thin to thick), moisturize, and in
//! the morning protect. The moisturizer takes its place in the same viscosity
//! order, so anything thicker (oils) follows it. Weekly steps carry no skeleton.

use crate::ingredient::{Frequency, IngredientSelection, ProductType, TimeSlot};
use crate::plan::RoutineStep;
use crate::types::Concern;
use serde::{Deserialize, Serialize};

/// Assembled step lists
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssembledRoutine {
    pub am: Vec<RoutineStep>,
    pub pm: Vec<RoutineStep>,
    pub weekly: Vec<RoutineStep>,
}

const SUNSCREEN: &str = "Apply broad-spectrum SPF 30+ sunscreen. Reapply every 2 hours if outdoors.";

/// Viscosity rank of the skeleton moisturizer (cream consistency)
pub const MOISTURIZER_VISCOSITY_RANK: u8 = 7;

/// Assemble ordered steps from final selections
#[must_use]
pub fn assemble(selections: &[IngredientSelection], primary_concern: Concern) -> AssembledRoutine {
    let mut am = daily(selections, TimeSlot::Am, primary_concern);
    am.push(skeleton(ProductType::Sunscreen, SUNSCREEN));
    let pm = daily(selections, TimeSlot::Pm, primary_concern);
    let weekly = treatments(selections, TimeSlot::Weekly);

    AssembledRoutine {
        am: numbered(am),
        pm: numbered(pm),
        weekly: numbered(weekly),
    }
}

/// Cleanse, then treatments and moisturizer merged thin to thick
fn daily(selections: &[IngredientSelection], slot: TimeSlot, primary_concern: Concern) -> Vec<RoutineStep> {
    let (thinner, thicker): (Vec<RoutineStep>, Vec<RoutineStep>) = treatments(selections, slot)
        .into_iter()
        .partition(|step| step.ingredient.map_or(true, |i| i.viscosity_rank() <= MOISTURIZER_VISCOSITY_RANK));

    let mut steps = vec![skeleton(ProductType::Cleanser, cleanser_instructions(primary_concern))];
    steps.extend(thinner);
    steps.push(skeleton(ProductType::Moisturizer, moisturizer_instructions(primary_concern, slot)));
    steps.extend(thicker);
    steps
}

fn treatments(selections: &[IngredientSelection], slot: TimeSlot) -> Vec<RoutineStep> {
    let mut chosen: Vec<&IngredientSelection> = selections.iter().filter(|s| s.slot == slot).collect();
    chosen.sort_by_key(|s| (s.ingredient.viscosity_rank(), s.ingredient.priority_rank()));
    chosen
        .into_iter()
        .map(|s| {
            let product_type = if slot == TimeSlot::Weekly {
                s.ingredient.weekly_product_type()
            } else {
                s.ingredient.product_type()
            };
            RoutineStep {
                order: 0,
                product_type,
                instructions: format!("{}: {}", s.ingredient.display_name(), s.ingredient.usage()),
                ingredient: Some(s.ingredient),
                frequency: s.frequency,
                wait_minutes: s.ingredient.wait_minutes(),
            }
        })
        .collect()
}

fn skeleton(product_type: ProductType, instructions: &str) -> RoutineStep {
    RoutineStep {
        order: 0,
        product_type,
        instructions: instructions.to_string(),
        ingredient: None,
        frequency: Frequency::Daily,
        wait_minutes: 0,
    }
}

fn numbered(mut steps: Vec<RoutineStep>) -> Vec<RoutineStep> {
    for (step, order) in steps.iter_mut().zip(1u32..) {
        step.order = order;
    }
    steps
}

fn cleanser_instructions(concern: Concern) -> &'static str {
    match concern {
        Concern::Acne => "Use a gentle salicylic acid cleanser. Massage for 30 seconds, rinse with lukewarm water.",
        Concern::Redness => "Use a gentle, fragrance-free cream cleanser. Avoid hot water and harsh scrubbing.",
        Concern::Dryness => "Use a hydrating, non-foaming cleanser. Pat skin dry instead of rubbing.",
        Concern::Oiliness | Concern::Pores => {
            "Use a gel-based or foaming cleanser to remove excess oil without stripping."
        }
        Concern::Texture | Concern::DarkSpots => "Use a gentle, low-pH cleanser and rinse with lukewarm water.",
    }
}

fn moisturizer_instructions(concern: Concern, slot: TimeSlot) -> &'static str {
    match (concern, slot) {
        (Concern::Dryness, TimeSlot::Pm) => "Apply a rich, emollient moisturizer; use a generous amount overnight.",
        (Concern::Dryness, _) => "Apply a rich, emollient moisturizer.",
        (Concern::Oiliness, _) => "Apply a lightweight, oil-free gel moisturizer.",
        _ => "Apply a moisturizer appropriate for your skin type.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::{Ingredient, Role, SelectionSource};

    fn selection(ingredient: Ingredient, slot: TimeSlot) -> IngredientSelection {
        IngredientSelection::new(
            ingredient,
            Role::Supportive,
            slot,
            Frequency::Daily,
            SelectionSource::Fallback,
        )
    }

    #[test]
    fn empty_selection_still_cleanses_and_protects() {
        let routine = assemble(&[], Concern::Texture);
        assert_eq!(routine.am.first().unwrap().product_type, ProductType::Cleanser);
        assert_eq!(routine.am.last().unwrap().product_type, ProductType::Sunscreen);
        assert_eq!(routine.pm.len(), 2);
        assert!(routine.weekly.is_empty());
    }

    #[test]
    fn treatments_sorted_thin_to_thick() {
        let selections = [
            selection(Ingredient::Squalane, TimeSlot::Pm),
            selection(Ingredient::Retinoid, TimeSlot::Pm),
            selection(Ingredient::Ceramides, TimeSlot::Pm),
        ];
        let routine = assemble(&selections, Concern::Pores);
        let order: Vec<_> = routine.pm.iter().filter_map(|s| s.ingredient).collect();
        assert_eq!(order, vec![Ingredient::Retinoid, Ingredient::Ceramides, Ingredient::Squalane]);
    }

    #[test]
    fn oil_follows_the_moisturizer() {
        let selections = [
            selection(Ingredient::Squalane, TimeSlot::Pm),
            selection(Ingredient::Niacinamide, TimeSlot::Pm),
        ];
        let routine = assemble(&selections, Concern::Dryness);
        let types: Vec<ProductType> = routine.pm.iter().map(|s| s.product_type).collect();
        assert_eq!(
            types,
            vec![ProductType::Cleanser, ProductType::Serum, ProductType::Moisturizer, ProductType::Oil]
        );

        let am = assemble(&[selection(Ingredient::Squalane, TimeSlot::Am)], Concern::Dryness).am;
        let types: Vec<ProductType> = am.iter().map(|s| s.product_type).collect();
        assert_eq!(
            types,
            vec![ProductType::Cleanser, ProductType::Moisturizer, ProductType::Oil, ProductType::Sunscreen]
        );
    }

    #[test]
    fn orders_are_one_based_and_contiguous() {
        let selections = [
            selection(Ingredient::VitaminC, TimeSlot::Am),
            selection(Ingredient::Niacinamide, TimeSlot::Am),
        ];
        let routine = assemble(&selections, Concern::DarkSpots);
        let orders: Vec<u32> = routine.am.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert_eq!(routine.am[1].ingredient, Some(Ingredient::VitaminC));
    }

    #[test]
    fn weekly_acid_becomes_exfoliant() {
        let routine = assemble(&[selection(Ingredient::LacticAcid, TimeSlot::Weekly)], Concern::Texture);
        assert_eq!(routine.weekly[0].product_type, ProductType::Exfoliant);
        assert_eq!(routine.weekly[0].order, 1);
    }
}
