//! Conflict Resolver
//!
//! Conflict rules are an undirected edge set over ingredients, checked by
//! membership. Within each slot ingredients are kept greedily in precedence
//! order; a loser is retimed to the weekly slot when it fits there, and
//! dropped otherwise. Every retime and drop is annotated, and running the
//! resolver on its own output changes nothing.

use crate::config::ConflictConfig;
use crate::error::EngineError;
use crate::ingredient::{Frequency, Ingredient, IngredientSelection, Role, SelectionSource, TimeSlot};
use crate::plan::{Annotation, AnnotationAction, AnnotationReason};
use std::collections::BTreeSet;

/// Declared conflict pairs
pub const DEFAULT_CONFLICTS: [(Ingredient, Ingredient); 11] = [
    (Ingredient::Retinoid, Ingredient::SalicylicAcid),
    (Ingredient::Retinoid, Ingredient::GlycolicAcid),
    (Ingredient::Retinoid, Ingredient::LacticAcid),
    (Ingredient::Retinoid, Ingredient::BenzoylPeroxide),
    (Ingredient::Retinoid, Ingredient::VitaminC),
    (Ingredient::SalicylicAcid, Ingredient::GlycolicAcid),
    (Ingredient::SalicylicAcid, Ingredient::LacticAcid),
    (Ingredient::GlycolicAcid, Ingredient::LacticAcid),
    (Ingredient::VitaminC, Ingredient::GlycolicAcid),
    (Ingredient::VitaminC, Ingredient::LacticAcid),
    (Ingredient::BenzoylPeroxide, Ingredient::VitaminC),
];

/// Symmetric conflict table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictTable {
    edges: BTreeSet<(Ingredient, Ingredient)>,
}

impl ConflictTable {
    /// Build from pairs; order within a pair is irrelevant
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Ingredient, Ingredient)>) -> Self {
        let edges = pairs
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| edge(a, b))
            .collect();
        Self { edges }
    }

    /// Whether `a` and `b` must not share a slot
    #[inline]
    #[must_use]
    pub fn conflicts(&self, a: Ingredient, b: Ingredient) -> bool {
        self.edges.contains(&edge(a, b))
    }

    /// Number of declared pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// No pairs declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every conflicting pair sharing a slot
    #[must_use]
    pub fn violations(&self, selections: &[IngredientSelection]) -> Vec<(TimeSlot, Ingredient, Ingredient)> {
        let mut found = Vec::new();
        for (i, a) in selections.iter().enumerate() {
            for b in &selections[i + 1..] {
                if a.slot == b.slot && self.conflicts(a.ingredient, b.ingredient) {
                    found.push((a.slot, a.ingredient, b.ingredient));
                }
            }
        }
        found
    }
}

impl Default for ConflictTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_CONFLICTS)
    }
}

fn edge(a: Ingredient, b: Ingredient) -> (Ingredient, Ingredient) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Resolver output
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    /// Conflict-free selections, input order preserved
    pub selections: Vec<IngredientSelection>,
    /// One annotation per retime or drop
    pub annotations: Vec<Annotation>,
}

/// Greedy per-slot conflict resolver
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    table: ConflictTable,
    config: ConflictConfig,
}

impl ConflictResolver {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new(table: ConflictTable, config: ConflictConfig) -> Self {
        Self { table, config }
    }

    /// Conflict table in use
    #[inline]
    #[must_use]
    pub fn table(&self) -> &ConflictTable {
        &self.table
    }

    /// Resolve conflicts, then verify the result
    pub fn resolve(&self, selections: Vec<IngredientSelection>) -> Result<Resolution, EngineError> {
        let mut slots: Vec<Option<IngredientSelection>> = selections.into_iter().map(Some).collect();
        let mut annotations = Vec::new();
        let mut weekly: Vec<Ingredient> = Vec::new();

        // Weekly occupants first, so retimes see the real weekly load.
        for index in self.by_precedence(&slots, TimeSlot::Weekly) {
            let Some(candidate) = slots[index] else { continue };
            match weekly.iter().copied().find(|k| self.table.conflicts(*k, candidate.ingredient)) {
                Some(winner) => {
                    tracing::info!(ingredient = %candidate.ingredient, %winner, "weekly conflict, dropped");
                    annotations.push(
                        Annotation::new(
                            candidate.ingredient,
                            AnnotationAction::Dropped,
                            AnnotationReason::WeeklyConflict,
                            format!("{} conflicts with {} in the weekly slot", candidate.ingredient, winner),
                        )
                        .with_counterpart(winner),
                    );
                    slots[index] = None;
                }
                None => weekly.push(candidate.ingredient),
            }
        }

        for slot in [TimeSlot::Am, TimeSlot::Pm] {
            let mut kept: Vec<Ingredient> = Vec::new();
            for index in self.by_precedence(&slots, slot) {
                let Some(candidate) = slots[index] else { continue };
                let Some(winner) = kept.iter().copied().find(|k| self.table.conflicts(*k, candidate.ingredient))
                else {
                    kept.push(candidate.ingredient);
                    continue;
                };

                let weekly_clash = weekly.iter().copied().find(|w| self.table.conflicts(*w, candidate.ingredient));
                let has_room = weekly.len() < self.config.weekly_capacity;

                if has_room && weekly_clash.is_none() {
                    let frequency = candidate.frequency.min(Frequency::TwoToThreeWeekly);
                    tracing::info!(
                        ingredient = %candidate.ingredient,
                        %winner,
                        from = %slot,
                        "conflict resolved by retiming to weekly"
                    );
                    annotations.push(
                        Annotation::new(
                            candidate.ingredient,
                            AnnotationAction::Retimed,
                            AnnotationReason::ConflictPair,
                            format!(
                                "{} conflicts with {} in {}; moved to alternate nights",
                                candidate.ingredient, winner, slot
                            ),
                        )
                        .with_counterpart(winner),
                    );
                    weekly.push(candidate.ingredient);
                    slots[index] = Some(IngredientSelection {
                        slot: TimeSlot::Weekly,
                        frequency,
                        ..candidate
                    });
                } else {
                    let reason = if has_room {
                        AnnotationReason::WeeklyConflict
                    } else {
                        AnnotationReason::WeeklySlotFull
                    };
                    tracing::info!(
                        ingredient = %candidate.ingredient,
                        %winner,
                        ?reason,
                        "conflict resolved by dropping"
                    );
                    annotations.push(
                        Annotation::new(
                            candidate.ingredient,
                            AnnotationAction::Dropped,
                            reason,
                            format!(
                                "{} conflicts with {} in {} and cannot move to alternate nights",
                                candidate.ingredient, winner, slot
                            ),
                        )
                        .with_counterpart(winner),
                    );
                    slots[index] = None;
                }
            }
        }

        let selections: Vec<IngredientSelection> = slots.into_iter().flatten().collect();
        self.verify(&selections)?;
        Ok(Resolution {
            selections,
            annotations,
        })
    }

    /// Post-check: no slot holds a conflicting pair
    pub fn verify(&self, selections: &[IngredientSelection]) -> Result<(), EngineError> {
        match self.table.violations(selections).first() {
            None => Ok(()),
            Some((slot, a, b)) => Err(EngineError::ConflictUnresolvable(format!(
                "{a} and {b} both scheduled in {slot}"
            ))),
        }
    }

    /// Minimal safe routine: non-irritant supportive ingredients that do not
    /// conflict with one another
    #[must_use]
    pub fn minimal_safe_routine(&self, selections: &[IngredientSelection], cause: &str) -> Resolution {
        let mut kept: Vec<IngredientSelection> = Vec::new();
        for candidate in selections.iter().filter(|s| !s.ingredient.is_irritant()) {
            let clash = kept
                .iter()
                .any(|k| k.slot == candidate.slot && self.table.conflicts(k.ingredient, candidate.ingredient));
            if !clash {
                kept.push(IngredientSelection {
                    role: Role::Supportive,
                    source: SelectionSource::Fallback,
                    ..*candidate
                });
            }
        }
        tracing::warn!(cause, kept = kept.len(), "falling back to minimal safe routine");
        Resolution {
            selections: kept,
            annotations: vec![Annotation::plan_wide(
                AnnotationAction::FallbackApplied,
                AnnotationReason::ConflictUnresolvable,
                format!("minimal safe routine applied: {cause}"),
            )],
        }
    }

    fn by_precedence(&self, slots: &[Option<IngredientSelection>], slot: TimeSlot) -> Vec<usize> {
        let mut indices: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.filter(|s| s.slot == slot).map(|_| i))
            .collect();
        indices.sort_by_key(|i| slots[*i].map(|s| s.precedence()));
        indices
    }
}
