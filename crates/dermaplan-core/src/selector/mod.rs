//! Ingredient Selector
//!
//! Maps the primary concern and every metric at or above the severity
//! threshold to actives from the rule table, then adds skin-type and
//! sensitivity support. Output is not yet conflict-checked.
//!
//! Ranking of metric-driven concerns:
//! 1. severity, descending
//! 2. declared concerns before undeclared, in declaration order
//! 3. metric vocabulary order

pub mod rules;

use crate::config::SelectionConfig;
use crate::ingredient::{IngredientSelection, Role, SelectionSource};
use crate::plan::{Annotation, AnnotationAction, AnnotationReason};
use crate::types::{Concern, Metric, Sensitivity, SkinMetricSet, SkinProfile};
use rules::{rule_for, skin_type_support, Placement, SENSITIVE_SUPPORT};
use std::cmp::Ordering;

/// Selector output: raw selections plus annotations made while selecting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionOutcome {
    /// Selections in insertion order, deduplicated by ingredient
    pub selections: Vec<IngredientSelection>,
    /// Demotions made during selection
    pub annotations: Vec<Annotation>,
}

impl SelectionOutcome {
    fn push(&mut self, candidate: IngredientSelection) {
        match self
            .selections
            .iter_mut()
            .find(|s| s.ingredient == candidate.ingredient)
        {
            Some(existing) => {
                if candidate.role == Role::Primary && existing.role == Role::Supportive {
                    existing.role = Role::Primary;
                }
            }
            None => self.selections.push(candidate),
        }
    }
}

/// Rule-table selector
#[derive(Debug, Clone, Default)]
pub struct IngredientSelector {
    config: SelectionConfig,
}

impl IngredientSelector {
    /// Create selector
    #[inline]
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Metric-driven concerns in rank order, primary concern excluded
    #[must_use]
    pub fn ranked_concerns(&self, metrics: &SkinMetricSet, profile: &SkinProfile) -> Vec<(Concern, f64)> {
        let mut ranked: Vec<(Metric, f64)> = Metric::ALL
            .iter()
            .filter_map(|m| metrics.score(*m).map(|s| (*m, s)))
            .filter(|(m, s)| {
                *s >= self.config.severity_threshold && Concern::from_metric(*m) != profile.primary_concern
            })
            .collect();

        ranked.sort_by(|(ma, sa), (mb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let da = profile.declaration_index(Concern::from_metric(*ma)).unwrap_or(usize::MAX);
                    let db = profile.declaration_index(Concern::from_metric(*mb)).unwrap_or(usize::MAX);
                    da.cmp(&db)
                })
                .then_with(|| ma.vocabulary_index().cmp(&mb.vocabulary_index()))
        });

        ranked
            .into_iter()
            .take(self.config.max_metric_concerns)
            .map(|(m, s)| (Concern::from_metric(m), s))
            .collect()
    }

    /// Select ingredients for a scan and profile
    #[must_use]
    pub fn select(&self, metrics: &SkinMetricSet, profile: &SkinProfile) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::default();

        let primary_rule = rule_for(profile.primary_concern);
        let primary_active = primary_rule.active;
        outcome.push(selection(
            primary_active,
            Role::Primary,
            SelectionSource::PrimaryConcern {
                concern: profile.primary_concern,
            },
        ));
        if let Some(companion) = primary_rule.companion {
            outcome.push(selection(
                companion,
                Role::Supportive,
                SelectionSource::Companion {
                    concern: profile.primary_concern,
                },
            ));
        }

        for (concern, severity) in self.ranked_concerns(metrics, profile) {
            let rule = rule_for(concern);
            let source = SelectionSource::MetricSeverity {
                metric: concern.metric(),
                severity,
            };
            let contested = rule.active.slot == primary_active.slot
                && rule.active.ingredient != primary_active.ingredient;
            let role = if contested {
                tracing::debug!(
                    ingredient = %rule.active.ingredient,
                    slot = %rule.active.slot,
                    "metric-driven active demoted below primary concern"
                );
                outcome.annotations.push(
                    Annotation::new(
                        rule.active.ingredient,
                        AnnotationAction::Demoted,
                        AnnotationReason::PrimaryConcernPrecedence,
                        format!(
                            "{} yields the {} slot to {} for the primary concern",
                            rule.active.ingredient, rule.active.slot, primary_active.ingredient
                        ),
                    )
                    .with_counterpart(primary_active.ingredient),
                );
                Role::Supportive
            } else {
                Role::Primary
            };
            outcome.push(selection(rule.active, role, source));

            if let Some(companion) = rule.companion {
                outcome.push(selection(companion, Role::Supportive, SelectionSource::Companion { concern }));
            }
        }

        for placement in skin_type_support(profile.skin_type) {
            outcome.push(selection(
                *placement,
                Role::Supportive,
                SelectionSource::SkinType {
                    skin_type: profile.skin_type,
                },
            ));
        }
        if profile.sensitivity == Sensitivity::High {
            outcome.push(selection(SENSITIVE_SUPPORT, Role::Supportive, SelectionSource::Sensitivity));
        }

        tracing::debug!(
            primary = %profile.primary_concern,
            count = outcome.selections.len(),
            "ingredients selected"
        );
        outcome
    }
}

fn selection(placement: Placement, role: Role, source: SelectionSource) -> IngredientSelection {
    IngredientSelection::new(placement.ingredient, role, placement.slot, placement.frequency, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient::{Frequency, Ingredient, TimeSlot};
    use crate::types::{QualitySignal, ScanId, SkinType};
    use chrono::Utc;

    fn metrics(values: &[(Metric, f64)]) -> SkinMetricSet {
        SkinMetricSet::new(
            ScanId::new(),
            values.iter().copied().collect(),
            90.0,
            QualitySignal::pass(),
            Utc::now(),
        )
    }

    fn ingredients(outcome: &SelectionOutcome) -> Vec<Ingredient> {
        outcome.selections.iter().map(|s| s.ingredient).collect()
    }

    #[test]
    fn primary_concern_always_selected() {
        let set = metrics(&[(Metric::Acne, 10.0)]);
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne);
        let outcome = IngredientSelector::default().select(&set, &profile);
        let salicylic = outcome.selections[0];
        assert_eq!(salicylic.ingredient, Ingredient::SalicylicAcid);
        assert_eq!(salicylic.role, Role::Primary);
        assert_eq!(salicylic.frequency, Frequency::TwoToThreeWeekly);
    }

    #[test]
    fn takes_top_two_metric_concerns() {
        let set = metrics(&[
            (Metric::Acne, 20.0),
            (Metric::Redness, 80.0),
            (Metric::Oiliness, 60.0),
            (Metric::DarkSpots, 50.0),
        ]);
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne);
        let ranked = IngredientSelector::default().ranked_concerns(&set, &profile);
        assert_eq!(ranked, vec![(Concern::Redness, 80.0), (Concern::Oiliness, 60.0)]);
    }

    #[test]
    fn equal_severity_uses_declaration_then_vocabulary_order() {
        let set = metrics(&[(Metric::Redness, 60.0), (Metric::Texture, 60.0), (Metric::DarkSpots, 60.0)]);
        let profile =
            SkinProfile::new(SkinType::Normal, Concern::Acne).with_concerns([Concern::DarkSpots]);
        let ranked = IngredientSelector::default().ranked_concerns(&set, &profile);
        assert_eq!(ranked[0].0, Concern::DarkSpots);
        assert_eq!(ranked[1].0, Concern::Redness);
    }

    #[test]
    fn metric_active_in_primary_slot_is_demoted() {
        let set = metrics(&[(Metric::Acne, 70.0), (Metric::Texture, 65.0)]);
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne);
        let outcome = IngredientSelector::default().select(&set, &profile);

        let lactic = outcome
            .selections
            .iter()
            .find(|s| s.ingredient == Ingredient::LacticAcid)
            .unwrap();
        assert_eq!(lactic.role, Role::Supportive);
        assert_eq!(lactic.slot, TimeSlot::Pm);
        assert_eq!(outcome.annotations.len(), 1);
        assert_eq!(outcome.annotations[0].reason, AnnotationReason::PrimaryConcernPrecedence);
    }

    #[test]
    fn duplicates_keep_primary_role() {
        let set = metrics(&[(Metric::Dryness, 80.0)]);
        let profile = SkinProfile::new(SkinType::Combination, Concern::Dryness);
        let outcome = IngredientSelector::default().select(&set, &profile);
        let hyaluronic: Vec<_> = outcome
            .selections
            .iter()
            .filter(|s| s.ingredient == Ingredient::HyaluronicAcid)
            .collect();
        assert_eq!(hyaluronic.len(), 1);
        assert_eq!(hyaluronic[0].role, Role::Primary);
    }

    #[test]
    fn support_by_skin_type_and_sensitivity() {
        let set = metrics(&[(Metric::Redness, 30.0)]);
        let profile = SkinProfile::new(SkinType::Dry, Concern::Redness).with_sensitivity(Sensitivity::High);
        let outcome = IngredientSelector::default().select(&set, &profile);
        assert_eq!(
            ingredients(&outcome),
            vec![
                Ingredient::Niacinamide,
                Ingredient::Ceramides,
                Ingredient::Squalane,
                Ingredient::CentellaAsiatica
            ]
        );
    }
}
