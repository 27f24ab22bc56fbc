//! Plan Lock Manager
//!
//! Owns every status change of a plan. Transitions are checked against
//! [`crate::state_machine`]; trigger evaluation decides when an `ACTIVE` plan
//! opens up for revision.

use crate::config::{LockConfig, TriggerConfig};
use crate::error::{EngineError, TransitionError};
use crate::plan::{AdjustmentTrigger, PlanStatus, RoutinePlan};
use crate::progress::ScoreDelta;
use crate::state_machine::validate_transition;
use chrono::NaiveDate;

/// Lifecycle governor for plans
#[derive(Debug, Clone, Default)]
pub struct PlanLockManager {
    lock: LockConfig,
    triggers: TriggerConfig,
}

impl PlanLockManager {
    /// Create lock manager
    #[inline]
    #[must_use]
    pub fn new(lock: LockConfig, triggers: TriggerConfig) -> Self {
        Self { lock, triggers }
    }

    /// Lock settings
    #[inline]
    #[must_use]
    pub fn lock_config(&self) -> &LockConfig {
        &self.lock
    }

    /// Requested lock duration, or the default; must lie in the bound
    pub fn lock_duration(&self, requested: Option<u32>) -> Result<u32, EngineError> {
        let days = requested.unwrap_or(self.lock.default_days);
        if self.lock.contains(days) {
            Ok(days)
        } else {
            Err(EngineError::validation(format!(
                "lock duration {days} outside [{}, {}]",
                self.lock.min_days, self.lock.max_days
            )))
        }
    }

    /// First delta worsening past the severe-irritation threshold
    #[must_use]
    pub fn severe_irritation<'a>(&self, deltas: &'a [ScoreDelta]) -> Option<&'a ScoreDelta> {
        deltas
            .iter()
            .find(|d| d.percent_change.is_some_and(|p| p > self.triggers.severe_irritation_percent))
    }

    /// Primary-concern delta worsening past the decline threshold
    #[must_use]
    pub fn primary_decline<'a>(&self, plan: &RoutinePlan, deltas: &'a [ScoreDelta]) -> Option<&'a ScoreDelta> {
        let metric = plan.primary_concern.metric();
        deltas
            .iter()
            .find(|d| d.metric == metric && d.percent_change.is_some_and(|p| p > self.triggers.decline_percent))
    }

    /// Early-review floor reached
    #[inline]
    #[must_use]
    pub fn early_review_reached(&self, plan: &RoutinePlan, today: NaiveDate) -> bool {
        plan.elapsed_days(today) >= self.lock.min_early_review_days
    }

    /// Trigger that would open this plan today, most urgent first
    #[must_use]
    pub fn evaluate_triggers(
        &self,
        plan: &RoutinePlan,
        deltas: &[ScoreDelta],
        today: NaiveDate,
    ) -> Option<AdjustmentTrigger> {
        if self.severe_irritation(deltas).is_some() {
            return Some(AdjustmentTrigger::SevereIrritation);
        }
        if self.primary_decline(plan, deltas).is_some() && self.early_review_reached(plan, today) {
            return Some(AdjustmentTrigger::ConfirmedDecline);
        }
        if plan.lock.is_expired(today) {
            return Some(AdjustmentTrigger::LockExpired);
        }
        None
    }

    /// `PENDING -> ACTIVE`
    pub fn activate(&self, plan: &mut RoutinePlan) -> Result<(), EngineError> {
        self.transition(plan, PlanStatus::Active)?;
        plan.can_adjust = false;
        Ok(())
    }

    /// `ACTIVE -> ADJUSTABLE` if a trigger fires; returns the trigger
    pub fn refresh(
        &self,
        plan: &mut RoutinePlan,
        deltas: &[ScoreDelta],
        today: NaiveDate,
    ) -> Result<Option<AdjustmentTrigger>, EngineError> {
        if plan.status != PlanStatus::Active {
            return Ok(None);
        }
        match self.evaluate_triggers(plan, deltas, today) {
            Some(trigger) => {
                self.unlock(plan, trigger)?;
                Ok(Some(trigger))
            }
            None => Ok(None),
        }
    }

    /// `ACTIVE -> ADJUSTABLE` for an already-decided trigger
    pub fn unlock(&self, plan: &mut RoutinePlan, trigger: AdjustmentTrigger) -> Result<(), EngineError> {
        self.transition(plan, PlanStatus::Adjustable)?;
        plan.can_adjust = true;
        plan.adjustment_reason = Some(trigger);
        Ok(())
    }

    /// `ADJUSTABLE -> SUPERSEDED` for `old`, installing `new` as its successor
    pub fn supersede(
        &self,
        old: &mut RoutinePlan,
        new: &mut RoutinePlan,
        today: NaiveDate,
    ) -> Result<(), EngineError> {
        if old.user_id != new.user_id {
            return Err(TransitionError::ForeignPlan(new.id).into());
        }
        validate_transition(old.status, PlanStatus::Superseded)?;
        validate_transition(new.status, PlanStatus::Active)?;

        new.version = old.version + 1;
        new.previous_plan_id = Some(old.id);
        new.adjustment_reason = old.adjustment_reason;
        self.transition(old, PlanStatus::Superseded)?;
        old.actual_end_date = Some(today);
        old.can_adjust = false;
        self.activate(new)?;
        tracing::info!(old = %old.id, new = %new.id, version = new.version, "plan superseded");
        Ok(())
    }

    /// `ADJUSTABLE -> COMPLETED` on user acknowledgement
    pub fn complete(&self, plan: &mut RoutinePlan, today: NaiveDate) -> Result<(), EngineError> {
        self.transition(plan, PlanStatus::Completed)?;
        plan.actual_end_date = Some(today);
        plan.can_adjust = false;
        Ok(())
    }

    fn transition(&self, plan: &mut RoutinePlan, to: PlanStatus) -> Result<(), EngineError> {
        validate_transition(plan.status, to)?;
        tracing::info!(plan_id = %plan.id, from = %plan.status, %to, "plan transition");
        plan.status = to;
        Ok(())
    }
}
