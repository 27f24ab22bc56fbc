//! Routine plan types
//!
//! A `RoutinePlan` is created by the engine in `Pending`, and from then on
//! only changes through [`crate::lock::PlanLockManager`] transitions. Retired
//! plans are kept (superseded/completed), never deleted.

use crate::guidance::PlanGuidance;
use crate::ingredient::{Frequency, Ingredient, IngredientSelection, ProductType, TimeSlot};
use crate::types::{Concern, ScanId, UserId};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Generate new plan ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// Assembled, not yet installed
    Pending,
    /// Installed and locked
    Active,
    /// Installed, open to revision
    Adjustable,
    /// Replaced by a newer version
    Superseded,
    /// Acknowledged as finished by the user
    Completed,
}

impl PlanStatus {
    /// Counts toward the one-live-plan-per-user rule
    #[inline]
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, PlanStatus::Active | PlanStatus::Adjustable)
    }

    /// No further transitions possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PlanStatus::Superseded | PlanStatus::Completed)
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PlanStatus::Pending => "PENDING",
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Adjustable => "ADJUSTABLE",
            PlanStatus::Superseded => "SUPERSEDED",
            PlanStatus::Completed => "COMPLETED",
        })
    }
}

/// One ordered step of a routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStep {
    /// 1-based position within its slot
    pub order: u32,
    /// Product category
    pub product_type: ProductType,
    /// What to do
    pub instructions: String,
    /// Active or supportive ingredient, `None` for skeleton steps
    pub ingredient: Option<Ingredient>,
    /// Cadence
    pub frequency: Frequency,
    /// Minutes to wait before the next step
    pub wait_minutes: u32,
}

/// Mutability window of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockWindow {
    /// First day of the plan
    pub start_date: NaiveDate,
    /// Day the lock expires
    pub planned_end_date: NaiveDate,
    /// Lock length in days
    pub duration_days: u32,
}

impl LockWindow {
    /// Window starting on `start_date`
    #[must_use]
    pub fn starting(start_date: NaiveDate, duration_days: u32) -> Self {
        Self {
            start_date,
            planned_end_date: start_date + Duration::days(i64::from(duration_days)),
            duration_days,
        }
    }

    /// Whole days since the start; negative before it
    #[inline]
    #[must_use]
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.start_date).num_days()
    }

    /// Lock has run its full length
    #[inline]
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.elapsed_days(today) >= i64::from(self.duration_days)
    }
}

/// What an annotation records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationAction {
    /// Primary role lowered to supportive
    Demoted,
    /// Moved to another slot
    Retimed,
    /// Removed from the plan
    Dropped,
    /// Cadence lowered
    FrequencyReduced,
    /// Minimal safe routine used instead
    FallbackApplied,
}

/// Machine-readable reason attached to an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationReason {
    /// The primary concern's active owns the slot
    PrimaryConcernPrecedence,
    /// Declared conflict pair with a higher-priority ingredient
    ConflictPair,
    /// Conflict pair and no weekly capacity left
    WeeklySlotFull,
    /// Conflict pair and the weekly slot holds a conflicting occupant
    WeeklyConflict,
    /// High sensitivity profile
    HighSensitivity,
    /// Irritation flag set on the profile
    IrritationFlag,
    /// Resolver post-check failed
    ConflictUnresolvable,
}

/// Record of one change the pipeline made to a selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Affected ingredient (none for plan-wide annotations)
    pub ingredient: Option<Ingredient>,
    /// What happened
    pub action: AnnotationAction,
    /// Why
    pub reason: AnnotationReason,
    /// The ingredient that caused the change, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart: Option<Ingredient>,
    /// Human-readable detail
    pub detail: String,
}

impl Annotation {
    /// Create annotation for an ingredient
    #[must_use]
    pub fn new(
        ingredient: Ingredient,
        action: AnnotationAction,
        reason: AnnotationReason,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            ingredient: Some(ingredient),
            action,
            reason,
            counterpart: None,
            detail: detail.into(),
        }
    }

    /// Plan-wide annotation
    #[must_use]
    pub fn plan_wide(action: AnnotationAction, reason: AnnotationReason, detail: impl Into<String>) -> Self {
        Self {
            ingredient: None,
            action,
            reason,
            counterpart: None,
            detail: detail.into(),
        }
    }

    /// With the ingredient that caused the change
    #[inline]
    #[must_use]
    pub fn with_counterpart(mut self, counterpart: Ingredient) -> Self {
        self.counterpart = Some(counterpart);
        self
    }
}

/// Trigger that opened a plan for revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentTrigger {
    /// Lock ran its full length
    LockExpired,
    /// Some metric worsened past the safety threshold
    SevereIrritation,
    /// Primary concern worsened after the early-review floor
    ConfirmedDecline,
    /// User asked for a revision
    UserRequest,
}

impl std::fmt::Display for AdjustmentTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AdjustmentTrigger::LockExpired => "lock-expired",
            AdjustmentTrigger::SevereIrritation => "severe-irritation",
            AdjustmentTrigger::ConfirmedDecline => "confirmed-decline",
            AdjustmentTrigger::UserRequest => "user-request",
        })
    }
}

/// A versioned, lockable skincare routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutinePlan {
    pub id: PlanId,
    pub user_id: UserId,
    /// Starts at 1; +1 per supersede
    pub version: u32,
    pub status: PlanStatus,
    pub primary_concern: Concern,
    pub am_steps: Vec<RoutineStep>,
    pub pm_steps: Vec<RoutineStep>,
    pub weekly_steps: Vec<RoutineStep>,
    /// Final, conflict-free selections
    pub selections: Vec<IngredientSelection>,
    pub annotations: Vec<Annotation>,
    pub lock: LockWindow,
    pub actual_end_date: Option<NaiveDate>,
    /// True once the plan is open to revision
    pub can_adjust: bool,
    /// Scan the plan was generated from; deltas are measured against it
    pub baseline_scan_id: ScanId,
    pub adjustment_reason: Option<AdjustmentTrigger>,
    pub previous_plan_id: Option<PlanId>,
    pub guidance: PlanGuidance,
    pub created_at: DateTime<Utc>,
}

impl RoutinePlan {
    /// Counts toward the one-live-plan-per-user rule
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Whole days since the lock started
    #[inline]
    #[must_use]
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        self.lock.elapsed_days(today)
    }

    /// Days until the lock expires, never negative
    #[must_use]
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (i64::from(self.lock.duration_days) - self.elapsed_days(today)).max(0)
    }

    /// Active and still inside the lock window
    #[must_use]
    pub fn is_locked(&self, today: NaiveDate) -> bool {
        self.status == PlanStatus::Active && !self.lock.is_expired(today)
    }

    /// Week of the plan, starting at 1
    #[must_use]
    pub fn week_number(&self, today: NaiveDate) -> i64 {
        self.elapsed_days(today).max(0) / 7 + 1
    }

    /// Steps of one slot
    #[must_use]
    pub fn steps(&self, slot: TimeSlot) -> &[RoutineStep] {
        match slot {
            TimeSlot::Am => &self.am_steps,
            TimeSlot::Pm => &self.pm_steps,
            TimeSlot::Weekly => &self.weekly_steps,
        }
    }

    /// Ingredients scheduled in one slot
    pub fn slot_ingredients(&self, slot: TimeSlot) -> impl Iterator<Item = Ingredient> + '_ {
        self.selections
            .iter()
            .filter(move |s| s.slot == slot)
            .map(|s| s.ingredient)
    }

    /// Selection for an ingredient, if scheduled
    #[must_use]
    pub fn selection(&self, ingredient: Ingredient) -> Option<&IngredientSelection> {
        self.selections.iter().find(|s| s.ingredient == ingredient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lock_window_expires_on_exact_day() {
        let window = LockWindow::starting(date(2025, 3, 1), 14);
        assert_eq!(window.planned_end_date, date(2025, 3, 15));
        assert!(!window.is_expired(date(2025, 3, 14)));
        assert!(window.is_expired(date(2025, 3, 15)));
    }

    #[test]
    fn live_statuses() {
        assert!(PlanStatus::Active.is_live());
        assert!(PlanStatus::Adjustable.is_live());
        assert!(!PlanStatus::Pending.is_live());
        assert!(PlanStatus::Superseded.is_terminal());
        assert_eq!(serde_json::to_string(&PlanStatus::Adjustable).unwrap(), "\"ADJUSTABLE\"");
    }

    #[test]
    fn annotation_serializes_reason_code() {
        let note = Annotation::new(
            Ingredient::LacticAcid,
            AnnotationAction::Retimed,
            AnnotationReason::ConflictPair,
            "moved to weekly",
        )
        .with_counterpart(Ingredient::Retinoid);
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["action"], "retimed");
        assert_eq!(json["reason"], "conflict_pair");
        assert_eq!(json["counterpart"], "retinoid");
    }
}
