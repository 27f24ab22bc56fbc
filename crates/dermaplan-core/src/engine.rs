//! Routine engine facade
//!
//! Wires the pipeline together:
//! Normalizer -> Selector -> Resolver -> Adjuster -> Assembler for new plans,
//! and Progress Evaluator -> Arbiter -> (new pipeline pass) for revisions.
//! Every call is pure over its explicit inputs.

use crate::arbiter::{AdjustmentArbiter, AdjustmentDecision};
use crate::assembler::assemble;
use crate::config::EngineConfig;
use crate::conflicts::{ConflictResolver, ConflictTable};
use crate::error::EngineError;
use crate::frequency::moderate_frequencies;
use crate::guidance::build_guidance;
use crate::lock::PlanLockManager;
use crate::normalizer::MetricNormalizer;
use crate::plan::{LockWindow, PlanId, PlanStatus, RoutinePlan};
use crate::progress::{ProgressEvaluator, ScoreDelta};
use crate::selector::IngredientSelector;
use crate::types::{SkinMetricSet, SkinProfile, UserId};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Caller context for plan generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Owner of the plan and of every plan in the history
    pub user_id: UserId,
    /// First day of the plan
    pub today: NaiveDate,
    /// Lock length; the configured default when absent
    #[serde(default)]
    pub lock_duration_days: Option<u32>,
    /// Caller intends to replace the current live plan
    #[serde(default)]
    pub supersede: bool,
}

impl PlanRequest {
    /// Create request
    #[inline]
    #[must_use]
    pub fn new(user_id: UserId, today: NaiveDate) -> Self {
        Self {
            user_id,
            today,
            lock_duration_days: None,
            supersede: false,
        }
    }

    /// With explicit lock duration
    #[inline]
    #[must_use]
    pub fn with_lock_days(mut self, days: u32) -> Self {
        self.lock_duration_days = Some(days);
        self
    }

    /// Mark as a supersede of the live plan
    #[inline]
    #[must_use]
    pub fn superseding(mut self) -> Self {
        self.supersede = true;
        self
    }
}

/// Outcome of a revision request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    /// Arbiter decision
    pub decision: AdjustmentDecision,
    /// Successor plan, present iff the decision allowed a revision
    pub plan: Option<RoutinePlan>,
}

/// Deterministic routine decision engine
#[derive(Debug, Clone)]
pub struct RoutineEngine {
    config: EngineConfig,
    normalizer: MetricNormalizer,
    selector: IngredientSelector,
    resolver: ConflictResolver,
    lock: PlanLockManager,
    progress: ProgressEvaluator,
    arbiter: AdjustmentArbiter,
}

impl RoutineEngine {
    /// Create engine from a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::from_parts(config, ConflictTable::default()))
    }

    /// Create engine with a custom conflict table
    pub fn with_conflict_table(config: EngineConfig, table: ConflictTable) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::from_parts(config, table))
    }

    fn from_parts(config: EngineConfig, table: ConflictTable) -> Self {
        let lock = PlanLockManager::new(config.lock.clone(), config.triggers.clone());
        Self {
            normalizer: MetricNormalizer::new(config.normalizer.clone()),
            selector: IngredientSelector::new(config.selection.clone()),
            resolver: ConflictResolver::new(table, config.conflicts.clone()),
            progress: ProgressEvaluator::new(config.progress.clone()),
            arbiter: AdjustmentArbiter::new(lock.clone()),
            lock,
            config,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metric normalizer
    #[inline]
    #[must_use]
    pub fn normalizer(&self) -> &MetricNormalizer {
        &self.normalizer
    }

    /// Conflict resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// Plan lock manager
    #[inline]
    #[must_use]
    pub fn lock_manager(&self) -> &PlanLockManager {
        &self.lock
    }

    /// Generate a `PENDING` plan for one scan
    ///
    /// Fails with `Validation` on malformed input, `Quality` when the scan
    /// needs a retake, and `InvariantViolation` when `history` holds a live
    /// plan, unless the request is a supersede and that plan is already
    /// `ADJUSTABLE`. The caller retires it with [`PlanLockManager::supersede`].
    pub fn generate_routine(
        &self,
        metrics: &SkinMetricSet,
        profile: &SkinProfile,
        history: &[RoutinePlan],
        request: &PlanRequest,
    ) -> Result<RoutinePlan, EngineError> {
        if let Some(foreign) = history.iter().find(|p| p.user_id != request.user_id) {
            return Err(EngineError::validation(format!(
                "plan {} in history belongs to another user",
                foreign.id
            )));
        }
        self.normalizer.check_quality(metrics)?;
        let duration = self.lock.lock_duration(request.lock_duration_days)?;

        if let Some(live) = history.iter().find(|p| p.is_live()) {
            if !request.supersede || live.status != PlanStatus::Adjustable {
                tracing::info!(
                    user_id = %request.user_id,
                    live_plan_id = %live.id,
                    status = %live.status,
                    supersede = request.supersede,
                    "live plan blocks generation"
                );
                return Err(EngineError::InvariantViolation {
                    user_id: request.user_id,
                    live_plan_id: live.id,
                });
            }
        }

        let mut plan = self.build_plan(metrics, profile, request.user_id, request.today, duration);
        if let Some(latest) = history.iter().max_by_key(|p| p.version) {
            plan.version = latest.version + 1;
            plan.previous_plan_id = Some(latest.id);
        }
        tracing::info!(
            plan_id = %plan.id,
            user_id = %plan.user_id,
            version = plan.version,
            selections = plan.selections.len(),
            annotations = plan.annotations.len(),
            "routine generated"
        );
        Ok(plan)
    }

    /// Per-metric deltas between two ordered scans
    pub fn evaluate_progress(
        &self,
        previous: &SkinMetricSet,
        current: &SkinMetricSet,
    ) -> Result<Vec<ScoreDelta>, EngineError> {
        self.progress.evaluate(previous, current)
    }

    /// Allow or deny an early revision
    #[must_use]
    pub fn decide_adjustment(
        &self,
        plan: &RoutinePlan,
        deltas: &[ScoreDelta],
        today: NaiveDate,
        user_requested: bool,
    ) -> AdjustmentDecision {
        self.arbiter.decide(plan, deltas, today, user_requested)
    }

    /// Decide, and when allowed build the successor from the newest scan
    ///
    /// On success `current` is `SUPERSEDED` and the returned plan is
    /// `ACTIVE`. On denial `current` is untouched.
    pub fn revise_plan(
        &self,
        current: &mut RoutinePlan,
        metrics: &SkinMetricSet,
        profile: &SkinProfile,
        deltas: &[ScoreDelta],
        today: NaiveDate,
        user_requested: bool,
    ) -> Result<Revision, EngineError> {
        let decision = self.decide_adjustment(current, deltas, today, user_requested);
        let Some(trigger) = decision.trigger.filter(|_| decision.allow) else {
            return Ok(Revision { decision, plan: None });
        };
        self.normalizer.check_quality(metrics)?;

        let mut successor = self.build_plan(metrics, profile, current.user_id, today, current.lock.duration_days);
        if current.status == PlanStatus::Active {
            self.lock.unlock(current, trigger)?;
        }
        self.lock.supersede(current, &mut successor, today)?;
        successor.adjustment_reason = Some(trigger);

        Ok(Revision {
            decision,
            plan: Some(successor),
        })
    }

    fn build_plan(
        &self,
        metrics: &SkinMetricSet,
        profile: &SkinProfile,
        user_id: UserId,
        today: NaiveDate,
        duration: u32,
    ) -> RoutinePlan {
        let selected = self.selector.select(metrics, profile);
        let mut annotations = selected.annotations;

        let resolution = match self.resolver.resolve(selected.selections.clone()) {
            Ok(resolution) => resolution,
            Err(err) => self.resolver.minimal_safe_routine(&selected.selections, &err.to_string()),
        };
        annotations.extend(resolution.annotations);

        let mut selections = resolution.selections;
        annotations.extend(moderate_frequencies(&mut selections, profile));

        let steps = assemble(&selections, profile.primary_concern);

        RoutinePlan {
            id: PlanId::new(),
            user_id,
            version: 1,
            status: PlanStatus::Pending,
            primary_concern: profile.primary_concern,
            am_steps: steps.am,
            pm_steps: steps.pm,
            weekly_steps: steps.weekly,
            selections,
            annotations,
            lock: LockWindow::starting(today, duration),
            actual_end_date: None,
            can_adjust: false,
            baseline_scan_id: metrics.scan_id(),
            adjustment_reason: None,
            previous_plan_id: None,
            guidance: build_guidance(profile),
            created_at: Utc::now(),
        }
    }
}

impl Default for RoutineEngine {
    fn default() -> Self {
        Self::from_parts(EngineConfig::default(), ConflictTable::default())
    }
}
