//! Plan service
//!
//! Binds the engine to the persistence and vision collaborators. Each
//! operation reads what it needs, calls the engine, and issues at most one
//! conditional write.

use crate::engine::{PlanRequest, Revision, RoutineEngine};
use crate::error::{EngineError, StoreError, VisionError};
use crate::plan::RoutinePlan;
use crate::progress::ScoreDelta;
use crate::store::PlanStore;
use crate::types::{RawMetricVector, ScanId, SkinMetricSet, SkinProfile, UserId};
use crate::vision::{ImageSet, VisionProvider};
use chrono::NaiveDate;

/// Engine plus collaborators for one deployment
#[derive(Debug)]
pub struct PlanService<S> {
    engine: RoutineEngine,
    store: S,
}

impl<S: PlanStore> PlanService<S> {
    /// Create service
    pub fn new(engine: RoutineEngine, store: S) -> Self {
        Self { engine, store }
    }

    /// Underlying engine
    pub fn engine(&self) -> &RoutineEngine {
        &self.engine
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Analyze photos, normalize, and store the scan
    pub fn submit_scan(
        &self,
        user_id: UserId,
        vision: &dyn VisionProvider,
        images: &ImageSet,
    ) -> Result<SkinMetricSet, EngineError> {
        if images.keys().iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::validation("three image keys are required"));
        }
        let raw = vision.analyze(images).map_err(|err| match err {
            VisionError::Rejected(reasons) => EngineError::Quality { reasons },
            other => EngineError::Vision(other),
        })?;
        self.record_scan(user_id, raw)
    }

    /// Normalize and store an already-analyzed scan
    pub fn record_scan(&self, user_id: UserId, raw: RawMetricVector) -> Result<SkinMetricSet, EngineError> {
        let scan = self.engine.normalizer().normalize(ScanId::new(), raw)?;
        self.store.put_scan(user_id, &scan)?;
        tracing::info!(%user_id, scan_id = %scan.scan_id(), "scan recorded");
        Ok(scan)
    }

    /// Generate, activate, and install a plan from a stored scan
    ///
    /// A supersede request retires the user's `ADJUSTABLE` plan in the same
    /// compare-and-swap that installs the successor.
    pub fn create_plan(
        &self,
        scan_id: ScanId,
        profile: &SkinProfile,
        request: &PlanRequest,
    ) -> Result<RoutinePlan, EngineError> {
        let scan = self
            .store
            .get_scan(request.user_id, scan_id)?
            .ok_or_else(|| StoreError::NotFound(format!("scan {scan_id}")))?;
        let history = self.store.plan_history(request.user_id)?;

        let mut plan = self.engine.generate_routine(&scan, profile, &history, request)?;
        let written = match history.into_iter().find(RoutinePlan::is_live) {
            Some(mut live) => {
                let expected = live.id;
                self.engine.lock_manager().supersede(&mut live, &mut plan, request.today)?;
                self.store.replace_live_plan(expected, &live, &plan)
            }
            None => {
                self.engine.lock_manager().activate(&mut plan)?;
                self.store.create_plan_if_no_live(&plan)
            }
        };

        match written {
            Ok(()) => Ok(plan),
            Err(StoreError::LivePlanExists { user_id, live_plan_id }) => {
                Err(EngineError::InvariantViolation { user_id, live_plan_id })
            }
            Err(StoreError::StaleLivePlan { user_id, expected }) => Err(EngineError::InvariantViolation {
                user_id,
                live_plan_id: expected,
            }),
            Err(other) => Err(other.into()),
        }
    }

    /// Deltas of the newest scan against the live plan's baseline
    ///
    /// Empty when no newer scan exists or the interval is still too short.
    pub fn baseline_deltas(&self, plan: &RoutinePlan) -> Result<Vec<ScoreDelta>, EngineError> {
        let Some(baseline) = self.store.get_scan(plan.user_id, plan.baseline_scan_id)? else {
            return Ok(Vec::new());
        };
        let Some(latest) = self.store.latest_scans(plan.user_id, 1)?.into_iter().next() else {
            return Ok(Vec::new());
        };
        if latest.scan_id() == baseline.scan_id() {
            return Ok(Vec::new());
        }
        match self.engine.evaluate_progress(&baseline, &latest) {
            Ok(deltas) => Ok(deltas),
            Err(EngineError::Validation(reason)) => {
                tracing::debug!(plan_id = %plan.id, %reason, "no comparable scan yet");
                Ok(Vec::new())
            }
            Err(other) => Err(other),
        }
    }

    /// Run the lock sweep on the live plan; returns it after any transition
    pub fn refresh_plan(&self, user_id: UserId, today: NaiveDate) -> Result<Option<RoutinePlan>, EngineError> {
        let Some(mut plan) = self.store.live_plan(user_id)? else {
            return Ok(None);
        };
        let deltas = self.baseline_deltas(&plan)?;
        if self.engine.lock_manager().refresh(&mut plan, &deltas, today)?.is_some() {
            self.store.update_plan(&plan)?;
        }
        Ok(Some(plan))
    }

    /// Ask the arbiter for a revision and install the successor if allowed
    pub fn request_revision(
        &self,
        user_id: UserId,
        profile: &SkinProfile,
        today: NaiveDate,
        user_requested: bool,
    ) -> Result<Revision, EngineError> {
        let mut plan = self
            .store
            .live_plan(user_id)?
            .ok_or_else(|| EngineError::validation(format!("user {user_id} has no live plan")))?;
        let latest = self
            .store
            .latest_scans(user_id, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("scans for user {user_id}")))?;
        let deltas = self.baseline_deltas(&plan)?;

        let expected = plan.id;
        let revision = self
            .engine
            .revise_plan(&mut plan, &latest, profile, &deltas, today, user_requested)?;
        if let Some(successor) = &revision.plan {
            self.store.replace_live_plan(expected, &plan, successor)?;
        }
        Ok(revision)
    }

    /// Acknowledge the end of an adjustable plan
    pub fn complete_plan(&self, user_id: UserId, today: NaiveDate) -> Result<RoutinePlan, EngineError> {
        let mut plan = self
            .store
            .live_plan(user_id)?
            .ok_or_else(|| EngineError::validation(format!("user {user_id} has no live plan")))?;
        self.engine.lock_manager().complete(&mut plan, today)?;
        self.store.update_plan(&plan)?;
        Ok(plan)
    }
}
