//! Adjustment Arbiter
//!
//! Decides whether a plan may be revised early. A denial is a normal
//! outcome carrying a reason code, not an error.
//!
//! Decision order:
//! 1. plan not live: deny
//! 2. severe irritation: allow, at any time
//! 3. primary-concern decline while locked: allow once the early-review
//!    floor is reached, deny before it
//! 4. primary-concern decline after the lock: allow
//! 5. user request: allow iff the plan can be adjusted (or its lock ran out)
//! 6. otherwise deny

use crate::lock::PlanLockManager;
use crate::plan::{AdjustmentTrigger, RoutinePlan};
use crate::progress::ScoreDelta;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Machine-readable decision reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    PlanNotLive,
    SevereIrritation,
    ConfirmedDecline,
    UserRequest,
    LockInForce,
    NoTrigger,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReasonCode::PlanNotLive => "plan_not_live",
            ReasonCode::SevereIrritation => "severe_irritation",
            ReasonCode::ConfirmedDecline => "confirmed_decline",
            ReasonCode::UserRequest => "user_request",
            ReasonCode::LockInForce => "lock_in_force",
            ReasonCode::NoTrigger => "no_trigger",
        })
    }
}

/// Allow/deny outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDecision {
    pub allow: bool,
    pub reason: ReasonCode,
    /// Trigger to record on the plan when allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<AdjustmentTrigger>,
}

impl AdjustmentDecision {
    fn allow(reason: ReasonCode, trigger: AdjustmentTrigger) -> Self {
        Self {
            allow: true,
            reason,
            trigger: Some(trigger),
        }
    }

    fn deny(reason: ReasonCode) -> Self {
        Self {
            allow: false,
            reason,
            trigger: None,
        }
    }
}

/// Decision table over plan state, deltas, date, and user intent
#[derive(Debug, Clone, Default)]
pub struct AdjustmentArbiter {
    lock: PlanLockManager,
}

impl AdjustmentArbiter {
    /// Create arbiter sharing the lock manager's thresholds
    #[inline]
    #[must_use]
    pub fn new(lock: PlanLockManager) -> Self {
        Self { lock }
    }

    /// Decide whether `plan` may be revised today
    #[must_use]
    pub fn decide(
        &self,
        plan: &RoutinePlan,
        deltas: &[ScoreDelta],
        today: NaiveDate,
        user_requested: bool,
    ) -> AdjustmentDecision {
        let decision = self.decide_inner(plan, deltas, today, user_requested);
        tracing::info!(
            plan_id = %plan.id,
            allow = decision.allow,
            reason = %decision.reason,
            user_requested,
            "adjustment decided"
        );
        decision
    }

    fn decide_inner(
        &self,
        plan: &RoutinePlan,
        deltas: &[ScoreDelta],
        today: NaiveDate,
        user_requested: bool,
    ) -> AdjustmentDecision {
        if !plan.is_live() {
            return AdjustmentDecision::deny(ReasonCode::PlanNotLive);
        }
        if self.lock.severe_irritation(deltas).is_some() {
            return AdjustmentDecision::allow(ReasonCode::SevereIrritation, AdjustmentTrigger::SevereIrritation);
        }

        let lock_expired = plan.lock.is_expired(today);
        let locked = !plan.can_adjust && !lock_expired;
        if self.lock.primary_decline(plan, deltas).is_some() {
            if !locked || self.lock.early_review_reached(plan, today) {
                return AdjustmentDecision::allow(ReasonCode::ConfirmedDecline, AdjustmentTrigger::ConfirmedDecline);
            }
            return AdjustmentDecision::deny(ReasonCode::LockInForce);
        }

        if user_requested {
            return if locked {
                AdjustmentDecision::deny(ReasonCode::LockInForce)
            } else {
                AdjustmentDecision::allow(ReasonCode::UserRequest, AdjustmentTrigger::UserRequest)
            };
        }

        if locked {
            AdjustmentDecision::deny(ReasonCode::LockInForce)
        } else {
            AdjustmentDecision::deny(ReasonCode::NoTrigger)
        }
    }
}
