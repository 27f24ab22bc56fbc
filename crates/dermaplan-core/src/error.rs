//! Error types for the routine engine
//!
//! Mirrors the caller-facing taxonomy:
//! - `Validation`: malformed or missing input, rejected before any write
//! - `Quality`: analysis not trustworthy, caller should request a retake
//! - `InvariantViolation`: a live plan already exists, retry after re-reading
//! - `ConflictUnresolvable`: resolver post-check failed (engine falls back)
//!
//! An adjustment denial is not an error; see [`crate::arbiter::AdjustmentDecision`].

use crate::plan::{PlanId, PlanStatus};
use crate::types::UserId;

/// Main engine error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Malformed or missing input
    #[error("validation failed: {0}")]
    Validation(String),

    /// Insufficient confidence or flagged image defects
    #[error("retake required: {}", .reasons.join("; "))]
    Quality {
        /// Reasons surfaced to the user
        reasons: Vec<String>,
    },

    /// Attempt to install a second live plan
    #[error("user {user_id} already has live plan {live_plan_id}")]
    InvariantViolation {
        /// Affected user
        user_id: UserId,
        /// The plan that is currently live
        live_plan_id: PlanId,
    },

    /// Conflict resolution left a conflicting pair in a slot
    #[error("conflict unresolvable: {0}")]
    ConflictUnresolvable(String),

    /// Illegal lifecycle transition
    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence collaborator failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Vision collaborator failure
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),
}

/// Stable error classification for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Quality,
    InvariantViolation,
    ConflictUnresolvable,
    Transition,
    Config,
    Store,
    Vision,
}

impl EngineError {
    /// Build a validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Caller should ask for new photos rather than report a failure
    #[inline]
    #[must_use]
    pub fn is_retake(&self) -> bool {
        matches!(self, Self::Quality { .. })
    }

    /// Caller may retry after re-reading current state
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. }
                | Self::Quality { .. }
                | Self::Store(StoreError::LivePlanExists { .. })
                | Self::Store(StoreError::StaleLivePlan { .. })
                | Self::Store(StoreError::StalePlanWrite { .. })
                | Self::Vision(VisionError::Unavailable(_))
        )
    }

    /// Error classification
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Quality { .. } => ErrorKind::Quality,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::ConflictUnresolvable(_) => ErrorKind::ConflictUnresolvable,
            Self::Transition(_) => ErrorKind::Transition,
            Self::Config(_) => ErrorKind::Config,
            Self::Store(_) => ErrorKind::Store,
            Self::Vision(_) => ErrorKind::Vision,
        }
    }
}

/// Plan lifecycle transition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Transition not in the table
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current status
        from: PlanStatus,
        /// Requested status
        to: PlanStatus,
    },

    /// Supersede attempted across users
    #[error("plan {0} belongs to a different user")]
    ForeignPlan(PlanId),
}

/// Persistence collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Conditional create rejected
    #[error("live plan {live_plan_id} already exists for user {user_id}")]
    LivePlanExists {
        /// Affected user
        user_id: UserId,
        /// Existing live plan
        live_plan_id: PlanId,
    },

    /// Compare-and-swap on the live plan failed
    #[error("live plan for user {user_id} changed (expected {expected})")]
    StaleLivePlan {
        /// Affected user
        user_id: UserId,
        /// Plan the caller expected to be live
        expected: PlanId,
    },

    /// Write would move a plan along a transition the table forbids
    #[error("stale write to plan {plan_id}: stored {stored}, attempted {attempted}")]
    StalePlanWrite {
        /// Plan written
        plan_id: PlanId,
        /// Status currently stored
        stored: PlanStatus,
        /// Status carried by the write
        attempted: PlanStatus,
    },

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Record could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Write rejected as inconsistent
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Transition ledger failed verification
    #[error("ledger integrity violation for user {0}")]
    LedgerIntegrity(UserId),
}

/// Vision collaborator errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisionError {
    /// Provider slow or down
    #[error("vision provider unavailable: {0}")]
    Unavailable(String),

    /// Provider rejected the images
    #[error("images rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_error_is_retake_and_recoverable() {
        let err = EngineError::Quality {
            reasons: vec!["blurry".to_string(), "low light".to_string()],
        };
        assert!(err.is_retake());
        assert!(err.is_recoverable());
        assert_eq!(err.kind(), ErrorKind::Quality);
        assert_eq!(err.to_string(), "retake required: blurry; low light");
    }

    #[test]
    fn invariant_violation_is_recoverable() {
        let err = EngineError::InvariantViolation {
            user_id: UserId::new(),
            live_plan_id: PlanId::new(),
        };
        assert!(err.is_recoverable());
        assert!(!err.is_retake());
    }

    #[test]
    fn validation_error_display() {
        let err = EngineError::validation("missing metric acne");
        assert!(err.to_string().contains("validation failed"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn transition_error_converts() {
        let err: EngineError = TransitionError::IllegalTransition {
            from: PlanStatus::Superseded,
            to: PlanStatus::Active,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Transition);
    }
}
