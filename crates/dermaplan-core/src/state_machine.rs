use crate::error::TransitionError;
use crate::plan::PlanStatus;

/// Validates a plan status transition.
pub fn validate_transition(from: PlanStatus, to: PlanStatus) -> Result<(), TransitionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        tracing::warn!(%from, %to, "illegal plan transition rejected");
        Err(TransitionError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: PlanStatus) -> Vec<PlanStatus> {
    use PlanStatus::*;
    match from {
        Pending => vec![Active],
        Active => vec![Adjustable],
        Adjustable => vec![Superseded, Completed],
        Superseded => vec![],
        Completed => vec![],
    }
}

fn allowed(from: PlanStatus, to: PlanStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
