use chrono::Duration;
use dermaplan_core::prelude::*;
use dermaplan_core::state_machine::{allowed_transitions, validate_transition};
use dermaplan_core::{AdjustmentTrigger, ReasonCode, TransitionError};
use dermaplan_test_utils::{date, profile, scan_with};
use proptest::prelude::*;

fn statuses() -> impl Strategy<Value = PlanStatus> {
    prop_oneof![
        Just(PlanStatus::Pending),
        Just(PlanStatus::Active),
        Just(PlanStatus::Adjustable),
        Just(PlanStatus::Superseded),
        Just(PlanStatus::Completed),
    ]
}

fn plan(engine: &RoutineEngine) -> RoutinePlan {
    let start = date(2025, 5, 5);
    engine
        .generate_routine(
            &scan_with(start, &[(Metric::Acne, 40.0)]),
            &profile(SkinType::Oily, Concern::Acne),
            &[],
            &PlanRequest::new(UserId::new(), start),
        )
        .unwrap()
}

fn active(engine: &RoutineEngine) -> RoutinePlan {
    let mut plan = plan(engine);
    engine.lock_manager().activate(&mut plan).unwrap();
    plan
}

fn day(plan: &RoutinePlan, n: i64) -> chrono::NaiveDate {
    plan.lock.start_date + Duration::days(n)
}

fn acne(previous: f64, current: f64) -> Vec<ScoreDelta> {
    vec![ScoreDelta::compute(Metric::Acne, previous, current, 10, 10.0)]
}

#[test]
fn test_pending_transitions() {
    assert!(validate_transition(PlanStatus::Pending, PlanStatus::Active).is_ok());

    assert!(validate_transition(PlanStatus::Pending, PlanStatus::Adjustable).is_err());
    assert!(validate_transition(PlanStatus::Pending, PlanStatus::Completed).is_err());
}

#[test]
fn test_adjustable_transitions() {
    assert!(validate_transition(PlanStatus::Adjustable, PlanStatus::Superseded).is_ok());
    assert!(validate_transition(PlanStatus::Adjustable, PlanStatus::Completed).is_ok());

    assert_eq!(
        validate_transition(PlanStatus::Adjustable, PlanStatus::Active),
        Err(TransitionError::IllegalTransition {
            from: PlanStatus::Adjustable,
            to: PlanStatus::Active,
        })
    );
}

#[test]
fn test_completing_an_active_plan_fails() {
    let engine = RoutineEngine::default();
    let mut plan = active(&engine);
    let today = day(&plan, 3);
    let err = engine.lock_manager().complete(&mut plan, today).unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
    assert_eq!(plan.status, PlanStatus::Active);
}

#[test]
fn test_pending_plan_is_not_live() {
    let engine = RoutineEngine::default();
    let plan = plan(&engine);
    let decision = engine.decide_adjustment(&plan, &acne(40.0, 60.0), day(&plan, 1), true);
    assert!(!decision.allow);
    assert_eq!(decision.reason, ReasonCode::PlanNotLive);
}

#[test]
fn test_severe_irritation_overrides_lock() {
    let engine = RoutineEngine::default();
    let plan = active(&engine);
    let decision = engine.decide_adjustment(&plan, &acne(40.0, 50.0), day(&plan, 1), false);
    assert!(decision.allow);
    assert_eq!(decision.reason, ReasonCode::SevereIrritation);
    assert_eq!(decision.trigger, Some(AdjustmentTrigger::SevereIrritation));
}

#[test]
fn test_decline_waits_for_early_review() {
    let engine = RoutineEngine::default();
    let plan = active(&engine);
    let deltas = acne(40.0, 46.0);

    let early = engine.decide_adjustment(&plan, &deltas, day(&plan, 6), false);
    assert!(!early.allow);
    assert_eq!(early.reason, ReasonCode::LockInForce);

    let reviewed = engine.decide_adjustment(&plan, &deltas, day(&plan, 7), false);
    assert!(reviewed.allow);
    assert_eq!(reviewed.reason, ReasonCode::ConfirmedDecline);
}

#[test]
fn test_secondary_decline_is_not_a_trigger() {
    let engine = RoutineEngine::default();
    let plan = active(&engine);
    let deltas = vec![ScoreDelta::compute(Metric::Redness, 40.0, 46.0, 10, 10.0)];
    let decision = engine.decide_adjustment(&plan, &deltas, day(&plan, 10), false);
    assert!(!decision.allow);
    assert_eq!(decision.reason, ReasonCode::LockInForce);
}

#[test]
fn test_user_request_respects_lock() {
    let engine = RoutineEngine::default();
    let plan = active(&engine);

    let locked = engine.decide_adjustment(&plan, &[], day(&plan, 13), true);
    assert!(!locked.allow);
    assert_eq!(locked.reason, ReasonCode::LockInForce);

    let expired = engine.decide_adjustment(&plan, &[], day(&plan, 14), true);
    assert!(expired.allow);
    assert_eq!(expired.trigger, Some(AdjustmentTrigger::UserRequest));

    let idle = engine.decide_adjustment(&plan, &[], day(&plan, 14), false);
    assert!(!idle.allow);
    assert_eq!(idle.reason, ReasonCode::NoTrigger);
}

#[test]
fn test_denied_revision_leaves_plan_untouched() {
    let engine = RoutineEngine::default();
    let mut plan = active(&engine);
    let before = plan.clone();
    let today = day(&plan, 3);
    let scan = scan_with(today, &[(Metric::Acne, 45.0)]);

    let revision = engine
        .revise_plan(&mut plan, &scan, &profile(SkinType::Oily, Concern::Acne), &[], today, true)
        .unwrap();

    assert!(!revision.decision.allow);
    assert!(revision.plan.is_none());
    assert_eq!(plan, before);
}

#[test]
fn test_superseded_plan_cannot_be_revised_again() {
    let engine = RoutineEngine::default();
    let mut plan = active(&engine);
    let today = day(&plan, 2);
    let scan = scan_with(today, &[(Metric::Acne, 60.0)]);
    let profile = profile(SkinType::Oily, Concern::Acne);

    let revision = engine
        .revise_plan(&mut plan, &scan, &profile, &acne(40.0, 60.0), today, false)
        .unwrap();
    assert_eq!(plan.status, PlanStatus::Superseded);
    assert_eq!(revision.plan.unwrap().version, 2);

    let again = engine.decide_adjustment(&plan, &acne(40.0, 60.0), today, true);
    assert_eq!(again.reason, ReasonCode::PlanNotLive);
}

#[test]
fn test_supersede_of_locked_plan_is_rejected() {
    let engine = RoutineEngine::default();
    let live = active(&engine);
    let today = day(&live, 1);
    let request = PlanRequest::new(live.user_id, today).superseding();
    let scan = scan_with(today, &[(Metric::Acne, 45.0)]);
    let profile = profile(SkinType::Oily, Concern::Acne);

    let err = engine
        .generate_routine(&scan, &profile, &[live.clone()], &request)
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvariantViolation {
            user_id: live.user_id,
            live_plan_id: live.id,
        }
    );
}

#[test]
fn test_supersede_of_adjustable_plan_builds_successor() {
    let engine = RoutineEngine::default();
    let mut live = active(&engine);
    let today = day(&live, 14);
    engine.lock_manager().refresh(&mut live, &[], today).unwrap();
    assert_eq!(live.status, PlanStatus::Adjustable);

    let request = PlanRequest::new(live.user_id, today).superseding();
    let scan = scan_with(today, &[(Metric::Acne, 45.0)]);
    let mut next = engine
        .generate_routine(&scan, &profile(SkinType::Oily, Concern::Acne), &[live.clone()], &request)
        .unwrap();
    assert_eq!(next.status, PlanStatus::Pending);

    engine.lock_manager().supersede(&mut live, &mut next, today).unwrap();
    assert_eq!(live.status, PlanStatus::Superseded);
    assert_eq!(next.status, PlanStatus::Active);
    assert_eq!(next.previous_plan_id, Some(live.id));
}

proptest! {
    #[test]
    fn prop_validate_matches_allowed(from in statuses(), to in statuses()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_terminal_states_are_final(from in statuses(), to in statuses()) {
        if from.is_terminal() {
            prop_assert!(validate_transition(from, to).is_err());
        }
    }
}
