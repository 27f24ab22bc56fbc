use super::{PlanStore, StoredPlan, StoredScan, TransitionLedger};
use crate::error::StoreError;
use crate::plan::{PlanId, PlanStatus, RoutinePlan};
use crate::state_machine::validate_transition;
use crate::store::LedgerEntry;
use crate::types::{ScanId, SkinMetricSet, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Records of one user; plans and scans kept as encoded envelopes
#[derive(Debug, Default)]
struct UserRecords {
    scans: HashMap<ScanId, String>,
    plans: HashMap<PlanId, String>,
    live: Option<PlanId>,
    ledger: TransitionLedger,
}

/// In-process [`PlanStore`]
///
/// One write lock covers the live-plan check and the write, which makes
/// `create_plan_if_no_live` and `replace_live_plan` atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, UserRecords>>,
}

impl InMemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition ledger of a user
    pub fn ledger(&self, user_id: UserId) -> Vec<LedgerEntry> {
        self.users
            .read()
            .get(&user_id)
            .map(|r| r.ledger.entries().to_vec())
            .unwrap_or_default()
    }

    /// Verify the hash chain of a user's ledger
    pub fn verify_ledger(&self, user_id: UserId) -> Result<(), StoreError> {
        match self.users.read().get(&user_id) {
            Some(records) => records.ledger.verify(user_id),
            None => Ok(()),
        }
    }
}

fn encode_plan(plan: &RoutinePlan) -> Result<String, StoreError> {
    serde_json::to_string(&StoredPlan::V1(plan.clone())).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_plan(raw: &str) -> Result<RoutinePlan, StoreError> {
    serde_json::from_str::<StoredPlan>(raw)
        .map(StoredPlan::into_current)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode_scan(scan: &SkinMetricSet) -> Result<String, StoreError> {
    serde_json::to_string(&StoredScan::V1(scan.clone())).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_scan(raw: &str) -> Result<SkinMetricSet, StoreError> {
    serde_json::from_str::<StoredScan>(raw)
        .map(StoredScan::into_current)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

impl UserRecords {
    fn status_of(&self, plan_id: PlanId) -> Result<Option<PlanStatus>, StoreError> {
        self.plans
            .get(&plan_id)
            .map(|raw| decode_plan(raw).map(|p| p.status))
            .transpose()
    }

    /// Stored status must equal `plan.status` or reach it in one legal step
    fn check_successor_status(&self, plan: &RoutinePlan) -> Result<(), StoreError> {
        let Some(stored) = self.status_of(plan.id)? else {
            return Err(StoreError::NotFound(format!("plan {}", plan.id)));
        };
        if stored == plan.status || validate_transition(stored, plan.status).is_ok() {
            return Ok(());
        }
        tracing::info!(plan_id = %plan.id, %stored, attempted = %plan.status, "stale plan write rejected");
        Err(StoreError::StalePlanWrite {
            plan_id: plan.id,
            stored,
            attempted: plan.status,
        })
    }

    fn write_plan(&mut self, plan: &RoutinePlan) -> Result<(), StoreError> {
        let previous = self.status_of(plan.id)?;
        let encoded = encode_plan(plan)?;
        self.plans.insert(plan.id, encoded);
        if previous != Some(plan.status) {
            self.ledger.append(plan.id, previous, plan.status);
        }
        if plan.is_live() {
            self.live = Some(plan.id);
        } else if self.live == Some(plan.id) {
            self.live = None;
        }
        Ok(())
    }
}

impl PlanStore for InMemoryStore {
    fn put_scan(&self, user_id: UserId, scan: &SkinMetricSet) -> Result<(), StoreError> {
        let encoded = encode_scan(scan)?;
        self.users
            .write()
            .entry(user_id)
            .or_default()
            .scans
            .insert(scan.scan_id(), encoded);
        Ok(())
    }

    fn get_scan(&self, user_id: UserId, scan_id: ScanId) -> Result<Option<SkinMetricSet>, StoreError> {
        let users = self.users.read();
        users
            .get(&user_id)
            .and_then(|r| r.scans.get(&scan_id))
            .map(|raw| decode_scan(raw))
            .transpose()
    }

    fn latest_scans(&self, user_id: UserId, limit: usize) -> Result<Vec<SkinMetricSet>, StoreError> {
        let users = self.users.read();
        let Some(records) = users.get(&user_id) else {
            return Ok(Vec::new());
        };
        let mut scans = records
            .scans
            .values()
            .map(|raw| decode_scan(raw))
            .collect::<Result<Vec<_>, _>>()?;
        scans.sort_by(|a, b| b.captured_at().cmp(&a.captured_at()));
        scans.truncate(limit);
        Ok(scans)
    }

    fn get_plan(&self, user_id: UserId, plan_id: PlanId) -> Result<Option<RoutinePlan>, StoreError> {
        let users = self.users.read();
        users
            .get(&user_id)
            .and_then(|r| r.plans.get(&plan_id))
            .map(|raw| decode_plan(raw))
            .transpose()
    }

    fn plan_history(&self, user_id: UserId) -> Result<Vec<RoutinePlan>, StoreError> {
        let users = self.users.read();
        let Some(records) = users.get(&user_id) else {
            return Ok(Vec::new());
        };
        let mut plans = records
            .plans
            .values()
            .map(|raw| decode_plan(raw))
            .collect::<Result<Vec<_>, _>>()?;
        plans.sort_by(|a, b| a.version.cmp(&b.version).then(a.created_at.cmp(&b.created_at)));
        Ok(plans)
    }

    fn live_plan(&self, user_id: UserId) -> Result<Option<RoutinePlan>, StoreError> {
        let users = self.users.read();
        let Some(records) = users.get(&user_id) else {
            return Ok(None);
        };
        records
            .live
            .and_then(|id| records.plans.get(&id))
            .map(|raw| decode_plan(raw))
            .transpose()
    }

    fn create_plan_if_no_live(&self, plan: &RoutinePlan) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let records = users.entry(plan.user_id).or_default();
        if let Some(live_plan_id) = records.live {
            tracing::info!(user_id = %plan.user_id, %live_plan_id, "conditional create rejected");
            return Err(StoreError::LivePlanExists {
                user_id: plan.user_id,
                live_plan_id,
            });
        }
        if !plan.is_live() {
            return Err(StoreError::InvalidRecord(format!(
                "plan {} must be live to be installed, found {}",
                plan.id, plan.status
            )));
        }
        if records.plans.contains_key(&plan.id) {
            return Err(StoreError::InvalidRecord(format!("plan {} already stored", plan.id)));
        }
        records.write_plan(plan)?;
        tracing::debug!(user_id = %plan.user_id, plan_id = %plan.id, "plan created");
        Ok(())
    }

    fn replace_live_plan(
        &self,
        expected: PlanId,
        retired: &RoutinePlan,
        successor: &RoutinePlan,
    ) -> Result<(), StoreError> {
        let user_id = retired.user_id;
        if successor.user_id != user_id || retired.id != expected {
            return Err(StoreError::InvalidRecord(format!(
                "supersede of {expected} must retire that plan for the same user"
            )));
        }
        let mut users = self.users.write();
        let records = users.entry(user_id).or_default();
        if records.live != Some(expected) {
            tracing::info!(%user_id, %expected, "supersede rejected, live plan changed");
            return Err(StoreError::StaleLivePlan { user_id, expected });
        }
        if retired.status != PlanStatus::Superseded {
            return Err(StoreError::InvalidRecord(format!(
                "retired plan {} is {}, expected SUPERSEDED",
                retired.id, retired.status
            )));
        }
        if successor.status != PlanStatus::Active || records.plans.contains_key(&successor.id) {
            return Err(StoreError::InvalidRecord(format!(
                "successor {} must be a new ACTIVE plan",
                successor.id
            )));
        }
        records.write_plan(retired)?;
        records.write_plan(successor)?;
        Ok(())
    }

    fn update_plan(&self, plan: &RoutinePlan) -> Result<(), StoreError> {
        let mut users = self.users.write();
        let records = users
            .get_mut(&plan.user_id)
            .filter(|r| r.plans.contains_key(&plan.id))
            .ok_or_else(|| StoreError::NotFound(format!("plan {}", plan.id)))?;
        records.check_successor_status(plan)?;
        if let Some(live_plan_id) = records.live.filter(|id| *id != plan.id && plan.is_live()) {
            return Err(StoreError::LivePlanExists {
                user_id: plan.user_id,
                live_plan_id,
            });
        }
        records.write_plan(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PlanRequest, RoutineEngine};
    use crate::lock::PlanLockManager;
    use crate::types::{Concern, Metric, QualitySignal, SkinProfile, SkinType};
    use chrono::{NaiveDate, Utc};

    fn active_plan(user_id: UserId) -> RoutinePlan {
        let scan = SkinMetricSet::new(
            ScanId::new(),
            Metric::ALL.iter().map(|m| (*m, 40.0)).collect(),
            90.0,
            QualitySignal::pass(),
            Utc::now(),
        );
        let profile = SkinProfile::new(SkinType::Normal, Concern::Acne);
        let today = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut plan = RoutineEngine::default()
            .generate_routine(&scan, &profile, &[], &PlanRequest::new(user_id, today))
            .unwrap();
        PlanLockManager::default().activate(&mut plan).unwrap();
        plan
    }

    #[test]
    fn second_live_plan_is_rejected() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let first = active_plan(user);
        store.create_plan_if_no_live(&first).unwrap();

        let err = store.create_plan_if_no_live(&active_plan(user)).unwrap_err();
        assert_eq!(
            err,
            StoreError::LivePlanExists {
                user_id: user,
                live_plan_id: first.id,
            }
        );
        assert_eq!(store.plan_history(user).unwrap().len(), 1);
    }

    #[test]
    fn users_are_isolated() {
        let store = InMemoryStore::new();
        let a = UserId::new();
        let b = UserId::new();
        store.create_plan_if_no_live(&active_plan(a)).unwrap();
        store.create_plan_if_no_live(&active_plan(b)).unwrap();
        assert!(store.live_plan(a).unwrap().is_some());
        let plan_a = store.live_plan(a).unwrap().unwrap();
        assert!(store.get_plan(b, plan_a.id).unwrap().is_none());
    }

    #[test]
    fn stale_supersede_is_rejected() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let live = active_plan(user);
        store.create_plan_if_no_live(&live).unwrap();

        let mut retired = live.clone();
        retired.id = PlanId::new();
        retired.status = crate::plan::PlanStatus::Superseded;
        let err = store
            .replace_live_plan(retired.id, &retired, &active_plan(user))
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleLivePlan { .. }));
    }

    #[test]
    fn stale_copy_cannot_revive_a_completed_plan() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let lock = PlanLockManager::default();
        let mut plan = active_plan(user);
        store.create_plan_if_no_live(&plan).unwrap();

        lock.unlock(&mut plan, crate::plan::AdjustmentTrigger::LockExpired).unwrap();
        store.update_plan(&plan).unwrap();
        let stale = plan.clone();

        let today = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        lock.complete(&mut plan, today).unwrap();
        store.update_plan(&plan).unwrap();

        let err = store.update_plan(&stale).unwrap_err();
        assert_eq!(
            err,
            StoreError::StalePlanWrite {
                plan_id: plan.id,
                stored: PlanStatus::Completed,
                attempted: PlanStatus::Adjustable,
            }
        );
        assert!(store.live_plan(user).unwrap().is_none());
        assert_eq!(store.get_plan(user, plan.id).unwrap().unwrap().status, PlanStatus::Completed);
        assert_eq!(store.ledger(user).len(), 3);
    }

    #[test]
    fn update_cannot_skip_a_transition() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let mut plan = active_plan(user);
        store.create_plan_if_no_live(&plan).unwrap();

        plan.status = PlanStatus::Completed;
        let err = store.update_plan(&plan).unwrap_err();
        assert!(matches!(err, StoreError::StalePlanWrite { .. }));
        assert_eq!(store.live_plan(user).unwrap().unwrap().status, PlanStatus::Active);
    }

    #[test]
    fn ledger_records_each_status_change() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let mut plan = active_plan(user);
        store.create_plan_if_no_live(&plan).unwrap();

        plan.status = crate::plan::PlanStatus::Adjustable;
        store.update_plan(&plan).unwrap();
        store.update_plan(&plan).unwrap();

        let ledger = store.ledger(user);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].from, Some(crate::plan::PlanStatus::Active));
        assert!(store.verify_ledger(user).is_ok());
    }
}
