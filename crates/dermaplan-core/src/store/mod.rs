//! Persistence collaborator contract
//!
//! Every operation is scoped to one user. Plan creation and supersede are
//! conditional writes so that at most one plan per user is live.

pub mod ledger;
pub mod memory;

pub use ledger::{LedgerEntry, TransitionLedger};
pub use memory::InMemoryStore;

use crate::error::StoreError;
use crate::plan::{PlanId, RoutinePlan};
use crate::types::{ScanId, SkinMetricSet, UserId};
use serde::{Deserialize, Serialize};

/// Schema-tagged plan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum StoredPlan {
    #[serde(rename = "routine_plan/v1")]
    V1(RoutinePlan),
}

impl StoredPlan {
    /// Upgrade to the current in-memory representation
    #[must_use]
    pub fn into_current(self) -> RoutinePlan {
        match self {
            StoredPlan::V1(plan) => plan,
        }
    }
}

/// Schema-tagged scan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum StoredScan {
    #[serde(rename = "skin_scan/v1")]
    V1(SkinMetricSet),
}

impl StoredScan {
    /// Upgrade to the current in-memory representation
    #[must_use]
    pub fn into_current(self) -> SkinMetricSet {
        match self {
            StoredScan::V1(scan) => scan,
        }
    }
}

/// Synchronous persistence provider
pub trait PlanStore: Send + Sync {
    /// Store a normalized scan
    fn put_scan(&self, user_id: UserId, scan: &SkinMetricSet) -> Result<(), StoreError>;

    /// Fetch one scan
    fn get_scan(&self, user_id: UserId, scan_id: ScanId) -> Result<Option<SkinMetricSet>, StoreError>;

    /// Up to `limit` scans, newest capture first
    fn latest_scans(&self, user_id: UserId, limit: usize) -> Result<Vec<SkinMetricSet>, StoreError>;

    /// Fetch one plan
    fn get_plan(&self, user_id: UserId, plan_id: PlanId) -> Result<Option<RoutinePlan>, StoreError>;

    /// Every plan of the user, oldest version first
    fn plan_history(&self, user_id: UserId) -> Result<Vec<RoutinePlan>, StoreError>;

    /// The user's `ACTIVE`/`ADJUSTABLE` plan
    fn live_plan(&self, user_id: UserId) -> Result<Option<RoutinePlan>, StoreError>;

    /// Create iff the user has no live plan
    fn create_plan_if_no_live(&self, plan: &RoutinePlan) -> Result<(), StoreError>;

    /// Retire `expected` and install `successor`, iff `expected` is still live
    fn replace_live_plan(
        &self,
        expected: PlanId,
        retired: &RoutinePlan,
        successor: &RoutinePlan,
    ) -> Result<(), StoreError>;

    /// Overwrite an existing plan
    fn update_plan(&self, plan: &RoutinePlan) -> Result<(), StoreError>;
}
