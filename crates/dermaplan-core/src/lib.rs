//! Dermaplan Core - skincare routine decision engine
//!
//! Turns skin-metric scores and stated concerns into a safety-checked
//! routine, then governs when that routine may change:
//! - selects actives per concern and severity
//! - resolves same-slot ingredient conflicts
//! - moderates cadence for sensitive skin
//! - assembles ordered AM/PM/weekly steps
//! - locks each plan for a commitment period and arbitrates early revisions
//!
//! # Example
//!
//! ```rust,ignore
//! use dermaplan_core::prelude::*;
//!
//! let engine = RoutineEngine::new(EngineConfig::default())?;
//! let plan = engine.generate_routine(&scan, &profile, &[], &PlanRequest::new(user_id, today))?;
//! println!("{} AM steps", plan.am_steps.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Pipeline components
pub mod arbiter;
pub mod assembler;
pub mod conflicts;
pub mod frequency;
pub mod lock;
pub mod normalizer;
pub mod progress;
pub mod selector;
pub mod state_machine;

// Domain model
pub mod config;
pub mod error;
pub mod guidance;
pub mod ingredient;
pub mod plan;
pub mod profile;
pub mod types;

// Facade and collaborators
pub mod engine;
pub mod service;
pub mod store;
pub mod vision;

pub use arbiter::{AdjustmentArbiter, AdjustmentDecision, ReasonCode};
pub use config::EngineConfig;
pub use conflicts::{ConflictResolver, ConflictTable};
pub use engine::{PlanRequest, Revision, RoutineEngine};
pub use error::{EngineError, ErrorKind, StoreError, TransitionError, VisionError};
pub use ingredient::{Frequency, Ingredient, IngredientSelection, ProductType, Role, TimeSlot};
pub use lock::PlanLockManager;
pub use plan::{
    AdjustmentTrigger, Annotation, AnnotationAction, AnnotationReason, LockWindow, PlanId,
    PlanStatus, RoutinePlan, RoutineStep,
};
pub use progress::{ProgressSummary, ScoreDelta, Trend};
pub use service::PlanService;
pub use store::{InMemoryStore, PlanStore};
pub use types::{
    Concern, Metric, QualitySignal, RawMetricVector, ScanId, Sensitivity, SkinMetricSet,
    SkinProfile, SkinType, UserId,
};
pub use vision::{ImageSet, VisionProvider};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Dermaplan Core
    pub use crate::{
        AdjustmentDecision, Concern, EngineConfig, EngineError, Ingredient, Metric, PlanRequest,
        PlanStatus, RoutineEngine, RoutinePlan, ScoreDelta, SkinMetricSet, SkinProfile, SkinType,
        TimeSlot, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
