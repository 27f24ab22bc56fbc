//! Vision collaborator contract
//!
//! The provider turns three stored photos into a raw metric vector. Image
//! bytes never pass through the engine; only storage keys do.

use crate::error::VisionError;
use crate::types::RawMetricVector;
use serde::{Deserialize, Serialize};

/// Storage keys of the three capture angles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    pub front: String,
    pub left: String,
    pub right: String,
}

impl ImageSet {
    /// Create image set
    pub fn new(front: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Keys in capture order
    #[must_use]
    pub fn keys(&self) -> [&str; 3] {
        [&self.front, &self.left, &self.right]
    }
}

/// Synchronous vision provider
pub trait VisionProvider: Send + Sync {
    /// Analyze one capture; `Rejected` carries retake reasons
    fn analyze(&self, images: &ImageSet) -> Result<RawMetricVector, VisionError>;
}
