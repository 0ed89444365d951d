//! Error taxonomy for the scroll timeline core.
//!
//! Only construction-time problems are returned as `Err`. The degradations the
//! engine recovers from on its own (missing trigger elements, malformed stagger
//! configs, degenerate viewports) reuse these variants as diagnostics attached to
//! outputs, and processing continues with the documented fallback.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::RegionId;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum CoreError {
    #[error("trigger group '{group}' resolved to no elements")]
    MissingTriggerElement { group: String },
    #[error("malformed stagger config: {reason}")]
    MalformedStaggerConfig { reason: String },
    #[error("degenerate viewport {width}x{height}")]
    DegenerateViewport { width: f32, height: f32 },
    #[error("invalid trigger region: start {start} must be below end {end}")]
    InvalidRegion { start: f32, end: f32 },
    #[error("invalid tween window [{start}, {end}]")]
    InvalidWindow { start: f32, end: f32 },
    #[error("stagger amount {amount} exceeds tween window span {span}")]
    StaggerExceedsWindow { amount: f32, span: f32 },
    #[error("unknown element group '{group}'")]
    UnknownGroup { group: String },
    #[error("registry is still loading")]
    NotReady,
    #[error("registry already left the loading state")]
    AlreadyReady,
    #[error("unknown region {id:?}")]
    UnknownRegion { id: RegionId },
    #[error("scene parse error: {0}")]
    SceneParse(String),
}

impl CoreError {
    /// True for the variants the engine degrades around instead of failing.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            CoreError::MissingTriggerElement { .. }
                | CoreError::MalformedStaggerConfig { .. }
                | CoreError::DegenerateViewport { .. }
        )
    }
}
