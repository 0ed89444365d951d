//! Output contracts from the core engine.
//!
//! A [`Frame`] carries the render state of every element whose region emitted
//! progress this frame, plus a separate list of semantic events. Adapters apply
//! changes to the host and transport events.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{ElementId, RegionId};
use crate::properties::RenderState;

/// Full render state of one element driven by `region` this frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub region: RegionId,
    pub element: ElementId,
    pub state: RenderState,
}

/// Discrete semantic signals emitted while processing a frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum CoreEvent {
    /// Progress moved off 0 or 1 into the region's interior.
    RegionEntered { region: RegionId, progress: f32 },
    /// Progress settled on 0 (left backwards) or 1 (left forwards).
    RegionLeft { region: RegionId, progress: f32 },
    PinChanged {
        region: RegionId,
        element: ElementId,
        pinned: bool,
    },
    RegionUnbound { region: RegionId },
    LifecycleReady { failed_assets: usize },
    Diagnostic {
        region: Option<RegionId>,
        error: CoreError,
    },
}

/// Outputs returned by `AnimationRegistry::frame`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Frame {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Changes for one region, in timeline element order.
    pub fn changes_for(&self, region: RegionId) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.region == region)
    }
}
