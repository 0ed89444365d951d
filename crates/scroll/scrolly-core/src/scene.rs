//! Scene definitions: every scroll region of a page as one JSON document.
//!
//! `parse_scene_json` deserializes and validates a scene before any of it is
//! registered, so a malformed region never reaches the registry.

use serde::{Deserialize, Serialize};

use crate::builder::TimelineDef;
use crate::error::{CoreError, CoreResult};
use crate::trigger::TriggerSpec;

/// One scroll-driven region: a trigger element, its scroll range, and the
/// timeline scrubbed across that range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionDef {
    pub name: String,
    /// Element group whose first element anchors the trigger.
    pub trigger: String,
    /// Element group whose first element is pinned; the trigger element when absent.
    #[serde(default)]
    pub pin_target: Option<String>,
    #[serde(default)]
    pub scroll: TriggerSpec,
    pub timeline: TimelineDef,
    /// Release the region once progress first reaches 1.
    #[serde(default)]
    pub once: bool,
}

impl RegionDef {
    pub fn new(name: &str, trigger: &str, scroll: TriggerSpec, timeline: TimelineDef) -> Self {
        Self {
            name: name.to_string(),
            trigger: trigger.to_string(),
            pin_target: None,
            scroll,
            timeline,
            once: false,
        }
    }

    pub fn pin_target(mut self, group: &str) -> Self {
        self.pin_target = Some(group.to_string());
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Every element group this region needs at bind time.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.trigger.as_str())
            .chain(self.pin_target.as_deref())
            .chain(self.timeline.groups())
    }
}

/// A page worth of regions, in registration order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneDef {
    pub regions: Vec<RegionDef>,
}

/// Parse and structurally validate a scene description.
///
/// Element groups are not checked here; groups that resolve to nothing are
/// reported per region when the registry binds.
pub fn parse_scene_json(s: &str) -> CoreResult<SceneDef> {
    let scene: SceneDef =
        serde_json::from_str(s).map_err(|e| CoreError::SceneParse(format!("parse error: {e}")))?;
    for (i, r) in scene.regions.iter().enumerate() {
        if r.name.trim().is_empty() {
            return Err(CoreError::SceneParse(format!("region {i} has no name")));
        }
        if r.trigger.trim().is_empty() {
            return Err(CoreError::SceneParse(format!(
                "region '{}' has no trigger group",
                r.name
            )));
        }
        if r.timeline.tweens.is_empty() {
            return Err(CoreError::SceneParse(format!(
                "region '{}' has an empty timeline",
                r.name
            )));
        }
        for t in &r.timeline.tweens {
            if t.duration.is_some_and(|d| !d.is_finite() || d < 0.0) {
                return Err(CoreError::SceneParse(format!(
                    "region '{}' has a negative or non-finite duration",
                    r.name
                )));
            }
        }
    }
    Ok(scene)
}
