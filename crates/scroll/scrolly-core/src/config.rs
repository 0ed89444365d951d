//! Core configuration for scrolly-core.

use serde::{Deserialize, Serialize};

use crate::ease::Ease;
use crate::error::{CoreError, CoreResult};
use crate::pose::PoseParams;

/// Engine-wide defaults. Every field is optional in JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scale parameters used by pose value sources that leave them unset.
    pub pose: PoseParams,
    /// Duration (timeline time units) of tweens that do not specify one.
    pub default_duration: f32,
    /// Ease of timelines that do not specify one.
    pub default_ease: Ease,
    /// Smoothed progress snaps to the raw value once closer than this.
    pub scrub_epsilon: f32,
    /// Seed for random stagger orders and random value sources.
    pub seed: u64,
    /// Maximum events to retain per frame; extra events are dropped.
    pub max_events_per_frame: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pose: PoseParams::default(),
            default_duration: 0.5,
            default_ease: Ease::default(),
            scrub_epsilon: 1e-4,
            seed: 0x5C20_11E5,
            max_events_per_frame: 256,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> CoreResult<Self> {
        serde_json::from_str(s).map_err(|e| CoreError::SceneParse(format!("config: {e}")))
    }
}
