//! Scrolly Core (host-agnostic)
//!
//! Scroll-scrubbed timeline engine: stagger distribution, per-element 3D poses
//! derived from layout, tween timelines evaluated as pure functions of scroll
//! progress, and a registry that drives regions frame by frame. Hosts register
//! element handles and apply the resulting render states; nothing here touches
//! a DOM or renderer.

pub mod builder;
pub mod config;
pub mod ease;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod outputs;
pub mod pose;
pub mod progress;
pub mod properties;
pub mod registry;
pub mod scene;
pub mod stagger;
pub mod timeline;
pub mod trigger;
pub mod tween;

// Re-exports for consumers (adapters)
pub use builder::{BuildCtx, Built, Position, PropDef, TimelineDef, TweenDef};
pub use config::Config;
pub use ease::{Curve, Direction, Ease};
pub use elements::{ElementHandle, ElementRegistry};
pub use error::{CoreError, CoreResult};
pub use geometry::{Point, Rect, Size};
pub use ids::{ElementId, RegionId, SubscriptionId};
pub use outputs::{Change, CoreEvent, Frame};
pub use pose::{transform, transform_with, Pose, PoseCache, PoseOverrides, PoseParams};
pub use progress::{PinState, ProgressSample, ScrollProgressSource};
pub use properties::{Property, RenderState};
pub use registry::{
    AnimationRegistry, ElementSink, Lifecycle, NullSink, PreloadReport, RegionStatus,
};
pub use scene::{parse_scene_json, RegionDef, SceneDef};
pub use stagger::{distribute, distribute_seeded, Distribution, GridAxis, StaggerConfig, StaggerMode};
pub use timeline::{AppliedState, Timeline};
pub use trigger::{Anchor, Edge, EndSpec, Scrub, TriggerRegion, TriggerSpec};
pub use tween::{PropertyTween, TweenSpec, ValueCtx, ValueFn};
