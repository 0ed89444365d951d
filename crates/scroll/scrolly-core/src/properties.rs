//! Animatable properties and the per-element render state they compose into.

use serde::{Deserialize, Serialize};

use crate::pose::{Pose, PoseField};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    /// Translation in px.
    X,
    Y,
    Z,
    /// Translation in percent of the element's own size.
    XPercent,
    YPercent,
    /// Rotation in degrees.
    #[serde(alias = "rotationX")]
    RotateX,
    #[serde(alias = "rotationY")]
    RotateY,
    #[serde(alias = "rotation")]
    Rotate,
    Scale,
    ScaleX,
    ScaleY,
    /// Skew in degrees.
    SkewX,
    SkewY,
    #[serde(alias = "autoAlpha")]
    Opacity,
    /// Brightness filter multiplier, 1.0 == 100%.
    Brightness,
}

impl Property {
    pub const ALL: [Property; 15] = [
        Property::X,
        Property::Y,
        Property::Z,
        Property::XPercent,
        Property::YPercent,
        Property::RotateX,
        Property::RotateY,
        Property::Rotate,
        Property::Scale,
        Property::ScaleX,
        Property::ScaleY,
        Property::SkewX,
        Property::SkewY,
        Property::Opacity,
        Property::Brightness,
    ];

    /// Value the property has when nothing animates it.
    #[inline]
    pub fn baseline(self) -> f32 {
        match self {
            Property::Scale
            | Property::ScaleX
            | Property::ScaleY
            | Property::Opacity
            | Property::Brightness => 1.0,
            _ => 0.0,
        }
    }

    /// Pose component this property reads from, if any.
    pub fn pose_field(self) -> Option<PoseField> {
        Some(match self {
            Property::X => PoseField::X,
            Property::Y => PoseField::Y,
            Property::Z => PoseField::Z,
            Property::RotateX => PoseField::RotateX,
            Property::RotateY => PoseField::RotateY,
            Property::Scale => PoseField::Scale,
            Property::Opacity => PoseField::Opacity,
            _ => return None,
        })
    }
}

/// Complete visual state for one element. Starts at the baseline and is
/// overwritten property by property as tweens are evaluated.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub x_percent: f32,
    pub y_percent: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate: f32,
    pub scale: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub skew_x: f32,
    pub skew_y: f32,
    pub opacity: f32,
    pub brightness: f32,
}

impl RenderState {
    pub const BASELINE: RenderState = RenderState {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        x_percent: 0.0,
        y_percent: 0.0,
        rotate_x: 0.0,
        rotate_y: 0.0,
        rotate: 0.0,
        scale: 1.0,
        scale_x: 1.0,
        scale_y: 1.0,
        skew_x: 0.0,
        skew_y: 0.0,
        opacity: 1.0,
        brightness: 1.0,
    };

    pub fn get(&self, prop: Property) -> f32 {
        match prop {
            Property::X => self.x,
            Property::Y => self.y,
            Property::Z => self.z,
            Property::XPercent => self.x_percent,
            Property::YPercent => self.y_percent,
            Property::RotateX => self.rotate_x,
            Property::RotateY => self.rotate_y,
            Property::Rotate => self.rotate,
            Property::Scale => self.scale,
            Property::ScaleX => self.scale_x,
            Property::ScaleY => self.scale_y,
            Property::SkewX => self.skew_x,
            Property::SkewY => self.skew_y,
            Property::Opacity => self.opacity,
            Property::Brightness => self.brightness,
        }
    }

    pub fn set(&mut self, prop: Property, value: f32) {
        let slot = match prop {
            Property::X => &mut self.x,
            Property::Y => &mut self.y,
            Property::Z => &mut self.z,
            Property::XPercent => &mut self.x_percent,
            Property::YPercent => &mut self.y_percent,
            Property::RotateX => &mut self.rotate_x,
            Property::RotateY => &mut self.rotate_y,
            Property::Rotate => &mut self.rotate,
            Property::Scale => &mut self.scale,
            Property::ScaleX => &mut self.scale_x,
            Property::ScaleY => &mut self.scale_y,
            Property::SkewX => &mut self.skew_x,
            Property::SkewY => &mut self.skew_y,
            Property::Opacity => &mut self.opacity,
            Property::Brightness => &mut self.brightness,
        };
        *slot = value;
    }

    /// autoAlpha semantics: fully transparent elements are hidden.
    #[inline]
    pub fn visible(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::BASELINE
    }

    /// The subset of the state expressible as a [`Pose`].
    pub fn pose(&self) -> Pose {
        Pose {
            x: self.x,
            y: self.y,
            z: self.z,
            rotate_x: self.rotate_x,
            rotate_y: self.rotate_y,
            scale: self.scale,
            opacity: self.opacity,
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Exact at both ends: `t == 0` yields `a` and `t == 1` yields `b`.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
