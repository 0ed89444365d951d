//! Geometric initial-pose calculation.
//!
//! Pushes an element further out from the viewport center along the line that
//! joins both centers, tilts it to face outward, and moves it back in depth.
//! Rotation and depth scale with how far the element already is from center,
//! so elements near the middle barely move while corner elements get the full
//! `max_rotation_deg` / `max_z_translation`.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};
use crate::ids::ElementId;

/// Full set of 3D transform + visibility values for one element.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        rotate_x: 0.0,
        rotate_y: 0.0,
        scale: 1.0,
        opacity: 1.0,
    };

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn field(&self, field: PoseField) -> f32 {
        match field {
            PoseField::X => self.x,
            PoseField::Y => self.y,
            PoseField::Z => self.z,
            PoseField::RotateX => self.rotate_x,
            PoseField::RotateY => self.rotate_y,
            PoseField::Scale => self.scale,
            PoseField::Opacity => self.opacity,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PoseField {
    X,
    Y,
    Z,
    RotateX,
    RotateY,
    Scale,
    Opacity,
}

/// The three scale parameters of the calculation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseParams {
    /// Outward translation in px applied along the center-to-element direction.
    pub offset_distance: f32,
    /// Rotation in degrees reached at the viewport corner.
    pub max_rotation_deg: f32,
    /// Z translation in px reached at the viewport corner.
    pub max_z_translation: f32,
}

impl PoseParams {
    pub const fn new(offset_distance: f32, max_rotation_deg: f32, max_z_translation: f32) -> Self {
        Self {
            offset_distance,
            max_rotation_deg,
            max_z_translation,
        }
    }
}

impl Default for PoseParams {
    fn default() -> Self {
        Self::new(250.0, 300.0, 2000.0)
    }
}

/// Partially specified parameters; unset fields fall back to a base set.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoseOverrides {
    pub offset_distance: Option<f32>,
    pub max_rotation_deg: Option<f32>,
    pub max_z_translation: Option<f32>,
}

impl PoseOverrides {
    /// Non-finite overrides count as unset.
    pub fn resolve(&self, base: PoseParams) -> PoseParams {
        let pick = |v: Option<f32>, fallback: f32| v.filter(|x| x.is_finite()).unwrap_or(fallback);
        PoseParams {
            offset_distance: pick(self.offset_distance, base.offset_distance),
            max_rotation_deg: pick(self.max_rotation_deg, base.max_rotation_deg),
            max_z_translation: pick(self.max_z_translation, base.max_z_translation),
        }
    }
}

/// Compute the initial pose of an element relative to the viewport center.
///
/// Degenerate viewports (zero area, non-finite) and elements centered exactly on
/// the viewport center yield [`Pose::IDENTITY`].
pub fn transform(
    bounds: Rect,
    viewport: Size,
    offset_distance: f32,
    max_rotation_deg: f32,
    max_z_translation: f32,
) -> Pose {
    if viewport.is_degenerate() {
        return Pose::IDENTITY;
    }
    let center = viewport.center();
    let ec = bounds.center();
    let dx = center.x - ec.x;
    let dy = center.y - ec.y;

    let max_distance = (center.x * center.x + center.y * center.y).sqrt();
    let current_distance = (dx * dx + dy * dy).sqrt();
    if max_distance <= 0.0 || current_distance == 0.0 {
        return Pose::IDENTITY;
    }
    let distance_factor = current_distance / max_distance;

    let angle = dy.abs().atan2(dx.abs());
    // |cos| and |sin| are translate_x / offset and translate_y / offset.
    let ratio_x = angle.cos().abs();
    let ratio_y = angle.sin().abs();
    let translate_x = ratio_x * offset_distance;
    let translate_y = ratio_y * offset_distance;

    let left = ec.x < center.x;
    let above = ec.y < center.y;

    let rotate_x = if above { -1.0 } else { 1.0 } * ratio_y * max_rotation_deg * distance_factor;
    let rotate_y = if left { 1.0 } else { -1.0 } * ratio_x * max_rotation_deg * distance_factor;

    Pose {
        x: if left { -translate_x } else { translate_x },
        y: if above { -translate_y } else { translate_y },
        z: max_z_translation * distance_factor,
        rotate_x,
        rotate_y,
        scale: 1.0,
        opacity: 1.0,
    }
}

/// [`transform`] taking its scale parameters as a struct.
#[inline]
pub fn transform_with(bounds: Rect, viewport: Size, params: PoseParams) -> Pose {
    transform(
        bounds,
        viewport,
        params.offset_distance,
        params.max_rotation_deg,
        params.max_z_translation,
    )
}

/// Poses are invariant under scroll; compute them once per (element, params)
/// and keep them until the viewport changes.
#[derive(Debug, Default)]
pub struct PoseCache {
    viewport: Size,
    entries: Vec<(PoseParams, HashMap<ElementId, Pose>)>,
}

impl PoseCache {
    pub fn new(viewport: Size) -> Self {
        if viewport.is_degenerate() {
            log::warn!(
                "degenerate viewport {}x{}; poses fall back to identity",
                viewport.width,
                viewport.height
            );
        }
        Self {
            viewport,
            entries: Vec::new(),
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn get_or_compute(&mut self, id: ElementId, bounds: Rect, params: PoseParams) -> Pose {
        let viewport = self.viewport;
        let idx = match self.entries.iter().position(|(p, _)| *p == params) {
            Some(idx) => idx,
            None => {
                self.entries.push((params, HashMap::new()));
                self.entries.len() - 1
            }
        };
        *self.entries[idx]
            .1
            .entry(id)
            .or_insert_with(|| transform_with(bounds, viewport, params))
    }

    /// Drop every cached pose; the next lookups recompute against `viewport`.
    pub fn invalidate(&mut self, viewport: Size) {
        *self = Self::new(viewport);
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, m)| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_fill_from_base() {
        let o = PoseOverrides {
            max_z_translation: Some(-3000.0),
            ..Default::default()
        };
        let p = o.resolve(PoseParams::default());
        assert_eq!(p, PoseParams::new(250.0, 300.0, -3000.0));

        let nan = PoseOverrides {
            offset_distance: Some(f32::NAN),
            ..Default::default()
        };
        assert_eq!(nan.resolve(PoseParams::default()), PoseParams::default());
    }

    #[test]
    fn cache_reuses_and_invalidates() {
        let mut cache = PoseCache::new(Size::new(1000.0, 800.0));
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        let a = cache.get_or_compute(ElementId(0), r, PoseParams::default());
        let b = cache.get_or_compute(ElementId(0), r, PoseParams::default());
        assert_eq!(a, b);
        cache.get_or_compute(ElementId(0), r, PoseParams::new(900.0, 300.0, 2000.0));
        assert_eq!(cache.len(), 2);

        cache.invalidate(Size::new(500.0, 400.0));
        assert!(cache.is_empty());
        let c = cache.get_or_compute(ElementId(0), r, PoseParams::default());
        assert_ne!(a, c);
    }

    #[test]
    fn zero_offset_distance_keeps_rotation_finite() {
        let p = transform(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Size::new(1000.0, 800.0),
            0.0,
            300.0,
            2000.0,
        );
        assert_eq!(p.x, 0.0);
        assert!(p.rotate_x.is_finite() && p.rotate_x != 0.0);
        assert!(p.rotate_y.is_finite() && p.rotate_y != 0.0);
    }
}
