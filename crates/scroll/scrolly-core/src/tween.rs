//! Tween specs and the value sources that feed them.
//!
//! A [`ValueFn`] is evaluated once per element when a timeline is built (and
//! again after a layout change); the resulting numbers are frozen into a
//! [`TweenSpec`]. Evaluating a timeline therefore never calls back into value
//! sources, random generators, or the pose calculator.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ease::Ease;
use crate::error::{CoreError, CoreResult};
use crate::geometry::{Rect, Size};
use crate::ids::ElementId;
use crate::pose::{PoseCache, PoseField, PoseOverrides, PoseParams};
use crate::properties::{lerp_f32, Property};

const WINDOW_EPS: f32 = 1e-5;

/// Everything a value source may look at for one element.
#[derive(Clone, Copy, Debug)]
pub struct ValueCtx {
    pub index: usize,
    pub count: usize,
    pub element: ElementId,
    pub bounds: Rect,
    pub viewport: Size,
}

#[derive(Clone)]
pub struct ValueClosure(pub Arc<dyn Fn(&ValueCtx) -> f32 + Send + Sync>);

impl fmt::Debug for ValueClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueClosure(..)")
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewportAxis {
    Width,
    Height,
}

fn one() -> f32 {
    1.0
}

/// Source of a per-element start or end value.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueFn {
    /// The property's resting value.
    Baseline,
    Const(f32),
    /// Explicit value per element index; the last entry repeats.
    PerIndex(Vec<f32>),
    Alternate { even: f32, odd: f32 },
    /// `|i - mid| * per_step`, positive before the middle element and negative after it.
    DistanceFromMiddle { per_step: f32 },
    /// One value for the last element, another for the rest.
    LastElse { last: f32, others: f32 },
    /// Uniform in `[min, max)` from the seeded source.
    Random { min: f32, max: f32 },
    /// Uniform in `[min_factor, max_factor)` times a viewport extent.
    Viewport {
        axis: ViewportAxis,
        #[serde(default = "one")]
        min_factor: f32,
        #[serde(default = "one")]
        max_factor: f32,
    },
    /// One component of the element's cached initial pose, scaled by `factor`.
    Pose {
        #[serde(default)]
        field: Option<PoseField>,
        #[serde(default = "one")]
        factor: f32,
        #[serde(default)]
        params: PoseOverrides,
    },
    #[serde(skip)]
    Custom(ValueClosure),
}

impl ValueFn {
    pub fn custom(f: impl Fn(&ValueCtx) -> f32 + Send + Sync + 'static) -> Self {
        ValueFn::Custom(ValueClosure(Arc::new(f)))
    }

    pub fn pose() -> Self {
        ValueFn::Pose {
            field: None,
            factor: 1.0,
            params: PoseOverrides::default(),
        }
    }
}

impl From<f32> for ValueFn {
    fn from(v: f32) -> Self {
        ValueFn::Const(v)
    }
}

/// Shared state while resolving value sources for one timeline.
pub struct ResolveEnv<'a> {
    pub poses: &'a mut PoseCache,
    pub rng: &'a mut StdRng,
    pub pose_defaults: PoseParams,
}

impl ValueFn {
    pub fn resolve(&self, prop: Property, ctx: &ValueCtx, env: &mut ResolveEnv<'_>) -> f32 {
        match self {
            ValueFn::Baseline => prop.baseline(),
            ValueFn::Const(v) => *v,
            ValueFn::PerIndex(values) => values
                .get(ctx.index)
                .or_else(|| values.last())
                .copied()
                .unwrap_or_else(|| prop.baseline()),
            ValueFn::Alternate { even, odd } => {
                if ctx.index % 2 == 0 {
                    *even
                } else {
                    *odd
                }
            }
            ValueFn::DistanceFromMiddle { per_step } => {
                let mid = ctx.count / 2;
                let dist = ctx.index.abs_diff(mid) as f32;
                if ctx.index < mid {
                    dist * per_step
                } else {
                    -dist * per_step
                }
            }
            ValueFn::LastElse { last, others } => {
                if ctx.index + 1 == ctx.count {
                    *last
                } else {
                    *others
                }
            }
            ValueFn::Random { min, max } => random_in(env.rng, *min, *max),
            ValueFn::Viewport {
                axis,
                min_factor,
                max_factor,
            } => {
                let extent = match axis {
                    ViewportAxis::Width => ctx.viewport.width,
                    ViewportAxis::Height => ctx.viewport.height,
                };
                random_in(env.rng, extent * min_factor, extent * max_factor)
            }
            ValueFn::Pose {
                field,
                factor,
                params,
            } => match field.or_else(|| prop.pose_field()) {
                Some(field) => {
                    let params = params.resolve(env.pose_defaults);
                    let pose = env.poses.get_or_compute(ctx.element, ctx.bounds, params);
                    pose.field(field) * factor
                }
                None => {
                    log::warn!("{prop:?} has no pose component; using its baseline");
                    prop.baseline()
                }
            },
            ValueFn::Custom(f) => (f.0)(ctx),
        }
    }
}

fn random_in(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if hi - lo <= f32::EPSILON {
        lo
    } else {
        rng.gen_range(lo..hi)
    }
}

/// Resolved start/end values of one property, indexed like the tween targets.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyTween {
    pub property: Property,
    pub from: Vec<f32>,
    pub to: Vec<f32>,
}

impl PropertyTween {
    #[inline]
    pub fn value_at(&self, index: usize, eased: f32) -> f32 {
        lerp_f32(self.from[index], self.to[index], eased)
    }
}

/// One tween inside a normalized timeline (total duration 1.0).
///
/// The tween occupies `[start, end]`. Element `i` animates over
/// `[start + delays[i], start + delays[i] + element_span]` where
/// `element_span = (end - start) - max(delays)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TweenSpec {
    targets: Vec<ElementId>,
    props: Vec<PropertyTween>,
    start: f32,
    end: f32,
    delays: Vec<f32>,
    element_span: f32,
    ease: Option<Ease>,
}

impl TweenSpec {
    pub fn new(
        targets: Vec<ElementId>,
        props: Vec<PropertyTween>,
        start: f32,
        end: f32,
        delays: Vec<f32>,
        ease: Option<Ease>,
    ) -> CoreResult<Self> {
        let in_unit = |v: f32| (-WINDOW_EPS..=1.0 + WINDOW_EPS).contains(&v);
        if !(in_unit(start) && in_unit(end) && start <= end) {
            return Err(CoreError::InvalidWindow { start, end });
        }
        let (start, end) = (start.clamp(0.0, 1.0), end.clamp(0.0, 1.0));
        let n = targets.len();
        let bad_len = delays.len() != n
            || props.iter().any(|p| p.from.len() != n || p.to.len() != n);
        if bad_len {
            return Err(CoreError::InvalidWindow { start, end });
        }
        let span = end - start;
        let mut max_delay = 0.0f32;
        for d in &delays {
            if !d.is_finite() || *d < 0.0 {
                return Err(CoreError::MalformedStaggerConfig {
                    reason: format!("negative or non-finite delay {d}"),
                });
            }
            max_delay = max_delay.max(*d);
        }
        if max_delay > span + WINDOW_EPS {
            return Err(CoreError::StaggerExceedsWindow {
                amount: max_delay,
                span,
            });
        }
        Ok(Self {
            targets,
            props,
            start,
            end,
            delays,
            element_span: (span - max_delay).max(0.0),
            ease,
        })
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    pub fn props(&self) -> &[PropertyTween] {
        &self.props
    }

    pub fn window(&self) -> (f32, f32) {
        (self.start, self.end)
    }

    pub fn delays(&self) -> &[f32] {
        &self.delays
    }

    pub fn ease(&self) -> Option<Ease> {
        self.ease
    }

    /// Window of element `index` within the timeline.
    pub fn element_window(&self, index: usize) -> (f32, f32) {
        let s = self.start + self.delays[index];
        (s, s + self.element_span)
    }

    /// Clamped local progress of element `index` at timeline progress `global`.
    pub fn local_progress(&self, index: usize, global: f32) -> f32 {
        let (s, e) = self.element_window(index);
        if e - s <= f32::EPSILON {
            return if global >= s { 1.0 } else { 0.0 };
        }
        ((global - s) / (e - s)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn ctx(index: usize, count: usize) -> ValueCtx {
        ValueCtx {
            index,
            count,
            element: ElementId(index as u32),
            bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
            viewport: Size::new(1000.0, 800.0),
        }
    }

    fn resolve_all(f: &ValueFn, prop: Property, count: usize, seed: u64) -> Vec<f32> {
        let mut poses = PoseCache::new(Size::new(1000.0, 800.0));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut env = ResolveEnv {
            poses: &mut poses,
            rng: &mut rng,
            pose_defaults: PoseParams::default(),
        };
        (0..count)
            .map(|i| f.resolve(prop, &ctx(i, count), &mut env))
            .collect()
    }

    #[test]
    fn fan_rotation_is_signed_by_side() {
        let v = resolve_all(&ValueFn::DistanceFromMiddle { per_step: 3.0 }, Property::Rotate, 5, 0);
        assert_eq!(v, vec![6.0, 3.0, 0.0, -3.0, -6.0]);
    }

    #[test]
    fn random_sources_are_seeded() {
        let f = ValueFn::Viewport {
            axis: ViewportAxis::Height,
            min_factor: 1.0,
            max_factor: 1.8,
        };
        let a = resolve_all(&f, Property::Y, 8, 42);
        let b = resolve_all(&f, Property::Y, 8, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (800.0..1440.0).contains(v)));
    }

    #[test]
    fn baseline_and_per_index_fallbacks() {
        assert_eq!(resolve_all(&ValueFn::Baseline, Property::Scale, 2, 0), vec![1.0, 1.0]);
        assert_eq!(
            resolve_all(&ValueFn::PerIndex(vec![1.0, 2.0]), Property::X, 3, 0),
            vec![1.0, 2.0, 2.0]
        );
        assert_eq!(
            resolve_all(&ValueFn::LastElse { last: 1.0, others: 0.2 }, Property::Brightness, 3, 0),
            vec![0.2, 0.2, 1.0]
        );
    }

    #[test]
    fn staggered_windows_share_duration() {
        let t = TweenSpec::new(
            vec![ElementId(0), ElementId(1)],
            vec![],
            0.0,
            1.0,
            vec![0.0, 0.5],
            None,
        )
        .unwrap();
        assert_eq!(t.element_window(0), (0.0, 0.5));
        assert_eq!(t.element_window(1), (0.5, 1.0));
        assert_eq!(t.local_progress(1, 0.75), 0.5);
    }

    #[test]
    fn rejects_stagger_past_window() {
        let err = TweenSpec::new(vec![ElementId(0)], vec![], 0.2, 0.4, vec![0.5], None).unwrap_err();
        assert!(matches!(err, CoreError::StaggerExceedsWindow { .. }));
        let err = TweenSpec::new(vec![], vec![], 0.6, 0.4, vec![], None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidWindow { .. }));
    }
}
