//! Declarative timeline definitions in absolute time units.
//!
//! Durations, stagger budgets and positions are authored in arbitrary time
//! units (typically "seconds" in the web vocabulary). `build` lays the tweens
//! out, resolves targets and value sources, and normalizes everything so the
//! whole timeline spans exactly 1.0 of scroll progress.

use hashbrown::HashMap;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ease::Ease;
use crate::elements::ElementRegistry;
use crate::error::{CoreError, CoreResult};
use crate::ids::ElementId;
use crate::pose::PoseCache;
use crate::properties::Property;
use crate::stagger::{distribute, StaggerConfig};
use crate::timeline::Timeline;
use crate::tween::{PropertyTween, ResolveEnv, TweenSpec, ValueCtx, ValueFn};

/// Where a tween starts on the timeline.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    /// Right after the end of the previous tween.
    #[default]
    Append,
    /// At an absolute time.
    At(f32),
    /// Offset from the end of the previous tween (may be negative).
    Relative(f32),
}

/// Start/end sources of one property. A missing `to` is the baseline. A missing
/// `from` continues from where the previously defined tween on the same element
/// and property ended, or the baseline when there is none.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropDef {
    pub property: Property,
    #[serde(default)]
    pub from: Option<ValueFn>,
    #[serde(default)]
    pub to: Option<ValueFn>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TweenDef {
    /// Element group animated by this tween.
    pub targets: String,
    pub props: Vec<PropDef>,
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default)]
    pub stagger: Option<StaggerConfig>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub ease: Option<Ease>,
}

impl TweenDef {
    /// Animate from the given values to the baseline.
    pub fn from(targets: &str, props: Vec<(Property, ValueFn)>) -> Self {
        Self::new(
            targets,
            props
                .into_iter()
                .map(|(property, v)| PropDef {
                    property,
                    from: Some(v),
                    to: None,
                })
                .collect(),
        )
    }

    /// Animate from the baseline to the given values.
    pub fn to(targets: &str, props: Vec<(Property, ValueFn)>) -> Self {
        Self::new(
            targets,
            props
                .into_iter()
                .map(|(property, v)| PropDef {
                    property,
                    from: None,
                    to: Some(v),
                })
                .collect(),
        )
    }

    pub fn from_to(targets: &str, props: Vec<(Property, ValueFn, ValueFn)>) -> Self {
        Self::new(
            targets,
            props
                .into_iter()
                .map(|(property, from, to)| PropDef {
                    property,
                    from: Some(from),
                    to: Some(to),
                })
                .collect(),
        )
    }

    fn new(targets: &str, props: Vec<PropDef>) -> Self {
        Self {
            targets: targets.to_string(),
            props,
            duration: None,
            stagger: None,
            position: Position::Append,
            ease: None,
        }
    }

    pub fn duration(mut self, d: f32) -> Self {
        self.duration = Some(d);
        self
    }

    pub fn stagger(mut self, s: StaggerConfig) -> Self {
        self.stagger = Some(s);
        self
    }

    pub fn at(mut self, t: f32) -> Self {
        self.position = Position::At(t);
        self
    }

    pub fn position(mut self, p: Position) -> Self {
        self.position = p;
        self
    }

    pub fn ease(mut self, e: Ease) -> Self {
        self.ease = Some(e);
        self
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimelineDef {
    #[serde(default)]
    pub default_ease: Option<Ease>,
    pub tweens: Vec<TweenDef>,
}

/// Inputs needed to turn definitions into a concrete timeline.
pub struct BuildCtx<'a> {
    pub elements: &'a ElementRegistry,
    pub poses: &'a mut PoseCache,
    pub rng: &'a mut StdRng,
    pub config: &'a Config,
    /// Scroll offset at which value sources observe element bounds. Layout
    /// dependent sources (poses) see the elements as they sit in the viewport
    /// at this scroll position.
    pub scroll_origin: f32,
}

/// A built timeline plus the degradations encountered while building it.
#[derive(Debug)]
pub struct Built {
    pub timeline: Timeline,
    pub diagnostics: Vec<CoreError>,
}

struct Laid {
    targets: Vec<ElementId>,
    props: Vec<PropertyTween>,
    start: f32,
    end: f32,
    delays: Vec<f32>,
    ease: Option<Ease>,
}

impl TimelineDef {
    pub fn new(default_ease: Option<Ease>) -> Self {
        Self {
            default_ease,
            tweens: Vec::new(),
        }
    }

    pub fn push(mut self, tween: TweenDef) -> Self {
        self.tweens.push(tween);
        self
    }

    /// Every element group referenced by a tween.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.tweens.iter().map(|t| t.targets.as_str())
    }

    /// Lay out, resolve and normalize. Fails when a target group is empty.
    pub fn build(&self, ctx: &mut BuildCtx<'_>) -> CoreResult<Built> {
        let mut diagnostics = Vec::new();
        let mut laid: Vec<Laid> = Vec::with_capacity(self.tweens.len());
        let mut cursor = 0.0f32;
        let mut total = 0.0f32;
        let viewport = ctx.poses.viewport();
        let elements = ctx.elements;
        let origin = ctx.scroll_origin;
        // End value of the last tween defined so far, per element and property.
        let mut carried: HashMap<(ElementId, Property), f32> = HashMap::new();

        for def in &self.tweens {
            let handles = elements.group(&def.targets);
            if handles.is_empty() {
                return Err(CoreError::MissingTriggerElement {
                    group: def.targets.clone(),
                });
            }
            let n = handles.len();

            let delays = match &def.stagger {
                Some(cfg) => {
                    let dist = distribute(n, cfg, &mut *ctx.rng);
                    diagnostics.extend(dist.diagnostic);
                    dist.delays
                }
                None => vec![0.0; n],
            };
            let amount = delays.iter().copied().fold(0.0f32, f32::max);
            let duration = def
                .duration
                .unwrap_or(ctx.config.default_duration)
                .max(0.0);
            let start = match def.position {
                Position::Append => cursor,
                Position::At(t) => t,
                Position::Relative(o) => cursor + o,
            }
            .max(0.0);
            let end = start + duration + amount;
            cursor = end;
            total = total.max(end);

            let mut env = ResolveEnv {
                poses: &mut *ctx.poses,
                rng: &mut *ctx.rng,
                pose_defaults: ctx.config.pose,
            };
            let mut props = Vec::with_capacity(def.props.len());
            for pd in &def.props {
                let mut from = Vec::with_capacity(n);
                let mut to = Vec::with_capacity(n);
                for (index, h) in handles.iter().enumerate() {
                    let vctx = ValueCtx {
                        index,
                        count: n,
                        element: h.id,
                        bounds: h.bounds.scrolled_by(origin),
                        viewport,
                    };
                    let current = carried
                        .get(&(h.id, pd.property))
                        .copied()
                        .unwrap_or_else(|| pd.property.baseline());
                    let first = match pd.from.as_ref() {
                        Some(f) => f.resolve(pd.property, &vctx, &mut env),
                        None => current,
                    };
                    let last = match pd.to.as_ref() {
                        Some(f) => f.resolve(pd.property, &vctx, &mut env),
                        None => pd.property.baseline(),
                    };
                    carried.insert((h.id, pd.property), last);
                    from.push(first);
                    to.push(last);
                }
                props.push(PropertyTween {
                    property: pd.property,
                    from,
                    to,
                });
            }

            laid.push(Laid {
                targets: handles.iter().map(|h| h.id).collect(),
                props,
                start,
                end,
                delays,
                ease: def.ease,
            });
        }

        let scale = if total > 0.0 { total.recip() } else { 1.0 };
        let mut tweens = Vec::with_capacity(laid.len());
        for l in laid {
            tweens.push(TweenSpec::new(
                l.targets,
                l.props,
                l.start * scale,
                l.end * scale,
                l.delays.into_iter().map(|d| d * scale).collect(),
                l.ease,
            )?);
        }

        let default_ease = self.default_ease.unwrap_or(ctx.config.default_ease);
        Ok(Built {
            timeline: Timeline::new(tweens, default_ease),
            diagnostics,
        })
    }
}
