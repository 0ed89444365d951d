//! Region registry and per-frame driver.
//!
//! The registry owns every registered region, gates binding on the asset
//! preload lifecycle, and turns coalesced scroll input into element render
//! states once per frame.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::builder::BuildCtx;
use crate::config::Config;
use crate::elements::ElementRegistry;
use crate::error::{CoreError, CoreResult};
use crate::geometry::Size;
use crate::ids::{ElementId, IdAllocator, RegionId, SubscriptionId};
use crate::outputs::{Change, CoreEvent, Frame};
use crate::pose::PoseCache;
use crate::progress::{PinState, ScrollProgressSource};
use crate::properties::RenderState;
use crate::scene::{RegionDef, SceneDef};
use crate::timeline::Timeline;
use crate::trigger::TriggerRegion;

/// Receives render states and pin instructions for host elements.
pub trait ElementSink {
    fn apply(&mut self, element: ElementId, state: &RenderState);

    /// `Some(offset)` holds the element in place; `None` releases it.
    fn set_pinned(&mut self, _element: ElementId, _offset: Option<f32>) {}
}

/// Sink that drops everything; useful when only the returned [`Frame`] matters.
#[derive(Debug, Default)]
pub struct NullSink;

impl ElementSink for NullSink {
    fn apply(&mut self, _element: ElementId, _state: &RenderState) {}
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Lifecycle {
    Loading,
    Ready,
}

/// Result of the host's asset preload.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PreloadReport {
    #[serde(default)]
    pub loaded: usize,
    /// Assets that failed to load. They count as resolved.
    #[serde(default)]
    pub failed: Vec<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RegionStatus {
    /// Registered, waiting for `init`.
    Pending,
    Active,
    /// Binding failed; see the diagnostic emitted at bind time.
    Skipped,
    Unbound,
}

#[derive(Debug)]
struct Bound {
    subscription: SubscriptionId,
    trigger: TriggerRegion,
    timeline: Timeline,
    pin_element: ElementId,
    progress: Option<f32>,
}

#[derive(Debug)]
enum Status {
    Pending,
    Active(Box<Bound>),
    Skipped,
    Unbound,
}

#[derive(Debug)]
struct Region {
    id: RegionId,
    def: RegionDef,
    status: Status,
    poses: PoseCache,
}

pub struct AnimationRegistry {
    config: Config,
    ids: IdAllocator,
    lifecycle: Lifecycle,
    regions: Vec<Region>,
    source: ScrollProgressSource,
    viewport: Size,
    /// False until the host reports its first viewport.
    viewport_known: bool,
    max_scroll: Option<f32>,
    pending_events: Vec<CoreEvent>,
    pending_releases: Vec<ElementId>,
}

impl AnimationRegistry {
    pub fn new(config: Config) -> Self {
        let source = ScrollProgressSource::new(0.0, config.scrub_epsilon);
        Self {
            config,
            ids: IdAllocator::new(),
            lifecycle: Lifecycle::Loading,
            regions: Vec::new(),
            source,
            viewport: Size::default(),
            viewport_known: false,
            max_scroll: None,
            pending_events: Vec::new(),
            pending_releases: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn scroll(&self) -> f32 {
        self.source.scroll()
    }

    /// Register a region. It binds on the next `init`.
    pub fn register(&mut self, def: RegionDef) -> RegionId {
        let id = self.ids.alloc_region();
        self.regions.push(Region {
            id,
            def,
            status: Status::Pending,
            poses: PoseCache::default(),
        });
        id
    }

    pub fn load_scene(&mut self, scene: SceneDef) -> Vec<RegionId> {
        scene.regions.into_iter().map(|r| self.register(r)).collect()
    }

    /// The one-way `Loading -> Ready` transition.
    pub fn mark_ready(&mut self, report: PreloadReport) -> CoreResult<()> {
        if self.lifecycle == Lifecycle::Ready {
            return Err(CoreError::AlreadyReady);
        }
        for asset in &report.failed {
            log::warn!("asset '{asset}' failed to preload; continuing without it");
        }
        log::info!(
            "assets resolved: {} loaded, {} failed",
            report.loaded,
            report.failed.len()
        );
        self.lifecycle = Lifecycle::Ready;
        self.pending_events.push(CoreEvent::LifecycleReady {
            failed_assets: report.failed.len(),
        });
        Ok(())
    }

    /// Upper bound for clamped trigger anchors (document height minus viewport).
    pub fn set_max_scroll(&mut self, max_scroll: Option<f32>) {
        self.max_scroll = max_scroll.filter(|m| m.is_finite());
    }

    /// Bind every pending region against the given layout.
    ///
    /// Regions whose groups resolve to nothing are skipped with a diagnostic;
    /// the rest bind normally. Returns the regions bound by this call.
    pub fn init(&mut self, elements: &ElementRegistry, viewport: Size) -> CoreResult<Vec<RegionId>> {
        if self.lifecycle != Lifecycle::Ready {
            return Err(CoreError::NotReady);
        }
        self.set_viewport(viewport);

        let mut bound = Vec::new();
        for idx in 0..self.regions.len() {
            if !matches!(self.regions[idx].status, Status::Pending) {
                continue;
            }
            let region = &mut self.regions[idx];
            region.poses = PoseCache::new(viewport);
            match bind_region(region, elements, viewport, self.max_scroll, &self.config) {
                Ok((mut b, diagnostics)) => {
                    b.subscription = self.source.bind(b.trigger);
                    region.status = Status::Active(Box::new(b));
                    for error in diagnostics {
                        self.pending_events.push(CoreEvent::Diagnostic {
                            region: Some(region.id),
                            error,
                        });
                    }
                    log::debug!("region '{}' bound as {:?}", region.def.name, region.id);
                    bound.push(region.id);
                }
                Err(error) => {
                    log::warn!("skipping region '{}': {error}", region.def.name);
                    region.status = Status::Skipped;
                    self.pending_events.push(CoreEvent::Diagnostic {
                        region: Some(region.id),
                        error,
                    });
                }
            }
        }
        Ok(bound)
    }

    /// Record a scroll position. Any number of calls per frame coalesce.
    pub fn on_scroll(&mut self, position: f32) {
        self.source.notify_scroll(position);
    }

    /// True while `frame` could produce output.
    pub fn needs_frame(&self) -> bool {
        self.source.needs_update()
            || !self.pending_events.is_empty()
            || !self.pending_releases.is_empty()
    }

    /// Process one display frame: at most one progress sample and one timeline
    /// evaluation per active region.
    pub fn frame(&mut self, dt: f32, sink: &mut impl ElementSink) -> Frame {
        let mut frame = Frame::default();
        frame.events.append(&mut self.pending_events);
        for element in self.pending_releases.drain(..) {
            sink.set_pinned(element, None);
        }

        let mut finished = Vec::new();
        for sample in self.source.tick(dt) {
            let Some(region) = self.regions.iter_mut().find(|r| {
                matches!(&r.status, Status::Active(b) if b.subscription == sample.subscription)
            }) else {
                continue;
            };
            let Status::Active(bound) = &mut region.status else {
                continue;
            };

            let applied = bound.timeline.advance(sample.progress);
            for (element, state) in applied.iter() {
                sink.apply(*element, state);
                frame.push_change(Change {
                    region: region.id,
                    element: *element,
                    state: *state,
                });
            }

            let interior = |p: f32| p > 0.0 && p < 1.0;
            let was_inside = bound.progress.is_some_and(interior);
            if interior(sample.progress) && !was_inside {
                frame.push_event(CoreEvent::RegionEntered {
                    region: region.id,
                    progress: sample.progress,
                });
            } else if !interior(sample.progress) && was_inside {
                frame.push_event(CoreEvent::RegionLeft {
                    region: region.id,
                    progress: sample.progress,
                });
            }
            bound.progress = Some(sample.progress);

            if sample.pin_changed {
                frame.push_event(CoreEvent::PinChanged {
                    region: region.id,
                    element: bound.pin_element,
                    pinned: sample.pin.is_pinned(),
                });
            }
            if sample.pin_changed || sample.pin.is_pinned() {
                sink.set_pinned(bound.pin_element, sample.pin.offset());
            }

            // Wait for smoothing to land on the end state before releasing.
            if region.def.once && sample.progress >= 1.0 {
                finished.push(region.id);
            }
        }

        for id in finished {
            if self.unbind(id).is_ok() {
                frame.events.append(&mut self.pending_events);
            }
        }

        let cap = self.config.max_events_per_frame;
        if frame.events.len() > cap {
            log::debug!("dropping {} events past the per-frame cap", frame.events.len() - cap);
            frame.events.truncate(cap);
        }
        frame
    }

    /// Re-resolve every active region against a new layout.
    ///
    /// Timeline structure is kept; layout dependent values (poses, viewport
    /// sized randoms, trigger offsets) are recomputed. Regions that no longer
    /// bind are skipped and their errors returned.
    pub fn on_resize(&mut self, elements: &ElementRegistry, viewport: Size) -> Vec<CoreError> {
        self.set_viewport(viewport);
        let mut errors = Vec::new();
        for region in &mut self.regions {
            let Status::Active(old) = &region.status else {
                continue;
            };
            let (subscription, pin_element) = (old.subscription, old.pin_element);
            region.poses.invalidate(viewport);
            match bind_region(region, elements, viewport, self.max_scroll, &self.config) {
                Ok((mut b, diagnostics)) => {
                    b.subscription = subscription;
                    self.source.rebind(subscription, b.trigger);
                    for error in diagnostics {
                        self.pending_events.push(CoreEvent::Diagnostic {
                            region: Some(region.id),
                            error,
                        });
                    }
                    region.status = Status::Active(Box::new(b));
                }
                Err(error) => {
                    log::warn!("region '{}' lost its layout: {error}", region.def.name);
                    if self.source.unbind(subscription).is_some_and(|p| p.is_pinned()) {
                        self.pending_releases.push(pin_element);
                    }
                    region.status = Status::Skipped;
                    self.pending_events.push(CoreEvent::Diagnostic {
                        region: Some(region.id),
                        error: error.clone(),
                    });
                    errors.push(error);
                }
            }
        }
        errors
    }

    /// Release a region for good: its pin is lifted and it produces no further
    /// output. Unbinding an already released region is a no-op.
    pub fn unbind(&mut self, id: RegionId) -> CoreResult<()> {
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CoreError::UnknownRegion { id })?;
        match std::mem::replace(&mut region.status, Status::Unbound) {
            Status::Unbound => return Ok(()),
            Status::Active(bound) => {
                if let Some(PinState::Pinned { .. }) = self.source.unbind(bound.subscription) {
                    self.pending_releases.push(bound.pin_element);
                    self.pending_events.push(CoreEvent::PinChanged {
                        region: id,
                        element: bound.pin_element,
                        pinned: false,
                    });
                }
            }
            Status::Pending | Status::Skipped => {}
        }
        region.poses = PoseCache::default();
        log::debug!("region '{}' unbound", region.def.name);
        self.pending_events.push(CoreEvent::RegionUnbound { region: id });
        Ok(())
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().map(|r| r.id)
    }

    pub fn region_by_name(&self, name: &str) -> Option<RegionId> {
        self.regions.iter().find(|r| r.def.name == name).map(|r| r.id)
    }

    pub fn region_status(&self, id: RegionId) -> Option<RegionStatus> {
        self.regions.iter().find(|r| r.id == id).map(|r| match r.status {
            Status::Pending => RegionStatus::Pending,
            Status::Active(_) => RegionStatus::Active,
            Status::Skipped => RegionStatus::Skipped,
            Status::Unbound => RegionStatus::Unbound,
        })
    }

    pub fn timeline(&self, id: RegionId) -> Option<&Timeline> {
        self.bound(id).map(|b| &b.timeline)
    }

    pub fn trigger_region(&self, id: RegionId) -> Option<TriggerRegion> {
        self.bound(id).map(|b| b.trigger)
    }

    /// Last progress applied for the region, if any frame has run since binding.
    pub fn progress(&self, id: RegionId) -> Option<f32> {
        self.bound(id).and_then(|b| b.progress)
    }

    fn bound(&self, id: RegionId) -> Option<&Bound> {
        self.regions.iter().find(|r| r.id == id).and_then(|r| match &r.status {
            Status::Active(b) => Some(b.as_ref()),
            _ => None,
        })
    }

    fn set_viewport(&mut self, viewport: Size) {
        let changed = !self.viewport_known || viewport != self.viewport;
        if viewport.is_degenerate() && changed {
            self.pending_events.push(CoreEvent::Diagnostic {
                region: None,
                error: CoreError::DegenerateViewport {
                    width: viewport.width,
                    height: viewport.height,
                },
            });
        }
        self.viewport = viewport;
        self.viewport_known = true;
    }
}

fn region_seed(base: u64, id: RegionId) -> u64 {
    base ^ u64::from(id.0).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Resolve groups, trigger range and timeline values for one region.
/// The returned subscription is a placeholder; callers fill it in.
fn bind_region(
    region: &mut Region,
    elements: &ElementRegistry,
    viewport: Size,
    max_scroll: Option<f32>,
    config: &Config,
) -> CoreResult<(Bound, Vec<CoreError>)> {
    let def = &region.def;
    let trigger_el = elements
        .group(&def.trigger)
        .first()
        .ok_or_else(|| CoreError::MissingTriggerElement {
            group: def.trigger.clone(),
        })?;

    let mut diagnostics = Vec::new();
    let pin_element = match def.pin_target.as_deref() {
        Some(group) => match elements.group(group).first() {
            Some(h) => h.id,
            None => {
                log::warn!("pin target '{group}' is empty; pinning the trigger element");
                diagnostics.push(CoreError::MissingTriggerElement {
                    group: group.to_string(),
                });
                trigger_el.id
            }
        },
        None => trigger_el.id,
    };

    let trigger = def
        .scroll
        .resolve(trigger_el.id, trigger_el.bounds, viewport, max_scroll)?;

    let mut rng = StdRng::seed_from_u64(region_seed(config.seed, region.id));
    let built = def.timeline.build(&mut BuildCtx {
        elements,
        poses: &mut region.poses,
        rng: &mut rng,
        config,
        scroll_origin: trigger.start(),
    })?;
    diagnostics.extend(built.diagnostics);

    Ok((
        Bound {
            subscription: SubscriptionId(u32::MAX),
            trigger,
            timeline: built.timeline,
            pin_element,
            progress: None,
        },
        diagnostics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{TimelineDef, TweenDef};
    use crate::ease::Ease;
    use crate::geometry::Rect;
    use crate::properties::Property;
    use crate::trigger::{Anchor, Edge, EndSpec, Scrub, TriggerSpec};
    use crate::tween::ValueFn;

    fn layout() -> ElementRegistry {
        let mut reg = ElementRegistry::new();
        reg.add_group("section", &[Rect::new(0.0, 1000.0, 1000.0, 800.0)]);
        reg.add_group("items", &[Rect::new(100.0, 1100.0, 100.0, 100.0); 2]);
        reg
    }

    fn region_def() -> RegionDef {
        let scroll = TriggerSpec {
            start: Anchor::new(Edge::Top, Edge::Top),
            end: EndSpec::Relative(1.0),
            pin: true,
            scrub: Scrub::Instant,
        };
        let timeline = TimelineDef::new(Some(Ease::LINEAR)).push(
            TweenDef::from("items", vec![(Property::Opacity, ValueFn::Const(0.0))]).duration(1.0),
        );
        RegionDef::new("fade", "section", scroll, timeline)
    }

    #[derive(Default)]
    struct LastState {
        states: Vec<(ElementId, RenderState)>,
        pins: Vec<(ElementId, Option<f32>)>,
    }

    impl ElementSink for LastState {
        fn apply(&mut self, element: ElementId, state: &RenderState) {
            self.states.retain(|(e, _)| *e != element);
            self.states.push((element, *state));
        }

        fn set_pinned(&mut self, element: ElementId, offset: Option<f32>) {
            self.pins.push((element, offset));
        }
    }

    #[test]
    fn init_requires_ready() {
        let mut reg = AnimationRegistry::new(Config::default());
        reg.register(region_def());
        assert_eq!(
            reg.init(&layout(), Size::new(1000.0, 800.0)),
            Err(CoreError::NotReady)
        );
        reg.mark_ready(PreloadReport::default()).unwrap();
        assert_eq!(reg.mark_ready(PreloadReport::default()), Err(CoreError::AlreadyReady));
        assert_eq!(reg.init(&layout(), Size::new(1000.0, 800.0)).unwrap().len(), 1);
    }

    #[test]
    fn frame_applies_state_and_pins() {
        let mut reg = AnimationRegistry::new(Config::default());
        let id = reg.register(region_def());
        reg.mark_ready(PreloadReport::default()).unwrap();
        reg.init(&layout(), Size::new(1000.0, 800.0)).unwrap();

        reg.on_scroll(1400.0);
        let frame = reg.frame(0.016, &mut NullSink);
        assert_eq!(frame.changes.len(), 2);
        assert!((frame.changes[0].state.opacity - 0.5).abs() < 1e-5);
        assert!(frame
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::PinChanged { pinned: true, .. })));
        assert!(frame
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::RegionEntered { region, .. } if *region == id)));

        // Nothing moved, nothing emitted.
        assert!(reg.frame(0.016, &mut NullSink).is_empty());
    }

    #[test]
    fn missing_trigger_is_skipped_not_fatal() {
        let mut reg = AnimationRegistry::new(Config::default());
        let mut def = region_def();
        def.trigger = "missing".into();
        let bad = reg.register(def);
        let good = reg.register(region_def());
        reg.mark_ready(PreloadReport::default()).unwrap();
        assert_eq!(reg.init(&layout(), Size::new(1000.0, 800.0)).unwrap(), vec![good]);
        assert_eq!(reg.region_status(bad), Some(RegionStatus::Skipped));
        let frame = reg.frame(0.0, &mut NullSink);
        assert!(frame.events.iter().any(|e| matches!(
            e,
            CoreEvent::Diagnostic { error: CoreError::MissingTriggerElement { .. }, .. }
        )));
    }

    #[test]
    fn unbind_is_final() {
        let mut reg = AnimationRegistry::new(Config::default());
        let id = reg.register(region_def());
        reg.mark_ready(PreloadReport::default()).unwrap();
        reg.init(&layout(), Size::new(1000.0, 800.0)).unwrap();
        reg.frame(0.0, &mut NullSink);
        reg.unbind(id).unwrap();
        reg.on_scroll(1500.0);
        let frame = reg.frame(0.016, &mut NullSink);
        assert!(frame.changes.is_empty());
        assert!(frame
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::RegionUnbound { .. })));
        assert_eq!(reg.region_status(id), Some(RegionStatus::Unbound));
        assert!(reg.unbind(id).is_ok());
        assert_eq!(
            reg.unbind(RegionId(99)),
            Err(CoreError::UnknownRegion { id: RegionId(99) })
        );
    }

    #[test]
    fn once_region_settles_before_releasing() {
        let mut reg = AnimationRegistry::new(Config::default());
        let mut def = region_def().once();
        def.scroll.scrub = Scrub::Smooth(0.5);
        let id = reg.register(def);
        reg.mark_ready(PreloadReport::default()).unwrap();
        reg.init(&layout(), Size::new(1000.0, 800.0)).unwrap();

        let mut sink = LastState::default();
        reg.frame(1.0 / 60.0, &mut sink);
        reg.on_scroll(2500.0);
        let first = reg.frame(1.0 / 60.0, &mut sink);
        assert!(!first
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::RegionUnbound { .. })));
        assert_eq!(reg.region_status(id), Some(RegionStatus::Active));

        let mut frames = 0;
        while reg.needs_frame() && frames < 5000 {
            reg.frame(1.0 / 60.0, &mut sink);
            frames += 1;
        }
        assert!(!reg.needs_frame());
        assert_eq!(reg.region_status(id), Some(RegionStatus::Unbound));
        assert_eq!(sink.states.len(), 2);
        for (_, state) in &sink.states {
            assert_eq!(state.opacity, 1.0);
        }
    }

    #[test]
    fn zero_viewport_on_first_init_is_reported() {
        let mut reg = AnimationRegistry::new(Config::default());
        reg.register(region_def());
        reg.mark_ready(PreloadReport::default()).unwrap();
        reg.init(&layout(), Size::new(0.0, 0.0)).unwrap();
        let frame = reg.frame(0.0, &mut NullSink);
        assert!(frame.events.iter().any(|e| matches!(
            e,
            CoreEvent::Diagnostic { region: None, error: CoreError::DegenerateViewport { .. } }
        )));

        // Reporting the same degenerate size again stays quiet.
        reg.on_resize(&layout(), Size::new(0.0, 0.0));
        let frame = reg.frame(0.0, &mut NullSink);
        assert!(!frame.events.iter().any(|e| matches!(
            e,
            CoreEvent::Diagnostic { error: CoreError::DegenerateViewport { .. }, .. }
        )));
    }
}
