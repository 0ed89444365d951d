//! Scroll position -> normalized progress per bound trigger region.
//!
//! Scroll notifications are coalesced: any number of `notify_scroll` calls
//! between two `tick`s count as one change, and each subscription emits at most
//! one sample per tick. Subscriptions whose progress did not move (including
//! regions far outside the viewport) emit nothing.

use serde::{Deserialize, Serialize};

use crate::ids::{IdAllocator, SubscriptionId};
use crate::trigger::{Scrub, TriggerRegion};

/// Pin instruction for the trigger element.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum PinState {
    Released,
    /// Hold the element in place by translating it `offset` along the scroll axis.
    Pinned { offset: f32 },
}

impl PinState {
    pub fn is_pinned(&self) -> bool {
        matches!(self, PinState::Pinned { .. })
    }

    pub fn offset(&self) -> Option<f32> {
        match self {
            PinState::Pinned { offset } => Some(*offset),
            PinState::Released => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressSample {
    pub subscription: SubscriptionId,
    /// Smoothed progress handed to the timeline.
    pub progress: f32,
    /// Unsmoothed progress at the current scroll position.
    pub raw: f32,
    pub pin: PinState,
    pub pin_changed: bool,
}

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    region: TriggerRegion,
    smoothed: f32,
    emitted: Option<f32>,
    pin: PinState,
    /// Smoothed progress has caught up with the raw value.
    settled: bool,
}

/// Converts scroll positions into per-region progress samples.
#[derive(Debug)]
pub struct ScrollProgressSource {
    ids: IdAllocator,
    subs: Vec<Subscription>,
    scroll: f32,
    dirty: bool,
    epsilon: f32,
}

impl ScrollProgressSource {
    pub fn new(initial_scroll: f32, epsilon: f32) -> Self {
        Self {
            ids: IdAllocator::new(),
            subs: Vec::new(),
            scroll: sanitize(initial_scroll),
            dirty: false,
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Start tracking a region. Its first sample is emitted on the next tick
    /// and reflects the current scroll position without smoothing.
    pub fn bind(&mut self, region: TriggerRegion) -> SubscriptionId {
        let id = self.ids.alloc_subscription();
        let raw = region.raw_progress(self.scroll);
        self.subs.push(Subscription {
            id,
            region,
            smoothed: raw,
            emitted: None,
            pin: PinState::Released,
            settled: false,
        });
        id
    }

    /// Replace the region of an existing subscription after a layout change.
    /// Smoothing restarts at the current position and a sample is forced.
    pub fn rebind(&mut self, id: SubscriptionId, region: TriggerRegion) -> bool {
        let scroll = self.scroll;
        match self.subs.iter_mut().find(|s| s.id == id) {
            Some(sub) => {
                sub.smoothed = region.raw_progress(scroll);
                sub.region = region;
                sub.emitted = None;
                sub.settled = false;
                true
            }
            None => false,
        }
    }

    /// Stop tracking. Returns the pin state the subscription held.
    pub fn unbind(&mut self, id: SubscriptionId) -> Option<PinState> {
        let idx = self.subs.iter().position(|s| s.id == id)?;
        Some(self.subs.remove(idx).pin)
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn notify_scroll(&mut self, position: f32) {
        let position = sanitize(position);
        if position != self.scroll {
            self.scroll = position;
            self.dirty = true;
        }
    }

    /// True while a tick could produce samples.
    pub fn needs_update(&self) -> bool {
        self.dirty || self.subs.iter().any(|s| !s.settled)
    }

    /// Advance smoothing by `dt` seconds and emit changed samples.
    pub fn tick(&mut self, dt: f32) -> Vec<ProgressSample> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let dirty = std::mem::take(&mut self.dirty);
        let scroll = self.scroll;
        let epsilon = self.epsilon;
        let mut out = Vec::new();

        for sub in &mut self.subs {
            if !dirty && sub.settled {
                continue;
            }
            let raw = sub.region.raw_progress(scroll);
            sub.smoothed = match sub.region.scrub() {
                Scrub::Smooth(tau) if tau > 0.0 => {
                    let alpha = 1.0 - (-dt / tau).exp();
                    let next = sub.smoothed + (raw - sub.smoothed) * alpha;
                    if (raw - next).abs() <= epsilon {
                        raw
                    } else {
                        next
                    }
                }
                _ => raw,
            };
            sub.settled = sub.smoothed == raw;

            let pin = if sub.region.pin() && raw > 0.0 && raw < 1.0 {
                PinState::Pinned {
                    offset: scroll - sub.region.start(),
                }
            } else {
                PinState::Released
            };
            let pin_changed = pin.is_pinned() != sub.pin.is_pinned();
            let pin_moved = pin != sub.pin;
            sub.pin = pin;

            if sub.emitted != Some(sub.smoothed) || pin_moved {
                sub.emitted = Some(sub.smoothed);
                out.push(ProgressSample {
                    subscription: sub.id,
                    progress: sub.smoothed,
                    raw,
                    pin,
                    pin_changed,
                });
            }
        }
        out
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ElementId;

    fn region(start: f32, end: f32, pin: bool, scrub: Scrub) -> TriggerRegion {
        TriggerRegion::new(ElementId(0), start, end, pin, scrub).unwrap()
    }

    #[test]
    fn coalesces_scroll_events_into_one_sample() {
        let mut src = ScrollProgressSource::new(0.0, 1e-4);
        let id = src.bind(region(100.0, 200.0, false, Scrub::Instant));
        assert_eq!(src.tick(0.016).len(), 1);
        for pos in [110.0, 130.0, 150.0] {
            src.notify_scroll(pos);
        }
        let samples = src.tick(0.016);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].subscription, id);
        assert_eq!(samples[0].progress, 0.5);
    }

    #[test]
    fn silent_when_outside_range() {
        let mut src = ScrollProgressSource::new(0.0, 1e-4);
        src.bind(region(5000.0, 6000.0, false, Scrub::Instant));
        assert_eq!(src.tick(0.016)[0].progress, 0.0);
        src.notify_scroll(300.0);
        assert!(src.tick(0.016).is_empty());
        assert!(src.tick(0.016).is_empty());
        assert!(!src.needs_update());
    }

    #[test]
    fn smoothing_lags_then_snaps() {
        let mut src = ScrollProgressSource::new(0.0, 1e-3);
        src.bind(region(0.0, 100.0, false, Scrub::Smooth(0.5)));
        src.tick(0.016);
        src.notify_scroll(100.0);
        let first = src.tick(0.1)[0];
        assert_eq!(first.raw, 1.0);
        let expected = 1.0 - (-0.1f32 / 0.5).exp();
        assert!((first.progress - expected).abs() < 1e-5);
        let mut last = first.progress;
        for _ in 0..200 {
            match src.tick(0.1).first() {
                Some(s) => {
                    assert!(s.progress >= last);
                    last = s.progress;
                }
                None => break,
            }
        }
        assert_eq!(last, 1.0);
        assert!(!src.needs_update());
    }

    #[test]
    fn pin_holds_only_inside_range() {
        let mut src = ScrollProgressSource::new(0.0, 1e-4);
        src.bind(region(100.0, 300.0, true, Scrub::Instant));
        assert_eq!(src.tick(0.0)[0].pin, PinState::Released);
        src.notify_scroll(150.0);
        let s = src.tick(0.0)[0];
        assert!(s.pin_changed);
        assert_eq!(s.pin, PinState::Pinned { offset: 50.0 });
        src.notify_scroll(300.0);
        let s = src.tick(0.0)[0];
        assert!(s.pin_changed);
        assert_eq!(s.pin, PinState::Released);
    }

    #[test]
    fn unbind_stops_output() {
        let mut src = ScrollProgressSource::new(0.0, 1e-4);
        let id = src.bind(region(0.0, 100.0, true, Scrub::Instant));
        src.notify_scroll(50.0);
        src.tick(0.0);
        assert_eq!(src.unbind(id), Some(PinState::Pinned { offset: 50.0 }));
        src.notify_scroll(60.0);
        assert!(src.tick(0.0).is_empty());
        assert_eq!(src.unbind(id), None);
    }
}
