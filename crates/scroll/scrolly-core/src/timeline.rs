//! Timeline evaluation: global progress -> per-element render state.
//!
//! `advance` is a pure function of its progress argument. Calling it with the
//! same value always yields the same state, regardless of call order, which is
//! what makes scrolling backwards retrace the exact forward path.

use hashbrown::HashSet;

use crate::ease::Ease;
use crate::ids::ElementId;
use crate::properties::{Property, RenderState};
use crate::tween::TweenSpec;

/// Render state of every element a timeline touches, in first-target order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppliedState {
    pub elements: Vec<(ElementId, RenderState)>,
}

impl AppliedState {
    pub fn get(&self, id: ElementId) -> Option<&RenderState> {
        self.elements.iter().find(|(e, _)| *e == id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ElementId, RenderState)> {
        self.elements.iter()
    }
}

/// Ordered tween specs over a normalized duration of 1.0. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    tweens: Vec<TweenSpec>,
    default_ease: Ease,
    /// Element order for outputs.
    order: Vec<ElementId>,
    /// Per tween, the output slot of each of its targets.
    slots: Vec<Vec<usize>>,
}

impl Timeline {
    pub fn new(tweens: Vec<TweenSpec>, default_ease: Ease) -> Self {
        let mut order: Vec<ElementId> = Vec::new();
        for t in &tweens {
            for id in t.targets() {
                if !order.contains(id) {
                    order.push(*id);
                }
            }
        }
        let slots = tweens
            .iter()
            .map(|t| {
                t.targets()
                    .iter()
                    .map(|id| order.iter().position(|e| e == id).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            tweens,
            default_ease,
            order,
            slots,
        }
    }

    pub fn tweens(&self) -> &[TweenSpec] {
        &self.tweens
    }

    pub fn default_ease(&self) -> Ease {
        self.default_ease
    }

    /// Elements driven by this timeline.
    pub fn elements(&self) -> &[ElementId] {
        &self.order
    }

    /// Evaluate every tween at `progress` (clamped to `[0, 1]`; NaN reads as 0).
    ///
    /// Tweens are applied in order and later writes to the same property win.
    /// A tween whose element window has not started yet only writes its start
    /// value when no earlier tween has written that property, so a pending tween
    /// cannot undo the result of one that already ran.
    pub fn advance(&self, progress: f32) -> AppliedState {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let mut states: Vec<(ElementId, RenderState)> = self
            .order
            .iter()
            .map(|id| (*id, RenderState::BASELINE))
            .collect();
        let mut written: HashSet<(usize, Property)> = HashSet::new();

        for (tween, slots) in self.tweens.iter().zip(&self.slots) {
            let ease = tween.ease().unwrap_or(self.default_ease);
            for (i, &slot) in slots.iter().enumerate() {
                let (window_start, _) = tween.element_window(i);
                let started = p >= window_start;
                let eased = ease.apply(tween.local_progress(i, p));
                for prop in tween.props() {
                    if !started && written.contains(&(slot, prop.property)) {
                        continue;
                    }
                    states[slot].1.set(prop.property, prop.value_at(i, eased));
                    written.insert((slot, prop.property));
                }
            }
        }

        AppliedState { elements: states }
    }
}
