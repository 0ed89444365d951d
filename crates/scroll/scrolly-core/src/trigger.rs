//! Trigger regions: the scroll range over which one timeline runs.
//!
//! Authoring uses edge anchors ("center center", "clamp(top bottom)") and
//! relative ends ("+=250%"); [`TriggerSpec::resolve`] turns them into absolute
//! scroll offsets once layout is known.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{Rect, Size};
use crate::ids::ElementId;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Center,
    Bottom,
}

impl Edge {
    fn offset(self, extent: f32) -> f32 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => extent * 0.5,
            Edge::Bottom => extent,
        }
    }

    fn parse(s: &str) -> Option<Edge> {
        match s {
            "top" => Some(Edge::Top),
            "center" => Some(Edge::Center),
            "bottom" => Some(Edge::Bottom),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Edge::Top => "top",
            Edge::Center => "center",
            Edge::Bottom => "bottom",
        }
    }
}

/// Scroll offset at which `element` edge meets `viewport` edge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Anchor {
    pub element: Edge,
    pub viewport: Edge,
    /// Never resolve outside `[0, max_scroll]`.
    pub clamp: bool,
}

impl Anchor {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self {
            element,
            viewport,
            clamp: false,
        }
    }

    pub const fn clamped(mut self) -> Self {
        self.clamp = true;
        self
    }

    pub fn resolve(&self, bounds: Rect, viewport: Size, max_scroll: Option<f32>) -> f32 {
        let pos = bounds.top + self.element.offset(bounds.height)
            - self.viewport.offset(viewport.height);
        if self.clamp {
            let upper = max_scroll.unwrap_or(f32::INFINITY).max(0.0);
            pos.clamp(0.0, upper)
        } else {
            pos
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseAnchorError(pub String);

impl fmt::Display for ParseAnchorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid trigger position '{}'", self.0)
    }
}

impl std::error::Error for ParseAnchorError {}

impl FromStr for Anchor {
    type Err = ParseAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAnchorError(s.to_string());
        let trimmed = s.trim();
        let (inner, clamp) = match trimmed
            .strip_prefix("clamp(")
            .and_then(|r| r.strip_suffix(')'))
        {
            Some(inner) => (inner, true),
            None => (trimmed, false),
        };
        let mut parts = inner.split_whitespace();
        let element = parts.next().and_then(Edge::parse).ok_or_else(err)?;
        let viewport = parts.next().and_then(Edge::parse).ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Anchor {
            element,
            viewport,
            clamp,
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = format!("{} {}", self.element.as_str(), self.viewport.as_str());
        if self.clamp {
            write!(f, "clamp({body})")
        } else {
            f.write_str(&body)
        }
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParseAnchorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(value: Anchor) -> Self {
        value.to_string()
    }
}

/// End of a trigger range.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub enum EndSpec {
    Anchor(Anchor),
    /// Distance past the start, as a fraction of the viewport height ("+=250%" is 2.5).
    Relative(f32),
}

impl FromStr for EndSpec {
    type Err = ParseAnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_prefix("+=") {
            Some(rest) => rest
                .strip_suffix('%')
                .and_then(|p| p.trim().parse::<f32>().ok())
                .filter(|p| p.is_finite())
                .map(|p| EndSpec::Relative(p / 100.0))
                .ok_or_else(|| ParseAnchorError(s.to_string())),
            None => trimmed.parse().map(EndSpec::Anchor),
        }
    }
}

impl fmt::Display for EndSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndSpec::Anchor(a) => a.fmt(f),
            EndSpec::Relative(r) => write!(f, "+={}%", r * 100.0),
        }
    }
}

impl TryFrom<String> for EndSpec {
    type Error = ParseAnchorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EndSpec> for String {
    fn from(value: EndSpec) -> Self {
        value.to_string()
    }
}

/// Progress smoothing. `Smooth(s)` lags the raw value with time constant `s` seconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "ScrubRepr", into = "ScrubRepr")]
pub enum Scrub {
    #[default]
    Instant,
    Smooth(f32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScrubRepr {
    Flag(bool),
    Seconds(f32),
}

impl From<ScrubRepr> for Scrub {
    fn from(value: ScrubRepr) -> Self {
        match value {
            ScrubRepr::Flag(_) => Scrub::Instant,
            ScrubRepr::Seconds(s) if s > 0.0 && s.is_finite() => Scrub::Smooth(s),
            ScrubRepr::Seconds(_) => Scrub::Instant,
        }
    }
}

impl From<Scrub> for ScrubRepr {
    fn from(value: Scrub) -> Self {
        match value {
            Scrub::Instant => ScrubRepr::Flag(true),
            Scrub::Smooth(s) => ScrubRepr::Seconds(s),
        }
    }
}

/// Authored trigger; resolved against layout into a [`TriggerRegion`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TriggerSpec {
    pub start: Anchor,
    pub end: EndSpec,
    pub pin: bool,
    pub scrub: Scrub,
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self {
            start: Anchor::new(Edge::Top, Edge::Bottom),
            end: EndSpec::Anchor(Anchor::new(Edge::Bottom, Edge::Top)),
            pin: false,
            scrub: Scrub::Instant,
        }
    }
}

impl TriggerSpec {
    pub fn resolve(
        &self,
        element: ElementId,
        bounds: Rect,
        viewport: Size,
        max_scroll: Option<f32>,
    ) -> CoreResult<TriggerRegion> {
        let start = self.start.resolve(bounds, viewport, max_scroll);
        let end = match self.end {
            EndSpec::Anchor(a) => a.resolve(bounds, viewport, max_scroll),
            EndSpec::Relative(r) => start + r * viewport.height,
        };
        TriggerRegion::new(element, start, end, self.pin, self.scrub)
    }
}

/// Absolute scroll range bound to one trigger element. Invariant: `start < end`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TriggerRegion {
    element: ElementId,
    start: f32,
    end: f32,
    pin: bool,
    scrub: Scrub,
}

impl TriggerRegion {
    pub fn new(element: ElementId, start: f32, end: f32, pin: bool, scrub: Scrub) -> CoreResult<Self> {
        if !(start.is_finite() && end.is_finite() && start < end) {
            return Err(CoreError::InvalidRegion { start, end });
        }
        Ok(Self {
            element,
            start,
            end,
            pin,
            scrub,
        })
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn pin(&self) -> bool {
        self.pin
    }

    pub fn scrub(&self) -> Scrub {
        self.scrub
    }

    #[inline]
    pub fn raw_progress(&self, scroll: f32) -> f32 {
        ((scroll - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}
