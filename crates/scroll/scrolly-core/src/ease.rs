//! Easing curves: monotone reparameterizations of local tween progress.
//!
//! Names follow the usual web-animation vocabulary (`"power3"`, `"sine.inOut"`,
//! `"back.out(2)"`, `"cubic-bezier(0.42,0,0.58,1)"`). A bare name means `.out`.
//! Every curve maps 0 to 0 and 1 to 1; only `back` leaves `[0, 1]` in between.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BACK_OVERSHOOT: f32 = 1.70158;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Curve {
    /// Linear.
    None,
    Sine,
    /// `Power(1)` is quadratic, up to `Power(4)` which is quintic.
    Power(u8),
    Expo,
    Circ,
    Back { overshoot: f32 },
    /// CSS-style timing function; direction is ignored.
    CubicBezier([f32; 4]),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    In,
    #[default]
    Out,
    InOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ease {
    pub curve: Curve,
    pub direction: Direction,
}

impl Ease {
    pub const LINEAR: Ease = Ease {
        curve: Curve::None,
        direction: Direction::Out,
    };

    pub const fn new(curve: Curve, direction: Direction) -> Self {
        Self { curve, direction }
    }

    pub const fn out(curve: Curve) -> Self {
        Self::new(curve, Direction::Out)
    }

    /// Map local progress `t` (clamped to `[0, 1]`) through the curve.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if let Curve::CubicBezier([x1, y1, x2, y2]) = self.curve {
            return bezier_ease_t(t, x1, y1, x2, y2);
        }
        match self.direction {
            Direction::In => ease_in(self.curve, t),
            Direction::Out => 1.0 - ease_in(self.curve, 1.0 - t),
            Direction::InOut => {
                if t < 0.5 {
                    ease_in(self.curve, 2.0 * t) * 0.5
                } else {
                    1.0 - ease_in(self.curve, 2.0 * (1.0 - t)) * 0.5
                }
            }
        }
    }

    /// True when the curve can leave `[0, 1]`.
    pub fn overshoots(&self) -> bool {
        match self.curve {
            Curve::Back { overshoot } => overshoot > 0.0,
            Curve::CubicBezier([_, y1, _, y2]) => !(0.0..=1.0).contains(&y1) || !(0.0..=1.0).contains(&y2),
            _ => false,
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Ease::out(Curve::Power(1))
    }
}

fn ease_in(curve: Curve, t: f32) -> f32 {
    match curve {
        Curve::None => t,
        Curve::Sine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
        Curve::Power(p) => t.powi(i32::from(p.clamp(1, 4)) + 1),
        Curve::Expo => {
            if t <= 0.0 {
                0.0
            } else {
                2f32.powf(10.0 * (t - 1.0))
            }
        }
        Curve::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        Curve::Back { overshoot } => t * t * ((overshoot + 1.0) * t - overshoot),
        Curve::CubicBezier([x1, y1, x2, y2]) => bezier_ease_t(t, x1, y1, x2, y2),
    }
}

#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if x1 == y1 && x2 == y2 {
        return t;
    }
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEaseError(pub String);

impl fmt::Display for ParseEaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ease '{}'", self.0)
    }
}

impl std::error::Error for ParseEaseError {}

fn parse_args(s: &str) -> Option<(&str, Vec<f32>)> {
    match s.find('(') {
        None => Some((s, Vec::new())),
        Some(open) => {
            let inner = s[open + 1..].strip_suffix(')')?;
            let args = inner
                .split(',')
                .map(|a| a.trim().parse::<f32>().ok())
                .collect::<Option<Vec<_>>>()?;
            Some((&s[..open], args))
        }
    }
}

impl FromStr for Ease {
    type Err = ParseEaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEaseError(s.to_string());
        let (head, args) = parse_args(s.trim()).ok_or_else(err)?;
        let (name, dir) = match head.split_once('.') {
            Some((n, d)) => (n, Some(d)),
            None => (head, None),
        };
        let direction = match dir {
            None | Some("out") => Direction::Out,
            Some("in") => Direction::In,
            Some("inOut") => Direction::InOut,
            Some(_) => return Err(err()),
        };
        let curve = match name {
            "none" | "linear" => Curve::None,
            "sine" => Curve::Sine,
            "power0" => Curve::None,
            "power1" | "quad" => Curve::Power(1),
            "power2" | "cubic" => Curve::Power(2),
            "power3" | "quart" => Curve::Power(3),
            "power4" | "quint" => Curve::Power(4),
            "expo" => Curve::Expo,
            "circ" => Curve::Circ,
            "back" => Curve::Back {
                overshoot: args.first().copied().unwrap_or(DEFAULT_BACK_OVERSHOOT),
            },
            "cubic-bezier" => match args.as_slice() {
                [x1, y1, x2, y2] => Curve::CubicBezier([*x1, *y1, *x2, *y2]),
                _ => return Err(err()),
            },
            _ => return Err(err()),
        };
        Ok(Ease { curve, direction })
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::InOut => "inOut",
        };
        match self.curve {
            Curve::None => write!(f, "none"),
            Curve::Sine => write!(f, "sine.{dir}"),
            Curve::Power(p) => write!(f, "power{p}.{dir}"),
            Curve::Expo => write!(f, "expo.{dir}"),
            Curve::Circ => write!(f, "circ.{dir}"),
            Curve::Back { overshoot } => write!(f, "back.{dir}({overshoot})"),
            Curve::CubicBezier([a, b, c, d]) => write!(f, "cubic-bezier({a},{b},{c},{d})"),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = ParseEaseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(value: Ease) -> Self {
        value.to_string()
    }
}
