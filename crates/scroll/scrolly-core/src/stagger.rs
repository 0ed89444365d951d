//! Stagger distribution: per-element delay offsets for a group animated together.
//!
//! Every mode works the same way: compute a distance for each element from a
//! reference position (an index, or a cell when a grid is given), then map the
//! distances linearly onto `[0, amount]` so the nearest element starts at 0 and
//! the farthest at `amount`. `FromEdges` flips the mapping; `Random` shuffles
//! evenly spaced delays with an injected random source.

use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const FLAT_EPS: f32 = 1e-6;

/// Where the stagger wave starts.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StaggerMode {
    #[default]
    #[serde(alias = "start")]
    Sequential,
    #[serde(alias = "end")]
    Reverse,
    #[serde(alias = "center")]
    FromCenter,
    #[serde(alias = "edges")]
    FromEdges,
    FromIndex(usize),
    Random,
}

/// Distance metric used for grid staggers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GridAxis {
    #[default]
    Both,
    X,
    Y,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaggerConfig {
    /// Total time budget spread across the group.
    pub amount: f32,
    /// Per-element step; when set it overrides `amount` (`amount = each * steps`).
    pub each: Option<f32>,
    #[serde(alias = "from")]
    pub mode: StaggerMode,
    /// `(rows, cols)`; elements are laid out row-major.
    pub grid: Option<(usize, usize)>,
    pub axis: GridAxis,
}

impl StaggerConfig {
    pub fn amount(amount: f32, mode: StaggerMode) -> Self {
        Self {
            amount,
            mode,
            ..Self::default()
        }
    }

    pub fn each(each: f32) -> Self {
        Self {
            each: Some(each),
            ..Self::default()
        }
    }

    pub fn with_grid(mut self, rows: usize, cols: usize) -> Self {
        self.grid = Some((rows, cols));
        self
    }

    pub fn with_mode(mut self, mode: StaggerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Total budget for `n` elements after resolving `each`.
    pub fn total_amount(&self, n: usize) -> f32 {
        match self.each {
            Some(each) => {
                let steps = match self.grid {
                    Some((rows, cols)) => rows.max(cols),
                    None => n.saturating_sub(1),
                };
                each * steps as f32
            }
            None => self.amount,
        }
    }

    fn validate(&self, n: usize) -> Result<f32, CoreError> {
        let amount = self.total_amount(n);
        if !amount.is_finite() || amount < 0.0 {
            return Err(CoreError::MalformedStaggerConfig {
                reason: format!("amount must be finite and >= 0, got {amount}"),
            });
        }
        if let Some((rows, cols)) = self.grid {
            if rows.checked_mul(cols) != Some(n) {
                return Err(CoreError::MalformedStaggerConfig {
                    reason: format!("grid {rows}x{cols} does not match {n} elements"),
                });
            }
        }
        if let StaggerMode::FromIndex(idx) = self.mode {
            if n > 0 && idx >= n {
                return Err(CoreError::MalformedStaggerConfig {
                    reason: format!("reference index {idx} out of range for {n} elements"),
                });
            }
        }
        Ok(amount)
    }
}

/// Distributed delays plus the diagnostic raised when the config had to be replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub delays: Vec<f32>,
    pub diagnostic: Option<CoreError>,
}

impl Distribution {
    pub fn max_delay(&self) -> f32 {
        self.delays.iter().copied().fold(0.0, f32::max)
    }
}

/// Strict variant: returns the malformed-config error instead of falling back.
pub fn try_distribute<R: Rng + ?Sized>(
    n: usize,
    cfg: &StaggerConfig,
    rng: &mut R,
) -> Result<Vec<f32>, CoreError> {
    let amount = cfg.validate(n)?;
    Ok(match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ if cfg.mode == StaggerMode::Random => {
            let mut delays = evenly_spaced(n, amount);
            delays.shuffle(rng);
            delays
        }
        _ => {
            let distances = distances(n, cfg);
            normalize(&distances, amount, cfg.mode == StaggerMode::FromEdges)
        }
    })
}

/// Distribute delays for `n` elements. Malformed configs degrade to
/// zero-valued sequential delays and carry a `MalformedStaggerConfig` diagnostic.
pub fn distribute<R: Rng + ?Sized>(n: usize, cfg: &StaggerConfig, rng: &mut R) -> Distribution {
    match try_distribute(n, cfg, rng) {
        Ok(delays) => Distribution {
            delays,
            diagnostic: None,
        },
        Err(err) => {
            log::warn!("{err}; falling back to zero stagger");
            Distribution {
                delays: vec![0.0; n],
                diagnostic: Some(err),
            }
        }
    }
}

/// [`distribute`] with a fresh `StdRng` seeded from `seed`.
pub fn distribute_seeded(n: usize, cfg: &StaggerConfig, seed: u64) -> Distribution {
    let mut rng = StdRng::seed_from_u64(seed);
    distribute(n, cfg, &mut rng)
}

fn evenly_spaced(n: usize, amount: f32) -> Vec<f32> {
    let last = (n - 1) as f32;
    (0..n).map(|i| i as f32 / last * amount).collect()
}

fn distances(n: usize, cfg: &StaggerConfig) -> Vec<f32> {
    match cfg.grid {
        None => {
            let reference = match cfg.mode {
                StaggerMode::Reverse => (n - 1) as f32,
                StaggerMode::FromCenter | StaggerMode::FromEdges => (n - 1) as f32 * 0.5,
                StaggerMode::FromIndex(idx) => idx as f32,
                StaggerMode::Sequential | StaggerMode::Random => 0.0,
            };
            (0..n).map(|i| (i as f32 - reference).abs()).collect()
        }
        Some((rows, cols)) => {
            let (ref_row, ref_col) = match cfg.mode {
                StaggerMode::Reverse => ((rows - 1) as f32, (cols - 1) as f32),
                StaggerMode::FromCenter | StaggerMode::FromEdges => {
                    ((rows - 1) as f32 * 0.5, (cols - 1) as f32 * 0.5)
                }
                StaggerMode::FromIndex(idx) => ((idx / cols) as f32, (idx % cols) as f32),
                StaggerMode::Sequential | StaggerMode::Random => (0.0, 0.0),
            };
            (0..n)
                .map(|i| {
                    let dy = (i / cols) as f32 - ref_row;
                    let dx = (i % cols) as f32 - ref_col;
                    match cfg.axis {
                        GridAxis::Both => (dx * dx + dy * dy).sqrt(),
                        GridAxis::X => dx.abs(),
                        GridAxis::Y => dy.abs(),
                    }
                })
                .collect()
        }
    }
}

fn normalize(distances: &[f32], amount: f32, invert: bool) -> Vec<f32> {
    let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
    let max = distances.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;
    if span <= FLAT_EPS {
        return vec![0.0; distances.len()];
    }
    distances
        .iter()
        .map(|d| {
            let t = (d - min) / span;
            if invert {
                (1.0 - t) * amount
            } else {
                t * amount
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_resolves_against_count_or_grid() {
        assert!((StaggerConfig::each(0.25).total_amount(5) - 1.0).abs() < 1e-6);
        let grid = StaggerConfig::each(0.1).with_grid(4, 9);
        assert!((grid.total_amount(36) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn flat_distances_collapse_to_zero() {
        let cfg = StaggerConfig::amount(1.0, StaggerMode::FromCenter).with_grid(1, 1);
        let d = distribute_seeded(1, &cfg, 0);
        assert_eq!(d.delays, vec![0.0]);
        assert!(d.diagnostic.is_none());
    }

    #[test]
    fn deserializes_demo_shorthand() {
        let cfg: StaggerConfig =
            serde_json::from_str(r#"{"amount":0.2,"from":"center","grid":[4,9]}"#).unwrap();
        assert_eq!(cfg.mode, StaggerMode::FromCenter);
        assert_eq!(cfg.grid, Some((4, 9)));
    }
}
