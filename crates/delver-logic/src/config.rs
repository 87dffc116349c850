//! Generator configuration: retry budgets, kind weights and tolerances.
//!
//! `GeneratorConfig::default()` is the tuned set. Every struct derives
//! serde with `#[serde(default)]`, so a JSON override only needs the fields
//! it changes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Pose;

/// Bounded retry counters. These are the only termination guarantee a
/// growth step has, so none of them may be zero in a useful config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryBudgets {
    /// Draws from the placed-parts registry when looking for an anchor.
    pub anchor: u32,
    /// Candidate instantiations per anchor socket (size mismatches included).
    pub candidate: u32,
    /// Full anchor+candidate re-entries after an overlap.
    pub placement: u32,
}

impl Default for RetryBudgets {
    fn default() -> Self {
        Self {
            anchor: 300,
            candidate: 10,
            placement: 100,
        }
    }
}

/// Relative weights of the candidate kind decision.
///
/// Defaults give a hallway one time in ten and split the rest evenly
/// between ordinary and special rooms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindWeights {
    pub hallway: f32,
    pub room: f32,
    pub special: f32,
}

impl Default for KindWeights {
    fn default() -> Self {
        Self {
            hallway: 1.0,
            room: 4.5,
            special: 4.5,
        }
    }
}

/// Thin box probed in front of each open socket of a fresh candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallProbe {
    /// How far in front of the socket the probe reaches.
    pub depth: f32,
    /// Half size of the probe across the socket opening.
    pub half_width: f32,
    pub half_height: f32,
}

impl Default for WallProbe {
    fn default() -> Self {
        Self {
            depth: 0.5,
            half_width: 0.4,
            half_height: 0.9,
        }
    }
}

/// Settings used only by proximity-driven growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximitySettings {
    /// Free sockets needed inside the activity volume before a special
    /// (dead-end) room may be chosen.
    pub min_free_sockets_for_special: usize,
    /// Seal a socket with a filler when its single fill attempt fails.
    pub seal_failed_sockets: bool,
    /// Upper bound on passes for one `fill_until_stuck` call.
    pub max_passes: u32,
    /// Half extents of the activity box centred on the viewer.
    pub activity_half_extents: Vec3,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            min_free_sockets_for_special: 2,
            seal_failed_sockets: true,
            max_passes: 64,
            activity_half_extents: Vec3::new(40.0, 10.0, 40.0),
        }
    }
}

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Where the entrance is spawned.
    pub origin: Pose,
    pub retries: RetryBudgets,
    pub weights: KindWeights,
    /// Overlap depth below which two part bounds are considered touching.
    pub overlap_tolerance: f32,
    /// Radius inside which an existing connector suppresses a new one.
    pub connector_tolerance: f32,
    pub wall_probe: WallProbe,
    pub proximity: ProximitySettings,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            origin: Pose::IDENTITY,
            retries: RetryBudgets::default(),
            weights: KindWeights::default(),
            overlap_tolerance: 0.05,
            connector_tolerance: 0.1,
            wall_probe: WallProbe::default(),
            proximity: ProximitySettings::default(),
        }
    }
}

impl GeneratorConfig {
    /// Default config with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn with_retries(mut self, retries: RetryBudgets) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_weights(mut self, weights: KindWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_origin(mut self, origin: Pose) -> Self {
        self.origin = origin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets_nonzero() {
        let r = RetryBudgets::default();
        assert!(r.anchor > 0 && r.candidate > 0 && r.placement > 0);
    }

    #[test]
    fn test_default_hallway_share() {
        let w = KindWeights::default();
        let share = w.hallway / (w.hallway + w.room + w.special);
        assert!((share - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_builder() {
        let c = GeneratorConfig::seeded(7).with_retries(RetryBudgets {
            anchor: 1,
            candidate: 2,
            placement: 3,
        });
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.retries.placement, 3);
        assert_eq!(c.weights, KindWeights::default());
    }
}
