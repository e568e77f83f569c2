//! Tunables for a chase session.
//!
//! The chase behavior that used to exist as several divergent copies of the
//! same logic (different spawn distances, capture radii, speed rules) is a
//! single table of presets here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the pursuer's speed is derived on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpeedRule {
    /// Track the player: above `threshold_kmh` the pursuer runs at
    /// `factor` times the player's smoothed speed, otherwise it falls back
    /// to the configured minimum speed.
    Adaptive { threshold_kmh: f64, factor: f64 },
    /// Constant speed for the whole session.
    Fixed { speed_kmh: f64 },
}

impl SpeedRule {
    /// Pursuer speed for this tick given the latest smoothed player speed.
    pub fn pursuer_speed_kmh(&self, floor_kmh: f64, player_speed_kmh: f64) -> f64 {
        match *self {
            SpeedRule::Adaptive { threshold_kmh, factor } => {
                if player_speed_kmh > threshold_kmh {
                    player_speed_kmh * factor
                } else {
                    floor_kmh
                }
            }
            SpeedRule::Fixed { speed_kmh } => speed_kmh,
        }
    }
}

/// Compass bearing at which the pursuer spawns relative to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnBearing {
    Random,
    /// Deterministic spawns for drills and tests.
    Fixed(f64),
}

/// Pursuit engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseConfig {
    pub spawn_distance_m: f64,
    pub capture_radius_m: f64,
    pub min_pursuer_speed_kmh: f64,
    pub speed_rule: SpeedRule,
    pub spawn_bearing: SpawnBearing,
    pub tick_period: Duration,
}

impl ChaseConfig {
    /// The main game: 200 m spawn, 3 m capture radius, adaptive speed.
    pub fn standard() -> Self {
        ChaseConfig {
            spawn_distance_m: 200.0,
            capture_radius_m: 3.0,
            min_pursuer_speed_kmh: 4.5,
            speed_rule: SpeedRule::Adaptive {
                threshold_kmh: 6.0,
                factor: 0.75,
            },
            spawn_bearing: SpawnBearing::Random,
            tick_period: Duration::from_secs(1),
        }
    }

    /// Forgiving variant with a 10 m capture radius.
    pub fn relaxed() -> Self {
        ChaseConfig {
            capture_radius_m: 10.0,
            ..Self::standard()
        }
    }

    /// Short deterministic chase: close spawn, fixed bearing, fixed speed.
    pub fn drill() -> Self {
        ChaseConfig {
            spawn_distance_m: 30.0,
            speed_rule: SpeedRule::Fixed { speed_kmh: 4.5 },
            spawn_bearing: SpawnBearing::Fixed(90.0),
            ..Self::standard()
        }
    }
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Which sample-filtering strategy a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterVariant {
    /// Anchor-based: each accepted sample becomes the reference for the next.
    TwoStage,
    /// Sliding window of recent samples, measured oldest to newest.
    Window { window_ms: u64 },
}

/// Position filter tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Samples arriving sooner than this after the last accepted one are
    /// ignored entirely.
    pub min_interval_s: f64,
    /// Implied speeds above this are GPS jumps, not running. 8.5 m/s is
    /// faster than an Olympic sprinter.
    pub max_speed_mps: f64,
    /// Displacements below this are jitter while standing still.
    pub min_movement_m: f64,
    /// Below this speed an interval does not count as moving time.
    pub resting_speed_mps: f64,
    pub variant: FilterVariant,
}

impl FilterConfig {
    pub fn two_stage() -> Self {
        FilterConfig {
            min_interval_s: 1.0,
            max_speed_mps: 8.5,
            min_movement_m: 5.0,
            resting_speed_mps: 0.28,
            variant: FilterVariant::TwoStage,
        }
    }

    /// Windowed variant: same thresholds, but displacement is measured
    /// across a sliding 1 s window instead of from the last accepted sample.
    pub fn windowed() -> Self {
        FilterConfig {
            variant: FilterVariant::Window { window_ms: 1000 },
            ..Self::two_stage()
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::two_stage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn adaptive_rule_boundary() {
        let rule = SpeedRule::Adaptive {
            threshold_kmh: 6.0,
            factor: 0.75,
        };

        // At the threshold the floor still applies; just above it the
        // proportional rule takes over.
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 6.0), 4.5);
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 6.0001), 6.0001 * 0.75);
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 12.0), 9.0);
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 0.0), 4.5);
    }

    #[test]
    fn fixed_rule_ignores_player() {
        let rule = SpeedRule::Fixed { speed_kmh: 5.0 };
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 20.0), 5.0);
        assert_relative_eq!(rule.pursuer_speed_kmh(4.5, 0.0), 5.0);
    }

    #[test]
    fn presets_differ_where_expected() {
        assert_relative_eq!(ChaseConfig::standard().capture_radius_m, 3.0);
        assert_relative_eq!(ChaseConfig::relaxed().capture_radius_m, 10.0);
        assert_eq!(
            ChaseConfig::drill().spawn_bearing,
            SpawnBearing::Fixed(90.0)
        );
        // The windowed variant changes the measurement strategy only; the
        // rejection thresholds stay the same.
        assert_eq!(
            FilterConfig::windowed().variant,
            FilterVariant::Window { window_ms: 1000 }
        );
        assert_relative_eq!(FilterConfig::windowed().min_movement_m, 5.0);
        assert_relative_eq!(FilterConfig::windowed().max_speed_mps, 8.5);
    }
}
