//! The pursuer: spawn, per-tick advancement, capture.

use geo::Point;
use rand::Rng;

use crate::config::{ChaseConfig, SpawnBearing};
use crate::geodesy;

/// Live pursuer state while the chase is on.
#[derive(Debug, Clone, Copy)]
pub struct PursuerState {
    pub position: Point,
    pub speed_kmh: f64,
    pub separation_m: f64,
}

enum Phase {
    /// No player position seen yet; there is nothing to chase.
    Uninitialized,
    Active(PursuerState),
    /// Terminal. Ticks are no-ops from here on.
    Captured { separation_m: f64 },
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Still waiting for the first player position.
    Waiting,
    /// Player position currently unknown; the pursuer holds still rather
    /// than chase a missing target.
    Holding,
    Advanced {
        position: Point,
        speed_kmh: f64,
        separation_m: f64,
    },
    /// Fired exactly once, on the tick whose starting separation fell
    /// below the capture radius. The pursuer did not move this tick.
    Captured { separation_m: f64 },
    /// Already captured; late-arriving ticks change nothing.
    Over,
}

pub struct PursuitEngine {
    config: ChaseConfig,
    phase: Phase,
}

impl PursuitEngine {
    pub fn new(config: ChaseConfig) -> Self {
        PursuitEngine {
            config,
            phase: Phase::Uninitialized,
        }
    }

    /// Spawn the pursuer at the configured distance and bearing from the
    /// player. Only the first call does anything; returns the spawn
    /// position when it happens.
    pub fn spawn_near(&mut self, player: Point) -> Option<Point> {
        if !matches!(self.phase, Phase::Uninitialized) {
            return None;
        }

        let bearing = match self.config.spawn_bearing {
            SpawnBearing::Fixed(deg) => deg,
            SpawnBearing::Random => rand::rng().random_range(0.0..360.0),
        };
        let position = geodesy::destination(player, bearing, self.config.spawn_distance_m);
        let separation_m = geodesy::distance_m(position, player);

        tracing::debug!(bearing, separation_m, "pursuer spawned");
        self.phase = Phase::Active(PursuerState {
            position,
            speed_kmh: self.config.min_pursuer_speed_kmh,
            separation_m,
        });
        Some(position)
    }

    /// Advance one tick.
    ///
    /// Capture is decided against the separation at tick start; a captured
    /// tick moves nothing and mutates no speed. The pursuer's speed comes
    /// from the latest player speed every tick, never from its own motion.
    pub fn tick(&mut self, player: Option<Point>, player_speed_kmh: f64) -> Tick {
        let state = match &mut self.phase {
            Phase::Uninitialized => return Tick::Waiting,
            Phase::Captured { .. } => return Tick::Over,
            Phase::Active(state) => state,
        };

        let Some(player) = player else {
            return Tick::Holding;
        };

        let separation_m = geodesy::distance_m(state.position, player);
        if separation_m < self.config.capture_radius_m {
            tracing::info!(separation_m, "pursuer caught the player");
            self.phase = Phase::Captured { separation_m };
            return Tick::Captured { separation_m };
        }

        state.speed_kmh = self
            .config
            .speed_rule
            .pursuer_speed_kmh(self.config.min_pursuer_speed_kmh, player_speed_kmh);

        let step_m = state.speed_kmh / 3.6 * self.config.tick_period.as_secs_f64();
        let bearing = geodesy::bearing_deg(state.position, player);
        state.position = geodesy::destination(state.position, bearing, step_m);
        state.separation_m = geodesy::distance_m(state.position, player);

        Tick::Advanced {
            position: state.position,
            speed_kmh: state.speed_kmh,
            separation_m: state.separation_m,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match &self.phase {
            Phase::Active(state) => Some(state.position),
            _ => None,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        match &self.phase {
            Phase::Active(state) => state.speed_kmh,
            _ => 0.0,
        }
    }

    pub fn separation_m(&self) -> f64 {
        match &self.phase {
            Phase::Active(state) => state.separation_m,
            Phase::Captured { separation_m } => *separation_m,
            Phase::Uninitialized => 0.0,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.phase, Phase::Captured { .. })
    }
}
