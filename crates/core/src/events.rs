//! Discrete notifications the simulation emits.
//!
//! Fire-and-forget: the core broadcasts and makes no assumption about who
//! is listening. Each event fires at most once per accepted sample or tick.

use geo::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// Smoothed player speed changed (per accepted sample).
    SpeedUpdated { kmh: f64 },
    /// A validated displacement was added to the session distance.
    DistanceAccrued { meters: f64 },
    /// The ledger paid out whole coins.
    CoinsAwarded { count: u32 },
    /// The pursuer spawned or advanced.
    PursuerMoved { position: Point },
    /// The adaptive rule picked a new pursuer speed.
    PursuerSpeedUpdated { kmh: f64 },
    /// Post-move separation for this tick.
    SeparationUpdated { meters: f64 },
    /// Terminal: the pursuer reached the player. Fires exactly once.
    Captured { separation_m: f64 },
}
