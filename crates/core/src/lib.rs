//! Simulation core for a GPS chase game: a virtual pursuer follows the
//! player's real-world position, movement earns coins, getting caught ends
//! the run.

pub mod config;
pub mod events;
pub mod filter;
pub mod geodesy;
pub mod ledger;
pub mod location;
pub mod map;
pub mod pursuit;
pub mod session;
pub mod shop;
pub mod store;
pub mod strava;

pub use geo::Point;
