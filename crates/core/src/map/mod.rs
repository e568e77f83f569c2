//! The map-renderer collaborator boundary.
//!
//! The core pushes scenes; it owns no rendering state. Whatever draws the
//! map (tiles, markers, route polylines) lives behind [`MapView`].

pub mod loader;

use geo::Point;

use crate::session::Snapshot;

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapScene {
    pub player: Option<Point>,
    pub pursuer: Option<Point>,
    /// Routes of past runs, drawn under the live markers.
    pub past_routes: Vec<Vec<Point>>,
}

impl MapScene {
    pub fn from_snapshot(snapshot: &Snapshot, past_routes: Vec<Vec<Point>>) -> Self {
        MapScene {
            player: snapshot.player,
            pursuer: snapshot.pursuer,
            past_routes,
        }
    }
}

pub trait MapView: Send {
    fn render(&mut self, scene: &MapScene);
}
