//! Great-circle math over WGS84 coordinates.
//!
//! Positions everywhere in this crate are `geo::Point` in
//! (longitude, latitude) decimal degrees. This module pins the units once:
//! distances in meters, bearings in compass degrees (0..360, clockwise
//! from north).

use geo::{HaversineBearing, HaversineDestination, HaversineDistance, Point};

/// Haversine distance between two points in meters.
pub fn distance_m(a: Point, b: Point) -> f64 {
    a.haversine_distance(&b)
}

/// Initial bearing from `a` toward `b`, normalized to 0..360 degrees.
pub fn bearing_deg(a: Point, b: Point) -> f64 {
    a.haversine_bearing(b).rem_euclid(360.0)
}

/// Destination point after traveling `distance_m` meters from `start`
/// along the great circle at `bearing_deg` degrees.
pub fn destination(start: Point, bearing_deg: f64, distance_m: f64) -> Point {
    start.haversine_destination(bearing_deg, distance_m)
}
