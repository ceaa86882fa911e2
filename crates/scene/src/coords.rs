//! Geographic to local planar projection.
//!
//! Every feature coordinate goes through [`project`] relative to the active
//! map center. The planar frame is the one the extruder works in: `x` is the
//! negated east offset and `y` the north offset, both in hundredths of a
//! metre-scaled distance. [`PlanarCoord::ground`] maps it onto the world
//! ground plane (X, Z) with Y up.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{EARTH_RADIUS_M, PROJECTION_DIVISOR};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoord {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Builds a coordinate from a GeoJSON position (`[lon, lat, ...]`).
    /// Returns `None` when the position has fewer than two components.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] => Some(Self::new(*lon, *lat)),
            _ => None,
        }
    }
}

/// A point in the local planar frame produced by [`project`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanarCoord {
    pub x: f32,
    pub y: f32,
}

impl PlanarCoord {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// World ground position (X, Z) of this planar point.
    pub fn ground(self) -> Vec2 {
        Vec2::new(-self.x, self.y)
    }
}

/// Projects `point` into the planar frame anchored at `center`.
///
/// The offset is built from the great-circle distance (whole metres) and the
/// rhumb-line bearing from `point` toward `center`, added onto the center's
/// own lon/lat and scaled down by [`PROJECTION_DIVISOR`]. Pure: the same
/// inputs always produce bit-identical output.
pub fn project(point: GeoCoord, center: GeoCoord) -> PlanarCoord {
    let distance = great_circle_distance(point, center);
    let bearing = rhumb_bearing(point, center).to_radians();
    let x = center.lon + distance * bearing.cos();
    let y = center.lat + distance * bearing.sin();
    PlanarCoord {
        x: (-x / PROJECTION_DIVISOR) as f32,
        y: (y / PROJECTION_DIVISOR) as f32,
    }
}

/// Great-circle distance in metres (spherical law of cosines), rounded to the
/// nearest metre.
pub fn great_circle_distance(from: GeoCoord, to: GeoCoord) -> f64 {
    let (from_lat, to_lat) = (from.lat.to_radians(), to.lat.to_radians());
    let delta_lon = from.lon.to_radians() - to.lon.to_radians();
    let cos_angle = to_lat.sin() * from_lat.sin() + to_lat.cos() * from_lat.cos() * delta_lon.cos();
    // Rounding error can push identical points just past 1.0.
    let angle = cos_angle.clamp(-1.0, 1.0).acos();
    (angle * EARTH_RADIUS_M).round()
}

/// Constant-heading bearing from `origin` to `destination`, degrees in [0, 360).
pub fn rhumb_bearing(origin: GeoCoord, destination: GeoCoord) -> f64 {
    use std::f64::consts::{FRAC_PI_4, PI};

    let mut delta_lon = destination.lon.to_radians() - origin.lon.to_radians();
    let delta_phi = ((destination.lat.to_radians() / 2.0 + FRAC_PI_4).tan()
        / (origin.lat.to_radians() / 2.0 + FRAC_PI_4).tan())
    .ln();

    if delta_lon.abs() > PI {
        delta_lon = if delta_lon > 0.0 {
            -(2.0 * PI - delta_lon)
        } else {
            2.0 * PI + delta_lon
        };
    }

    (delta_lon.atan2(delta_phi).to_degrees() + 360.0) % 360.0
}
