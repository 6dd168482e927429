//! # Robinson Projection
//!
//! Pseudo-cylindrical world projection used for the map, computed from the
//! published 5° table of parallel lengths (X) and distances from the equator
//! (Y), interpolated linearly between table rows.
//!
//! Input coordinates are lon/lat degrees (WGS84); output is metres on the
//! WGS84 semi-major axis, matching `+proj=robin`.

use geo::{Coord, MapCoords, MultiPolygon};

/// WGS84 semi-major axis in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

pub(crate) const FXC: f64 = 0.8487;
pub(crate) const FYC: f64 = 1.3523;

/// Robinson table rows for latitudes 0°, 5°, ..., 90°: (X, Y).
const TABLE: [(f64, f64); 19] = [
    (1.0000, 0.0000),
    (0.9986, 0.0620),
    (0.9954, 0.1240),
    (0.9900, 0.1860),
    (0.9822, 0.2480),
    (0.9730, 0.3100),
    (0.9600, 0.3720),
    (0.9427, 0.4340),
    (0.9216, 0.4958),
    (0.8962, 0.5571),
    (0.8679, 0.6176),
    (0.8350, 0.6769),
    (0.7986, 0.7346),
    (0.7597, 0.7903),
    (0.7186, 0.8435),
    (0.6732, 0.8936),
    (0.6213, 0.9394),
    (0.5722, 0.9761),
    (0.5322, 1.0000),
];

/// Project one lon/lat coordinate (degrees) to Robinson metres.
///
/// Latitudes outside ±90° are clamped; longitude is not wrapped.
#[must_use]
pub fn robinson(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-90.0, 90.0);
    let (x_factor, y_factor) = interpolate(lat.abs());
    Coord {
        x: FXC * EARTH_RADIUS * x_factor * coord.x.to_radians(),
        y: FYC * EARTH_RADIUS * y_factor * lat.signum(),
    }
}

/// Project a whole multipolygon.
#[must_use]
pub fn project(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.map_coords(robinson)
}

fn interpolate(abs_lat: f64) -> (f64, f64) {
    let position = abs_lat / 5.0;
    let index = (position.floor() as usize).min(TABLE.len() - 2);
    let t = position - index as f64;
    let (x0, y0) = TABLE[index];
    let (x1, y1) = TABLE[index + 1];
    (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t)
}

// =============================================================================
// TESTS
// =============================================================================
