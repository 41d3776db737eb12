//! Planar geometry helpers
//!
//! Angles are in degrees at the API boundary.

use contracts::{Location, Vector3D};

/// Rotate `location` around the z axis by `yaw_degrees`
///
/// z is left unchanged.
pub fn rotate(yaw_degrees: f64, location: Location) -> Location {
    location.rotate_yaw(yaw_degrees)
}

/// Horizontal bearing of `offset`, degrees in (-180, 180]
///
/// The zero vector yields 0.
pub fn azimuth(offset: Vector3D) -> f64 {
    let degrees = offset.y.atan2(offset.x).to_degrees();
    // atan2(-0.0, x < 0) lands on -180
    if degrees <= -180.0 {
        180.0
    } else {
        degrees
    }
}
