//! Geometry value types
//!
//! Units follow the simulator convention: meters for locations, degrees for rotations.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 3D vector (m, m/s, ...)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A point in world space.
pub type Location = Vector3D;

impl Vector3D {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean norm
    #[inline]
    pub fn squared_length(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Euclidean norm
    #[inline]
    pub fn length(&self) -> f64 {
        self.squared_length().sqrt()
    }

    /// Euclidean distance to `other`
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        (*other - *self).length()
    }

    /// True when no component is NaN or infinite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Rotate around the z axis by `yaw_degrees`, z unchanged
    pub fn rotate_yaw(self, yaw_degrees: f64) -> Self {
        let (s, c) = yaw_degrees.to_radians().sin_cos();
        Self::new(c * self.x - s * self.y, s * self.x + c * self.y, self.z)
    }
}

impl Add for Vector3D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation (pitch, yaw, roll), unit: degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    #[inline]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z), unit: meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll), unit: degrees
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    #[inline]
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Transform at `location` with no rotation
    #[inline]
    pub const fn from_location(location: Location) -> Self {
        Self {
            location,
            rotation: Rotation::new(0.0, 0.0, 0.0),
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.location.is_finite() && self.rotation.is_finite()
    }
}
