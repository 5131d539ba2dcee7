//! Vector types used by shape payloads.

use palisade_core::{EntityError, EntityResult};
use serde::{Deserialize, Serialize};

/// 2D vector - box corners, circle centers
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let delta = self - other;
        delta.dot(delta)
    }

    /// True if every component of `self` is <= the matching one in `other`
    #[must_use]
    pub fn le_all(self, other: Self) -> bool {
        self.x <= other.x && self.y <= other.y
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// 3D vector - sphere centers
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let delta = self - other;
        delta.dot(delta)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Rejects negative and NaN radii.
pub(crate) fn check_radius(radius: f64) -> EntityResult<()> {
    if radius.is_nan() || radius < 0.0 {
        return Err(EntityError::InvalidArgument);
    }
    Ok(())
}

/// True if two round shapes touch or overlap.
pub(crate) fn spheres_touch(distance_squared: f64, first_radius: f64, second_radius: f64) -> bool {
    let reach = first_radius + second_radius;
    distance_squared <= reach * reach
}
