//! # Sphere

use palisade_core::lifecycle::contract_violation;
use palisade_core::{
    read_pair, Entity, EntityResult, ErrorCode, Guardable, LifecycleState, Lockable,
};
use serde::{Deserialize, Serialize};

use crate::math::{check_radius, spheres_touch, Vec3};

/// Center and radius of a sphere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SphereShape {
    /// Center point
    pub center: Vec3,
    /// Radius, never negative
    pub radius: f64,
}

impl SphereShape {
    /// True if the spheres overlap or touch.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        spheres_touch(self.center.distance_squared(other.center), self.radius, other.radius)
    }
}

/// Lockable sphere.
#[derive(Debug)]
pub struct Sphere {
    inner: Lockable<SphereShape>,
}

impl Sphere {
    /// Creates an uninitialized sphere.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Sphere"),
        }
    }

    /// Initializes with a center and radius.
    ///
    /// Aborts if the sphere is already initialized.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative or NaN radius; the sphere then stays
    /// uninitialized.
    pub fn initialize_shape(&mut self, center: Vec3, radius: f64) -> EntityResult<()> {
        if self.inner.state() == LifecycleState::Initialized {
            contract_violation("Sphere", "initialize_shape", "called while object is already initialized");
        }
        if let Err(error) = check_radius(radius) {
            self.record_outcome(ErrorCode::InvalidArgument);
            return Err(error);
        }
        self.inner.initialize_with(SphereShape { center, radius })
    }

    /// Moves the center.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center(&self, center: Vec3) -> EntityResult<()> {
        self.inner.update("set_center", |s| s.center = center)
    }

    /// Moves the center along x.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center_x(&self, x: f64) -> EntityResult<()> {
        self.inner.update("set_center_x", |s| s.center.x = x)
    }

    /// Moves the center along y.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center_y(&self, y: f64) -> EntityResult<()> {
        self.inner.update("set_center_y", |s| s.center.y = y)
    }

    /// Moves the center along z.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center_z(&self, z: f64) -> EntityResult<()> {
        self.inner.update("set_center_z", |s| s.center.z = z)
    }

    /// Changes the radius.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative or NaN radius, or the guard error.
    pub fn set_radius(&self, radius: f64) -> EntityResult<()> {
        self.inner.try_update("set_radius", |s| {
            check_radius(radius)?;
            s.radius = radius;
            Ok(())
        })
    }

    /// Current center and radius.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn shape(&self) -> EntityResult<SphereShape> {
        self.inner.snapshot("shape")
    }

    /// Center point.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn center(&self) -> EntityResult<Vec3> {
        self.inner.read("center", |s| s.center)
    }

    /// Radius.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn radius(&self) -> EntityResult<f64> {
        self.inner.read("radius", |s| s.radius)
    }

    /// Copy-assigns `other` into this live sphere.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_copy(&other.inner)
    }

    /// Move-assigns `other`, leaving it as a zero sphere.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn take_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_move(&other.inner)
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Sphere {
    type Payload = SphereShape;

    fn lockable(&self) -> &Lockable<SphereShape> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<SphereShape> {
        &mut self.inner
    }
}

/// True if the spheres overlap or touch.
///
/// # Errors
///
/// Returns the pair acquisition error.
pub fn intersect_sphere(first: &Sphere, second: &Sphere) -> EntityResult<bool> {
    read_pair(&first.inner, &second.inner, "intersect_sphere", SphereShape::touches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::EntityError;

    fn sphere(x: f64, y: f64, z: f64, radius: f64) -> Sphere {
        let mut shape = Sphere::new();
        shape.initialize_shape(Vec3::new(x, y, z), radius).unwrap();
        shape
    }

    #[test]
    fn test_intersection_in_depth() {
        let a = sphere(0.0, 0.0, 0.0, 1.0);
        let above = sphere(0.0, 0.0, 2.0, 1.0);
        let far_above = sphere(0.0, 0.0, 2.5, 1.0);
        assert!(intersect_sphere(&a, &above).unwrap());
        assert!(!intersect_sphere(&far_above, &a).unwrap());
        assert!(intersect_sphere(&a, &a).unwrap());
    }

    #[test]
    fn test_setters() {
        let s = sphere(0.0, 0.0, 0.0, 1.0);
        s.set_center(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        s.set_center_z(9.0).unwrap();
        s.set_center_x(-1.0).unwrap();
        s.set_center_y(-2.0).unwrap();
        assert_eq!(s.center().unwrap(), Vec3::new(-1.0, -2.0, 9.0));
        assert_eq!(s.set_radius(-0.5), Err(EntityError::InvalidArgument));
        assert_eq!(s.radius().unwrap(), 1.0);
    }

    #[test]
    fn test_copy_then_destroy_and_reinitialize() {
        let source = sphere(1.0, 1.0, 1.0, 2.0);
        let mut copy = Sphere::new();
        copy.initialize_copy(&source).unwrap();
        assert_eq!(copy.shape().unwrap(), source.shape().unwrap());

        copy.destroy().unwrap();
        copy.initialize_shape(Vec3::ZERO, 1.0).unwrap();
        assert_eq!(copy.radius().unwrap(), 1.0);

        let target = sphere(0.0, 0.0, 0.0, 0.0);
        target.assign_from(&source).unwrap();
        assert_eq!(target.radius().unwrap(), 2.0);
    }
}
