//! # Circle

use palisade_core::lifecycle::contract_violation;
use palisade_core::{
    read_pair, Entity, EntityResult, ErrorCode, Guardable, LifecycleState, Lockable,
};
use serde::{Deserialize, Serialize};

use crate::math::{check_radius, spheres_touch, Vec2};

/// Center and radius of a circle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleShape {
    /// Center point
    pub center: Vec2,
    /// Radius, never negative
    pub radius: f64,
}

impl CircleShape {
    /// True if the circles overlap or touch.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        spheres_touch(self.center.distance_squared(other.center), self.radius, other.radius)
    }
}

/// Lockable circle.
#[derive(Debug)]
pub struct Circle {
    inner: Lockable<CircleShape>,
}

impl Circle {
    /// Creates an uninitialized circle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Circle"),
        }
    }

    /// Initializes with a center and radius.
    ///
    /// Aborts if the circle is already initialized.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative or NaN radius; the circle then stays
    /// uninitialized.
    pub fn initialize_shape(&mut self, center_x: f64, center_y: f64, radius: f64) -> EntityResult<()> {
        if self.inner.state() == LifecycleState::Initialized {
            contract_violation("Circle", "initialize_shape", "called while object is already initialized");
        }
        if let Err(error) = check_radius(radius) {
            self.record_outcome(ErrorCode::InvalidArgument);
            return Err(error);
        }
        self.inner.initialize_with(CircleShape {
            center: Vec2::new(center_x, center_y),
            radius,
        })
    }

    /// Moves the center.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center(&self, center_x: f64, center_y: f64) -> EntityResult<()> {
        self.inner
            .update("set_center", |c| c.center = Vec2::new(center_x, center_y))
    }

    /// Moves the center horizontally.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center_x(&self, center_x: f64) -> EntityResult<()> {
        self.inner.update("set_center_x", |c| c.center.x = center_x)
    }

    /// Moves the center vertically.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_center_y(&self, center_y: f64) -> EntityResult<()> {
        self.inner.update("set_center_y", |c| c.center.y = center_y)
    }

    /// Changes the radius.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a negative or NaN radius, or the guard error.
    pub fn set_radius(&self, radius: f64) -> EntityResult<()> {
        self.inner.try_update("set_radius", |c| {
            check_radius(radius)?;
            c.radius = radius;
            Ok(())
        })
    }

    /// Current center and radius.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn shape(&self) -> EntityResult<CircleShape> {
        self.inner.snapshot("shape")
    }

    /// Center x.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn center_x(&self) -> EntityResult<f64> {
        self.inner.read("center_x", |c| c.center.x)
    }

    /// Center y.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn center_y(&self) -> EntityResult<f64> {
        self.inner.read("center_y", |c| c.center.y)
    }

    /// Radius.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn radius(&self) -> EntityResult<f64> {
        self.inner.read("radius", |c| c.radius)
    }

    /// Copy-assigns `other` into this live circle.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_copy(&other.inner)
    }

    /// Move-assigns `other`, leaving it as a zero circle.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn take_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_move(&other.inner)
    }
}

impl Default for Circle {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Circle {
    type Payload = CircleShape;

    fn lockable(&self) -> &Lockable<CircleShape> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<CircleShape> {
        &mut self.inner
    }
}

/// True if the circles overlap or touch.
///
/// # Errors
///
/// Returns the pair acquisition error.
pub fn intersect_circle(first: &Circle, second: &Circle) -> EntityResult<bool> {
    read_pair(&first.inner, &second.inner, "intersect_circle", CircleShape::touches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::EntityError;

    fn circle(x: f64, y: f64, radius: f64) -> Circle {
        let mut shape = Circle::new();
        shape.initialize_shape(x, y, radius).unwrap();
        shape
    }

    #[test]
    fn test_intersection() {
        let a = circle(0.0, 0.0, 1.0);
        let b = circle(1.5, 0.0, 1.0);
        let far = circle(10.0, 0.0, 1.0);
        assert!(intersect_circle(&a, &b).unwrap());
        assert!(intersect_circle(&b, &a).unwrap());
        assert!(!intersect_circle(&a, &far).unwrap());
        assert!(intersect_circle(&far, &far).unwrap());
    }

    #[test]
    fn test_touching_circles_intersect() {
        let a = circle(0.0, 0.0, 1.0);
        let b = circle(2.0, 0.0, 1.0);
        assert!(intersect_circle(&a, &b).unwrap());
    }

    #[test]
    fn test_radius_validation() {
        let a = circle(0.0, 0.0, 1.0);
        assert_eq!(a.set_radius(-1.0), Err(EntityError::InvalidArgument));
        assert_eq!(a.get_error(), ErrorCode::InvalidArgument);
        assert_eq!(a.radius().unwrap(), 1.0);
        a.set_radius(3.0).unwrap();
        assert_eq!(a.radius().unwrap(), 3.0);

        let mut bad = Circle::new();
        assert_eq!(bad.initialize_shape(0.0, 0.0, f64::NAN), Err(EntityError::InvalidArgument));
        assert_eq!(bad.lifecycle_state(), LifecycleState::Uninitialized);
        bad.initialize_shape(0.0, 0.0, 0.0).unwrap();
    }

    #[test]
    fn test_setters_and_move() {
        let mut a = circle(0.0, 0.0, 1.0);
        a.enable_thread_safety().unwrap();
        a.set_center(2.0, 3.0).unwrap();
        a.set_center_x(4.0).unwrap();
        assert_eq!(a.center_x().unwrap(), 4.0);
        assert_eq!(a.center_y().unwrap(), 3.0);

        let target = circle(0.0, 0.0, 0.0);
        target.take_from(&a).unwrap();
        assert_eq!(target.shape().unwrap().center, Vec2::new(4.0, 3.0));
        assert_eq!(a.shape().unwrap(), CircleShape::default());
        assert!(a.is_thread_safe());
    }
}
