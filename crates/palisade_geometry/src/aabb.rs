//! # Axis-Aligned Bounding Box
//!
//! Invariant: `min <= max` on both axes. Setters that would invert the box
//! are rejected with [`EntityError::InvalidArgument`] and leave it unchanged.

use palisade_core::lifecycle::contract_violation;
use palisade_core::{
    read_pair, Entity, EntityError, EntityResult, ErrorCode, Guardable, LifecycleState, Lockable,
};
use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Corners of a box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AabbBounds {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl AabbBounds {
    /// Creates bounds from corner coordinates.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// True if `min <= max` on both axes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.le_all(self.max)
    }

    /// True if the boxes overlap or touch.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.le_all(other.max) && other.min.le_all(self.max)
    }
}

fn checked(bounds: AabbBounds) -> EntityResult<AabbBounds> {
    if bounds.is_valid() {
        Ok(bounds)
    } else {
        tracing::debug!(?bounds, "rejected inverted box");
        Err(EntityError::InvalidArgument)
    }
}

/// Lockable axis-aligned box.
#[derive(Debug)]
pub struct Aabb {
    inner: Lockable<AabbBounds>,
}

impl Aabb {
    /// Creates an uninitialized box.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Aabb"),
        }
    }

    /// Initializes with explicit corners.
    ///
    /// Aborts if the box is already initialized.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::InvalidArgument`] if `min > max` on either
    /// axis; the box then stays uninitialized.
    pub fn initialize_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> EntityResult<()> {
        if self.inner.state() == LifecycleState::Initialized {
            contract_violation(
                "Aabb",
                "initialize_bounds",
                "called while object is already initialized",
            );
        }
        match checked(AabbBounds::new(min_x, min_y, max_x, max_y)) {
            Ok(bounds) => self.inner.initialize_with(bounds),
            Err(error) => {
                self.record_outcome(ErrorCode::InvalidArgument);
                Err(error)
            }
        }
    }

    /// Replaces all four corners.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for inverted bounds, or the guard error.
    pub fn set_bounds(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> EntityResult<()> {
        self.inner.try_update("set_bounds", |bounds| {
            *bounds = checked(AabbBounds::new(min_x, min_y, max_x, max_y))?;
            Ok(())
        })
    }

    /// Moves the lower-left corner.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if it would pass the upper-right corner.
    pub fn set_minimum(&self, min_x: f64, min_y: f64) -> EntityResult<()> {
        self.edit("set_minimum", |b| b.min = Vec2::new(min_x, min_y))
    }

    /// Moves the lower-left corner horizontally.
    ///
    /// # Errors
    ///
    /// See [`Aabb::set_minimum`].
    pub fn set_minimum_x(&self, min_x: f64) -> EntityResult<()> {
        self.edit("set_minimum_x", |b| b.min.x = min_x)
    }

    /// Moves the lower-left corner vertically.
    ///
    /// # Errors
    ///
    /// See [`Aabb::set_minimum`].
    pub fn set_minimum_y(&self, min_y: f64) -> EntityResult<()> {
        self.edit("set_minimum_y", |b| b.min.y = min_y)
    }

    /// Moves the upper-right corner.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if it would pass the lower-left corner.
    pub fn set_maximum(&self, max_x: f64, max_y: f64) -> EntityResult<()> {
        self.edit("set_maximum", |b| b.max = Vec2::new(max_x, max_y))
    }

    /// Moves the upper-right corner horizontally.
    ///
    /// # Errors
    ///
    /// See [`Aabb::set_maximum`].
    pub fn set_maximum_x(&self, max_x: f64) -> EntityResult<()> {
        self.edit("set_maximum_x", |b| b.max.x = max_x)
    }

    /// Moves the upper-right corner vertically.
    ///
    /// # Errors
    ///
    /// See [`Aabb::set_maximum`].
    pub fn set_maximum_y(&self, max_y: f64) -> EntityResult<()> {
        self.edit("set_maximum_y", |b| b.max.y = max_y)
    }

    fn edit(&self, operation: &str, change: impl FnOnce(&mut AabbBounds)) -> EntityResult<()> {
        self.inner.try_update(operation, |bounds| {
            let mut candidate = *bounds;
            change(&mut candidate);
            *bounds = checked(candidate)?;
            Ok(())
        })
    }

    /// Current corners.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn bounds(&self) -> EntityResult<AabbBounds> {
        self.inner.snapshot("bounds")
    }

    /// Lower-left x.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn minimum_x(&self) -> EntityResult<f64> {
        self.inner.read("minimum_x", |b| b.min.x)
    }

    /// Lower-left y.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn minimum_y(&self) -> EntityResult<f64> {
        self.inner.read("minimum_y", |b| b.min.y)
    }

    /// Upper-right x.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn maximum_x(&self) -> EntityResult<f64> {
        self.inner.read("maximum_x", |b| b.max.x)
    }

    /// Upper-right y.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn maximum_y(&self) -> EntityResult<f64> {
        self.inner.read("maximum_y", |b| b.max.y)
    }

    /// Copy-assigns `other`'s corners into this live box.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_copy(&other.inner)
    }

    /// Move-assigns `other`'s corners, leaving `other` as a zero box.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn take_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_move(&other.inner)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Aabb {
    type Payload = AabbBounds;

    fn lockable(&self) -> &Lockable<AabbBounds> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<AabbBounds> {
        &mut self.inner
    }
}

/// True if the two boxes overlap or touch. `first` and `second` may be the
/// same box.
///
/// # Errors
///
/// Returns the pair acquisition error.
pub fn intersect_aabb(first: &Aabb, second: &Aabb) -> EntityResult<bool> {
    read_pair(&first.inner, &second.inner, "intersect_aabb", AabbBounds::overlaps)
}
