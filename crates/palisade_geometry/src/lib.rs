//! # PALISADE Geometry
//!
//! Collision primitives built on the entity discipline of `palisade_core`.
//!
//! | shape | payload | dual-entity test |
//! |---|---|---|
//! | [`Aabb`] | [`AabbBounds`] | [`intersect_aabb`] |
//! | [`Circle`] | [`CircleShape`] | [`intersect_circle`] |
//! | [`Sphere`] | [`SphereShape`] | [`intersect_sphere`] |
//!
//! Intersection tests secure both shapes through the ordered pair lock,
//! copy both payloads, release, then evaluate. Touching shapes intersect.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aabb;
pub mod circle;
pub mod math;
pub mod sphere;

pub use aabb::{intersect_aabb, Aabb, AabbBounds};
pub use circle::{intersect_circle, Circle, CircleShape};
pub use math::{Vec2, Vec3};
pub use sphere::{intersect_sphere, Sphere, SphereShape};
