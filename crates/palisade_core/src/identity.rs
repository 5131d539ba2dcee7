//! # Entity Identity
//!
//! Lock ordering is driven by identity, never by domain values. Every
//! lockable entity receives a process-unique [`EntityId`] when it is created;
//! the id travels with the value when it moves, so it is stable for the
//! entity's whole life.

use std::sync::atomic::{AtomicU64, Ordering};

/// Next id to hand out. Zero is reserved for [`EntityId::NULL`].
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a lockable entity.
///
/// Ids are strictly ordered; two distinct entities never share one, so the
/// ordering is a strict total order usable as the lock acquisition key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Allocates a fresh, never reused id.
    #[must_use]
    pub fn allocate() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Anything with a stable identity usable as a lock ordering key.
pub trait Identity {
    /// The entity's identity.
    fn entity_id(&self) -> EntityId;
}
