//! # Optional Exclusion Guard
//!
//! A reentrant exclusion lock attached to one entity. Entities without a
//! guard behave as single-threaded values: locking them is a no-op that
//! yields an unguarded [`GuardLock`].
//!
//! Two acquisition modes:
//!
//! - [`Guard::lock`] blocks (optionally bounded by a timeout)
//! - [`Guard::try_lock`] never blocks and reports contention as
//!   [`EntityError::AlreadyLocked`]; the pairwise routine uses it to detect
//!   contention on its second acquisition

use std::cell::Cell;
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::error::{EntityError, EntityResult};

thread_local! {
    /// Remaining guard allocations allowed on this thread (`None` = unlimited).
    static GUARD_ALLOCATION_LIMIT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Limits how many more guards this thread may allocate.
///
/// `Some(0)` makes the next allocation fail with [`EntityError::NoMemory`];
/// `None` removes the limit. Used to exercise allocation-failure paths.
pub fn set_thread_guard_limit(limit: Option<usize>) {
    GUARD_ALLOCATION_LIMIT.with(|slot| slot.set(limit));
}

/// Remaining guard allocations on this thread.
#[must_use]
pub fn thread_guard_limit() -> Option<usize> {
    GUARD_ALLOCATION_LIMIT.with(Cell::get)
}

fn reserve_allocation() -> EntityResult<()> {
    GUARD_ALLOCATION_LIMIT.with(|slot| match slot.get() {
        None => Ok(()),
        Some(0) => Err(EntityError::NoMemory),
        Some(remaining) => {
            slot.set(Some(remaining - 1));
            Ok(())
        }
    })
}

/// Reentrant exclusion lock owned by exactly one entity.
#[derive(Debug)]
pub struct Guard {
    mutex: ReentrantMutex<()>,
}

impl Guard {
    /// Allocates a new, unlocked guard.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NoMemory`] if this thread's guard allocation
    /// limit is exhausted.
    pub fn allocate() -> EntityResult<Self> {
        reserve_allocation()?;
        Ok(Self {
            mutex: ReentrantMutex::new(()),
        })
    }

    /// Acquires the guard, blocking until it is available.
    ///
    /// Reentrant: the owning thread may lock again without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Timeout`] if `timeout` elapses first.
    pub fn lock(&self, timeout: Option<Duration>) -> EntityResult<GuardLock<'_>> {
        let guard = match timeout {
            None => self.mutex.lock(),
            Some(limit) => self
                .mutex
                .try_lock_for(limit)
                .ok_or(EntityError::Timeout { attempts: 1 })?,
        };
        Ok(GuardLock { inner: Some(guard) })
    }

    /// Attempts to acquire the guard without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::AlreadyLocked`] if another thread holds it.
    pub fn try_lock(&self) -> EntityResult<GuardLock<'_>> {
        self.mutex
            .try_lock()
            .map(|guard| GuardLock { inner: Some(guard) })
            .ok_or(EntityError::AlreadyLocked)
    }

    /// True if any thread currently holds the guard.
    #[inline]
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }

    /// True if the calling thread holds the guard.
    #[inline]
    #[must_use]
    pub fn is_owned_by_current_thread(&self) -> bool {
        self.mutex.is_owned_by_current_thread()
    }
}

/// Acquires an optional guard; a missing guard yields an unguarded lock.
///
/// # Errors
///
/// See [`Guard::lock`].
pub fn acquire(guard: Option<&Guard>, timeout: Option<Duration>) -> EntityResult<GuardLock<'_>> {
    match guard {
        Some(guard) => guard.lock(timeout),
        None => Ok(GuardLock::unguarded()),
    }
}

/// Non-blocking variant of [`acquire`].
///
/// # Errors
///
/// See [`Guard::try_lock`].
pub fn try_acquire(guard: Option<&Guard>) -> EntityResult<GuardLock<'_>> {
    match guard {
        Some(guard) => guard.try_lock(),
        None => Ok(GuardLock::unguarded()),
    }
}

/// Proof of a guard acquisition; releases the guard when dropped.
#[derive(Default)]
pub struct GuardLock<'a> {
    inner: Option<ReentrantMutexGuard<'a, ()>>,
}

impl GuardLock<'_> {
    /// A lock token for an entity without a guard.
    #[inline]
    #[must_use]
    pub const fn unguarded() -> Self {
        Self { inner: None }
    }

    /// True if this token holds a real guard.
    #[inline]
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.inner.is_some()
    }

    /// Releases the guard now.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for GuardLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardLock").field("held", &self.is_held()).finish()
    }
}
