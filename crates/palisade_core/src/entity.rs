//! # Lockable Entities
//!
//! [`Lockable<T>`] is the one generic implementation of the entity
//! discipline. Domain types wrap a `Lockable<Payload>` and implement the
//! small [`Entity`] trait; they then get the whole lifecycle, guard and
//! outcome surface, and can take part in pairwise locking with any other
//! entity (of any type) through the blanket [`Guardable`] impl.
//!
//! ## Access model
//!
//! - Lifecycle transitions and guard attach/detach take `&mut self`: they
//!   need exclusive access, so they happen before an entity is shared
//! - Data accessors take `&self`; they acquire the entity's guard (a no-op
//!   when no guard is attached), then the payload cell, so an `Arc` of an
//!   entity can be used from many threads
//! - Payload closures passed to [`Lockable::read`]/[`Lockable::update`] must
//!   not call back into the same entity's accessors

use parking_lot::Mutex;

use crate::channel::ErrorSlot;
use crate::config;
use crate::error::{AsErrorCode, EntityError, EntityResult, ErrorCode};
use crate::guard::{self, Guard, GuardLock};
use crate::identity::{EntityId, Identity};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::pair;

/// An entity that can take part in guard acquisition.
///
/// Object safe, so heterogeneous entities can be passed to
/// [`crate::lock_many`] as `&dyn Guardable`.
pub trait Guardable: Identity {
    /// Current lifecycle state.
    fn lifecycle_state(&self) -> LifecycleState;

    /// The attached guard, if thread safety is enabled.
    fn guard(&self) -> Option<&Guard>;

    /// Records an operation outcome in the entity's last-error slot.
    fn record_outcome(&self, code: ErrorCode);

    /// Type name used in diagnostics.
    fn type_name(&self) -> &'static str;
}

/// Generic lockable entity: identity, lifecycle, optional guard, payload.
pub struct Lockable<T> {
    id: EntityId,
    lifecycle: Lifecycle,
    guard: Option<Guard>,
    cell: Mutex<T>,
    last_error: ErrorSlot,
}

impl<T: Default> Lockable<T> {
    /// Creates an `Uninitialized` entity named after its payload type.
    #[must_use]
    pub fn new() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Creates an `Uninitialized` entity with a diagnostic type name.
    #[must_use]
    pub fn named(type_name: &'static str) -> Self {
        Self {
            id: EntityId::allocate(),
            lifecycle: Lifecycle::new(type_name),
            guard: None,
            cell: Mutex::new(T::default()),
            last_error: ErrorSlot::new(),
        }
    }

    /// Initializes with the default payload.
    ///
    /// Aborts if the entity is already `Initialized`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the lifecycle surface uniform.
    pub fn initialize(&mut self) -> EntityResult<()> {
        self.initialize_with(T::default())
    }

    /// Initializes with `payload`.
    ///
    /// Aborts if the entity is already `Initialized`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the lifecycle surface uniform.
    pub fn initialize_with(&mut self, payload: T) -> EntityResult<()> {
        self.lifecycle.mark_initialized("initialize");
        *self.cell.get_mut() = payload;
        self.finish(Ok(()))
    }

    /// Initializes by moving `source`'s payload out under the pair lock.
    ///
    /// `source` keeps its `Initialized` state with a default payload.
    /// Aborts if `source` is not `Initialized` or `self` is.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error (only possible under a bounded
    /// lock policy); `self` then stays uninitialized.
    pub fn initialize_move(&mut self, source: &Lockable<T>) -> EntityResult<()> {
        const OPERATION: &str = "initialize_move";
        source.lifecycle.require_source_initialized(OPERATION);
        self.lifecycle.require_not_initialized(OPERATION);

        let taken = self.take_from_source(source);
        let result = taken.map(|payload| {
            *self.cell.get_mut() = payload;
            self.lifecycle.mark_initialized(OPERATION);
        });
        source.record(ErrorCode::of(&result));
        self.finish(result)
    }

    fn take_from_source(&self, source: &Lockable<T>) -> EntityResult<T> {
        let policy = config::current();
        let pair = pair::acquire_ordered(&policy, self.guard_slot(), source.guard_slot())?;
        let payload = std::mem::take(&mut *source.cell.lock());
        drop(pair);
        Ok(payload)
    }
}

impl<T: Default + Clone> Lockable<T> {
    /// Initializes with a copy of `source`'s payload, read under the pair
    /// lock. `source` is left unchanged.
    ///
    /// Aborts if `source` is not `Initialized` or `self` is.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error (only possible under a bounded
    /// lock policy); `self` then stays uninitialized.
    pub fn initialize_copy(&mut self, source: &Lockable<T>) -> EntityResult<()> {
        const OPERATION: &str = "initialize_copy";
        source.lifecycle.require_source_initialized(OPERATION);
        self.lifecycle.require_not_initialized(OPERATION);

        let policy = config::current();
        let copied = pair::acquire_ordered(&policy, self.guard_slot(), source.guard_slot())
            .map(|pair| {
                let payload = source.cell.lock().clone();
                drop(pair);
                payload
            });
        let result = copied.map(|payload| {
            *self.cell.get_mut() = payload;
            self.lifecycle.mark_initialized(OPERATION);
        });
        self.finish(result)
    }

    /// Copy-assigns `source`'s payload into this live entity.
    ///
    /// Both entities are held through the pair lock for the copy. Assigning
    /// an entity to itself is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_copy(&self, source: &Lockable<T>) -> EntityResult<()> {
        const OPERATION: &str = "assign_copy";
        self.lifecycle.require_initialized(OPERATION);
        source.lifecycle.require_source_initialized(OPERATION);
        if self.id == source.id {
            return self.finish(Ok(()));
        }
        let result = pair::update_pair(self, source, OPERATION, |target, from| {
            target.clone_from(from);
            Ok::<(), EntityError>(())
        });
        self.finish(result)
    }

    /// Returns a clone of the payload.
    ///
    /// # Errors
    ///
    /// Returns the guard acquisition error.
    pub fn snapshot(&self, operation: &str) -> EntityResult<T> {
        self.read(operation, T::clone)
    }
}

impl<T: Default> Lockable<T> {
    /// Move-assigns `source`'s payload into this live entity, leaving
    /// `source` initialized with a default payload. Self-assignment is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_move(&self, source: &Lockable<T>) -> EntityResult<()> {
        const OPERATION: &str = "assign_move";
        self.lifecycle.require_initialized(OPERATION);
        source.lifecycle.require_source_initialized(OPERATION);
        if self.id == source.id {
            return self.finish(Ok(()));
        }
        let result = pair::update_pair(self, source, OPERATION, |target, from| {
            *target = std::mem::take(from);
            Ok::<(), EntityError>(())
        });
        source.record(ErrorCode::of(&result));
        self.finish(result)
    }

    /// Tears the entity down: releases the guard, resets the payload and
    /// moves to `Destroyed`.
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the lifecycle surface uniform.
    pub fn destroy(&mut self) -> EntityResult<()> {
        self.lifecycle.mark_destroyed("destroy");
        self.guard = None;
        *self.cell.get_mut() = T::default();
        self.finish(Ok(()))
    }

    /// Replaces the payload, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns the guard acquisition error.
    pub fn replace(&self, operation: &str, payload: T) -> EntityResult<T> {
        self.update(operation, |current| std::mem::replace(current, payload))
    }
}

impl<T> Lockable<T> {
    /// Attaches a guard. No-op if one is already attached.
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NoMemory`] if the guard cannot be allocated;
    /// the entity stays guard-less and fully usable single-threaded.
    pub fn enable_thread_safety(&mut self) -> EntityResult<()> {
        self.lifecycle.require_initialized("enable_thread_safety");
        if self.guard.is_some() {
            return self.finish(Ok(()));
        }
        let result = Guard::allocate().map(|guard| {
            self.guard = Some(guard);
        });
        match &result {
            Ok(()) => tracing::debug!(entity = self.type_name(), id = %self.id, "guard attached"),
            Err(error) => tracing::warn!(entity = self.type_name(), id = %self.id, %error, "guard allocation failed"),
        }
        self.finish(result)
    }

    /// Detaches and releases the guard. No-op if none is attached.
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the lifecycle surface uniform.
    pub fn disable_thread_safety(&mut self) -> EntityResult<()> {
        self.lifecycle.require_initialized("disable_thread_safety");
        if self.guard.take().is_some() {
            tracing::debug!(entity = self.type_name(), id = %self.id, "guard detached");
        }
        self.finish(Ok(()))
    }

    /// True if a guard is attached.
    ///
    /// Aborts unless the entity is `Initialized`.
    #[must_use]
    pub fn is_thread_safe(&self) -> bool {
        self.lifecycle.require_initialized("is_thread_safe");
        self.last_error.store(ErrorCode::Success);
        self.guard.is_some()
    }

    /// Acquires the entity's guard (no-op when none is attached).
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::Timeout`] under a bounded lock policy.
    pub fn lock(&self, operation: &str) -> EntityResult<GuardLock<'_>> {
        self.lifecycle.require_initialized(operation);
        let result = guard::acquire(self.guard.as_ref(), config::current().lock_timeout());
        if let Err(error) = &result {
            tracing::warn!(entity = self.type_name(), id = %self.id, operation, %error, "guard acquisition failed");
        }
        self.finish(result)
    }

    /// Runs `f` with shared access to the payload, under the guard.
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns the guard acquisition error.
    pub fn read<R>(&self, operation: &str, f: impl FnOnce(&T) -> R) -> EntityResult<R> {
        let lock = self.lock(operation)?;
        let value = f(&*self.cell.lock());
        drop(lock);
        Ok(value)
    }

    /// Runs `f` with exclusive access to the payload, under the guard.
    ///
    /// Aborts unless the entity is `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns the guard acquisition error.
    pub fn update<R>(&self, operation: &str, f: impl FnOnce(&mut T) -> R) -> EntityResult<R> {
        let lock = self.lock(operation)?;
        let value = f(&mut *self.cell.lock());
        drop(lock);
        Ok(value)
    }

    /// Like [`Lockable::update`], for fallible domain logic.
    ///
    /// The closure's outcome is recorded in the last-error slots.
    ///
    /// # Errors
    ///
    /// Returns the guard acquisition error or the closure's error.
    pub fn try_update<R, E>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<EntityError> + AsErrorCode,
    {
        let lock = self.lock(operation)?;
        let result = f(&mut *self.cell.lock());
        drop(lock);
        self.finish(result)
    }

    /// This entity's most recent outcome.
    #[inline]
    #[must_use]
    pub fn get_error(&self) -> ErrorCode {
        self.last_error.load()
    }

    /// Description of this entity's most recent outcome.
    #[must_use]
    pub fn get_error_str(&self) -> &'static str {
        self.get_error().as_str()
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// The entity's identity.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Type name used in diagnostics.
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.lifecycle.type_name()
    }

    /// Identity plus optional guard, as consumed by the ordering routines.
    #[inline]
    pub(crate) fn guard_slot(&self) -> (EntityId, Option<&Guard>) {
        (self.id, self.guard.as_ref())
    }

    /// The payload cell. Only locked after the guard protocol has run.
    #[inline]
    pub(crate) fn cell(&self) -> &Mutex<T> {
        &self.cell
    }

    /// Stores `code` in this entity's slot and the thread-local slot.
    #[inline]
    pub(crate) fn record(&self, code: ErrorCode) {
        self.last_error.store(code);
    }

    /// Records `result`'s outcome in both slots and hands it back.
    pub(crate) fn finish<R, E: AsErrorCode>(&self, result: Result<R, E>) -> Result<R, E> {
        self.last_error.store(ErrorCode::of(&result));
        result
    }
}

impl<T: Default> Default for Lockable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Lockable<T> {
    fn drop(&mut self) {
        match self.lifecycle.state() {
            LifecycleState::Initialized => {
                self.guard = None;
                self.lifecycle.mark_destroyed("drop");
            }
            LifecycleState::Uninitialized => {
                if !std::thread::panicking() {
                    self.lifecycle
                        .violate("drop", "object left scope without being initialized");
                }
            }
            LifecycleState::Destroyed => {}
        }
    }
}

impl<T> std::fmt::Debug for Lockable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lockable")
            .field("type", &self.lifecycle.type_name())
            .field("id", &self.id)
            .field("state", &self.lifecycle.state())
            .field("thread_safe", &self.guard.is_some())
            .field("last_error", &self.last_error.load())
            .finish_non_exhaustive()
    }
}

/// The per-type interface for domain collaborators.
///
/// Implement [`Entity::lockable`] and [`Entity::lockable_mut`]; every other
/// method is provided.
pub trait Entity {
    /// The domain payload guarded by the entity.
    type Payload: Default + Clone;

    /// The embedded lockable entity.
    fn lockable(&self) -> &Lockable<Self::Payload>;

    /// The embedded lockable entity, mutably.
    fn lockable_mut(&mut self) -> &mut Lockable<Self::Payload>;

    /// See [`Lockable::initialize`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::initialize`].
    fn initialize(&mut self) -> EntityResult<()> {
        self.lockable_mut().initialize()
    }

    /// See [`Lockable::initialize_copy`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::initialize_copy`].
    fn initialize_copy(&mut self, source: &Self) -> EntityResult<()>
    where
        Self: Sized,
    {
        self.lockable_mut().initialize_copy(source.lockable())
    }

    /// See [`Lockable::initialize_move`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::initialize_move`].
    fn initialize_move(&mut self, source: &Self) -> EntityResult<()>
    where
        Self: Sized,
    {
        self.lockable_mut().initialize_move(source.lockable())
    }

    /// See [`Lockable::assign_copy`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::assign_copy`].
    fn assign_copy(&self, source: &Self) -> EntityResult<()>
    where
        Self: Sized,
    {
        self.lockable().assign_copy(source.lockable())
    }

    /// See [`Lockable::assign_move`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::assign_move`].
    fn assign_move(&self, source: &Self) -> EntityResult<()>
    where
        Self: Sized,
    {
        self.lockable().assign_move(source.lockable())
    }

    /// See [`Lockable::destroy`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::destroy`].
    fn destroy(&mut self) -> EntityResult<()> {
        self.lockable_mut().destroy()
    }

    /// See [`Lockable::enable_thread_safety`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::enable_thread_safety`].
    fn enable_thread_safety(&mut self) -> EntityResult<()> {
        self.lockable_mut().enable_thread_safety()
    }

    /// See [`Lockable::disable_thread_safety`].
    ///
    /// # Errors
    ///
    /// See [`Lockable::disable_thread_safety`].
    fn disable_thread_safety(&mut self) -> EntityResult<()> {
        self.lockable_mut().disable_thread_safety()
    }

    /// See [`Lockable::is_thread_safe`].
    fn is_thread_safe(&self) -> bool {
        self.lockable().is_thread_safe()
    }

    /// See [`Lockable::get_error`].
    fn get_error(&self) -> ErrorCode {
        self.lockable().get_error()
    }

    /// See [`Lockable::get_error_str`].
    fn get_error_str(&self) -> &'static str {
        self.lockable().get_error_str()
    }
}

impl<T: Default + Clone> Entity for Lockable<T> {
    type Payload = T;

    fn lockable(&self) -> &Lockable<T> {
        self
    }

    fn lockable_mut(&mut self) -> &mut Lockable<T> {
        self
    }
}

impl<E: Entity> Identity for E {
    fn entity_id(&self) -> EntityId {
        self.lockable().id
    }
}

impl<E: Entity> Guardable for E {
    fn lifecycle_state(&self) -> LifecycleState {
        self.lockable().state()
    }

    fn guard(&self) -> Option<&Guard> {
        self.lockable().guard.as_ref()
    }

    fn record_outcome(&self, code: ErrorCode) {
        self.lockable().record(code);
    }

    fn type_name(&self) -> &'static str {
        self.lockable().type_name()
    }
}
