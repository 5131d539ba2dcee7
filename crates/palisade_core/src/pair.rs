//! # Pairwise Lock Ordering
//!
//! Secures two entities at once without risking deadlock.
//!
//! ## Algorithm
//!
//! ```text
//! same entity?  ── yes ──> lock it once, second slot = NotHeld
//!      │ no
//!      v
//! order by EntityId: lower, upper
//!      │
//!      v
//! ┌─> lock lower (blocking) ───────── failure ──> return error
//! │        │
//! │        v
//! │   try-lock upper ──── ok ──> BothLocked
//! │        │ contended
//! │        v
//! └── release lower, back off
//! ```
//!
//! Every thread takes the lower guard first, so at most one of two racing
//! pairwise operations can hold `lower` while asking for `upper`; the other
//! is queued on `lower`. No circular wait can form.
//!
//! Guards are released upper first, then lower, when the [`PairGuard`] drops.

use std::thread;

use crate::config::{self, LockPolicy};
use crate::contention;
use crate::entity::{Guardable, Lockable};
use crate::error::{AsErrorCode, EntityError, EntityResult, ErrorCode};
use crate::guard::{self, Guard, GuardLock};
use crate::identity::EntityId;
use crate::lifecycle::{contract_violation, LifecycleState};

/// Progress of one pairwise acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PairState {
    /// Nothing held.
    NotLocked,
    /// The lower-identity guard is held, the upper one is being requested.
    LowerLocked,
    /// Both participants are secured.
    BothLocked,
    /// Both guards have been released.
    Released,
}

/// What a [`PairGuard`] holds for one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// The participant's guard is held.
    Held,
    /// The participant has no guard attached; nothing needed locking.
    Unguarded,
    /// Nothing is held for this slot (second slot of a self-pair).
    NotHeld,
}

impl SlotStatus {
    fn of(lock: &GuardLock<'_>) -> Self {
        if lock.is_held() {
            Self::Held
        } else {
            Self::Unguarded
        }
    }
}

/// Both participants of a pairwise acquisition, released on drop.
pub struct PairGuard<'a> {
    lower: GuardLock<'a>,
    upper: GuardLock<'a>,
    lower_id: EntityId,
    upper_id: EntityId,
    swapped: bool,
    same: bool,
    attempts: u32,
    state: PairState,
}

impl PairGuard<'_> {
    /// Slot status of the first argument.
    #[must_use]
    pub fn first_slot(&self) -> SlotStatus {
        if self.swapped {
            self.upper_slot()
        } else {
            SlotStatus::of(&self.lower)
        }
    }

    /// Slot status of the second argument.
    #[must_use]
    pub fn second_slot(&self) -> SlotStatus {
        if self.swapped {
            SlotStatus::of(&self.lower)
        } else {
            self.upper_slot()
        }
    }

    fn upper_slot(&self) -> SlotStatus {
        if self.same {
            SlotStatus::NotHeld
        } else {
            SlotStatus::of(&self.upper)
        }
    }

    /// True if the first argument is secured (held, or has no guard).
    #[inline]
    #[must_use]
    pub fn first_held(&self) -> bool {
        self.first_slot() != SlotStatus::NotHeld
    }

    /// True if the second argument is secured separately from the first.
    #[inline]
    #[must_use]
    pub fn second_held(&self) -> bool {
        self.second_slot() != SlotStatus::NotHeld
    }

    /// Identity acquired first.
    #[inline]
    #[must_use]
    pub const fn lower_id(&self) -> EntityId {
        self.lower_id
    }

    /// Identity acquired second (equal to `lower_id` for a self-pair).
    #[inline]
    #[must_use]
    pub const fn upper_id(&self) -> EntityId {
        self.upper_id
    }

    /// True if both arguments were the same entity.
    #[inline]
    #[must_use]
    pub const fn is_self_pair(&self) -> bool {
        self.same
    }

    /// Number of lower-then-upper attempts it took.
    #[inline]
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Current acquisition state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> PairState {
        self.state
    }
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.upper));
        drop(std::mem::take(&mut self.lower));
        self.state = PairState::Released;
        tracing::trace!(lower = %self.lower_id, upper = %self.upper_id, state = ?self.state, "pair released");
    }
}

impl std::fmt::Debug for PairGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairGuard")
            .field("lower_id", &self.lower_id)
            .field("upper_id", &self.upper_id)
            .field("first", &self.first_slot())
            .field("second", &self.second_slot())
            .field("attempts", &self.attempts)
            .field("state", &self.state)
            .finish()
    }
}

/// Locks two entities in identity order under the active policy.
///
/// Aborts if either entity is not `Initialized`. The outcome is recorded in
/// both entities' error slots.
///
/// # Errors
///
/// Only under a bounded [`LockPolicy`]: [`EntityError::Timeout`]. Contention
/// is retried internally and never surfaces as
/// [`EntityError::AlreadyLocked`].
pub fn lock_pair<'a, A, B>(first: &'a A, second: &'a B) -> EntityResult<PairGuard<'a>>
where
    A: Guardable + ?Sized,
    B: Guardable + ?Sized,
{
    lock_pair_with(&config::current(), first, second)
}

/// [`lock_pair`] with an explicit policy.
///
/// # Errors
///
/// See [`lock_pair`].
pub fn lock_pair_with<'a, A, B>(
    policy: &LockPolicy,
    first: &'a A,
    second: &'a B,
) -> EntityResult<PairGuard<'a>>
where
    A: Guardable + ?Sized,
    B: Guardable + ?Sized,
{
    require_live(first.lifecycle_state(), first.type_name(), "lock_pair");
    require_live(second.lifecycle_state(), second.type_name(), "lock_pair");

    let result = acquire_ordered(
        policy,
        (first.entity_id(), first.guard()),
        (second.entity_id(), second.guard()),
    );
    let code = ErrorCode::of(&result);
    second.record_outcome(code);
    first.record_outcome(code);
    result
}

/// Releases both guards (upper first, then lower).
pub fn unlock_pair(pair: PairGuard<'_>) {
    drop(pair);
}

/// Core ordered acquisition over raw `(identity, guard)` slots.
///
/// Performs no lifecycle checks; callers decide which participants must be
/// live (the destination of `initialize_copy` is not yet).
pub(crate) fn acquire_ordered<'a>(
    policy: &LockPolicy,
    first: (EntityId, Option<&'a Guard>),
    second: (EntityId, Option<&'a Guard>),
) -> EntityResult<PairGuard<'a>> {
    let timeout = policy.lock_timeout();

    if first.0 == second.0 {
        let lock = guard::acquire(first.1, timeout).map_err(|error| timed_out(error, 1))?;
        contention::note_acquired();
        return Ok(PairGuard {
            lower: lock,
            upper: GuardLock::unguarded(),
            lower_id: first.0,
            upper_id: first.0,
            swapped: false,
            same: true,
            attempts: 1,
            state: PairState::BothLocked,
        });
    }

    let swapped = second.0 < first.0;
    let ((lower_id, lower_guard), (upper_id, upper_guard)) =
        if swapped { (second, first) } else { (first, second) };

    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);

        let lower = guard::acquire(lower_guard, timeout).map_err(|error| timed_out(error, attempts))?;
        tracing::trace!(lower = %lower_id, upper = %upper_id, attempts, state = ?PairState::LowerLocked, "lower guard acquired");

        match guard::try_acquire(upper_guard) {
            Ok(upper) => {
                contention::note_acquired();
                return Ok(PairGuard {
                    lower,
                    upper,
                    lower_id,
                    upper_id,
                    swapped,
                    same: false,
                    attempts,
                    state: PairState::BothLocked,
                });
            }
            Err(EntityError::AlreadyLocked) => {
                let mirrored = if lower.is_held() {
                    contention::release_after_wait(lower_id, upper_id, || drop(lower))
                } else {
                    drop(lower);
                    false
                };
                if mirrored {
                    tracing::warn!(lower = %lower_id, upper = %upper_id, "opposite-role wait detected");
                }
                contention::note_retry();
                tracing::trace!(lower = %lower_id, upper = %upper_id, attempts, state = ?PairState::NotLocked, "upper guard contended, backing off");

                if policy.max_pair_attempts.is_some_and(|max| attempts >= max) {
                    contention::note_timeout();
                    tracing::warn!(lower = %lower_id, upper = %upper_id, attempts, "pair acquisition gave up");
                    return Err(EntityError::Timeout { attempts });
                }
                thread::sleep(policy.backoff());
            }
            Err(error) => {
                drop(lower);
                return Err(error);
            }
        }
    }
}

fn timed_out(error: EntityError, attempts: u32) -> EntityError {
    match error {
        EntityError::Timeout { .. } => {
            contention::note_timeout();
            tracing::warn!(attempts, "guard acquisition timed out");
            EntityError::Timeout { attempts }
        }
        other => other,
    }
}

fn require_live(state: LifecycleState, type_name: &str, operation: &str) {
    if state != LifecycleState::Initialized {
        contract_violation(type_name, operation, "called while object is not initialized");
    }
}

/// Reads both payloads under the pair lock and evaluates `f` on the copies
/// after release.
///
/// `first` and `second` may be the same entity.
///
/// # Errors
///
/// Returns the pair acquisition error.
pub fn read_pair<A, B, R>(
    first: &Lockable<A>,
    second: &Lockable<B>,
    operation: &str,
    f: impl FnOnce(&A, &B) -> R,
) -> EntityResult<R>
where
    A: Clone,
    B: Clone,
{
    require_live(first.state(), first.type_name(), operation);
    require_live(second.state(), second.type_name(), operation);

    let pair = match acquire_ordered(&config::current(), first.guard_slot(), second.guard_slot()) {
        Ok(pair) => pair,
        Err(error) => {
            second.record(error.error_code());
            return first.finish(Err(error));
        }
    };
    let a = first.cell().lock().clone();
    let b = second.cell().lock().clone();
    drop(pair);

    second.record(ErrorCode::Success);
    first.finish(Ok(f(&a, &b)))
}

/// Runs `f` with exclusive access to both payloads under the pair lock.
///
/// The two entities must be distinct; a self-pair is rejected with
/// [`EntityError::InvalidArgument`] since one payload cannot be borrowed
/// mutably twice. Payload cells are taken in identity order.
///
/// # Errors
///
/// Returns the pair acquisition error, `InvalidArgument` for a self-pair,
/// or the closure's error.
pub fn update_pair<A, B, R, E>(
    first: &Lockable<A>,
    second: &Lockable<B>,
    operation: &str,
    f: impl FnOnce(&mut A, &mut B) -> Result<R, E>,
) -> Result<R, E>
where
    E: From<EntityError> + AsErrorCode,
{
    require_live(first.state(), first.type_name(), operation);
    require_live(second.state(), second.type_name(), operation);

    if first.id() == second.id() {
        return first.finish(Err(E::from(EntityError::InvalidArgument)));
    }

    let pair = match acquire_ordered(&config::current(), first.guard_slot(), second.guard_slot()) {
        Ok(pair) => pair,
        Err(error) => {
            second.record(error.error_code());
            return first.finish(Err(E::from(error)));
        }
    };

    let result = if first.id() < second.id() {
        let mut a = first.cell().lock();
        let mut b = second.cell().lock();
        f(&mut *a, &mut *b)
    } else {
        let mut b = second.cell().lock();
        let mut a = first.cell().lock();
        f(&mut *a, &mut *b)
    };
    drop(pair);

    second.record(ErrorCode::of(&result));
    first.finish(result)
}
