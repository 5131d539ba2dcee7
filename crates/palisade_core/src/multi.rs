//! # N-Way Ordered Acquisition
//!
//! Generalizes the pairwise routine to any number of entities:
//!
//! 1. Sort participants by [`EntityId`] and drop duplicates
//! 2. Lock the lowest one blocking, `try_lock` the rest in ascending order
//! 3. On contention, release everything in reverse order, back off, retry
//!
//! Release on drop is also in reverse acquisition order.

use std::thread;

use crate::config::{self, LockPolicy};
use crate::contention;
use crate::entity::Guardable;
use crate::error::{EntityError, EntityResult, ErrorCode};
use crate::guard::{self, GuardLock};
use crate::identity::EntityId;
use crate::lifecycle::{contract_violation, LifecycleState};

/// Guards for a set of entities, held in ascending identity order.
pub struct MultiGuard<'a> {
    locks: Vec<(EntityId, GuardLock<'a>)>,
    attempts: u32,
}

impl MultiGuard<'_> {
    /// Distinct participants, in acquisition order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.locks.iter().map(|(id, _)| *id).collect()
    }

    /// Number of distinct participants.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no participants were given.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// True if `id` is secured by this guard.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.locks.binary_search_by_key(&id, |(held, _)| *held).is_ok()
    }

    /// Number of acquisition attempts it took.
    #[inline]
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Drop for MultiGuard<'_> {
    fn drop(&mut self) {
        while let Some((_, lock)) = self.locks.pop() {
            drop(lock);
        }
    }
}

impl std::fmt::Debug for MultiGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiGuard")
            .field("ids", &self.ids())
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Locks every entity in `entities` under the active policy.
///
/// Aborts if any participant is not `Initialized`.
///
/// # Errors
///
/// Only under a bounded [`LockPolicy`]: [`EntityError::Timeout`].
pub fn lock_many<'a>(entities: &[&'a dyn Guardable]) -> EntityResult<MultiGuard<'a>> {
    lock_many_with(&config::current(), entities)
}

/// [`lock_many`] with an explicit policy.
///
/// # Errors
///
/// See [`lock_many`].
pub fn lock_many_with<'a>(
    policy: &LockPolicy,
    entities: &[&'a dyn Guardable],
) -> EntityResult<MultiGuard<'a>> {
    for entity in entities {
        if entity.lifecycle_state() != LifecycleState::Initialized {
            contract_violation(
                entity.type_name(),
                "lock_many",
                "called while object is not initialized",
            );
        }
    }

    let mut ordered: Vec<&'a dyn Guardable> = entities.to_vec();
    ordered.sort_by_key(|entity| entity.entity_id());
    ordered.dedup_by_key(|entity| entity.entity_id());

    let result = acquire_all(policy, &ordered);
    let code = ErrorCode::of(&result);
    for entity in &ordered {
        entity.record_outcome(code);
    }
    result
}

fn acquire_all<'a>(
    policy: &LockPolicy,
    ordered: &[&'a dyn Guardable],
) -> EntityResult<MultiGuard<'a>> {
    let timeout = policy.lock_timeout();
    let mut attempts: u32 = 0;

    'retry: loop {
        attempts = attempts.saturating_add(1);
        let mut locks: Vec<(EntityId, GuardLock<'a>)> = Vec::with_capacity(ordered.len());

        for (index, entity) in ordered.iter().enumerate() {
            let id = entity.entity_id();
            let acquired = if index == 0 {
                guard::acquire(entity.guard(), timeout)
            } else {
                guard::try_acquire(entity.guard())
            };

            match acquired {
                Ok(lock) => locks.push((id, lock)),
                Err(EntityError::AlreadyLocked) => {
                    let held = locks
                        .last()
                        .filter(|(_, lock)| lock.is_held())
                        .map(|(held_id, _)| *held_id);
                    let mirrored = match held {
                        Some(held_id) => {
                            contention::release_after_wait(held_id, id, || release_reverse(locks))
                        }
                        None => {
                            release_reverse(locks);
                            false
                        }
                    };
                    if mirrored {
                        tracing::warn!(blocked = %id, "opposite-role wait detected");
                    }
                    contention::note_retry();
                    tracing::trace!(blocked = %id, attempts, "n-way acquisition contended, backing off");

                    if policy.max_pair_attempts.is_some_and(|max| attempts >= max) {
                        contention::note_timeout();
                        tracing::warn!(participants = ordered.len(), attempts, "n-way acquisition gave up");
                        return Err(EntityError::Timeout { attempts });
                    }
                    thread::sleep(policy.backoff());
                    continue 'retry;
                }
                Err(EntityError::Timeout { .. }) => {
                    release_reverse(locks);
                    contention::note_timeout();
                    return Err(EntityError::Timeout { attempts });
                }
                Err(error) => {
                    release_reverse(locks);
                    return Err(error);
                }
            }
        }

        contention::note_acquired();
        return Ok(MultiGuard { locks, attempts });
    }
}

fn release_reverse(mut locks: Vec<(EntityId, GuardLock<'_>)>) {
    while let Some((_, lock)) = locks.pop() {
        drop(lock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Lockable;
    use crate::guard::Guard;
    use std::sync::{mpsc, Arc};

    fn guarded(name: &'static str) -> Lockable<u32> {
        let mut entity = Lockable::named(name);
        entity.initialize().unwrap();
        entity.enable_thread_safety().unwrap();
        entity
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        let a = guarded("A");
        let b = guarded("B");
        let c = guarded("C");

        let many = lock_many(&[&c, &a, &b, &a]).unwrap();
        assert_eq!(many.len(), 3);
        assert_eq!(many.ids(), vec![a.id(), b.id(), c.id()]);
        assert!(many.contains(b.id()));
        drop(many);

        for entity in [&a, &b, &c] {
            assert!(!entity.guard().map_or(true, Guard::is_locked));
        }
    }

    #[test]
    fn test_empty_set() {
        let many = lock_many(&[]).unwrap();
        assert!(many.is_empty());
    }

    #[test]
    fn test_mixed_payload_types() {
        let a = guarded("A");
        let mut label: Lockable<String> = Lockable::named("Label");
        label.initialize().unwrap();

        let many = lock_many(&[&label, &a]).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_bounded_policy_times_out_and_releases() {
        let a = Arc::new(guarded("A"));
        let b = Arc::new(guarded("B"));
        let c = Arc::new(guarded("C"));

        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                let _lock = c.lock("hold").unwrap();
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };
        locked_rx.recv().unwrap();

        let policy = LockPolicy {
            max_pair_attempts: Some(2),
            ..LockPolicy::DEFAULT
        };
        let result = lock_many_with(&policy, &[&*a, &*b, &*c]);
        assert_eq!(result.unwrap_err(), EntityError::Timeout { attempts: 2 });
        assert_eq!(a.get_error(), ErrorCode::Timeout);
        assert!(!a.guard().map_or(true, Guard::is_locked));
        assert!(!b.guard().map_or(true, Guard::is_locked));

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(lock_many_with(&policy, &[&*a, &*b, &*c]).is_ok());
    }
}
