//! # Contention Tracking
//!
//! Process-wide bookkeeping for ordered acquisitions.
//!
//! The uncontended path only bumps atomic counters. When a try-lock on the
//! upper guard fails, the thread still holds the lower guard; before
//! releasing it, the thread publishes a wait record
//! `(thread, owned, requested)`. A record whose mirror image is published by
//! another thread means two threads are waiting on each other in opposite
//! roles. Identity ordering makes that impossible for flat pair
//! acquisitions, so a detected mirror points at a nested acquisition that
//! bypassed the ordering; it is counted and reported to the caller.
//!
//! The counters are monotonic and never reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::identity::EntityId;

#[derive(Clone, Copy, Debug)]
struct WaitRecord {
    thread: ThreadId,
    owned: EntityId,
    requested: EntityId,
}

static WAIT_RECORDS: Mutex<Vec<WaitRecord>> = parking_lot::const_mutex(Vec::new());

static ACQUISITIONS: AtomicU64 = AtomicU64::new(0);
static RETRIES: AtomicU64 = AtomicU64::new(0);
static CYCLES_DETECTED: AtomicU64 = AtomicU64::new(0);
static TIMEOUTS: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the contention counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentionStats {
    /// Successful pairwise/N-way acquisitions.
    pub acquisitions: u64,
    /// Contended attempts that released and backed off.
    pub retries: u64,
    /// Opposite-role waits detected.
    pub cycles_detected: u64,
    /// Acquisitions abandoned under a bounded policy.
    pub timeouts: u64,
}

impl ContentionStats {
    /// Counter growth since `earlier`.
    #[must_use]
    pub const fn since(&self, earlier: &Self) -> Self {
        Self {
            acquisitions: self.acquisitions.saturating_sub(earlier.acquisitions),
            retries: self.retries.saturating_sub(earlier.retries),
            cycles_detected: self.cycles_detected.saturating_sub(earlier.cycles_detected),
            timeouts: self.timeouts.saturating_sub(earlier.timeouts),
        }
    }
}

/// Current counter values.
#[must_use]
pub fn stats() -> ContentionStats {
    ContentionStats {
        acquisitions: ACQUISITIONS.load(Ordering::Relaxed),
        retries: RETRIES.load(Ordering::Relaxed),
        cycles_detected: CYCLES_DETECTED.load(Ordering::Relaxed),
        timeouts: TIMEOUTS.load(Ordering::Relaxed),
    }
}

/// Number of threads currently registered as waiting.
#[must_use]
pub fn waiting_threads() -> usize {
    WAIT_RECORDS.lock().len()
}

/// Registers the calling thread as holding `owned` while requesting
/// `requested`. Returns true if another thread waits in the mirrored role.
///
/// Only called on the contended path.
pub(crate) fn register_wait(owned: EntityId, requested: EntityId) -> bool {
    let thread = thread::current().id();
    let mut records = WAIT_RECORDS.lock();

    match records.iter_mut().find(|r| r.thread == thread) {
        Some(record) => {
            record.owned = owned;
            record.requested = requested;
        }
        None => records.push(WaitRecord {
            thread,
            owned,
            requested,
        }),
    }

    let mirrored = records
        .iter()
        .any(|r| r.thread != thread && r.owned == requested && r.requested == owned);
    drop(records);

    if mirrored {
        CYCLES_DETECTED.fetch_add(1, Ordering::Relaxed);
    }
    mirrored
}

/// Removes the calling thread's wait record.
pub(crate) fn clear_wait() {
    let thread = thread::current().id();
    WAIT_RECORDS.lock().retain(|r| r.thread != thread);
}

/// Publishes a wait for `requested` while `owned` is still held, runs
/// `release`, then withdraws the record.
///
/// Returns true if a mirrored waiter was seen.
pub(crate) fn release_after_wait(
    owned: EntityId,
    requested: EntityId,
    release: impl FnOnce(),
) -> bool {
    let mirrored = register_wait(owned, requested);
    release();
    clear_wait();
    mirrored
}

/// Runs `f` while the wait registry is locked.
#[cfg(test)]
pub(crate) fn with_registry_locked<R>(f: impl FnOnce() -> R) -> R {
    let _records = WAIT_RECORDS.lock();
    f()
}

pub(crate) fn note_acquired() {
    ACQUISITIONS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_retry() {
    RETRIES.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_timeout() {
    TIMEOUTS.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_register_and_clear() {
        let a = EntityId::allocate();
        let b = EntityId::allocate();

        assert!(!register_wait(a, b));
        // Re-registering replaces this thread's record instead of adding one
        assert!(!register_wait(a, b));
        clear_wait();
    }

    #[test]
    fn test_mirrored_wait_is_detected() {
        let a = EntityId::allocate();
        let b = EntityId::allocate();
        let before = stats();

        let (registered_tx, registered_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let other = std::thread::spawn(move || {
            assert!(!register_wait(b, a));
            registered_tx.send(()).unwrap();
            done_rx.recv().unwrap();
            clear_wait();
        });

        registered_rx.recv().unwrap();
        assert!(register_wait(a, b));
        clear_wait();
        done_tx.send(()).unwrap();
        other.join().unwrap();

        assert!(stats().since(&before).cycles_detected >= 1);
    }

    #[test]
    fn test_release_after_wait_withdraws_record() {
        let a = EntityId::allocate();
        let b = EntityId::allocate();
        let thread = thread::current().id();
        let mut registered_during_release = false;

        let mirrored = release_after_wait(a, b, || {
            registered_during_release = WAIT_RECORDS
                .lock()
                .iter()
                .any(|r| r.thread == thread && r.owned == a && r.requested == b);
        });

        assert!(!mirrored);
        assert!(registered_during_release);
        assert!(!WAIT_RECORDS.lock().iter().any(|r| r.thread == thread));
    }

    #[test]
    fn test_counters_are_monotonic() {
        let before = stats();
        note_acquired();
        note_retry();
        note_timeout();
        let delta = stats().since(&before);
        assert!(delta.acquisitions >= 1);
        assert!(delta.retries >= 1);
        assert!(delta.timeouts >= 1);
    }
}
