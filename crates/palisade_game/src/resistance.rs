//! # Resistance
//!
//! Percentage and flat damage reduction for one damage type.

use palisade_core::{Entity, EntityResult, Lockable};
use serde::{Deserialize, Serialize};

/// Percentage and flat reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResistanceValues {
    /// Percentage reduction
    pub percent: i32,
    /// Flat reduction
    pub flat: i32,
}

/// Lockable resistance.
#[derive(Debug)]
pub struct Resistance {
    inner: Lockable<ResistanceValues>,
}

impl Resistance {
    /// Creates an uninitialized resistance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Resistance"),
        }
    }

    /// Initializes with explicit values.
    ///
    /// # Errors
    ///
    /// Never fails; aborts if already initialized.
    pub fn initialize_values(&mut self, percent: i32, flat: i32) -> EntityResult<()> {
        self.inner.initialize_with(ResistanceValues { percent, flat })
    }

    /// Sets the percentage reduction.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_percent(&self, percent: i32) -> EntityResult<()> {
        self.inner.update("set_percent", |r| r.percent = percent)
    }

    /// Sets the flat reduction.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_flat(&self, flat: i32) -> EntityResult<()> {
        self.inner.update("set_flat", |r| r.flat = flat)
    }

    /// Sets both values at once.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_values(&self, percent: i32, flat: i32) -> EntityResult<()> {
        self.inner
            .update("set_values", |r| *r = ResistanceValues { percent, flat })
    }

    /// Zeroes both values.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn reset(&self) -> EntityResult<()> {
        self.inner
            .replace("reset", ResistanceValues::default())
            .map(|_| ())
    }

    /// Percentage reduction.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn percent(&self) -> EntityResult<i32> {
        self.inner.read("percent", |r| r.percent)
    }

    /// Flat reduction.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn flat(&self) -> EntityResult<i32> {
        self.inner.read("flat", |r| r.flat)
    }

    /// Both values.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn values(&self) -> EntityResult<ResistanceValues> {
        self.inner.snapshot("values")
    }

    /// Copy-assigns `other` into this live resistance.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn assign_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_copy(&other.inner)
    }

    /// Move-assigns `other`, leaving it zeroed.
    ///
    /// # Errors
    ///
    /// Returns the pair acquisition error.
    pub fn take_from(&self, other: &Self) -> EntityResult<()> {
        self.inner.assign_move(&other.inner)
    }
}

impl Default for Resistance {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Resistance {
    type Payload = ResistanceValues;

    fn lockable(&self) -> &Lockable<ResistanceValues> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<ResistanceValues> {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::{ErrorCode, LifecycleState};
    use std::sync::Arc;
    use std::thread;

    fn resistance(percent: i32, flat: i32) -> Resistance {
        let mut r = Resistance::new();
        r.initialize_values(percent, flat).unwrap();
        r
    }

    #[test]
    fn test_setters_and_reset() {
        let r = resistance(10, 5);
        r.set_percent(25).unwrap();
        r.set_flat(-3).unwrap();
        assert_eq!(r.values().unwrap(), ResistanceValues { percent: 25, flat: -3 });
        r.set_values(1, 2).unwrap();
        assert_eq!((r.percent().unwrap(), r.flat().unwrap()), (1, 2));
        r.reset().unwrap();
        assert_eq!(r.values().unwrap(), ResistanceValues::default());
        assert_eq!(r.get_error(), ErrorCode::Success);
    }

    #[test]
    fn test_default_initialize() {
        let mut r = Resistance::new();
        r.initialize().unwrap();
        assert_eq!(r.values().unwrap(), ResistanceValues::default());
    }

    #[test]
    fn test_move_leaves_source_usable() {
        let source = resistance(30, 7);
        let mut target = Resistance::new();
        target.initialize_move(&source).unwrap();
        assert_eq!(target.percent().unwrap(), 30);
        assert_eq!(source.values().unwrap(), ResistanceValues::default());
        source.set_percent(4).unwrap();
        assert_eq!(source.percent().unwrap(), 4);
    }

    #[test]
    fn test_concurrent_assignments() {
        let mut a = resistance(1, 1);
        let mut b = resistance(2, 2);
        a.enable_thread_safety().unwrap();
        b.enable_thread_safety().unwrap();
        let (a, b) = (Arc::new(a), Arc::new(b));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let (a, b) = (Arc::clone(&a), Arc::clone(&b));
                thread::spawn(move || {
                    for _ in 0..200 {
                        if t % 2 == 0 {
                            a.assign_from(&b).unwrap();
                        } else {
                            b.assign_from(&a).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Every copy moves a whole value, never a torn mix
        let (va, vb) = (a.values().unwrap(), b.values().unwrap());
        assert_eq!(va.percent, va.flat);
        assert_eq!(vb.percent, vb.flat);
    }

    #[test]
    fn test_destroy() {
        let mut r = resistance(1, 1);
        r.destroy().unwrap();
        assert_eq!(r.lockable().state(), LifecycleState::Destroyed);
    }
}
