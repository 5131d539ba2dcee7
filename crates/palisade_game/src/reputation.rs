//! # Reputation
//!
//! Lifetime (`total`) and spendable (`current`) reputation, plus milestone
//! and per-faction tables. [`transfer_reputation`] moves spendable
//! reputation between two holders under the ordered pair lock.

use std::collections::BTreeMap;

use palisade_core::{update_pair, Entity, EntityError, EntityResult, Lockable};

use crate::error::{GameError, GameResult};

/// Reputation state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Standing {
    /// Lifetime reputation earned
    pub total: i64,
    /// Reputation available to spend
    pub current: i64,
    /// Milestone id -> reached value
    pub milestones: BTreeMap<u32, i64>,
    /// Faction id -> reputation with that faction
    pub factions: BTreeMap<u32, i64>,
}

/// Lockable reputation holder.
#[derive(Debug)]
pub struct Reputation {
    inner: Lockable<Standing>,
}

impl Reputation {
    /// Creates an uninitialized holder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Reputation"),
        }
    }

    /// Initializes with milestones and a starting total; `current` starts
    /// equal to `total`.
    ///
    /// # Errors
    ///
    /// Never fails; aborts if already initialized.
    pub fn initialize_standing(
        &mut self,
        milestones: BTreeMap<u32, i64>,
        total: i64,
    ) -> EntityResult<()> {
        self.inner.initialize_with(Standing {
            total,
            current: total,
            milestones,
            factions: BTreeMap::new(),
        })
    }

    /// Lifetime reputation.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn total(&self) -> EntityResult<i64> {
        self.inner.read("total", |s| s.total)
    }

    /// Overwrites lifetime reputation.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_total(&self, total: i64) -> EntityResult<()> {
        self.inner.update("set_total", |s| s.total = total)
    }

    /// Adds to lifetime reputation.
    ///
    /// # Errors
    ///
    /// [`GameError::Overflow`], or the guard error.
    pub fn add_total(&self, amount: i64) -> GameResult<()> {
        self.inner.try_update("add_total", |s| {
            s.total = s.total.checked_add(amount).ok_or(GameError::Overflow)?;
            Ok(())
        })
    }

    /// Subtracts from lifetime reputation.
    ///
    /// # Errors
    ///
    /// [`GameError::Overflow`], or the guard error.
    pub fn sub_total(&self, amount: i64) -> GameResult<()> {
        self.inner.try_update("sub_total", |s| {
            s.total = s.total.checked_sub(amount).ok_or(GameError::Overflow)?;
            Ok(())
        })
    }

    /// Spendable reputation.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn current(&self) -> EntityResult<i64> {
        self.inner.read("current", |s| s.current)
    }

    /// Overwrites spendable reputation.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_current(&self, current: i64) -> EntityResult<()> {
        self.inner.update("set_current", |s| s.current = current)
    }

    /// Adds to spendable reputation.
    ///
    /// # Errors
    ///
    /// [`GameError::Overflow`], or the guard error.
    pub fn add_current(&self, amount: i64) -> GameResult<()> {
        self.inner.try_update("add_current", |s| {
            s.current = s.current.checked_add(amount).ok_or(GameError::Overflow)?;
            Ok(())
        })
    }

    /// Subtracts from spendable reputation.
    ///
    /// # Errors
    ///
    /// [`GameError::Overflow`], or the guard error.
    pub fn sub_current(&self, amount: i64) -> GameResult<()> {
        self.inner.try_update("sub_current", |s| {
            s.current = s.current.checked_sub(amount).ok_or(GameError::Overflow)?;
            Ok(())
        })
    }

    /// Value reached for a milestone, 0 if never set.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn milestone(&self, id: u32) -> EntityResult<i64> {
        self.inner
            .read("milestone", |s| s.milestones.get(&id).copied().unwrap_or(0))
    }

    /// Sets a milestone value.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_milestone(&self, id: u32, value: i64) -> EntityResult<()> {
        self.inner.update("set_milestone", |s| {
            s.milestones.insert(id, value);
        })
    }

    /// All milestones.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn milestones(&self) -> EntityResult<BTreeMap<u32, i64>> {
        self.inner.read("milestones", |s| s.milestones.clone())
    }

    /// Replaces the whole milestone table.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_milestones(&self, milestones: BTreeMap<u32, i64>) -> EntityResult<()> {
        self.inner.update("set_milestones", |s| s.milestones = milestones)
    }

    /// All faction standings.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn factions(&self) -> EntityResult<BTreeMap<u32, i64>> {
        self.inner.read("factions", |s| s.factions.clone())
    }

    /// Replaces the whole faction table.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_factions(&self, factions: BTreeMap<u32, i64>) -> EntityResult<()> {
        self.inner.update("set_factions", |s| s.factions = factions)
    }

    /// Reputation with a faction, 0 if never set.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn faction(&self, id: u32) -> EntityResult<i64> {
        self.inner
            .read("faction", |s| s.factions.get(&id).copied().unwrap_or(0))
    }

    /// Sets reputation with a faction.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn set_faction(&self, id: u32, value: i64) -> EntityResult<()> {
        self.inner.update("set_faction", |s| {
            s.factions.insert(id, value);
        })
    }

    /// Full state.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn standing(&self) -> EntityResult<Standing> {
        self.inner.snapshot("standing")
    }
}

impl Default for Reputation {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Reputation {
    type Payload = Standing;

    fn lockable(&self) -> &Lockable<Standing> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<Standing> {
        &mut self.inner
    }
}

/// Moves `amount` of spendable reputation from `from` to `to`. The
/// receiver's lifetime total grows by the same amount.
///
/// All-or-nothing: on any error neither holder changes.
///
/// # Errors
///
/// - `InvalidArgument` for a negative amount or when `from` and `to` are
///   the same holder
/// - [`GameError::InsufficientReputation`] if `from` cannot cover it
/// - [`GameError::Overflow`] if the receiver would overflow
pub fn transfer_reputation(from: &Reputation, to: &Reputation, amount: i64) -> GameResult<()> {
    update_pair(&from.inner, &to.inner, "transfer_reputation", |giver, receiver| {
        if amount < 0 {
            return Err(EntityError::InvalidArgument.into());
        }
        if giver.current < amount {
            return Err(GameError::InsufficientReputation {
                required: amount,
                available: giver.current,
            });
        }
        let current = receiver.current.checked_add(amount).ok_or(GameError::Overflow)?;
        let total = receiver.total.checked_add(amount).ok_or(GameError::Overflow)?;
        giver.current -= amount;
        receiver.current = current;
        receiver.total = total;
        tracing::debug!(amount, "reputation transferred");
        Ok(())
    })
}
