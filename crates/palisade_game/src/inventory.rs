//! # Inventory
//!
//! Fixed-size slot inventory. The slot count is chosen once at
//! initialization and never grows; adds stack onto existing items before
//! claiming empty slots.
//!
//! [`transfer_item`] moves items between two inventories under the ordered
//! pair lock, rolling both back from snapshots if either half fails.

use palisade_core::{update_pair, Entity, EntityError, EntityResult, Lockable};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Item type identifier. 0 marks an empty slot.
pub type ItemId = u32;

/// A stack of items in one slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item type, or 0 for an empty slot
    pub item_id: ItemId,
    /// Number of items in this stack
    pub count: u32,
}

impl ItemStack {
    /// An empty slot.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            item_id: 0,
            count: 0,
        }
    }

    /// A stack of `count` items.
    #[inline]
    #[must_use]
    pub const fn new(item_id: ItemId, count: u32) -> Self {
        Self { item_id, count }
    }

    /// True if nothing is stored here.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0 || self.item_id == 0
    }
}

/// Slot storage of an inventory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    stacks: Vec<ItemStack>,
    used: u32,
}

impl Slots {
    fn with_capacity(capacity: u32) -> Self {
        Self {
            stacks: vec![ItemStack::empty(); capacity as usize],
            used: 0,
        }
    }

    fn capacity(&self) -> u32 {
        u32::try_from(self.stacks.len()).unwrap_or(u32::MAX)
    }

    fn count_item(&self, item_id: ItemId) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.item_id == item_id)
            .fold(0u32, |total, s| total.saturating_add(s.count))
    }

    fn free_space(&self, item_id: ItemId, max_stack: u32) -> u64 {
        self.stacks
            .iter()
            .map(|s| {
                if s.is_empty() {
                    u64::from(max_stack)
                } else if s.item_id == item_id {
                    u64::from(max_stack.saturating_sub(s.count))
                } else {
                    0
                }
            })
            .sum()
    }

    fn add(&mut self, item_id: ItemId, count: u32, max_stack: u32) -> GameResult<()> {
        if item_id == 0 {
            return Err(GameError::InvalidItem(item_id));
        }
        if max_stack == 0 {
            return Err(EntityError::InvalidArgument.into());
        }
        if self.free_space(item_id, max_stack) < u64::from(count) {
            return Err(GameError::InventoryFull {
                capacity: self.capacity(),
                amount: count,
            });
        }

        let mut remaining = count;

        // Existing stacks first
        for slot in &mut self.stacks {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item_id && slot.count < max_stack {
                let add = (max_stack - slot.count).min(remaining);
                slot.count += add;
                remaining -= add;
            }
        }

        for slot in &mut self.stacks {
            if remaining == 0 {
                break;
            }
            if slot.is_empty() {
                let add = remaining.min(max_stack);
                *slot = ItemStack::new(item_id, add);
                self.used += 1;
                remaining -= add;
            }
        }

        Ok(())
    }

    fn remove(&mut self, item_id: ItemId, count: u32) -> GameResult<()> {
        if item_id == 0 {
            return Err(GameError::InvalidItem(item_id));
        }
        let available = self.count_item(item_id);
        if available < count {
            return Err(GameError::InsufficientItems {
                item_id,
                required: count,
                available,
            });
        }

        let mut remaining = count;
        for slot in &mut self.stacks {
            if remaining == 0 {
                break;
            }
            if slot.item_id == item_id {
                let take = slot.count.min(remaining);
                slot.count -= take;
                remaining -= take;
                if slot.count == 0 {
                    *slot = ItemStack::empty();
                    self.used = self.used.saturating_sub(1);
                }
            }
        }

        Ok(())
    }
}

/// Lockable inventory.
#[derive(Debug)]
pub struct Inventory {
    inner: Lockable<Slots>,
}

impl Inventory {
    /// Creates an uninitialized inventory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Lockable::named("Inventory"),
        }
    }

    /// Initializes with `capacity` empty slots.
    ///
    /// # Errors
    ///
    /// Never fails; aborts if already initialized.
    pub fn initialize_slots(&mut self, capacity: u32) -> EntityResult<()> {
        self.inner.initialize_with(Slots::with_capacity(capacity))
    }

    /// Adds `count` items, filling matching stacks before empty slots.
    ///
    /// Nothing is added unless the whole amount fits.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidItem`] for item id 0
    /// - `InvalidArgument` for a zero `max_stack`
    /// - [`GameError::InventoryFull`] if the amount does not fit
    pub fn add_item(&self, item_id: ItemId, count: u32, max_stack: u32) -> GameResult<()> {
        self.inner
            .try_update("add_item", |slots| slots.add(item_id, count, max_stack))
    }

    /// Removes `count` items, taking from the first matching slots.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientItems`] if fewer than `count` are held,
    /// [`GameError::InvalidItem`] for item id 0.
    pub fn remove_item(&self, item_id: ItemId, count: u32) -> GameResult<()> {
        self.inner
            .try_update("remove_item", |slots| slots.remove(item_id, count))
    }

    /// Total of an item across all slots.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn count_item(&self, item_id: ItemId) -> EntityResult<u32> {
        self.inner.read("count_item", |slots| slots.count_item(item_id))
    }

    /// True if at least `count` of the item are held.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn has_item(&self, item_id: ItemId, count: u32) -> EntityResult<bool> {
        self.inner
            .read("has_item", |slots| slots.count_item(item_id) >= count)
    }

    /// True if every slot is occupied.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn is_full(&self) -> EntityResult<bool> {
        self.inner
            .read("is_full", |slots| slots.used >= slots.capacity())
    }

    /// Number of occupied slots.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn used_slots(&self) -> EntityResult<u32> {
        self.inner.read("used_slots", |slots| slots.used)
    }

    /// Number of slots.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn capacity(&self) -> EntityResult<u32> {
        self.inner.read("capacity", Slots::capacity)
    }

    /// Contents of one slot, `None` past the end.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn slot(&self, index: usize) -> EntityResult<Option<ItemStack>> {
        self.inner
            .read("slot", |slots| slots.stacks.get(index).copied())
    }

    /// Copy of every slot, for later [`Inventory::restore`].
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn snapshot(&self) -> EntityResult<Slots> {
        self.inner.snapshot("snapshot")
    }

    /// Replaces every slot with a saved copy.
    ///
    /// # Errors
    ///
    /// Returns the guard error.
    pub fn restore(&self, saved: Slots) -> EntityResult<()> {
        self.inner.replace("restore", saved).map(|_| ())
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Inventory {
    type Payload = Slots;

    fn lockable(&self) -> &Lockable<Slots> {
        &self.inner
    }

    fn lockable_mut(&mut self) -> &mut Lockable<Slots> {
        &mut self.inner
    }
}

/// Moves `count` of `item_id` from `from` into `to`.
///
/// Both inventories are held for the whole move; if either half fails both
/// are restored, so items are never lost or duplicated.
///
/// # Errors
///
/// - `InvalidArgument` when `from` and `to` are the same inventory
/// - [`GameError::InsufficientItems`] if `from` is short
/// - [`GameError::InventoryFull`] if `to` cannot take the whole amount
/// - [`GameError::InvalidItem`] for item id 0
pub fn transfer_item(
    from: &Inventory,
    to: &Inventory,
    item_id: ItemId,
    count: u32,
    max_stack: u32,
) -> GameResult<()> {
    update_pair(&from.inner, &to.inner, "transfer_item", |giver, receiver| {
        let (giver_saved, receiver_saved) = (giver.clone(), receiver.clone());
        let moved = giver
            .remove(item_id, count)
            .and_then(|()| receiver.add(item_id, count, max_stack));
        if let Err(error) = &moved {
            *giver = giver_saved;
            *receiver = receiver_saved;
            tracing::debug!(item_id, count, %error, "item transfer rolled back");
        }
        moved
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_core::ErrorCode;

    fn inventory(capacity: u32) -> Inventory {
        let mut inv = Inventory::new();
        inv.initialize_slots(capacity).unwrap();
        inv
    }

    #[test]
    fn test_add_items() {
        let inv = inventory(4);
        inv.add_item(1, 10, 64).unwrap();
        assert_eq!(inv.count_item(1).unwrap(), 10);
        assert_eq!(inv.used_slots().unwrap(), 1);
        assert_eq!(inv.capacity().unwrap(), 4);
    }

    #[test]
    fn test_add_stacking() {
        let inv = inventory(4);
        inv.add_item(1, 64, 64).unwrap();
        inv.add_item(1, 10, 64).unwrap();
        assert_eq!(inv.count_item(1).unwrap(), 74);
        assert_eq!(inv.used_slots().unwrap(), 2);
        assert_eq!(inv.slot(1).unwrap(), Some(ItemStack::new(1, 10)));
        assert_eq!(inv.slot(9).unwrap(), None);
    }

    #[test]
    fn test_add_is_all_or_nothing() {
        let inv = inventory(2);
        inv.add_item(1, 10, 16).unwrap();
        let result = inv.add_item(1, 30, 16);
        assert_eq!(
            result,
            Err(GameError::InventoryFull { capacity: 2, amount: 30 })
        );
        assert_eq!(inv.count_item(1).unwrap(), 10);
        assert_eq!(inv.get_error(), ErrorCode::Domain);

        inv.add_item(1, 22, 16).unwrap();
        assert!(inv.is_full().unwrap());
    }

    #[test]
    fn test_invalid_arguments() {
        let inv = inventory(2);
        assert_eq!(inv.add_item(0, 1, 16), Err(GameError::InvalidItem(0)));
        assert_eq!(inv.get_error(), ErrorCode::InvalidArgument);
        assert_eq!(
            inv.add_item(1, 1, 0),
            Err(GameError::Entity(EntityError::InvalidArgument))
        );
        assert_eq!(inv.used_slots().unwrap(), 0);
    }

    #[test]
    fn test_remove_items() {
        let inv = inventory(4);
        inv.add_item(1, 100, 64).unwrap();
        inv.remove_item(1, 70).unwrap();
        assert_eq!(inv.count_item(1).unwrap(), 30);
        assert_eq!(inv.used_slots().unwrap(), 1);
        assert!(inv.has_item(1, 30).unwrap());
        assert!(!inv.has_item(1, 31).unwrap());
    }

    #[test]
    fn test_remove_insufficient() {
        let inv = inventory(4);
        inv.add_item(1, 10, 64).unwrap();
        let result = inv.remove_item(1, 20);
        assert!(matches!(result, Err(GameError::InsufficientItems { .. })));
        assert_eq!(inv.count_item(1).unwrap(), 10);
    }

    #[test]
    fn test_snapshot_restore() {
        let inv = inventory(4);
        inv.add_item(1, 50, 64).unwrap();
        let saved = inv.snapshot().unwrap();

        inv.add_item(2, 30, 64).unwrap();
        assert_eq!(inv.count_item(2).unwrap(), 30);

        inv.restore(saved).unwrap();
        assert_eq!(inv.count_item(2).unwrap(), 0);
        assert_eq!(inv.count_item(1).unwrap(), 50);
        assert_eq!(inv.used_slots().unwrap(), 1);
    }

    #[test]
    fn test_transfer() {
        let a = inventory(4);
        let b = inventory(4);
        a.add_item(7, 20, 10).unwrap();
        transfer_item(&a, &b, 7, 15, 10).unwrap();
        assert_eq!(a.count_item(7).unwrap(), 5);
        assert_eq!(b.count_item(7).unwrap(), 15);
        assert_eq!(b.used_slots().unwrap(), 2);
    }

    #[test]
    fn test_transfer_rolls_back() {
        let a = inventory(4);
        let b = inventory(1);
        a.add_item(7, 20, 10).unwrap();

        let result = transfer_item(&a, &b, 7, 15, 10);
        assert_eq!(result, Err(GameError::InventoryFull { capacity: 1, amount: 15 }));
        assert_eq!(a.count_item(7).unwrap(), 20);
        assert_eq!(a.used_slots().unwrap(), 2);
        assert_eq!(b.count_item(7).unwrap(), 0);

        assert!(matches!(
            transfer_item(&a, &b, 7, 21, 10),
            Err(GameError::InsufficientItems { .. })
        ));
        assert_eq!(
            transfer_item(&a, &a, 7, 1, 10),
            Err(GameError::Entity(EntityError::InvalidArgument))
        );
    }
}
