//! Item containers and the opaque gear snapshot used by the gear swap.

use serde::{Deserialize, Serialize};

use crate::ports::GearError;

/// Identifier of an item definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// A quantity of a single item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item definition the stack holds.
    pub item: ItemId,
    /// Number of items in the stack.
    pub amount: u64,
}

impl ItemStack {
    /// Creates a new stack.
    #[must_use]
    pub const fn new(item: ItemId, amount: u64) -> Self {
        Self { item, amount }
    }
}

/// Opaque copy of an owner's inventory and equipment taken before a session.
///
/// Only the gear port that produced a snapshot knows how to interpret it; the
/// engine stores it and hands it back exactly once at session end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GearSnapshot {
    inventory: Vec<ItemStack>,
    equipment: Vec<ItemStack>,
}

impl GearSnapshot {
    /// Captures the provided inventory and equipment contents.
    #[must_use]
    pub fn new(inventory: Vec<ItemStack>, equipment: Vec<ItemStack>) -> Self {
        Self {
            inventory,
            equipment,
        }
    }

    /// Inventory contents at capture time.
    #[must_use]
    pub fn inventory(&self) -> &[ItemStack] {
        &self.inventory
    }

    /// Equipment contents at capture time.
    #[must_use]
    pub fn equipment(&self) -> &[ItemStack] {
        &self.equipment
    }
}

/// Fixed-capacity container of item stacks.
///
/// Stacks of the same item merge; a new item occupies one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemContainer {
    capacity: usize,
    slots: Vec<ItemStack>,
}

impl ItemContainer {
    /// Creates an empty container with the given number of slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Adds a stack, merging into an existing slot holding the same item.
    pub fn add(&mut self, stack: ItemStack) -> Result<(), GearError> {
        if stack.amount == 0 {
            return Ok(());
        }

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.item == stack.item) {
            slot.amount = slot.amount.saturating_add(stack.amount);
            return Ok(());
        }

        if self.is_full() {
            return Err(GearError::Full);
        }

        self.slots.push(stack);
        Ok(())
    }

    /// Number of units of the item held across the container.
    #[must_use]
    pub fn amount_of(&self, item: ItemId) -> u64 {
        self.slots
            .iter()
            .filter(|slot| slot.item == item)
            .map(|slot| slot.amount)
            .sum()
    }

    /// Reports whether every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Current stacks in slot order.
    #[must_use]
    pub fn contents(&self) -> &[ItemStack] {
        &self.slots
    }

    /// Empties every slot.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Replaces the contents with the provided stacks, in order.
    pub fn replace(&mut self, stacks: &[ItemStack]) {
        self.slots.clear();
        self.slots.extend_from_slice(stacks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked() -> ItemContainer {
        let mut container = ItemContainer::new(3);
        container.add(ItemStack::new(ItemId::new(1325), 1)).expect("scimitar");
        container.add(ItemStack::new(ItemId::new(385), 5)).expect("sharks");
        container
    }

    #[test]
    fn snapshot_reset_restore_round_trips() {
        let mut container = stocked();
        let before = container.clone();
        let snapshot = GearSnapshot::new(container.contents().to_vec(), Vec::new());

        container.reset();
        assert!(container.contents().is_empty());
        container.add(ItemStack::new(ItemId::new(1277), 1)).expect("kit");

        container.replace(snapshot.inventory());
        assert_eq!(container, before);
        assert_eq!(container.amount_of(ItemId::new(385)), 5);
    }

    #[test]
    fn stacks_of_same_item_merge() {
        let mut container = stocked();
        container.add(ItemStack::new(ItemId::new(385), 3)).expect("merge");
        assert_eq!(container.contents().len(), 2);
        assert_eq!(container.amount_of(ItemId::new(385)), 8);
    }

    #[test]
    fn full_container_rejects_new_items_but_merges_existing() {
        let mut container = stocked();
        container.add(ItemStack::new(ItemId::new(560), 100)).expect("third slot");
        assert!(container.is_full());
        assert_eq!(
            container.add(ItemStack::new(ItemId::new(555), 1000)),
            Err(GearError::Full)
        );
        assert!(container.add(ItemStack::new(ItemId::new(560), 1)).is_ok());
    }
}
