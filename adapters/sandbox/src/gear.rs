//! Inventory and equipment containers kept per owner in memory.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use horde_survival_core::{
    GearError, GearPort, GearSnapshot, ItemContainer, ItemId, ItemStack, OwnerId,
};
use parking_lot::Mutex;

const EQUIPMENT_SLOTS: usize = 14;

#[derive(Clone, Debug)]
struct Containers {
    inventory: ItemContainer,
    equipment: ItemContainer,
}

/// In-memory inventory and equipment containers.
#[derive(Debug)]
pub struct SandboxGear {
    inventory_slots: usize,
    owners: Mutex<HashMap<OwnerId, Containers>>,
    fail_snapshots: AtomicBool,
    refuse_grants: AtomicBool,
}

impl SandboxGear {
    /// Creates a gear store whose inventories hold `inventory_slots` stacks.
    #[must_use]
    pub fn new(inventory_slots: usize) -> Self {
        Self {
            inventory_slots,
            owners: Mutex::new(HashMap::new()),
            fail_snapshots: AtomicBool::new(false),
            refuse_grants: AtomicBool::new(false),
        }
    }

    /// Gives the owner empty containers.
    pub fn load_owner(&self, owner: OwnerId) {
        let containers = Containers {
            inventory: ItemContainer::new(self.inventory_slots),
            equipment: ItemContainer::new(EQUIPMENT_SLOTS),
        };
        let _ = self.owners.lock().insert(owner, containers);
    }

    /// Puts items in the owner's inventory, bypassing failure injection.
    pub fn give(&self, owner: OwnerId, stack: ItemStack) -> Result<(), GearError> {
        self.with_containers(owner, |containers| containers.inventory.add(stack))
    }

    /// Equips items on the owner.
    pub fn equip(&self, owner: OwnerId, stack: ItemStack) -> Result<(), GearError> {
        self.with_containers(owner, |containers| containers.equipment.add(stack))
    }

    /// Inventory contents in slot order.
    #[must_use]
    pub fn inventory(&self, owner: OwnerId) -> Vec<ItemStack> {
        self.owners
            .lock()
            .get(&owner)
            .map(|containers| containers.inventory.contents().to_vec())
            .unwrap_or_default()
    }

    /// Equipment contents in slot order.
    #[must_use]
    pub fn equipment(&self, owner: OwnerId) -> Vec<ItemStack> {
        self.owners
            .lock()
            .get(&owner)
            .map(|containers| containers.equipment.contents().to_vec())
            .unwrap_or_default()
    }

    /// Units of the item held in the owner's inventory.
    #[must_use]
    pub fn amount_of(&self, owner: OwnerId, item: ItemId) -> u64 {
        self.owners
            .lock()
            .get(&owner)
            .map_or(0, |containers| containers.inventory.amount_of(item))
    }

    /// Makes every snapshot attempt fail.
    pub fn fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    /// Makes every [`GearPort::add`] call fail.
    pub fn refuse_grants(&self, refuse: bool) {
        self.refuse_grants.store(refuse, Ordering::SeqCst);
    }

    fn with_containers<T>(
        &self,
        owner: OwnerId,
        apply: impl FnOnce(&mut Containers) -> Result<T, GearError>,
    ) -> Result<T, GearError> {
        let mut owners = self.owners.lock();
        let containers = owners
            .get_mut(&owner)
            .ok_or(GearError::Unavailable(owner))?;
        apply(containers)
    }
}

impl GearPort for SandboxGear {
    fn snapshot(&self, owner: OwnerId) -> Result<GearSnapshot, GearError> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(GearError::Unavailable(owner));
        }
        self.with_containers(owner, |containers| {
            Ok(GearSnapshot::new(
                containers.inventory.contents().to_vec(),
                containers.equipment.contents().to_vec(),
            ))
        })
    }

    fn reset(&self, owner: OwnerId) -> Result<(), GearError> {
        self.with_containers(owner, |containers| {
            containers.inventory.reset();
            containers.equipment.reset();
            Ok(())
        })
    }

    fn restore(&self, owner: OwnerId, snapshot: &GearSnapshot) -> Result<(), GearError> {
        let inventory_slots = self.inventory_slots;
        self.with_containers(owner, |containers| {
            if snapshot.inventory().len() > inventory_slots
                || snapshot.equipment().len() > EQUIPMENT_SLOTS
            {
                return Err(GearError::InvalidSnapshot);
            }
            containers.inventory.replace(snapshot.inventory());
            containers.equipment.replace(snapshot.equipment());
            Ok(())
        })
    }

    fn add(&self, owner: OwnerId, stack: ItemStack) -> Result<(), GearError> {
        if self.refuse_grants.load(Ordering::SeqCst) {
            return Err(GearError::Full);
        }
        self.give(owner, stack)
    }

    fn is_full(&self, owner: OwnerId) -> bool {
        self.owners
            .lock()
            .get(&owner)
            .map_or(true, |containers| containers.inventory.is_full())
    }
}
