#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory collaborators for driving the Horde Survival engine without a
//! game server.
//!
//! The sandbox implements every port from `horde-survival-core` with plain
//! maps behind locks. It is used by the headless simulator and by the
//! integration tests of the other crates, which can inject failures (refused
//! spawns, failed snapshots, refused grants) to exercise the degraded paths.

use std::sync::Arc;

use horde_survival_core::{Location, OwnerId, Ports};

mod gear;
mod notifier;
mod world;

pub use gear::SandboxGear;
pub use notifier::{Notification, RecordingNotifier};
pub use world::{SandboxEntity, SandboxWorld};

const DEFAULT_INVENTORY_SLOTS: usize = 28;

/// The three sandbox collaborators, kept together so tests can inspect them.
#[derive(Clone, Debug)]
pub struct Sandbox {
    /// Entity and owner positions.
    pub world: Arc<SandboxWorld>,
    /// Inventory and equipment containers.
    pub gear: Arc<SandboxGear>,
    /// Delivered messages.
    pub notifier: Arc<RecordingNotifier>,
}

impl Sandbox {
    /// Creates an empty sandbox with 28-slot inventories.
    #[must_use]
    pub fn new() -> Self {
        Self::with_inventory_slots(DEFAULT_INVENTORY_SLOTS)
    }

    /// Creates an empty sandbox with custom inventory capacity.
    #[must_use]
    pub fn with_inventory_slots(slots: usize) -> Self {
        Self {
            world: Arc::new(SandboxWorld::new()),
            gear: Arc::new(SandboxGear::new(slots)),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    /// Port bundle backed by this sandbox.
    #[must_use]
    pub fn ports(&self) -> Ports {
        Ports::new(
            self.world.clone(),
            self.gear.clone(),
            self.notifier.clone(),
        )
    }

    /// Connects an owner at the location and gives them empty containers.
    pub fn join(&self, owner: OwnerId, location: Location) {
        self.world.connect(owner, location);
        self.gear.load_owner(owner);
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use horde_survival_core::{GearPort, ItemId, ItemStack, Location, OwnerId, WorldPort};

    use super::Sandbox;

    #[test]
    fn gear_round_trips_through_snapshot() {
        let sandbox = Sandbox::new();
        let owner = OwnerId::new(1);
        sandbox.join(owner, Location::new(0, 0));
        sandbox
            .gear
            .give(owner, ItemStack::new(ItemId::new(995), 1_000))
            .expect("coins");
        sandbox
            .gear
            .equip(owner, ItemStack::new(ItemId::new(4151), 1))
            .expect("whip");
        let before = (sandbox.gear.inventory(owner), sandbox.gear.equipment(owner));

        let snapshot = sandbox.gear.snapshot(owner).expect("snapshot");
        sandbox.gear.reset(owner).expect("reset");
        assert!(sandbox.gear.inventory(owner).is_empty());
        sandbox.gear.restore(owner, &snapshot).expect("restore");

        assert_eq!(
            (sandbox.gear.inventory(owner), sandbox.gear.equipment(owner)),
            before
        );
    }

    #[test]
    fn absent_owner_cannot_be_moved() {
        let sandbox = Sandbox::new();
        assert!(sandbox
            .world
            .move_owner(OwnerId::new(9), Location::new(1, 1))
            .is_err());
    }
}
