//! Narrow interfaces to the collaborators that surround the engine.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    EntityId, EntitySnapshot, GearSnapshot, HostileSpawn, ItemStack, Location, OwnerId,
};

/// Failures reported by the world collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    /// The owner is not connected to the world.
    #[error("{0} is not present in the world")]
    OwnerAbsent(OwnerId),
    /// The entity is not registered in the world.
    #[error("{0} is not registered")]
    UnknownEntity(EntityId),
    /// The world refused to register a new entity.
    #[error("spawn rejected: {0}")]
    SpawnRejected(String),
}

/// Failures reported by the inventory and equipment collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GearError {
    /// The owner has no loaded containers.
    #[error("containers for {0} are unavailable")]
    Unavailable(OwnerId),
    /// The container has no free slot for a new item.
    #[error("container is full")]
    Full,
    /// The snapshot handed back does not belong to this owner.
    #[error("snapshot does not match the owner's containers")]
    InvalidSnapshot,
}

/// World registration and spatial queries consumed by the engine.
pub trait WorldPort: Send + Sync {
    /// Registers a hostile entity and returns its identifier.
    fn register(&self, spawn: &HostileSpawn) -> Result<EntityId, PortError>;

    /// Removes a hostile entity from the world.
    fn deregister(&self, entity: EntityId) -> Result<(), PortError>;

    /// Current location of an entity, if it is registered.
    fn location_of(&self, entity: EntityId) -> Option<Location>;

    /// Reports whether an entity is still registered and alive.
    fn is_present(&self, entity: EntityId) -> bool;

    /// Every entity currently registered in the world.
    fn entities(&self) -> Vec<EntitySnapshot>;

    /// Location of a connected owner, `None` once they are gone.
    fn owner_location(&self, owner: OwnerId) -> Option<Location>;

    /// Relocates an owner.
    fn move_owner(&self, owner: OwnerId, destination: Location) -> Result<(), PortError>;

    /// Points an entity's combat at an owner.
    fn set_target(&self, entity: EntityId, owner: OwnerId) -> Result<(), PortError>;

    /// Walks an entity back toward a location.
    fn steer(&self, entity: EntityId, toward: Location) -> Result<(), PortError>;
}

/// Inventory and equipment containers used for the gear swap.
pub trait GearPort: Send + Sync {
    /// Copies the owner's current inventory and equipment.
    fn snapshot(&self, owner: OwnerId) -> Result<GearSnapshot, GearError>;

    /// Empties the owner's inventory and equipment.
    fn reset(&self, owner: OwnerId) -> Result<(), GearError>;

    /// Replaces the owner's containers with a previously captured snapshot.
    fn restore(&self, owner: OwnerId, snapshot: &GearSnapshot) -> Result<(), GearError>;

    /// Places items in the owner's inventory.
    fn add(&self, owner: OwnerId, stack: ItemStack) -> Result<(), GearError>;

    /// Reports whether the owner's inventory has no free slot.
    fn is_full(&self, owner: OwnerId) -> bool;
}

/// Fire-and-forget message delivery.
pub trait Notifier: Send + Sync {
    /// Sends a message to a single owner.
    fn notify(&self, owner: OwnerId, message: &str);

    /// Sends a message to every connected actor.
    fn broadcast(&self, message: &str);
}

/// Bundle of collaborator handles shared by the engine components.
#[derive(Clone)]
pub struct Ports {
    /// World registration and queries.
    pub world: Arc<dyn WorldPort>,
    /// Gear containers.
    pub gear: Arc<dyn GearPort>,
    /// Message delivery.
    pub notifier: Arc<dyn Notifier>,
}

impl Ports {
    /// Bundles the provided collaborators.
    #[must_use]
    pub fn new(
        world: Arc<dyn WorldPort>,
        gear: Arc<dyn GearPort>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            world,
            gear,
            notifier,
        }
    }
}

impl std::fmt::Debug for Ports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}
