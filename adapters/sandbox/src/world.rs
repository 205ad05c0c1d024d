//! World with connected owners and registered entities held in memory.

use std::collections::{BTreeMap, HashMap};

use horde_survival_core::{
    CombatStats, EntityId, EntitySnapshot, HostileSpawn, Location, OwnerId, PortError, WorldPort,
};
use parking_lot::Mutex;

/// Entity as the sandbox world stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SandboxEntity {
    /// World type identifier.
    pub type_id: u16,
    /// Current tile.
    pub location: Location,
    /// Stats the entity was registered with.
    pub stats: CombatStats,
    /// Owner the entity is currently attacking.
    pub target: Option<OwnerId>,
}

#[derive(Debug, Default)]
struct WorldState {
    entities: BTreeMap<EntityId, SandboxEntity>,
    owners: HashMap<OwnerId, Location>,
    next_entity: u64,
    refused_spawns: usize,
    steers: usize,
}

/// In-memory world with connected owners and registered entities.
#[derive(Debug, Default)]
pub struct SandboxWorld {
    state: Mutex<WorldState>,
}

impl SandboxWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects an owner at the given location.
    pub fn connect(&self, owner: OwnerId, location: Location) {
        let _ = self.state.lock().owners.insert(owner, location);
    }

    /// Disconnects an owner.
    pub fn disconnect(&self, owner: OwnerId) {
        let _ = self.state.lock().owners.remove(&owner);
    }

    /// Makes the next `count` registrations fail.
    pub fn refuse_spawns(&self, count: usize) {
        self.state.lock().refused_spawns = count;
    }

    /// Places an entity no session knows about.
    pub fn spawn_stray(&self, type_id: u16, location: Location) -> EntityId {
        let mut state = self.state.lock();
        insert_entity(
            &mut state,
            SandboxEntity {
                type_id,
                location,
                stats: CombatStats {
                    hitpoints: 1,
                    max_hit: 0,
                },
                target: None,
            },
        )
    }

    /// Removes an entity as combat would on death, returning whether it existed.
    pub fn kill(&self, entity: EntityId) -> bool {
        self.state.lock().entities.remove(&entity).is_some()
    }

    /// Teleports an entity.
    pub fn relocate(&self, entity: EntityId, location: Location) {
        if let Some(stored) = self.state.lock().entities.get_mut(&entity) {
            stored.location = location;
        }
    }

    /// Copy of a registered entity.
    #[must_use]
    pub fn entity(&self, entity: EntityId) -> Option<SandboxEntity> {
        self.state.lock().entities.get(&entity).cloned()
    }

    /// Identifiers of every registered entity.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.state.lock().entities.keys().copied().collect()
    }

    /// Number of registered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.state.lock().entities.len()
    }

    /// Number of leash corrections applied so far.
    #[must_use]
    pub fn steer_count(&self) -> usize {
        self.state.lock().steers
    }
}

fn insert_entity(state: &mut WorldState, entity: SandboxEntity) -> EntityId {
    state.next_entity += 1;
    let id = EntityId::new(state.next_entity);
    let _ = state.entities.insert(id, entity);
    id
}

impl WorldPort for SandboxWorld {
    fn register(&self, spawn: &HostileSpawn) -> Result<EntityId, PortError> {
        let mut state = self.state.lock();
        if state.refused_spawns > 0 {
            state.refused_spawns -= 1;
            return Err(PortError::SpawnRejected("no free entity slot".to_owned()));
        }

        Ok(insert_entity(
            &mut state,
            SandboxEntity {
                type_id: spawn.type_id,
                location: spawn.location,
                stats: spawn.stats,
                target: Some(spawn.target),
            },
        ))
    }

    fn deregister(&self, entity: EntityId) -> Result<(), PortError> {
        self.state
            .lock()
            .entities
            .remove(&entity)
            .map(|_| ())
            .ok_or(PortError::UnknownEntity(entity))
    }

    fn location_of(&self, entity: EntityId) -> Option<Location> {
        self.state
            .lock()
            .entities
            .get(&entity)
            .map(|stored| stored.location)
    }

    fn is_present(&self, entity: EntityId) -> bool {
        self.state.lock().entities.contains_key(&entity)
    }

    fn entities(&self) -> Vec<EntitySnapshot> {
        self.state
            .lock()
            .entities
            .iter()
            .map(|(id, stored)| EntitySnapshot {
                id: *id,
                type_id: stored.type_id,
                location: stored.location,
            })
            .collect()
    }

    fn owner_location(&self, owner: OwnerId) -> Option<Location> {
        self.state.lock().owners.get(&owner).copied()
    }

    fn move_owner(&self, owner: OwnerId, destination: Location) -> Result<(), PortError> {
        let mut state = self.state.lock();
        let location = state
            .owners
            .get_mut(&owner)
            .ok_or(PortError::OwnerAbsent(owner))?;
        *location = destination;
        Ok(())
    }

    fn set_target(&self, entity: EntityId, owner: OwnerId) -> Result<(), PortError> {
        let mut state = self.state.lock();
        let stored = state
            .entities
            .get_mut(&entity)
            .ok_or(PortError::UnknownEntity(entity))?;
        stored.target = Some(owner);
        Ok(())
    }

    fn steer(&self, entity: EntityId, toward: Location) -> Result<(), PortError> {
        let mut state = self.state.lock();
        let stored = state
            .entities
            .get_mut(&entity)
            .ok_or(PortError::UnknownEntity(entity))?;
        stored.location = toward;
        state.steers += 1;
        Ok(())
    }
}
