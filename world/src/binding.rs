//! Glue attached to every spawned hostile entity.

use std::sync::Weak;

use horde_survival_core::{ArenaConfig, EntityId, OwnerId, PortError, Ports, TierDefinition};
use horde_survival_system_rewards::RewardLedger;
use parking_lot::Mutex;
use tracing::debug;

use crate::session::{Session, SessionHandle};

/// What the periodic binding tick decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingTick {
    /// The entity keeps fighting its owner.
    Hold,
    /// The entity strayed past the leash and was sent back to the center.
    Steered,
    /// The entity has no session or owner left and must be removed.
    Release,
}

/// Routes one hostile entity's events into the session that spawned it.
///
/// The binding never owns its session: once the registry drops the session
/// every callback becomes a no-op.
#[derive(Clone, Debug)]
pub struct HostileBinding {
    session: Weak<Mutex<Session>>,
    owner: OwnerId,
    entity: EntityId,
    wave: u32,
    tier: TierDefinition,
}

impl HostileBinding {
    pub(crate) fn new(
        handle: &SessionHandle,
        entity: EntityId,
        wave: u32,
        tier: TierDefinition,
    ) -> Self {
        Self {
            session: handle.downgrade(),
            owner: handle.owner(),
            entity,
            wave,
            tier,
        }
    }

    /// Owner the entity is paired with.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Entity the binding is attached to.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Wave the entity was spawned for.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Strength tier the entity was drawn from.
    #[must_use]
    pub const fn tier(&self) -> &TierDefinition {
        &self.tier
    }

    /// Reports whether the binding was created for this session.
    #[must_use]
    pub fn belongs_to(&self, handle: &SessionHandle) -> bool {
        Weak::ptr_eq(&self.session, &handle.downgrade())
    }

    /// The entity may only attack its session owner.
    #[must_use]
    pub fn may_engage(&self, target: OwnerId) -> bool {
        target == self.owner
    }

    /// The entity may only be damaged by its session owner.
    #[must_use]
    pub fn may_be_damaged_by(&self, attacker: OwnerId) -> bool {
        attacker == self.owner
    }

    /// Credits the kill and tells the owner, returning the reward paid.
    pub(crate) fn on_death(&self, ports: &Ports, ledger: &RewardLedger) -> Option<u64> {
        let session = self.session.upgrade()?;
        let reward = ledger.kill_reward(self.tier.kind, self.wave);
        if !session.lock().record_kill(self.entity, reward) {
            return None;
        }

        ports.notifier.notify(
            self.owner,
            &format!("{} defeated! +{reward} reward points.", self.tier.kind.label()),
        );
        Some(reward)
    }

    /// Re-asserts the owner as target and keeps the entity on its leash.
    pub(crate) fn on_tick(&self, ports: &Ports, arena: &ArenaConfig) -> BindingTick {
        let Some(session) = self.session.upgrade() else {
            return BindingTick::Release;
        };
        if session.lock().is_ended() {
            return BindingTick::Release;
        }
        if ports.world.owner_location(self.owner).is_none() {
            return BindingTick::Release;
        }

        match ports.world.set_target(self.entity, self.owner) {
            Ok(()) => {}
            Err(PortError::UnknownEntity(_)) => return BindingTick::Release,
            Err(error) => {
                debug!(entity = %self.entity, owner = %self.owner, %error, "target not applied");
            }
        }

        let Some(location) = ports.world.location_of(self.entity) else {
            return BindingTick::Release;
        };
        if location.distance(arena.center) <= arena.leash_radius {
            return BindingTick::Hold;
        }

        match ports.world.steer(self.entity, arena.center) {
            Ok(()) => BindingTick::Steered,
            Err(error) => {
                debug!(entity = %self.entity, %error, "leash steer refused");
                BindingTick::Hold
            }
        }
    }

    /// Unregisters the entity from its session, returning whether it was tracked.
    pub(crate) fn on_removed(&self) -> bool {
        self.session
            .upgrade()
            .is_some_and(|session| session.lock().remove_active_entity(self.entity))
    }
}
