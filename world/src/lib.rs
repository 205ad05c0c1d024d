#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative instance and session state for Horde Survival.
//!
//! The [`InstanceRegistry`] is the only place sessions are created or
//! destroyed. It is safe to share across threads: the owner index and the
//! entity binding index are concurrent maps, and each session sits behind its
//! own lock so sessions never contend with one another.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::{mapref::entry::Entry, DashMap, DashSet};
use horde_survival_core::{
    EndReason, EntityId, HordeConfig, HostileSpawn, InstanceId, ItemStack, OwnerId, PortError,
    Ports, TierDefinition, TierTable,
};
use horde_survival_system_rewards::RewardLedger;
use tracing::{debug, info, warn};

mod area;
mod binding;
mod session;
mod shop;

pub use area::{AreaAction, AreaDenial, ARENA_NAME};
pub use binding::{BindingTick, HostileBinding};
pub use session::{
    ClearReport, CountdownTick, FinishedSession, GearRestore, InstanceArea, Session,
    SessionHandle, SessionSummary, WavePhase,
};
pub use shop::{PurchaseError, Receipt};

/// Outcome of paying the session balance out as currency items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayoutStatus {
    /// Nothing was owed.
    Nothing,
    /// The currency items were placed in the owner's containers.
    Granted,
    /// The gear port refused the currency items.
    Failed(horde_survival_core::GearError),
}

/// Final accounting of a session that was ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Why the session ended.
    pub reason: EndReason,
    /// Progress at the moment the session ended.
    pub summary: SessionSummary,
    /// Participation bonus for the highest wave reached.
    pub end_bonus: u64,
    /// Balance plus bonus paid out as currency items.
    pub payout: u64,
    /// Whether the payout reached the owner.
    pub payout_status: PayoutStatus,
    /// Entities removed from the world.
    pub cleared: ClearReport,
    /// Gear restoration outcome.
    pub gear: GearRestore,
    /// Whether the owner was moved to the exit.
    pub relocated: bool,
}

/// Result of the global shutdown cleanup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Settlements of every session that was still live.
    pub settlements: Vec<Settlement>,
    /// Stray hostile entities removed by the final area sweep.
    pub swept: usize,
}

/// Result of issuing one hostile spawn for a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The entity was registered, bound, and tracked.
    Spawned(EntityId),
    /// The world refused the spawn; the wave target was lowered.
    Rejected(PortError),
    /// The session ended while the spawn was in flight; the entity was removed.
    Discarded(EntityId),
}

/// Process-wide index of live horde sessions.
#[derive(Debug)]
pub struct InstanceRegistry {
    sessions: DashMap<OwnerId, SessionHandle>,
    pending: DashSet<OwnerId>,
    bindings: DashMap<EntityId, HostileBinding>,
    ports: Ports,
    config: HordeConfig,
    ledger: RewardLedger,
    tiers: TierTable,
    next_instance: AtomicU32,
}

impl InstanceRegistry {
    /// Creates an empty registry wired to the provided collaborators.
    #[must_use]
    pub fn new(config: HordeConfig, ports: Ports) -> Self {
        Self::with_tiers(config, ports, TierTable::standard())
    }

    /// Creates an empty registry recognising a custom tier table.
    #[must_use]
    pub fn with_tiers(config: HordeConfig, ports: Ports, tiers: TierTable) -> Self {
        let ledger = RewardLedger::new(config.rewards.clone());
        Self {
            sessions: DashMap::new(),
            pending: DashSet::new(),
            bindings: DashMap::new(),
            ports,
            config,
            ledger,
            tiers,
            next_instance: AtomicU32::new(1),
        }
    }

    /// Collaborators the registry talks to.
    #[must_use]
    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// Configuration the registry was built with.
    #[must_use]
    pub fn config(&self) -> &HordeConfig {
        &self.config
    }

    /// Reward formulas used for kills and settlement.
    #[must_use]
    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    /// Tiers recognised as horde entities.
    #[must_use]
    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Places the owner in a fresh instance, or returns their live session.
    ///
    /// The owner is moved and their gear swapped without any registry lock
    /// held, so collaborators may call back into the registry. Returns `None`
    /// and leaves nothing behind when the owner cannot be moved into the
    /// instance, or while another creation for the same owner is in flight.
    pub fn create_instance(&self, owner: OwnerId) -> Option<SessionHandle> {
        if let Some(existing) = self.get_session(owner) {
            self.notify_existing(owner);
            return Some(existing);
        }

        if !self.pending.insert(owner) {
            debug!(%owner, "instance creation already in progress");
            return None;
        }
        let _claim = CreationClaim {
            pending: &self.pending,
            owner,
        };
        if let Some(existing) = self.get_session(owner) {
            self.notify_existing(owner);
            return Some(existing);
        }

        let arena = &self.config.arena;
        if let Err(error) = self.ports.world.move_owner(owner, arena.entrance) {
            warn!(%owner, %error, "could not move owner into a new instance");
            return None;
        }

        let instance = InstanceId::new(self.next_instance.fetch_add(1, Ordering::Relaxed));
        let area = InstanceArea::new(instance, arena);
        let session = Session::open(owner, area, &self.ports, &self.config.gear.starter_kit);
        let handle = SessionHandle::new(session);

        match self.sessions.entry(owner) {
            Entry::Occupied(existing) => {
                let winner = existing.get().clone();
                drop(existing);
                warn!(%owner, "instance created concurrently; discarding duplicate");
                let _ = handle.finish(&self.ports);
                self.notify_existing(owner);
                return Some(winner);
            }
            Entry::Vacant(slot) => {
                let _ = slot.insert(handle.clone());
            }
        }

        info!(%owner, instance = instance.get(), "horde session created");
        self.ports.notifier.notify(
            owner,
            "Welcome to Horde Survival! Survive as many waves as you can.",
        );
        Some(handle)
    }

    fn notify_existing(&self, owner: OwnerId) {
        self.ports
            .notifier
            .notify(owner, "You already have an active horde session.");
    }

    /// Ends the owner's session and settles it.
    ///
    /// The registry entry is removed before any cleanup runs, so no failure
    /// can leave it behind. Returns `None` when there was nothing to end.
    pub fn end_session(&self, owner: OwnerId, reason: EndReason) -> Option<Settlement> {
        let (_, handle) = self.sessions.remove(&owner)?;
        let Some(finished) = handle.finish(&self.ports) else {
            debug!(%owner, %reason, "session already ended");
            return None;
        };

        self.bindings.retain(|_, binding| !binding.belongs_to(&handle));

        let summary = finished.summary;
        let end_bonus = self.ledger.session_end_bonus(summary.highest_wave);
        let payout = summary.balance.saturating_add(end_bonus);
        let payout_status = self.pay_out(owner, payout);

        let exit = handle.lock().area().exit();
        let relocated = match self.ports.world.move_owner(owner, exit) {
            Ok(()) => true,
            Err(error) => {
                warn!(%owner, %error, "could not move owner to the exit");
                false
            }
        };

        info!(
            %owner,
            %reason,
            highest_wave = summary.highest_wave,
            kills = summary.total_kills,
            payout,
            "horde session ended"
        );
        self.ports.notifier.notify(
            owner,
            &format!(
                "Horde Survival complete! Highest wave: {}, kills: {}, reward: {} (+{} participation bonus).",
                summary.highest_wave, summary.total_kills, summary.balance, end_bonus
            ),
        );
        self.ports
            .notifier
            .notify(owner, &format!("Your horde session has ended: {reason}."));

        Some(Settlement {
            reason,
            summary,
            end_bonus,
            payout,
            payout_status,
            cleared: finished.cleared,
            gear: finished.gear,
            relocated,
        })
    }

    fn pay_out(&self, owner: OwnerId, amount: u64) -> PayoutStatus {
        if amount == 0 {
            return PayoutStatus::Nothing;
        }

        let stack = ItemStack::new(self.config.gear.currency_item, amount);
        match self.ports.gear.add(owner, stack) {
            Ok(()) => PayoutStatus::Granted,
            Err(error) => {
                warn!(%owner, %error, amount, "reward payout failed");
                PayoutStatus::Failed(error)
            }
        }
    }

    /// Live session of the owner, if any.
    #[must_use]
    pub fn get_session(&self, owner: OwnerId) -> Option<SessionHandle> {
        self.sessions.get(&owner).map(|entry| entry.value().clone())
    }

    /// Reports whether the owner has a session that has not ended.
    #[must_use]
    pub fn has_active_session(&self, owner: OwnerId) -> bool {
        self.get_session(owner)
            .is_some_and(|handle| !handle.is_ended())
    }

    /// Number of sessions in the registry.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Handles to every session, for tick processing.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Ends the owner's session because they disconnected.
    pub fn handle_logout(&self, owner: OwnerId) -> Option<Settlement> {
        self.end_session(owner, EndReason::Logout)
    }

    /// Ends the owner's session because they died.
    pub fn handle_death(&self, owner: OwnerId) -> Option<Settlement> {
        self.end_session(owner, EndReason::Death)
    }

    /// Ends the owner's session on request.
    pub fn manual_exit(&self, owner: OwnerId) -> Option<Settlement> {
        let settlement = self.end_session(owner, EndReason::ManualExit);
        if settlement.is_none() {
            self.ports
                .notifier
                .notify(owner, "You are not in a horde session.");
        }
        settlement
    }

    /// Ends every session and sweeps the instance footprint of strays.
    pub fn cleanup_all_sessions(&self) -> ShutdownReport {
        let owners: Vec<OwnerId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        let settlements: Vec<Settlement> = owners
            .into_iter()
            .filter_map(|owner| self.end_session(owner, EndReason::Shutdown))
            .collect();

        self.sessions.clear();
        self.bindings.clear();
        let swept = self.sweep_instance_area();

        info!(sessions = settlements.len(), swept, "horde shutdown cleanup finished");
        ShutdownReport { settlements, swept }
    }

    /// Removes every horde entity standing inside the instance footprint.
    pub fn sweep_instance_area(&self) -> usize {
        let bounds = self.config.arena.bounds;
        let strays: Vec<EntityId> = self
            .ports
            .world
            .entities()
            .into_iter()
            .filter(|entity| bounds.contains(entity.location) && self.tiers.contains_type(entity.type_id))
            .map(|entity| entity.id)
            .collect();

        let mut swept = 0;
        for entity in strays {
            match self.ports.world.deregister(entity) {
                Ok(()) => swept += 1,
                Err(error) => warn!(%entity, %error, "stray sweep could not remove entity"),
            }
        }
        swept
    }

    /// Registers a hostile entity for the session and binds it.
    ///
    /// The binding is in place before the session starts tracking the entity,
    /// so a death reported immediately after registration is never lost.
    pub fn spawn_hostile(
        &self,
        handle: &SessionHandle,
        spawn: &HostileSpawn,
        wave: u32,
        tier: TierDefinition,
    ) -> SpawnOutcome {
        let entity = match self.ports.world.register(spawn) {
            Ok(entity) => entity,
            Err(error) => {
                warn!(owner = %handle.owner(), wave, %error, "spawn refused");
                handle.lock().abandon_spawn();
                return SpawnOutcome::Rejected(error);
            }
        };

        let _ = self
            .bindings
            .insert(entity, HostileBinding::new(handle, entity, wave, tier));
        if handle.lock().add_active_entity(entity) {
            return SpawnOutcome::Spawned(entity);
        }

        let _ = self.bindings.remove(&entity);
        if let Err(error) = self.ports.world.deregister(entity) {
            warn!(%entity, %error, "could not remove entity spawned after session end");
        }
        SpawnOutcome::Discarded(entity)
    }

    /// Removes every entity tracked by the session and drops their bindings.
    pub fn clear_session_entities(&self, handle: &SessionHandle) -> ClearReport {
        let report = handle.clear_active_entities(self.ports.world.as_ref());
        for entity in report.entities() {
            let _ = self.bindings.remove(&entity);
        }
        report
    }

    /// Death event for a hostile entity; returns the kill reward credited.
    pub fn on_hostile_entity_killed(&self, entity: EntityId) -> Option<u64> {
        let (_, binding) = self.bindings.remove(&entity)?;
        binding.on_death(&self.ports, &self.ledger)
    }

    /// Removal event for a hostile entity from any cause.
    pub fn on_hostile_entity_removed(&self, entity: EntityId) -> bool {
        self.bindings
            .remove(&entity)
            .is_some_and(|(_, binding)| binding.on_removed())
    }

    /// Binding attached to the entity, if it belongs to a session.
    #[must_use]
    pub fn binding(&self, entity: EntityId) -> Option<HostileBinding> {
        self.bindings.get(&entity).map(|entry| entry.value().clone())
    }

    /// Reports whether the entity may attack the target.
    ///
    /// Entities outside the horde are not restricted.
    #[must_use]
    pub fn may_engage(&self, entity: EntityId, target: OwnerId) -> bool {
        self.binding(entity)
            .map_or(true, |binding| binding.may_engage(target))
    }

    /// Reports whether the attacker may damage the entity.
    #[must_use]
    pub fn may_damage(&self, attacker: OwnerId, entity: EntityId) -> bool {
        self.binding(entity)
            .map_or(true, |binding| binding.may_be_damaged_by(attacker))
    }

    /// Runs the periodic tick of every binding, returning how many were released.
    pub fn process_bindings(&self) -> usize {
        let bindings: Vec<HostileBinding> = self
            .bindings
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut released = 0;
        for binding in bindings {
            if binding.on_tick(&self.ports, &self.config.arena) != BindingTick::Release {
                continue;
            }

            let _ = self.bindings.remove(&binding.entity());
            let _ = binding.on_removed();
            if let Err(error) = self.ports.world.deregister(binding.entity()) {
                debug!(entity = %binding.entity(), %error, "released entity already gone");
            }
            released += 1;
        }
        released
    }
}

struct CreationClaim<'a> {
    pending: &'a DashSet<OwnerId>,
    owner: OwnerId,
}

impl Drop for CreationClaim<'_> {
    fn drop(&mut self) {
        let _ = self.pending.remove(&self.owner);
    }
}
