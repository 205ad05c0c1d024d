//! Per-owner session state and its gear swap.

use std::{
    collections::BTreeSet,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};

use horde_survival_core::{
    ArenaConfig, EndReason, EntityId, GearError, GearSnapshot, InstanceId, ItemStack, Location,
    OwnerId, PortError, Ports, Region, WorldPort,
};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Private copy of the arena allocated to one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceArea {
    id: InstanceId,
    bounds: Region,
    center: Location,
    exit: Location,
}

impl InstanceArea {
    /// Describes an instance occupying the configured arena footprint.
    #[must_use]
    pub fn new(id: InstanceId, arena: &ArenaConfig) -> Self {
        Self {
            id,
            bounds: arena.bounds,
            center: arena.center,
            exit: arena.exit,
        }
    }

    /// Identifier of the instance.
    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Footprint the owner must stay within.
    #[must_use]
    pub const fn bounds(&self) -> Region {
        self.bounds
    }

    /// Arena center used for spawning and leashing.
    #[must_use]
    pub const fn center(&self) -> Location {
        self.center
    }

    /// Safe location outside the footprint.
    #[must_use]
    pub const fn exit(&self) -> Location {
        self.exit
    }
}

/// Progress of the wave cycle for one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// Created but no wave has started yet.
    Idle,
    /// Entities for the current wave are being issued.
    Spawning,
    /// Every spawn has been issued and the wave is being fought.
    WaveActive,
    /// Waiting between a cleared wave and the next one.
    Countdown,
    /// Terminal state.
    Ended,
}

#[derive(Clone, Copy, Debug)]
struct Countdown {
    seconds_remaining: u32,
    last_tick_at: Instant,
}

/// Result of advancing a session's countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownTick {
    /// No countdown is running.
    Inactive,
    /// The countdown is still running.
    Running {
        /// Whole seconds left.
        remaining: u32,
        /// Whether the owner should hear about the remaining time.
        announce: bool,
    },
    /// The countdown reached zero during this tick.
    Elapsed,
}

/// Authoritative state of one owner's progress through an instance.
#[derive(Debug)]
pub struct Session {
    owner: OwnerId,
    area: InstanceArea,
    started_at: Instant,
    current_wave: u32,
    highest_wave_reached: u32,
    phase: WavePhase,
    active_entities: BTreeSet<EntityId>,
    pruned: BTreeSet<EntityId>,
    spawned_this_wave: u32,
    to_spawn_this_wave: u32,
    countdown: Option<Countdown>,
    total_reward: u64,
    total_kills: u64,
    wave_kills: u32,
    gear_snapshot: Option<GearSnapshot>,
    ended: bool,
    observed_at: Instant,
    last_activity_at: Instant,
}

impl Session {
    /// Opens a session and swaps the owner's gear for the starter kit.
    ///
    /// The owner's containers are copied before anything is touched. When the
    /// copy fails the session is still usable, but the reset and the starter
    /// kit are skipped and teardown will not attempt a restore.
    #[must_use]
    pub fn open(owner: OwnerId, area: InstanceArea, ports: &Ports, starter_kit: &[ItemStack]) -> Self {
        let gear_snapshot = match ports.gear.snapshot(owner) {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(%owner, %error, "gear snapshot failed; keeping the owner's own gear");
                None
            }
        };

        if gear_snapshot.is_some() {
            swap_in_starter_kit(owner, ports, starter_kit);
        }

        let now = Instant::now();
        Self {
            owner,
            area,
            started_at: now,
            current_wave: 0,
            highest_wave_reached: 0,
            phase: WavePhase::Idle,
            active_entities: BTreeSet::new(),
            pruned: BTreeSet::new(),
            spawned_this_wave: 0,
            to_spawn_this_wave: 0,
            countdown: None,
            total_reward: 0,
            total_kills: 0,
            wave_kills: 0,
            gear_snapshot,
            ended: false,
            observed_at: now,
            last_activity_at: now,
        }
    }

    /// Owner controlling the session.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Instance allocated to the session.
    #[must_use]
    pub const fn area(&self) -> &InstanceArea {
        &self.area
    }

    /// When the session was opened.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Wave currently being played; zero before the first wave.
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Highest wave number started during the session.
    #[must_use]
    pub const fn highest_wave_reached(&self) -> u32 {
        self.highest_wave_reached
    }

    /// Position in the wave cycle.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Hostile entities bound to the session and still alive.
    pub fn active_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.active_entities.iter().copied()
    }

    /// Number of hostile entities still alive.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_entities.len()
    }

    /// Reports whether the entity is tracked by the session.
    #[must_use]
    pub fn is_tracking(&self, entity: EntityId) -> bool {
        self.active_entities.contains(&entity)
    }

    /// Entities successfully issued for the current wave.
    #[must_use]
    pub const fn spawned_this_wave(&self) -> u32 {
        self.spawned_this_wave
    }

    /// Entities the current wave is expected to issue.
    #[must_use]
    pub const fn to_spawn_this_wave(&self) -> u32 {
        self.to_spawn_this_wave
    }

    /// Seconds left on the running countdown.
    #[must_use]
    pub fn countdown_remaining(&self) -> Option<u32> {
        self.countdown.map(|countdown| countdown.seconds_remaining)
    }

    /// Reward-currency balance.
    #[must_use]
    pub const fn total_reward(&self) -> u64 {
        self.total_reward
    }

    /// Kills across every wave.
    #[must_use]
    pub const fn total_kills(&self) -> u64 {
        self.total_kills
    }

    /// Kills during the current wave.
    #[must_use]
    pub const fn wave_kills(&self) -> u32 {
        self.wave_kills
    }

    /// Reports whether the owner's original gear was captured.
    #[must_use]
    pub const fn has_gear_snapshot(&self) -> bool {
        self.gear_snapshot.is_some()
    }

    /// Reports whether the session has reached its terminal state.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    /// Last time a qualifying event touched the session.
    #[must_use]
    pub const fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    /// Latest tick time the session has seen.
    #[must_use]
    pub const fn observed_at(&self) -> Instant {
        self.observed_at
    }

    /// Advances the session clock to the tick time; it never moves backwards.
    ///
    /// Events arriving between ticks are stamped with this time.
    pub fn observe(&mut self, now: Instant) {
        self.observed_at = self.observed_at.max(now);
    }

    /// Refreshes the idle timer at the given tick time.
    pub fn touch(&mut self, now: Instant) {
        self.observe(now);
        self.mark_active();
    }

    fn mark_active(&mut self) {
        self.last_activity_at = self.observed_at;
    }

    /// Advances to the next wave and returns its number.
    pub fn increment_wave(&mut self) -> u32 {
        let next = self.current_wave.saturating_add(1);
        self.begin_wave(next, 0);
        next
    }

    /// Enters the given wave with a fresh spawn target.
    ///
    /// Per-wave counters are reset and the highest wave is raised when
    /// improved. Has no effect once the session has ended.
    pub fn begin_wave(&mut self, wave: u32, spawn_target: u32) {
        if self.ended {
            return;
        }

        self.current_wave = wave;
        self.highest_wave_reached = self.highest_wave_reached.max(wave);
        self.wave_kills = 0;
        self.spawned_this_wave = 0;
        self.to_spawn_this_wave = spawn_target;
        self.countdown = None;
        self.phase = WavePhase::Spawning;
        self.mark_active();
    }

    /// Replaces the spawn target of the current wave.
    pub fn set_spawn_target(&mut self, target: u32) {
        if !self.ended {
            self.to_spawn_this_wave = target;
        }
    }

    /// Lowers the spawn target after a spawn the world refused.
    pub fn abandon_spawn(&mut self) {
        self.to_spawn_this_wave = self.to_spawn_this_wave.saturating_sub(1);
    }

    /// Marks every spawn of the current wave as issued.
    pub fn finish_spawning(&mut self) {
        if !self.ended && self.phase == WavePhase::Spawning {
            self.phase = WavePhase::WaveActive;
        }
    }

    /// Tracks a freshly spawned entity and counts it toward the spawn target.
    ///
    /// Returns `false` when the session has ended, in which case the caller
    /// owns the entity and must remove it from the world.
    pub fn add_active_entity(&mut self, entity: EntityId) -> bool {
        if self.ended {
            return false;
        }

        if self.active_entities.insert(entity) {
            self.spawned_this_wave = self.spawned_this_wave.saturating_add(1);
        }
        self.mark_active();
        true
    }

    /// Stops tracking an entity, returning whether it was tracked.
    pub fn remove_active_entity(&mut self, entity: EntityId) -> bool {
        let _ = self.pruned.remove(&entity);
        let removed = self.active_entities.remove(&entity);
        if removed {
            self.mark_active();
        }
        removed
    }

    /// Credits a kill of a tracked entity.
    ///
    /// Entities pruned before their death event arrived are still credited.
    /// Returns `false` without crediting anything when the session has ended
    /// or the entity was not tracked.
    pub fn record_kill(&mut self, entity: EntityId, reward: u64) -> bool {
        if self.ended {
            return false;
        }
        let tracked = self.active_entities.remove(&entity);
        let pruned = self.pruned.remove(&entity);
        if !tracked && !pruned {
            return false;
        }

        self.total_kills = self.total_kills.saturating_add(1);
        self.wave_kills = self.wave_kills.saturating_add(1);
        self.total_reward = self.total_reward.saturating_add(reward);
        self.mark_active();
        true
    }

    /// Credits reward currency.
    pub fn add_reward(&mut self, amount: u64) {
        if self.ended {
            return;
        }
        self.total_reward = self.total_reward.saturating_add(amount);
        self.mark_active();
    }

    /// Returns a previous debit, unless the session has ended.
    pub fn refund(&mut self, amount: u64) -> bool {
        if self.ended {
            return false;
        }
        self.total_reward = self.total_reward.saturating_add(amount);
        true
    }

    /// Debits reward currency, returning the remaining balance.
    ///
    /// Returns `None` and leaves the balance unchanged when it does not cover
    /// the cost or the session has ended.
    pub fn debit(&mut self, cost: u64) -> Option<u64> {
        if self.ended || cost > self.total_reward {
            return None;
        }
        self.total_reward -= cost;
        self.mark_active();
        Some(self.total_reward)
    }

    /// Drops tracked entities the world no longer knows about.
    ///
    /// Dropped entities stay eligible for kill credit until their death or
    /// removal event arrives.
    pub fn prune_absent(&mut self, world: &dyn WorldPort) -> usize {
        let absent: Vec<EntityId> = self
            .active_entities
            .iter()
            .copied()
            .filter(|entity| !world.is_present(*entity))
            .collect();
        for entity in &absent {
            let _ = self.active_entities.remove(entity);
            let _ = self.pruned.insert(*entity);
        }
        let pruned = absent.len();
        if pruned > 0 {
            debug!(owner = %self.owner, pruned, "dropped entities missing from the world");
        }
        pruned
    }

    /// Entities dropped by pruning whose death has not been reported yet.
    #[must_use]
    pub fn awaiting_death_report(&self) -> usize {
        self.pruned.len()
    }

    /// Reports whether every spawn was issued and every entity is gone.
    #[must_use]
    pub fn is_wave_completed(&self) -> bool {
        self.spawned_this_wave == self.to_spawn_this_wave && self.active_entities.is_empty()
    }

    /// Starts the pause before the next wave.
    pub fn start_countdown(&mut self, seconds: u32, now: Instant) {
        if self.ended {
            return;
        }
        self.countdown = Some(Countdown {
            seconds_remaining: seconds,
            last_tick_at: now,
        });
        self.phase = WavePhase::Countdown;
    }

    /// Advances the countdown by the whole seconds elapsed since its last step.
    pub fn tick_countdown(&mut self, now: Instant) -> CountdownTick {
        let Some(countdown) = self.countdown.as_mut() else {
            return CountdownTick::Inactive;
        };

        let elapsed = now.saturating_duration_since(countdown.last_tick_at).as_secs();
        if elapsed == 0 && countdown.seconds_remaining > 0 {
            return CountdownTick::Running {
                remaining: countdown.seconds_remaining,
                announce: false,
            };
        }

        let steps = u32::try_from(elapsed)
            .unwrap_or(u32::MAX)
            .min(countdown.seconds_remaining);
        countdown.seconds_remaining -= steps;
        countdown.last_tick_at += Duration::from_secs(u64::from(steps));

        let remaining = countdown.seconds_remaining;
        if remaining == 0 {
            self.countdown = None;
            return CountdownTick::Elapsed;
        }

        CountdownTick::Running {
            remaining,
            announce: steps > 0 && (remaining <= 5 || remaining % 5 == 0),
        }
    }

    /// Recommends ending the session, without ending it.
    ///
    /// The owner must still be present in the world, inside the instance
    /// footprint, and active within `idle_timeout`.
    #[must_use]
    pub fn should_end(
        &self,
        now: Instant,
        world: &dyn WorldPort,
        idle_timeout: Duration,
    ) -> Option<EndReason> {
        if self.ended {
            return None;
        }

        let Some(location) = world.owner_location(self.owner) else {
            return Some(EndReason::OwnerGone);
        };

        if !self.area.bounds.contains(location) {
            return Some(EndReason::LeftArea);
        }

        if now.saturating_duration_since(self.last_activity_at) > idle_timeout {
            return Some(EndReason::Idle);
        }

        None
    }

    /// Progress counters suitable for reporting.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            owner: self.owner,
            instance: self.area.id,
            current_wave: self.current_wave,
            highest_wave: self.highest_wave_reached,
            balance: self.total_reward,
            total_kills: self.total_kills,
            duration: self.observed_at.saturating_duration_since(self.started_at),
        }
    }

    fn close(&mut self) -> (Vec<EntityId>, Option<GearSnapshot>) {
        self.ended = true;
        self.phase = WavePhase::Ended;
        self.countdown = None;
        self.pruned.clear();
        let entities = std::mem::take(&mut self.active_entities);
        (entities.into_iter().collect(), self.gear_snapshot.take())
    }
}

fn swap_in_starter_kit(owner: OwnerId, ports: &Ports, starter_kit: &[ItemStack]) {
    if let Err(error) = ports.gear.reset(owner) {
        warn!(%owner, %error, "gear reset failed; starter kit skipped");
        return;
    }

    for stack in starter_kit {
        if let Err(error) = ports.gear.add(owner, *stack) {
            warn!(%owner, item = stack.item.get(), %error, "starter kit item not granted");
        }
    }
}

/// Progress counters captured from a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Owner of the session.
    pub owner: OwnerId,
    /// Instance the session occupied.
    pub instance: InstanceId,
    /// Wave being played at capture time.
    pub current_wave: u32,
    /// Highest wave started.
    pub highest_wave: u32,
    /// Reward-currency balance.
    pub balance: u64,
    /// Kills across every wave.
    pub total_kills: u64,
    /// Time since the session opened.
    pub duration: Duration,
}

/// Outcome of removing a session's tracked entities from the world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Entities removed from the world.
    pub removed: Vec<EntityId>,
    /// Entities the world refused to remove.
    pub failed: Vec<(EntityId, PortError)>,
}

impl ClearReport {
    /// Every entity that left the session, whether or not the world removed it.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.removed
            .iter()
            .copied()
            .chain(self.failed.iter().map(|(entity, _)| *entity))
    }

    fn deregister_all(world: &dyn WorldPort, entities: Vec<EntityId>) -> Self {
        let mut report = Self::default();
        for entity in entities {
            match world.deregister(entity) {
                Ok(()) | Err(PortError::UnknownEntity(_)) => report.removed.push(entity),
                Err(error) => {
                    warn!(%entity, %error, "failed to remove hostile entity");
                    report.failed.push((entity, error));
                }
            }
        }
        report
    }
}

/// Outcome of handing the owner's original gear back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GearRestore {
    /// The snapshot was restored.
    Restored,
    /// No snapshot was captured, so nothing was touched.
    Skipped,
    /// The gear port refused the snapshot.
    Failed(GearError),
}

/// Everything released when a session reached its terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishedSession {
    /// Progress at the moment the session ended.
    pub summary: SessionSummary,
    /// Entities removed from the world.
    pub cleared: ClearReport,
    /// Gear restoration outcome.
    pub gear: GearRestore,
}

/// Shared, lockable reference to a session.
///
/// The registry and the scheduler hold strong handles; entity bindings only
/// hold weak ones.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    owner: OwnerId,
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    /// Wraps a session for shared access.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            owner: session.owner,
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Owner of the wrapped session.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Locks the session for inspection or mutation.
    ///
    /// World deregistration must not happen while the guard is held.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    /// Reports whether both handles refer to the same session.
    #[must_use]
    pub fn ptr_eq(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reports whether the session has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.inner.lock().is_ended()
    }

    /// Removes every tracked entity from the world and empties the set.
    ///
    /// The set is drained under the lock and the world is called after the
    /// lock is released, so removal callbacks can re-enter the session.
    pub fn clear_active_entities(&self, world: &dyn WorldPort) -> ClearReport {
        let drained: Vec<EntityId> = {
            let mut session = self.inner.lock();
            std::mem::take(&mut session.active_entities)
                .into_iter()
                .collect()
        };
        ClearReport::deregister_all(world, drained)
    }

    /// Moves the session to its terminal state exactly once.
    ///
    /// Returns `None` when the session had already ended.
    pub fn finish(&self, ports: &Ports) -> Option<FinishedSession> {
        let (summary, entities, snapshot) = {
            let mut session = self.inner.lock();
            if session.ended {
                return None;
            }
            let summary = session.summary();
            let (entities, snapshot) = session.close();
            (summary, entities, snapshot)
        };

        let cleared = ClearReport::deregister_all(ports.world.as_ref(), entities);
        let gear = match snapshot {
            None => GearRestore::Skipped,
            Some(snapshot) => match ports.gear.restore(self.owner, &snapshot) {
                Ok(()) => GearRestore::Restored,
                Err(error) => {
                    warn!(owner = %self.owner, %error, "failed to restore original gear");
                    GearRestore::Failed(error)
                }
            },
        };

        Some(FinishedSession {
            summary,
            cleared,
            gear,
        })
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<Session>> {
        Arc::downgrade(&self.inner)
    }
}
