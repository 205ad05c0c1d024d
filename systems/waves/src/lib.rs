#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling system driving the spawn, fight, and countdown cycle.
//!
//! The scheduler owns the random source used for tier selection and spawn
//! placement. All session state lives in the world crate; the scheduler only
//! reads it and applies transitions through the session and registry APIs.

use std::time::Instant;

use horde_survival_core::{
    ArenaConfig, CombatStats, EndReason, HordeConfig, HostileSpawn, Location, TierDefinition,
    TierTable, WaveConfig,
};
use horde_survival_system_rewards::{MilestoneBonus, RewardLedger};
use horde_survival_world::{
    CountdownTick, InstanceRegistry, Session, SessionHandle, SpawnOutcome, WavePhase,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

const EARLY_WAVE_LIMIT: u32 = 5;
const EARLY_TIER_COUNT: usize = 3;
const MID_WAVE_LIMIT: u32 = 15;
const MID_TIER_COUNT: usize = 6;
const LATE_WAVE_LIMIT: u32 = 30;
const LATE_STRONG_BIAS: f64 = 0.6;
const FINAL_TIER_COUNT: usize = 3;

/// Summary of a wave that was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveStart {
    /// Wave number.
    pub wave: u32,
    /// Entities the wave asked for.
    pub requested: u32,
    /// Entities registered and tracked.
    pub spawned: u32,
    /// Spawns the world refused.
    pub rejected: u32,
}

/// Summary of a wave that was cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveClear {
    /// Wave number.
    pub wave: u32,
    /// Wave reward credited.
    pub reward: u64,
    /// Milestone bonus credited.
    pub bonus: MilestoneBonus,
}

/// What a scheduler tick did for one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed phase.
    Waiting,
    /// A new wave was started.
    WaveStarted(WaveStart),
    /// The active wave was cleared and the countdown began.
    WaveCleared(WaveClear),
    /// The session should be ended by the caller.
    ShouldEnd(EndReason),
    /// The session has already ended.
    Ended,
}

/// Drives the wave cycle of every session it is handed.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: WaveConfig,
    arena: ArenaConfig,
    tiers: TierTable,
    ledger: RewardLedger,
    rng: ChaCha8Rng,
}

impl WaveScheduler {
    /// Creates a scheduler seeded from the wave configuration.
    #[must_use]
    pub fn new(config: &HordeConfig, tiers: TierTable) -> Self {
        Self {
            waves: config.waves.clone(),
            arena: config.arena.clone(),
            tiers,
            ledger: RewardLedger::new(config.rewards.clone()),
            rng: ChaCha8Rng::seed_from_u64(config.waves.seed),
        }
    }

    /// Creates a scheduler sharing the registry's configuration and tiers.
    #[must_use]
    pub fn for_registry(registry: &InstanceRegistry) -> Self {
        Self::new(registry.config(), registry.tiers().clone())
    }

    /// Number of entities in a wave, growing with the wave number up to the cap.
    #[must_use]
    pub fn zombie_count(&self, wave: u32) -> u32 {
        let count = (self.waves.base_count + f64::from(wave) * self.waves.count_scaling).ceil();
        if count <= 0.0 {
            return 0;
        }
        (count as u32).min(self.waves.max_per_wave)
    }

    /// Draws the tier of one entity for the wave.
    ///
    /// Early waves draw from the weakest tiers only, the eligible range
    /// widens with the wave number, and very late waves draw from the
    /// strongest tiers only.
    pub fn select_tier(&mut self, wave: u32) -> Option<TierDefinition> {
        let len = self.tiers.len();
        if len == 0 {
            return None;
        }

        let index = if wave <= EARLY_WAVE_LIMIT {
            self.rng.gen_range(0..len.min(EARLY_TIER_COUNT))
        } else if wave <= MID_WAVE_LIMIT {
            self.rng.gen_range(0..len.min(MID_TIER_COUNT))
        } else if wave <= LATE_WAVE_LIMIT {
            if self.rng.gen_bool(LATE_STRONG_BIAS) {
                let half = len / 2;
                half + self.rng.gen_range(0..len - half)
            } else {
                self.rng.gen_range(0..len)
            }
        } else {
            len - 1 - self.rng.gen_range(0..len.min(FINAL_TIER_COUNT))
        };

        self.tiers.get(index).copied()
    }

    /// Combat statistics of a tier at the given wave.
    ///
    /// Base values grow linearly with the wave number and are multiplied by
    /// the tier's strength.
    #[must_use]
    pub fn scaled_stats(&self, tier: &TierDefinition, wave: u32) -> CombatStats {
        let wave = f64::from(wave);
        let hp_multiplier = (1.0 + wave * self.waves.hp_rate) * tier.strength;
        let damage_multiplier = (1.0 + wave * self.waves.damage_rate) * tier.strength;

        CombatStats {
            hitpoints: ((f64::from(tier.base_hitpoints) * hp_multiplier) as u32).max(1),
            max_hit: (f64::from(tier.base_max_hit) * damage_multiplier) as u32,
        }
    }

    fn spawn_point(&mut self) -> Location {
        let offsets = &self.arena.spawn_offsets;
        if offsets.is_empty() {
            return self.arena.center;
        }
        let offset = offsets[self.rng.gen_range(0..offsets.len())];
        self.arena.center.offset(offset)
    }

    /// Reports whether the session's active wave has been fully cleared.
    #[must_use]
    pub fn is_wave_completed(session: &Session) -> bool {
        session.phase() == WavePhase::WaveActive && session.is_wave_completed()
    }

    /// Clears leftovers and spawns the given wave for the session.
    ///
    /// Returns `None` when the session has ended.
    pub fn start_wave(
        &mut self,
        registry: &InstanceRegistry,
        handle: &SessionHandle,
        wave: u32,
    ) -> Option<WaveStart> {
        let leftovers = registry.clear_session_entities(handle);
        if !leftovers.removed.is_empty() {
            debug!(owner = %handle.owner(), count = leftovers.removed.len(), "cleared leftover entities");
        }

        let requested = self.zombie_count(wave);
        {
            let mut session = handle.lock();
            if session.is_ended() {
                return None;
            }
            session.begin_wave(wave, requested);
        }

        let owner = handle.owner();
        registry.ports().notifier.notify(
            owner,
            &format!("Wave {wave} begins! {requested} zombies incoming!"),
        );

        let mut start = WaveStart {
            wave,
            requested,
            spawned: 0,
            rejected: 0,
        };
        for _ in 0..requested {
            let Some(tier) = self.select_tier(wave) else {
                handle.lock().abandon_spawn();
                start.rejected += 1;
                continue;
            };
            let spawn = HostileSpawn {
                type_id: tier.type_id,
                label: tier.kind.label(),
                location: self.spawn_point(),
                stats: self.scaled_stats(&tier, wave),
                target: owner,
            };

            match registry.spawn_hostile(handle, &spawn, wave, tier) {
                SpawnOutcome::Spawned(_) => start.spawned += 1,
                SpawnOutcome::Rejected(_) => start.rejected += 1,
                SpawnOutcome::Discarded(_) => return None,
            }
        }

        handle.lock().finish_spawning();
        info!(
            %owner,
            wave,
            requested,
            spawned = start.spawned,
            rejected = start.rejected,
            "wave started"
        );
        Some(start)
    }

    /// Advances one session by a tick.
    ///
    /// An idle session starts wave one. A running countdown is advanced by
    /// wall-clock seconds and starts the next wave when it elapses. An active
    /// wave drops entities the world no longer knows and, once cleared, pays
    /// its reward and starts the countdown. Ending is only recommended.
    pub fn process_tick(
        &mut self,
        registry: &InstanceRegistry,
        handle: &SessionHandle,
        now: Instant,
    ) -> TickOutcome {
        let world = registry.ports().world.as_ref();
        let (phase, current_wave) = {
            let mut session = handle.lock();
            if session.is_ended() {
                return TickOutcome::Ended;
            }
            session.observe(now);
            if let Some(reason) = session.should_end(now, world, self.waves.idle_timeout()) {
                return TickOutcome::ShouldEnd(reason);
            }
            (session.phase(), session.current_wave())
        };

        match phase {
            WavePhase::Ended => TickOutcome::Ended,
            WavePhase::Idle => self.begin(registry, handle, 1),
            WavePhase::Countdown => {
                let tick = handle.lock().tick_countdown(now);
                match tick {
                    CountdownTick::Running {
                        remaining,
                        announce,
                    } => {
                        if announce {
                            registry.ports().notifier.notify(
                                handle.owner(),
                                &format!("Next wave in {remaining} seconds..."),
                            );
                        }
                        TickOutcome::Waiting
                    }
                    CountdownTick::Elapsed | CountdownTick::Inactive => {
                        self.begin(registry, handle, current_wave + 1)
                    }
                }
            }
            WavePhase::Spawning | WavePhase::WaveActive => {
                let completed = {
                    let mut session = handle.lock();
                    let _ = session.prune_absent(world);
                    Self::is_wave_completed(&session)
                };
                if completed {
                    self.complete_wave(registry, handle, now)
                } else {
                    TickOutcome::Waiting
                }
            }
        }
    }

    fn begin(
        &mut self,
        registry: &InstanceRegistry,
        handle: &SessionHandle,
        wave: u32,
    ) -> TickOutcome {
        self.start_wave(registry, handle, wave)
            .map_or(TickOutcome::Ended, TickOutcome::WaveStarted)
    }

    fn complete_wave(
        &self,
        registry: &InstanceRegistry,
        handle: &SessionHandle,
        now: Instant,
    ) -> TickOutcome {
        let countdown = self.waves.countdown_secs;
        let clear = {
            let mut session = handle.lock();
            if session.is_ended() {
                return TickOutcome::Ended;
            }
            let wave = session.current_wave();
            let reward = self.ledger.wave_reward(wave);
            let bonus = self.ledger.milestone_bonus(wave);
            session.add_reward(reward.saturating_add(bonus.total()));
            session.start_countdown(countdown, now);
            WaveClear {
                wave,
                reward,
                bonus,
            }
        };

        let owner = handle.owner();
        let notifier = &registry.ports().notifier;
        notifier.notify(
            owner,
            &format!(
                "Wave {} completed! +{} reward points.",
                clear.wave, clear.reward
            ),
        );
        if clear.bonus.fixed > 0 {
            notifier.notify(
                owner,
                &format!(
                    "Milestone reached! Wave {} bonus: +{} reward points.",
                    clear.wave, clear.bonus.fixed
                ),
            );
        }
        if clear.bonus.special > 0 {
            notifier.notify(
                owner,
                &format!(
                    "Special reward for reaching wave {}: +{} reward points!",
                    clear.wave, clear.bonus.special
                ),
            );
        }
        if clear.bonus.scaling > 0 {
            notifier.notify(
                owner,
                &format!("Epic milestone bonus: +{} reward points!", clear.bonus.scaling),
            );
        }
        if self.ledger.is_broadcast_wave(clear.wave) {
            notifier.broadcast(&format!(
                "[Horde Survival] {owner} has reached wave {}!",
                clear.wave
            ));
        }
        notifier.notify(owner, &format!("Next wave starts in {countdown} seconds..."));

        info!(%owner, wave = clear.wave, reward = clear.reward, bonus = clear.bonus.total(), "wave cleared");
        TickOutcome::WaveCleared(clear)
    }
}
