use std::time::{Duration, Instant};

use horde_survival_core::{EndReason, HordeConfig, Location, OwnerId, WorldPort};
use horde_survival_sandbox::Sandbox;
use horde_survival_system_waves::{TickOutcome, WaveScheduler};
use horde_survival_world::{InstanceRegistry, SessionHandle, WavePhase};

struct Harness {
    sandbox: Sandbox,
    registry: InstanceRegistry,
    scheduler: WaveScheduler,
    owner: OwnerId,
    handle: SessionHandle,
}

impl Harness {
    fn with_config(config: HordeConfig) -> Self {
        let sandbox = Sandbox::new();
        let owner = OwnerId::new(11);
        sandbox.join(owner, Location::new(3200, 3200));
        let registry = InstanceRegistry::new(config, sandbox.ports());
        let scheduler = WaveScheduler::for_registry(&registry);
        let handle = registry.create_instance(owner).expect("session created");
        Self {
            sandbox,
            registry,
            scheduler,
            owner,
            handle,
        }
    }

    fn new() -> Self {
        Self::with_config(HordeConfig::default())
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        self.scheduler
            .process_tick(&self.registry, &self.handle, now)
    }

    fn kill_everything(&self) -> u64 {
        self.sandbox
            .world
            .entity_ids()
            .into_iter()
            .filter_map(|entity| {
                assert!(self.sandbox.world.kill(entity));
                self.registry.on_hostile_entity_killed(entity)
            })
            .sum()
    }
}

#[test]
fn first_wave_clears_then_second_wave_follows_countdown() {
    let mut harness = Harness::new();
    let start = Instant::now();

    let first = match harness.tick(start) {
        TickOutcome::WaveStarted(wave) => wave,
        other => panic!("expected wave start, got {other:?}"),
    };
    assert_eq!(first.wave, 1);
    assert_eq!(first.requested, 4);
    assert_eq!(first.spawned, 4);
    assert_eq!(harness.sandbox.world.entity_count(), 4);
    assert_eq!(harness.handle.lock().phase(), WavePhase::WaveActive);
    for entity in harness.sandbox.world.entity_ids() {
        let stored = harness.sandbox.world.entity(entity).expect("registered");
        assert_eq!(stored.target, Some(harness.owner));
        let tier = harness
            .registry
            .tiers()
            .by_type(stored.type_id)
            .expect("horde tier");
        assert!(tier.strength <= 3.0);
        assert_eq!(stored.stats, harness.scheduler.scaled_stats(tier, 1));
    }

    assert_eq!(harness.tick(start), TickOutcome::Waiting);
    let kill_rewards = harness.kill_everything();
    assert!(kill_rewards >= 4 * 8);
    assert!(harness.handle.lock().is_wave_completed());

    let cleared = match harness.tick(start) {
        TickOutcome::WaveCleared(clear) => clear,
        other => panic!("expected wave clear, got {other:?}"),
    };
    assert_eq!(cleared.wave, 1);
    assert_eq!(cleared.reward, 75);
    assert!(cleared.bonus.is_empty());
    {
        let session = harness.handle.lock();
        assert_eq!(session.phase(), WavePhase::Countdown);
        assert_eq!(session.total_reward(), kill_rewards + 75);
        assert_eq!(session.total_kills(), 4);
    }

    assert_eq!(
        harness.tick(start + Duration::from_secs(10)),
        TickOutcome::Waiting
    );
    assert_eq!(harness.sandbox.world.entity_count(), 0);
    assert_eq!(
        harness.tick(start + Duration::from_secs(14)),
        TickOutcome::Waiting
    );

    let second = match harness.tick(start + Duration::from_secs(15)) {
        TickOutcome::WaveStarted(wave) => wave,
        other => panic!("expected wave start, got {other:?}"),
    };
    assert_eq!(second.wave, 2);
    assert!(second.requested >= first.requested);
    assert_eq!(harness.sandbox.world.entity_count(), 4);
    for entity in harness.sandbox.world.entity_ids() {
        let stored = harness.sandbox.world.entity(entity).expect("registered");
        let tier = harness
            .registry
            .tiers()
            .by_type(stored.type_id)
            .expect("horde tier");
        assert!(stored.stats.hitpoints > harness.scheduler.scaled_stats(tier, 1).hitpoints);
    }

    let messages = harness.sandbox.notifier.messages_for(harness.owner);
    assert!(messages.contains(&"Wave 1 begins! 4 zombies incoming!".to_owned()));
    assert!(messages.contains(&"Wave 1 completed! +75 reward points.".to_owned()));
    assert!(messages.contains(&"Next wave in 5 seconds...".to_owned()));
    assert!(messages.contains(&"Wave 2 begins! 4 zombies incoming!".to_owned()));
}

#[test]
fn zero_sized_wave_completes_immediately() {
    let mut config = HordeConfig::default();
    config.waves.base_count = 0.0;
    config.waves.count_scaling = 0.0;
    let mut harness = Harness::with_config(config);
    let now = Instant::now();

    match harness.tick(now) {
        TickOutcome::WaveStarted(wave) => assert_eq!(wave.requested, 0),
        other => panic!("expected wave start, got {other:?}"),
    }
    assert!(matches!(harness.tick(now), TickOutcome::WaveCleared(_)));
}

#[test]
fn refused_spawns_do_not_stall_the_wave() {
    let mut harness = Harness::new();
    harness.sandbox.world.refuse_spawns(3);
    let now = Instant::now();

    match harness.tick(now) {
        TickOutcome::WaveStarted(wave) => {
            assert_eq!(wave.spawned, 1);
            assert_eq!(wave.rejected, 3);
        }
        other => panic!("expected wave start, got {other:?}"),
    }
    let _ = harness.kill_everything();
    assert!(matches!(harness.tick(now), TickOutcome::WaveCleared(_)));
}

#[test]
fn entities_removed_without_callback_are_pruned() {
    let mut harness = Harness::new();
    let now = Instant::now();
    let _ = harness.tick(now);

    for entity in harness.sandbox.world.entity_ids() {
        assert!(harness.sandbox.world.kill(entity));
    }

    assert!(matches!(harness.tick(now), TickOutcome::WaveCleared(_)));
    assert_eq!(harness.handle.lock().total_kills(), 0);
}

#[test]
fn deaths_reported_after_pruning_are_still_credited() {
    let mut harness = Harness::new();
    let now = Instant::now();
    let _ = harness.tick(now);

    let entities = harness.sandbox.world.entity_ids();
    assert_eq!(entities.len(), 4);
    for entity in &entities {
        assert!(harness.sandbox.world.kill(*entity));
    }
    let cleared = match harness.tick(now) {
        TickOutcome::WaveCleared(clear) => clear,
        other => panic!("expected wave clear, got {other:?}"),
    };

    let credited: Vec<Option<u64>> = entities
        .iter()
        .map(|entity| harness.registry.on_hostile_entity_killed(*entity))
        .collect();
    assert!(credited.iter().all(Option::is_some));

    let session = harness.handle.lock();
    assert_eq!(session.total_kills(), 4);
    assert_eq!(session.awaiting_death_report(), 0);
    assert_eq!(
        session.total_reward(),
        cleared.reward + credited.into_iter().flatten().sum::<u64>()
    );
}

#[test]
fn milestone_waves_pay_bonuses_and_broadcast() {
    let mut harness = Harness::new();
    let now = Instant::now();

    let _ = harness
        .scheduler
        .start_wave(&harness.registry, &harness.handle, 50)
        .expect("wave started");
    let _ = harness.kill_everything();
    let balance_before = harness.handle.lock().total_reward();

    let cleared = match harness.tick(now) {
        TickOutcome::WaveCleared(clear) => clear,
        other => panic!("expected wave clear, got {other:?}"),
    };

    assert_eq!(cleared.bonus.fixed, 500);
    assert_eq!(cleared.bonus.special, 5_000);
    assert_eq!(
        harness.handle.lock().total_reward(),
        balance_before + cleared.reward + 5_500
    );
    assert_eq!(
        harness.sandbox.notifier.broadcasts(),
        vec![format!("[Horde Survival] {} has reached wave 50!", harness.owner)]
    );
}

#[test]
fn leaving_the_arena_recommends_ending() {
    let mut harness = Harness::new();
    let now = Instant::now();
    let _ = harness.tick(now);

    let exit = harness.registry.config().arena.exit;
    harness
        .sandbox
        .world
        .move_owner(harness.owner, exit)
        .expect("owner present");
    assert_eq!(
        harness.tick(now),
        TickOutcome::ShouldEnd(EndReason::LeftArea)
    );
    assert!(harness.registry.has_active_session(harness.owner));

    harness.sandbox.world.disconnect(harness.owner);
    assert_eq!(
        harness.tick(now),
        TickOutcome::ShouldEnd(EndReason::OwnerGone)
    );
}

#[test]
fn idle_sessions_are_flagged_after_timeout() {
    let mut harness = Harness::new();
    let now = Instant::now();
    let _ = harness.tick(now);

    let later = now + Duration::from_secs(31 * 60);
    assert_eq!(harness.tick(later), TickOutcome::ShouldEnd(EndReason::Idle));
}

#[test]
fn ended_sessions_are_left_alone() {
    let mut harness = Harness::new();
    let now = Instant::now();
    let _ = harness.tick(now);
    let _ = harness.registry.handle_logout(harness.owner);

    assert_eq!(harness.tick(now), TickOutcome::Ended);
    assert!(harness
        .scheduler
        .start_wave(&harness.registry, &harness.handle, 2)
        .is_none());
    assert_eq!(harness.sandbox.world.entity_count(), 0);
}
