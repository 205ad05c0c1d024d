//! Composition root tying the registry and the wave scheduler together.

use std::{sync::Arc, time::Instant};

use horde_survival_core::{HordeConfig, OwnerId, Ports};
use horde_survival_system_waves::{TickOutcome, WaveClear, WaveScheduler, WaveStart};
use horde_survival_world::{InstanceRegistry, SessionHandle, Settlement, ShutdownReport};
use tracing::info;

/// Everything that happened during one engine tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Waves started, per owner.
    pub waves_started: Vec<(OwnerId, WaveStart)>,
    /// Waves cleared, per owner.
    pub waves_cleared: Vec<(OwnerId, WaveClear)>,
    /// Sessions ended because they recommended it.
    pub settlements: Vec<Settlement>,
    /// Bindings released by their periodic tick.
    pub released: usize,
}

/// The horde mode as a game server embeds it.
///
/// Lifecycle events may arrive on any thread through [`HordeEngine::registry`];
/// the periodic tick is driven by a single caller.
#[derive(Debug)]
pub struct HordeEngine {
    registry: Arc<InstanceRegistry>,
    scheduler: WaveScheduler,
}

impl HordeEngine {
    /// Builds the engine from configuration and collaborators.
    #[must_use]
    pub fn new(config: HordeConfig, ports: Ports) -> Self {
        let registry = Arc::new(InstanceRegistry::new(config, ports));
        let scheduler = WaveScheduler::for_registry(&registry);
        Self {
            registry,
            scheduler,
        }
    }

    /// Shared registry for lifecycle events and queries.
    #[must_use]
    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Places the owner in a new instance.
    pub fn enter(&self, owner: OwnerId) -> Option<SessionHandle> {
        self.registry.create_instance(owner)
    }

    /// Runs one tick for every session and every binding.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        for handle in self.registry.active_sessions() {
            let owner = handle.owner();
            match self.scheduler.process_tick(&self.registry, &handle, now) {
                TickOutcome::WaveStarted(start) => report.waves_started.push((owner, start)),
                TickOutcome::WaveCleared(clear) => report.waves_cleared.push((owner, clear)),
                TickOutcome::ShouldEnd(reason) => {
                    if let Some(settlement) = self.registry.end_session(owner, reason) {
                        report.settlements.push(settlement);
                    }
                }
                TickOutcome::Waiting | TickOutcome::Ended => {}
            }
        }
        report.released = self.registry.process_bindings();
        report
    }

    /// Ends every session and sweeps strays.
    pub fn shutdown(&self) -> ShutdownReport {
        let report = self.registry.cleanup_all_sessions();
        info!(
            sessions = report.settlements.len(),
            swept = report.swept,
            "horde engine stopped"
        );
        report
    }
}
