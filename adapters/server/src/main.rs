#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless simulator running one Horde Survival session against the sandbox.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use horde_survival_core::{HordeConfig, OwnerId, ShopCategory};
use horde_survival_sandbox::{Notification, Sandbox};
use horde_survival_server::{
    config,
    tracing_init::{init_tracing, DEFAULT_FILTER},
    HordeEngine,
};
use horde_survival_world::{GearRestore, Settlement};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "horde-survival")]
#[command(version, about = "Headless Horde Survival session simulator")]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave the arena after clearing this wave
    #[arg(long, default_value_t = 10)]
    target_wave: u32,

    /// Override the wave composition seed
    #[arg(long)]
    seed: Option<u64>,

    /// Hostile entities the simulated owner kills per tick
    #[arg(long, default_value_t = 1)]
    kills_per_tick: usize,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 600)]
    tick_ms: u64,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Shop purchase attempted after every cleared wave until it succeeds, as `category:index`
    #[arg(long = "buy", value_parser = parse_order)]
    orders: Vec<Order>,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug)]
struct Order {
    category: ShopCategory,
    index: usize,
}

fn parse_order(text: &str) -> Result<Order, String> {
    let (category, index) = text
        .split_once(':')
        .ok_or_else(|| format!("expected `category:index`, found `{text}`"))?;
    let category = category
        .parse::<ShopCategory>()
        .map_err(|error| error.to_string())?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|error| format!("invalid item index `{index}`: {error}"))?;
    Ok(Order { category, index })
}

#[derive(Debug, Serialize)]
struct Summary {
    reason: String,
    ticks: u64,
    highest_wave: u32,
    kills: u64,
    balance: u64,
    end_bonus: u64,
    payout: u64,
    gear_restored: bool,
}

impl Summary {
    fn new(settlement: &Settlement, ticks: u64) -> Self {
        Self {
            reason: settlement.reason.to_string(),
            ticks,
            highest_wave: settlement.summary.highest_wave,
            kills: settlement.summary.total_kills,
            balance: settlement.summary.balance,
            end_bonus: settlement.end_bonus,
            payout: settlement.payout,
            gear_restored: settlement.gear == GearRestore::Restored,
        }
    }
}

fn relay_notifications(sandbox: &Sandbox) {
    for notification in sandbox.notifier.drain() {
        match notification {
            Notification::Direct { owner, message } => {
                info!(target: "horde_survival::notify", %owner, "{message}");
            }
            Notification::Broadcast { message } => {
                info!(target: "horde_survival::broadcast", "{message}");
            }
        }
    }
}

/// Entry point for the Horde Survival simulator.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(DEFAULT_FILTER, args.log_json);

    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => HordeConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.waves.seed = seed;
    }

    let sandbox = Sandbox::new();
    let owner = OwnerId::new(1);
    sandbox.join(owner, config.arena.exit);
    let mut engine = HordeEngine::new(config, sandbox.ports());
    let _ = engine
        .enter(owner)
        .context("could not create a horde instance")?;

    let start = Instant::now();
    let mut orders = args.orders.clone();
    let mut ticks: u64 = 0;
    let settlement = loop {
        if ticks >= args.max_ticks {
            bail!(
                "wave {} was not cleared within {} ticks",
                args.target_wave,
                args.max_ticks
            );
        }
        let now = start + Duration::from_millis(ticks.saturating_mul(args.tick_ms));
        ticks += 1;

        let mut report = engine.tick(now);
        relay_notifications(&sandbox);
        if let Some(settlement) = report.settlements.pop() {
            break settlement;
        }

        if !report.waves_cleared.is_empty() {
            orders.retain(|order| {
                engine
                    .registry()
                    .purchase(owner, order.category, order.index)
                    .is_err()
            });
        }
        if report
            .waves_cleared
            .iter()
            .any(|(_, clear)| clear.wave >= args.target_wave)
        {
            let settlement = engine
                .registry()
                .manual_exit(owner)
                .context("session disappeared before the manual exit")?;
            break settlement;
        }

        for entity in sandbox
            .world
            .entity_ids()
            .into_iter()
            .take(args.kills_per_tick)
        {
            if sandbox.world.kill(entity) {
                let _ = engine.registry().on_hostile_entity_killed(entity);
            }
        }
    };
    relay_notifications(&sandbox);

    let summary = Summary::new(&settlement, ticks);
    println!(
        "{}",
        toml::to_string(&summary).context("failed to render session summary")?
    );

    let _ = engine.shutdown();
    Ok(())
}
