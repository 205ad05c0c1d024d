#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure reward-currency formulas for the horde mode.
//!
//! Every function is deterministic in its inputs and has no side effects; the
//! callers decide when to credit the amounts and which notifications to emit.

use horde_survival_core::{RewardConfig, ZombieKind};

/// Breakdown of the bonus paid when a wave is cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MilestoneBonus {
    /// Flat bonus paid on every milestone wave.
    pub fixed: u64,
    /// One-time bonus for a named wave.
    pub special: u64,
    /// Bonus proportional to the wave number for very high recurring waves.
    pub scaling: u64,
}

impl MilestoneBonus {
    /// Sum of every component.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.fixed
            .saturating_add(self.special)
            .saturating_add(self.scaling)
    }

    /// Reports whether nothing is paid.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Stateless reward calculator parameterised by [`RewardConfig`].
#[derive(Clone, Debug, Default)]
pub struct RewardLedger {
    config: RewardConfig,
}

impl RewardLedger {
    /// Creates a ledger using the provided formulas.
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self { config }
    }

    /// Formulas the ledger applies.
    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Currency paid for clearing a wave.
    ///
    /// Linear in the wave number up to the diminishing threshold, then scaled
    /// by `1 / (1 + falloff * waves_past_threshold)`, and always capped.
    #[must_use]
    pub fn wave_reward(&self, wave: u32) -> u64 {
        let config = &self.config;
        let linear = config
            .wave_base
            .saturating_add(config.wave_linear.saturating_mul(u64::from(wave)));

        let reward = if wave > config.diminishing_after {
            let past = f64::from(wave - config.diminishing_after);
            let multiplier = 1.0 / (1.0 + config.diminishing_falloff.max(0.0) * past);
            (linear as f64 * multiplier).round() as u64
        } else {
            linear
        };

        reward.min(config.wave_cap)
    }

    /// Reports whether the wave is a positive multiple of the milestone interval.
    #[must_use]
    pub fn is_milestone(&self, wave: u32) -> bool {
        let interval = self.config.milestone_interval;
        interval != 0 && wave != 0 && wave % interval == 0
    }

    /// Bonus components owed for clearing the wave.
    ///
    /// Named waves pay their special bonus whether or not they fall on the
    /// milestone interval. The recurring scaling bonus never stacks with a
    /// special bonus.
    #[must_use]
    pub fn milestone_bonus(&self, wave: u32) -> MilestoneBonus {
        let config = &self.config;
        let fixed = if self.is_milestone(wave) {
            config.milestone_bonus
        } else {
            0
        };

        let special = config
            .special_milestones
            .iter()
            .find(|milestone| milestone.wave == wave)
            .map_or(0, |milestone| milestone.bonus);

        let recurring = config.recurring_interval != 0
            && wave >= config.recurring_from
            && wave % config.recurring_interval == 0;
        let scaling = if special == 0 && recurring {
            u64::from(wave).saturating_mul(config.recurring_per_wave)
        } else {
            0
        };

        MilestoneBonus {
            fixed,
            special,
            scaling,
        }
    }

    /// Reports whether clearing the wave deserves a server-wide announcement.
    #[must_use]
    pub fn is_broadcast_wave(&self, wave: u32) -> bool {
        let config = &self.config;
        config.broadcast_interval != 0
            && wave >= config.broadcast_from
            && wave % config.broadcast_interval == 0
    }

    /// Participation bonus paid at session end.
    #[must_use]
    pub fn session_end_bonus(&self, highest_wave: u32) -> u64 {
        u64::from(highest_wave)
            .saturating_mul(self.config.participation_per_wave)
            .min(self.config.participation_cap)
    }

    /// Currency paid for killing one entity of the given kind during a wave.
    #[must_use]
    pub fn kill_reward(&self, kind: ZombieKind, wave: u32) -> u64 {
        let base = kind.kill_reward_base();
        let growth = f64::from(wave.saturating_sub(1)) * self.config.kill_wave_growth;
        let reward = (base as f64 * (1.0 + growth)).round() as u64;
        reward.min(base.saturating_mul(self.config.kill_cap_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> RewardLedger {
        RewardLedger::default()
    }

    #[test]
    fn wave_reward_is_monotonic_through_threshold() {
        let ledger = ledger();
        for wave in 1..20 {
            assert!(
                ledger.wave_reward(wave + 1) >= ledger.wave_reward(wave),
                "reward dropped between waves {wave} and {}",
                wave + 1
            );
        }
        assert_eq!(ledger.wave_reward(1), 75);
        assert_eq!(ledger.wave_reward(20), 550);
    }

    #[test]
    fn wave_reward_never_exceeds_cap_after_threshold() {
        let ledger = ledger();
        let cap = ledger.config().wave_cap;
        for wave in 21..=1_000 {
            assert!(ledger.wave_reward(wave) <= cap, "wave {wave} exceeded cap");
        }
        assert_eq!(ledger.wave_reward(500), cap);
    }

    #[test]
    fn diminishing_returns_apply_past_threshold() {
        let ledger = ledger();
        let linear = 50 + 25 * 21;
        assert!(ledger.wave_reward(21) < linear);
        assert_eq!(ledger.wave_reward(21), 553);
    }

    #[test]
    fn milestones_follow_configured_interval() {
        let ledger = RewardLedger::new(RewardConfig {
            milestone_interval: 15,
            ..RewardConfig::default()
        });
        for wave in [15, 30, 45] {
            assert!(ledger.is_milestone(wave), "wave {wave} should be a milestone");
        }
        for wave in [0, 14, 16, 20] {
            assert!(!ledger.is_milestone(wave), "wave {wave} is not a milestone");
        }
    }

    #[test]
    fn zero_interval_disables_milestones() {
        let ledger = RewardLedger::new(RewardConfig {
            milestone_interval: 0,
            ..RewardConfig::default()
        });
        assert!(!ledger.is_milestone(10));
    }

    #[test]
    fn milestone_bonus_combines_fixed_special_and_scaling() {
        let ledger = ledger();

        assert_eq!(
            ledger.milestone_bonus(10),
            MilestoneBonus {
                fixed: 500,
                special: 0,
                scaling: 0,
            }
        );
        assert_eq!(ledger.milestone_bonus(25).total(), 2_500);
        assert_eq!(ledger.milestone_bonus(50).total(), 5_500);
        assert_eq!(ledger.milestone_bonus(100).total(), 10_500);
        assert_eq!(ledger.milestone_bonus(150).total(), 500 + 1_500);
        assert_eq!(ledger.milestone_bonus(200).scaling, 2_000);
        assert!(ledger.milestone_bonus(7).is_empty());
    }

    #[test]
    fn special_bonus_is_larger_than_fixed_bonus() {
        let ledger = ledger();
        for milestone in &ledger.config().special_milestones {
            assert!(milestone.bonus > ledger.config().milestone_bonus);
        }
    }

    #[test]
    fn broadcast_waves_start_at_fifty() {
        let ledger = ledger();
        assert!(!ledger.is_broadcast_wave(25));
        assert!(ledger.is_broadcast_wave(50));
        assert!(ledger.is_broadcast_wave(75));
        assert!(!ledger.is_broadcast_wave(60));
    }

    #[test]
    fn session_end_bonus_is_capped() {
        let ledger = ledger();
        assert_eq!(ledger.session_end_bonus(0), 0);
        assert_eq!(ledger.session_end_bonus(12), 60);
        assert_eq!(ledger.session_end_bonus(200), 1_000);
        assert_eq!(ledger.session_end_bonus(u32::MAX), 1_000);
    }

    #[test]
    fn kill_reward_scales_with_wave_and_caps() {
        let ledger = ledger();
        assert_eq!(ledger.kill_reward(ZombieKind::Shambler, 1), 8);
        assert_eq!(ledger.kill_reward(ZombieKind::Shambler, 0), 8);
        assert_eq!(ledger.kill_reward(ZombieKind::Elite, 3), 46);
        assert_eq!(ledger.kill_reward(ZombieKind::Brute, 1_000), 75);
    }

    #[test]
    fn formulas_are_deterministic() {
        let first = ledger();
        let second = ledger();
        for wave in 0..300 {
            assert_eq!(first.wave_reward(wave), second.wave_reward(wave));
            assert_eq!(first.milestone_bonus(wave), second.milestone_bonus(wave));
        }
    }
}
