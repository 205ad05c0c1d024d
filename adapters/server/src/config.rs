//! Loading and validation of the TOML engine configuration.

use std::path::Path;

use anyhow::{Context, Result};
use horde_survival_core::HordeConfig;
use thiserror::Error;

/// Configuration values the engine cannot run with.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Waves could never contain an entity.
    #[error("waves.max_per_wave must be at least 1")]
    EmptyWaves,
    /// A scaling rate is negative or not a number.
    #[error("waves.{name} must be a non-negative number, found {value}")]
    InvalidRate {
        /// Name of the offending field.
        name: &'static str,
        /// Value found in the file.
        value: f64,
    },
    /// The owner would be placed outside their own instance.
    #[error("arena.{name} at {location} lies outside the arena bounds")]
    OutsideArena {
        /// Name of the offending location.
        name: &'static str,
        /// Location found in the file.
        location: String,
    },
    /// The exit would leave the owner inside the instance.
    #[error("arena.exit at {0} lies inside the arena bounds")]
    ExitInsideArena(String),
}

/// Reads, parses, and validates a configuration file.
pub fn load(path: &Path) -> Result<HordeConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parses and validates configuration text.
pub fn parse(contents: &str) -> Result<HordeConfig> {
    let config: HordeConfig =
        toml::from_str(contents).context("failed to parse horde config toml contents")?;
    validate(&config)?;
    Ok(config)
}

/// Checks the invariants the engine relies on.
pub fn validate(config: &HordeConfig) -> Result<(), ConfigError> {
    let waves = &config.waves;
    if waves.max_per_wave == 0 {
        return Err(ConfigError::EmptyWaves);
    }

    for (name, value) in [
        ("base_count", waves.base_count),
        ("count_scaling", waves.count_scaling),
        ("hp_rate", waves.hp_rate),
        ("damage_rate", waves.damage_rate),
    ] {
        if value.is_nan() || value < 0.0 {
            return Err(ConfigError::InvalidRate { name, value });
        }
    }

    let arena = &config.arena;
    for (name, location) in [("center", arena.center), ("entrance", arena.entrance)] {
        if !arena.bounds.contains(location) {
            return Err(ConfigError::OutsideArena {
                name,
                location: location.to_string(),
            });
        }
    }
    if arena.bounds.contains(arena.exit) {
        return Err(ConfigError::ExitInsideArena(arena.exit.to_string()));
    }

    Ok(())
}
