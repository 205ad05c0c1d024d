#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde Survival engine.
//!
//! This crate defines the vocabulary that connects the authoritative instance
//! state, the pure wave and reward systems, and the adapters that plug the
//! engine into a game server. Collaborators outside the engine (world entity
//! registration, gear containers, message delivery) are reached exclusively
//! through the port traits exported here, so every other crate can be driven
//! by in-memory implementations during tests.

use std::fmt;

use serde::{Deserialize, Serialize};

mod config;
mod gear;
mod ports;
mod tiers;

pub use config::{
    ArenaConfig, GearConfig, HordeConfig, RewardConfig, ShopCatalog, ShopCategory, ShopItem,
    SpecialMilestone, UnknownShopCategory, WaveConfig,
};
pub use gear::{GearSnapshot, ItemContainer, ItemId, ItemStack};
pub use ports::{GearError, GearPort, Notifier, PortError, Ports, WorldPort};
pub use tiers::{TierDefinition, TierTable, ZombieKind};

/// Identity of an actor that can own a horde session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Creates a new owner identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Identity assigned by the world to a registered hostile entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Identifier of a private instance area allocated for one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u32);

impl InstanceId {
    /// Creates a new instance identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Tile position in the game world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal tile coordinate.
    pub x: i32,
    /// Vertical tile coordinate.
    pub y: i32,
    /// Height plane the tile lives on.
    #[serde(default)]
    pub plane: u8,
}

impl Location {
    /// Creates a location on the ground plane.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, plane: 0 }
    }

    /// Returns the location displaced by the provided offset, keeping the plane.
    #[must_use]
    pub const fn offset(self, offset: Offset) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
            plane: self.plane,
        }
    }

    /// Chebyshev distance in tiles, the metric used for leashing and aggression.
    #[must_use]
    pub fn distance(self, other: Location) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

/// Relative displacement applied to a [`Location`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal displacement in tiles.
    pub dx: i32,
    /// Vertical displacement in tiles.
    pub dy: i32,
}

impl Offset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Inclusive axis-aligned bounding region measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Smallest x coordinate inside the region.
    pub min_x: i32,
    /// Largest x coordinate inside the region.
    pub max_x: i32,
    /// Smallest y coordinate inside the region.
    pub min_y: i32,
    /// Largest y coordinate inside the region.
    pub max_y: i32,
}

impl Region {
    /// Creates a region from its inclusive bounds.
    #[must_use]
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Reports whether the location falls inside the region on any plane.
    #[must_use]
    pub const fn contains(&self, location: Location) -> bool {
        location.x >= self.min_x
            && location.x <= self.max_x
            && location.y >= self.min_y
            && location.y <= self.max_y
    }
}

/// Hit points and maximum hit applied to a spawned hostile entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatStats {
    /// Total hit points the entity spawns with.
    pub hitpoints: u32,
    /// Largest damage the entity may deal with a single hit.
    pub max_hit: u32,
}

/// Everything the world needs to register a hostile entity for a session.
#[derive(Clone, Debug, PartialEq)]
pub struct HostileSpawn {
    /// World type identifier of the entity.
    pub type_id: u16,
    /// Display label used in notifications.
    pub label: &'static str,
    /// Tile the entity appears on.
    pub location: Location,
    /// Scaled combat statistics.
    pub stats: CombatStats,
    /// The only actor the entity may engage.
    pub target: OwnerId,
}

/// Read-only description of an entity currently registered in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Identifier assigned by the world.
    pub id: EntityId,
    /// World type identifier of the entity.
    pub type_id: u16,
    /// Tile the entity currently occupies.
    pub location: Location,
}

/// Reasons a horde session may be terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The owner disconnected.
    Logout,
    /// The owner died inside the instance.
    Death,
    /// The owner asked to leave.
    ManualExit,
    /// The server is shutting down.
    Shutdown,
    /// The owner walked out of the instance area.
    LeftArea,
    /// The owner produced no qualifying activity for too long.
    Idle,
    /// The owner is no longer known to the world.
    OwnerGone,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Logout => "Player logged out",
            Self::Death => "Player died",
            Self::ManualExit => "Manual exit",
            Self::Shutdown => "Server shutdown",
            Self::LeftArea => "Left area",
            Self::Idle => "Inactivity timeout",
            Self::OwnerGone => "Player no longer present",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{EndReason, Location, Offset, Region};

    #[test]
    fn distance_uses_largest_axis() {
        let origin = Location::new(10, 10);
        assert_eq!(origin.distance(Location::new(13, 12)), 3);
        assert_eq!(origin.distance(Location::new(4, 11)), 6);
        assert_eq!(origin.distance(origin), 0);
    }

    #[test]
    fn offset_keeps_plane() {
        let mut start = Location::new(100, 200);
        start.plane = 2;
        let moved = start.offset(Offset::new(-15, 15));
        assert_eq!(moved, Location { x: 85, y: 215, plane: 2 });
    }

    #[test]
    fn region_bounds_are_inclusive() {
        let region = Region::new(2360, 2445, 5045, 5125);
        assert!(region.contains(Location::new(2360, 5045)));
        assert!(region.contains(Location::new(2445, 5125)));
        assert!(region.contains(Location::new(2401, 5088)));
        assert!(!region.contains(Location::new(2359, 5088)));
        assert!(!region.contains(Location::new(2401, 5126)));
    }

    #[test]
    fn end_reasons_render_for_players() {
        assert_eq!(EndReason::Logout.to_string(), "Player logged out");
        assert_eq!(EndReason::Death.to_string(), "Player died");
        assert_eq!(EndReason::Shutdown.to_string(), "Server shutdown");
    }
}
