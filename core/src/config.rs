//! Tunable parameters for every part of the horde mode.
//!
//! All sections deserialize with defaults so a configuration file only needs
//! to name the values it overrides.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ItemId, ItemStack, Location, Offset, Region};

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HordeConfig {
    /// Instance footprint and key locations.
    pub arena: ArenaConfig,
    /// Wave sizing, scaling, and pacing.
    pub waves: WaveConfig,
    /// Reward-currency formulas.
    pub rewards: RewardConfig,
    /// Reward shop catalog.
    pub shop: ShopCatalog,
    /// Gear swap and payout items.
    pub gear: GearConfig,
}

/// Instance footprint and key locations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Bounding region every instance occupies.
    pub bounds: Region,
    /// Arena center used for spawning and leashing.
    pub center: Location,
    /// Where the owner is placed when the instance is created.
    pub entrance: Location,
    /// Safe location the owner is moved to when the session ends.
    pub exit: Location,
    /// Furthest an entity may stray from the center before being steered back.
    pub leash_radius: u32,
    /// Ring of spawn points relative to the center.
    pub spawn_offsets: Vec<Offset>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            bounds: Region::new(2360, 2445, 5045, 5125),
            center: Location::new(2401, 5088),
            entrance: Location::new(2413, 5117),
            exit: Location::new(2438, 5168),
            leash_radius: 20,
            spawn_offsets: vec![
                Offset::new(-15, -15),
                Offset::new(0, -15),
                Offset::new(15, -15),
                Offset::new(-15, 0),
                Offset::new(15, 0),
                Offset::new(-15, 15),
                Offset::new(0, 15),
                Offset::new(15, 15),
            ],
        }
    }
}

/// Wave sizing, stat scaling, and pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Entities in a wave before per-wave growth.
    pub base_count: f64,
    /// Additional entities per wave number.
    pub count_scaling: f64,
    /// Hard cap on entities per wave.
    pub max_per_wave: u32,
    /// Hit point growth per wave number.
    pub hp_rate: f64,
    /// Damage growth per wave number.
    pub damage_rate: f64,
    /// Seconds between a cleared wave and the next one.
    pub countdown_secs: u32,
    /// Seconds without qualifying activity before a session should end.
    pub idle_timeout_secs: u64,
    /// Seed for spawn placement and tier selection.
    pub seed: u64,
}

impl WaveConfig {
    /// Idle threshold as a duration.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_count: 3.0,
            count_scaling: 0.5,
            max_per_wave: 25,
            hp_rate: 0.1,
            damage_rate: 0.05,
            countdown_secs: 15,
            idle_timeout_secs: 30 * 60,
            seed: 0x5eed_a11e_4b1d_2024,
        }
    }
}

/// A one-time bonus paid when a specific wave is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMilestone {
    /// Wave that triggers the bonus.
    pub wave: u32,
    /// Reward-currency amount paid.
    pub bonus: u64,
}

/// Reward-currency formulas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Flat part of every wave reward.
    pub wave_base: u64,
    /// Linear part of the wave reward, per wave number.
    pub wave_linear: u64,
    /// Waves beyond this number receive diminishing returns.
    pub diminishing_after: u32,
    /// Multiplier falloff per wave past the diminishing threshold.
    pub diminishing_falloff: f64,
    /// Upper bound on any single wave reward.
    pub wave_cap: u64,
    /// Every wave divisible by this number is a milestone.
    pub milestone_interval: u32,
    /// Flat bonus paid on every milestone.
    pub milestone_bonus: u64,
    /// Named waves paying a one-time special bonus.
    pub special_milestones: Vec<SpecialMilestone>,
    /// First wave that can pay the recurring scaling bonus.
    pub recurring_from: u32,
    /// Interval of the recurring scaling bonus.
    pub recurring_interval: u32,
    /// Recurring bonus paid per wave number.
    pub recurring_per_wave: u64,
    /// Participation bonus per highest wave reached.
    pub participation_per_wave: u64,
    /// Cap on the participation bonus.
    pub participation_cap: u64,
    /// Kill reward growth per wave after the first.
    pub kill_wave_growth: f64,
    /// Kill rewards never exceed this multiple of the kind's base.
    pub kill_cap_multiplier: u64,
    /// First wave eligible for a server-wide announcement.
    pub broadcast_from: u32,
    /// Announce every wave divisible by this number from `broadcast_from` on.
    pub broadcast_interval: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            wave_base: 50,
            wave_linear: 25,
            diminishing_after: 20,
            diminishing_falloff: 0.04,
            wave_cap: 600,
            milestone_interval: 10,
            milestone_bonus: 500,
            special_milestones: vec![
                SpecialMilestone {
                    wave: 25,
                    bonus: 2_500,
                },
                SpecialMilestone {
                    wave: 50,
                    bonus: 5_000,
                },
                SpecialMilestone {
                    wave: 100,
                    bonus: 10_000,
                },
            ],
            recurring_from: 150,
            recurring_interval: 50,
            recurring_per_wave: 10,
            participation_per_wave: 5,
            participation_cap: 1_000,
            kill_wave_growth: 0.15,
            kill_cap_multiplier: 5,
            broadcast_from: 50,
            broadcast_interval: 25,
        }
    }
}

/// Gear swap and payout items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearConfig {
    /// Items granted after the owner's gear is swapped out.
    pub starter_kit: Vec<ItemStack>,
    /// Item used to pay out reward currency at session end.
    pub currency_item: ItemId,
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            starter_kit: vec![
                ItemStack::new(ItemId::new(1277), 1),
                ItemStack::new(ItemId::new(1117), 1),
                ItemStack::new(ItemId::new(379), 5),
            ],
            currency_item: ItemId::new(13307),
        }
    }
}

/// Reward shop sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShopCategory {
    /// Swords, whips, and other weapons.
    Weapons,
    /// Helmets, bodies, legs, and boots.
    Armour,
    /// Food, potions, and supplies.
    Consumables,
    /// Accessories and special items.
    Upgrades,
}

impl ShopCategory {
    /// All categories in menu order.
    pub const ALL: [ShopCategory; 4] = [
        Self::Weapons,
        Self::Armour,
        Self::Consumables,
        Self::Upgrades,
    ];
}

impl fmt::Display for ShopCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Weapons => "weapons",
            Self::Armour => "armour",
            Self::Consumables => "consumables",
            Self::Upgrades => "upgrades",
        };
        f.write_str(name)
    }
}

/// Returned when text does not name a shop category.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown shop category `{0}`; use weapons, armour, consumables, or upgrades")]
pub struct UnknownShopCategory(pub String);

impl FromStr for ShopCategory {
    type Err = UnknownShopCategory;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "weapons" | "weapon" => Ok(Self::Weapons),
            "armour" | "armor" => Ok(Self::Armour),
            "consumables" | "food" | "supplies" => Ok(Self::Consumables),
            "upgrades" | "accessories" => Ok(Self::Upgrades),
            _ => Err(UnknownShopCategory(text.to_owned())),
        }
    }
}

/// One purchasable entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    /// Items granted on purchase.
    pub stack: ItemStack,
    /// Price in reward currency.
    pub cost: u64,
    /// Wave the session must have reached.
    pub wave_requirement: u32,
    /// Text shown to the owner.
    pub description: String,
}

impl ShopItem {
    fn new(item: u32, amount: u64, cost: u64, wave_requirement: u32, description: &str) -> Self {
        Self {
            stack: ItemStack::new(ItemId::new(item), amount),
            cost,
            wave_requirement,
            description: description.to_owned(),
        }
    }
}

/// Items for sale, per category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopCatalog {
    /// Weapon entries.
    pub weapons: Vec<ShopItem>,
    /// Armour entries.
    pub armour: Vec<ShopItem>,
    /// Consumable entries.
    pub consumables: Vec<ShopItem>,
    /// Upgrade entries.
    pub upgrades: Vec<ShopItem>,
}

impl ShopCatalog {
    /// Entries listed under a category.
    #[must_use]
    pub fn items(&self, category: ShopCategory) -> &[ShopItem] {
        match category {
            ShopCategory::Weapons => &self.weapons,
            ShopCategory::Armour => &self.armour,
            ShopCategory::Consumables => &self.consumables,
            ShopCategory::Upgrades => &self.upgrades,
        }
    }

    /// Entry at a zero-based index within a category.
    #[must_use]
    pub fn item(&self, category: ShopCategory, index: usize) -> Option<&ShopItem> {
        self.items(category).get(index)
    }
}

impl Default for ShopCatalog {
    fn default() -> Self {
        Self {
            weapons: vec![
                ShopItem::new(1325, 1, 50, 1, "Steel scimitar"),
                ShopItem::new(1339, 1, 150, 3, "Mithril scimitar"),
                ShopItem::new(1345, 1, 350, 5, "Adamant scimitar"),
                ShopItem::new(1333, 1, 750, 8, "Rune scimitar"),
                ShopItem::new(4151, 1, 1_500, 12, "Abyssal whip"),
                ShopItem::new(11694, 1, 2_500, 15, "Armadyl godsword"),
            ],
            armour: vec![
                ShopItem::new(1159, 1, 40, 1, "Steel full helm"),
                ShopItem::new(1119, 1, 80, 1, "Steel platebody"),
                ShopItem::new(1123, 1, 240, 3, "Mithril platebody"),
                ShopItem::new(1127, 1, 560, 5, "Adamant platebody"),
                ShopItem::new(1131, 1, 1_200, 8, "Rune platebody"),
                ShopItem::new(1061, 1, 900, 12, "Dragon boots"),
            ],
            consumables: vec![
                ShopItem::new(385, 5, 25, 1, "5x Sharks"),
                ShopItem::new(385, 10, 45, 1, "10x Sharks"),
                ShopItem::new(2434, 3, 30, 1, "3x Prayer potions"),
                ShopItem::new(2440, 3, 35, 1, "3x Super strength"),
                ShopItem::new(2452, 1, 60, 5, "1x Super combat potion"),
            ],
            upgrades: vec![
                ShopItem::new(1704, 1, 100, 3, "Amulet of strength"),
                ShopItem::new(1712, 1, 250, 5, "Amulet of power"),
                ShopItem::new(1201, 1, 400, 5, "Rune kiteshield"),
                ShopItem::new(6585, 1, 1_000, 12, "Amulet of fury"),
                ShopItem::new(6570, 1, 800, 10, "Fire cape"),
            ],
        }
    }
}
