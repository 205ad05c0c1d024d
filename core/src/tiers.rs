//! Table-driven description of the hostile entity strength tiers.

/// Behavioural family a tier belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZombieKind {
    /// Slow, weak walker.
    Shambler,
    /// Armed mid-tier fighter.
    Warrior,
    /// Heavy hitter.
    Brute,
    /// Strongest family.
    Elite,
}

impl ZombieKind {
    /// Display label used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shambler => "Zombie",
            Self::Warrior => "Zombie Warrior",
            Self::Brute => "Zombie Brute",
            Self::Elite => "Elite Zombie",
        }
    }

    /// Reward-currency base paid for a kill before wave scaling.
    #[must_use]
    pub const fn kill_reward_base(self) -> u64 {
        match self {
            Self::Shambler => 8,
            Self::Warrior => 12,
            Self::Brute => 15,
            Self::Elite => 35,
        }
    }
}

/// One strength tier of spawnable hostile entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierDefinition {
    /// World type identifier used when registering the entity.
    pub type_id: u16,
    /// Intrinsic strength multiplier applied on top of wave scaling.
    pub strength: f64,
    /// Behavioural family.
    pub kind: ZombieKind,
    /// Hit points before any scaling.
    pub base_hitpoints: u32,
    /// Maximum hit before any scaling.
    pub base_max_hit: u32,
}

impl TierDefinition {
    const fn new(type_id: u16, strength: f64, kind: ZombieKind, hp: u32, max_hit: u32) -> Self {
        Self {
            type_id,
            strength,
            kind,
            base_hitpoints: hp,
            base_max_hit: max_hit,
        }
    }
}

const STANDARD_TIERS: [TierDefinition; 10] = [
    TierDefinition::new(76, 1.0, ZombieKind::Shambler, 20, 2),
    TierDefinition::new(77, 2.0, ZombieKind::Shambler, 22, 2),
    TierDefinition::new(78, 3.0, ZombieKind::Shambler, 24, 3),
    TierDefinition::new(79, 4.0, ZombieKind::Shambler, 26, 3),
    TierDefinition::new(80, 5.0, ZombieKind::Shambler, 28, 4),
    TierDefinition::new(81, 6.0, ZombieKind::Warrior, 30, 4),
    TierDefinition::new(82, 7.0, ZombieKind::Warrior, 32, 5),
    TierDefinition::new(83, 8.0, ZombieKind::Brute, 36, 6),
    TierDefinition::new(84, 9.0, ZombieKind::Brute, 40, 6),
    TierDefinition::new(85, 10.0, ZombieKind::Elite, 45, 8),
];

/// Ordered set of tiers, weakest first.
#[derive(Clone, Debug, PartialEq)]
pub struct TierTable {
    tiers: Vec<TierDefinition>,
}

impl TierTable {
    /// Builds a table from tiers sorted weakest first.
    #[must_use]
    pub fn new(mut tiers: Vec<TierDefinition>) -> Self {
        tiers.sort_by(|a, b| a.strength.total_cmp(&b.strength));
        Self { tiers }
    }

    /// The ten-tier table used by the horde mode.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_TIERS.to_vec())
    }

    /// Number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Reports whether the table holds no tiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tier at the provided index, weakest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TierDefinition> {
        self.tiers.get(index)
    }

    /// Looks up a tier by its world type identifier.
    #[must_use]
    pub fn by_type(&self, type_id: u16) -> Option<&TierDefinition> {
        self.tiers.iter().find(|tier| tier.type_id == type_id)
    }

    /// Reports whether the world type identifier belongs to a horde tier.
    #[must_use]
    pub fn contains_type(&self, type_id: u16) -> bool {
        self.by_type(type_id).is_some()
    }

    /// Iterator over the tiers, weakest first.
    pub fn iter(&self) -> impl Iterator<Item = &TierDefinition> {
        self.tiers.iter()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_ordered_by_strength() {
        let table = TierTable::standard();
        assert_eq!(table.len(), 10);
        let strengths: Vec<f64> = table.iter().map(|tier| tier.strength).collect();
        assert!(strengths.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(table.get(9).map(|tier| tier.kind), Some(ZombieKind::Elite));
    }

    #[test]
    fn type_lookup_recognises_horde_types_only() {
        let table = TierTable::standard();
        assert!(table.contains_type(76));
        assert!(table.contains_type(85));
        assert!(!table.contains_type(1));
    }

    #[test]
    fn unsorted_tiers_are_sorted_on_construction() {
        let table = TierTable::new(vec![
            TierDefinition::new(2, 5.0, ZombieKind::Brute, 10, 1),
            TierDefinition::new(1, 1.0, ZombieKind::Shambler, 10, 1),
        ]);
        assert_eq!(table.get(0).map(|tier| tier.type_id), Some(1));
    }
}
