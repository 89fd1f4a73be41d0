//! # Items
//!
//! Equipment, consumables and the stat bonuses they carry.

use crate::{DiceRoll, EntityId, StatusKind};
use serde::{Deserialize, Serialize};

/// Item quality tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// All tiers in ascending order.
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Multiplier applied to template value and bonuses.
    pub fn multiplier(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.25,
            Rarity::Rare => 1.6,
            Rarity::Epic => 2.0,
            Rarity::Legendary => 2.75,
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }
}

/// Equipment slots on a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Accessory,
}

/// Additive stat modifiers shared by items, buffs and relics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBonuses {
    pub attack: i32,
    pub defense: i32,
    pub max_health: i32,
    pub max_mana: i32,
    pub speed: i32,
    pub crit_chance: f64,
}

impl StatBonuses {
    /// Bonus that only raises attack.
    pub fn attack(amount: i32) -> Self {
        Self {
            attack: amount,
            ..Self::default()
        }
    }

    /// Bonus that only raises defense.
    pub fn defense(amount: i32) -> Self {
        Self {
            defense: amount,
            ..Self::default()
        }
    }

    /// Scales every integer field, rounding to nearest.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |value: i32| (value as f64 * factor).round() as i32;
        Self {
            attack: scale(self.attack),
            defense: scale(self.defense),
            max_health: scale(self.max_health),
            max_mana: scale(self.max_mana),
            speed: scale(self.speed),
            crit_chance: self.crit_chance * factor,
        }
    }
}

impl std::ops::Add for StatBonuses {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            attack: self.attack + other.attack,
            defense: self.defense + other.defense,
            max_health: self.max_health + other.max_health,
            max_mana: self.max_mana + other.max_mana,
            speed: self.speed + other.speed,
            crit_chance: self.crit_chance + other.crit_chance,
        }
    }
}

impl std::iter::Sum for StatBonuses {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, bonus| acc + bonus)
    }
}

/// Effect rolled when an equipped item lands a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OnHitKind {
    /// Heals the wielder for a percentage of damage dealt
    Lifesteal { percent: u32 },
    /// Applies a damage-over-time or control status to the target
    Inflict {
        status: StatusKind,
        turns: u32,
        magnitude: i32,
    },
}

/// An on-hit effect and its proc chance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnHitEffect {
    pub kind: OnHitKind,
    pub chance: f64,
}

/// What a consumable does when used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConsumableEffect {
    Heal(i32),
    RestoreMana(i32),
    /// Temporary stat boost for a number of turns
    Empower { bonuses: StatBonuses, turns: u32 },
    /// Removes every status effect
    Cleanse,
}

/// Item category with category-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon { damage: DiceRoll },
    Armor,
    Accessory,
    Consumable(ConsumableEffect),
}

/// A concrete item instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique per instance; clones get a fresh id
    pub id: EntityId,
    /// Template key shared by every copy of this item
    pub template_id: String,
    pub name: String,
    pub kind: ItemKind,
    pub rarity: Rarity,
    /// Dungeon level the item was generated for
    pub level: u32,
    /// Base gold value
    pub value: u32,
    pub bonuses: StatBonuses,
    pub on_hit: Option<OnHitEffect>,
}

impl Item {
    /// Slot this item occupies, if it is equipment.
    pub fn slot(&self) -> Option<EquipSlot> {
        match self.kind {
            ItemKind::Weapon { .. } => Some(EquipSlot::Weapon),
            ItemKind::Armor => Some(EquipSlot::Armor),
            ItemKind::Accessory => Some(EquipSlot::Accessory),
            ItemKind::Consumable(_) => None,
        }
    }

    /// Whether this item can be equipped.
    pub fn is_equipment(&self) -> bool {
        self.slot().is_some()
    }

    /// Whether this item is used up on use.
    pub fn is_consumable(&self) -> bool {
        matches!(self.kind, ItemKind::Consumable(_))
    }

    /// Weapon damage dice, if this is a weapon.
    pub fn weapon_damage(&self) -> Option<DiceRoll> {
        match self.kind {
            ItemKind::Weapon { damage } => Some(damage),
            _ => None,
        }
    }

    /// Gold received when selling.
    pub fn sell_price(&self) -> u32 {
        self.value / 2
    }
}

/// A player's three equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub accessory: Option<Item>,
}

impl Equipment {
    /// Item in the given slot.
    pub fn get(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
            EquipSlot::Accessory => self.accessory.as_ref(),
        }
    }

    /// Places an item, returning whatever it displaced.
    pub fn set(&mut self, slot: EquipSlot, item: Option<Item>) -> Option<Item> {
        let target = match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::Accessory => &mut self.accessory,
        };
        std::mem::replace(target, item)
    }

    /// Every equipped item.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        [&self.weapon, &self.armor, &self.accessory]
            .into_iter()
            .filter_map(|slot| slot.as_ref())
    }

    /// Sum of all equipped bonuses.
    pub fn total_bonuses(&self) -> StatBonuses {
        self.iter().map(|item| item.bonuses).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sword() -> Item {
        Item {
            id: Uuid::nil(),
            template_id: "short_sword".to_string(),
            name: "Short Sword".to_string(),
            kind: ItemKind::Weapon {
                damage: DiceRoll::new(1, 6, 0),
            },
            rarity: Rarity::Common,
            level: 1,
            value: 20,
            bonuses: StatBonuses::attack(2),
            on_hit: None,
        }
    }

    #[test]
    fn test_item_slots() {
        let item = sword();
        assert_eq!(item.slot(), Some(EquipSlot::Weapon));
        assert!(item.is_equipment());
        assert!(!item.is_consumable());
        assert_eq!(item.sell_price(), 10);
    }

    #[test]
    fn test_equipment_set_returns_previous() {
        let mut equipment = Equipment::default();
        assert!(equipment.set(EquipSlot::Weapon, Some(sword())).is_none());
        let previous = equipment.set(EquipSlot::Weapon, Some(sword()));
        assert!(previous.is_some());
        assert_eq!(equipment.total_bonuses().attack, 2);
    }

    #[test]
    fn test_bonus_arithmetic() {
        let total: StatBonuses = vec![StatBonuses::attack(2), StatBonuses::defense(3)]
            .into_iter()
            .sum();
        assert_eq!(total.attack, 2);
        assert_eq!(total.defense, 3);
        assert_eq!(StatBonuses::attack(4).scaled(1.5).attack, 6);
    }
}
