//! # Loot Generation
//!
//! Item templates, level-scaled rarity rolls and the generators built on
//! them: room loot, shop stock and class starting kits.

use crate::{
    with_rng, ConsumableEffect, DiceRoll, Equipment, GameRng, Item, ItemKind, OnHitEffect,
    OnHitKind, PlayerClass, Rarity, ShopEntry, StatBonuses, StatusKind,
};
use log::debug;

/// Static description an item instance is rolled from.
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ItemKind,
    /// Earliest dungeon level the template drops on
    pub min_level: u32,
    /// Lowest rarity the template can roll at
    pub rarity_floor: Rarity,
    pub base_value: u32,
    pub bonuses: StatBonuses,
    pub on_hit: Option<OnHitEffect>,
}

const fn bonuses(
    attack: i32,
    defense: i32,
    max_health: i32,
    max_mana: i32,
    speed: i32,
    crit_chance: f64,
) -> StatBonuses {
    StatBonuses {
        attack,
        defense,
        max_health,
        max_mana,
        speed,
        crit_chance,
    }
}

const NO_BONUS: StatBonuses = bonuses(0, 0, 0, 0, 0, 0.0);

const fn weapon(count: u32, sides: u32) -> ItemKind {
    ItemKind::Weapon {
        damage: DiceRoll::new(count, sides, 0),
    }
}

const fn inflict(status: StatusKind, turns: u32, magnitude: i32, chance: f64) -> Option<OnHitEffect> {
    Some(OnHitEffect {
        kind: OnHitKind::Inflict {
            status,
            turns,
            magnitude,
        },
        chance,
    })
}

/// Every item the dungeon can produce.
pub const ITEM_TEMPLATES: &[ItemTemplate] = &[
    // Weapons
    ItemTemplate {
        id: "dagger",
        name: "Dagger",
        kind: weapon(1, 4),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 12,
        bonuses: bonuses(0, 0, 0, 0, 1, 0.05),
        on_hit: None,
    },
    ItemTemplate {
        id: "short_sword",
        name: "Short Sword",
        kind: weapon(1, 6),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 15,
        bonuses: bonuses(1, 0, 0, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "longsword",
        name: "Longsword",
        kind: weapon(1, 8),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 25,
        bonuses: bonuses(2, 0, 0, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "bone_wand",
        name: "Bone Wand",
        kind: weapon(1, 6),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 20,
        bonuses: bonuses(1, 0, 0, 10, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "venom_fang",
        name: "Venom Fang",
        kind: weapon(1, 6),
        min_level: 4,
        rarity_floor: Rarity::Uncommon,
        base_value: 45,
        bonuses: bonuses(2, 0, 0, 0, 1, 0.0),
        on_hit: inflict(StatusKind::Poison, 3, 3, 0.35),
    },
    ItemTemplate {
        id: "war_axe",
        name: "War Axe",
        kind: weapon(1, 10),
        min_level: 5,
        rarity_floor: Rarity::Common,
        base_value: 50,
        bonuses: bonuses(3, 0, 0, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "flame_brand",
        name: "Flame Brand",
        kind: weapon(1, 8),
        min_level: 7,
        rarity_floor: Rarity::Rare,
        base_value: 80,
        bonuses: bonuses(3, 0, 0, 0, 0, 0.0),
        on_hit: inflict(StatusKind::Burn, 2, 4, 0.25),
    },
    ItemTemplate {
        id: "vampiric_blade",
        name: "Vampiric Blade",
        kind: weapon(1, 8),
        min_level: 9,
        rarity_floor: Rarity::Rare,
        base_value: 95,
        bonuses: bonuses(2, 0, 0, 0, 0, 0.0),
        on_hit: Some(OnHitEffect {
            kind: OnHitKind::Lifesteal { percent: 25 },
            chance: 0.3,
        }),
    },
    ItemTemplate {
        id: "frost_maul",
        name: "Frost Maul",
        kind: weapon(2, 6),
        min_level: 11,
        rarity_floor: Rarity::Rare,
        base_value: 110,
        bonuses: bonuses(4, 0, 0, 0, -1, 0.0),
        on_hit: inflict(StatusKind::Freeze, 1, 0, 0.15),
    },
    ItemTemplate {
        id: "stormcaller",
        name: "Stormcaller",
        kind: weapon(2, 8),
        min_level: 14,
        rarity_floor: Rarity::Epic,
        base_value: 160,
        bonuses: bonuses(6, 0, 0, 0, 1, 0.05),
        on_hit: inflict(StatusKind::Stun, 1, 0, 0.1),
    },
    // Armor
    ItemTemplate {
        id: "padded_robe",
        name: "Padded Robe",
        kind: ItemKind::Armor,
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 10,
        bonuses: bonuses(0, 1, 0, 10, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "leather_armor",
        name: "Leather Armor",
        kind: ItemKind::Armor,
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 15,
        bonuses: bonuses(0, 2, 0, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "chainmail",
        name: "Chainmail",
        kind: ItemKind::Armor,
        min_level: 4,
        rarity_floor: Rarity::Common,
        base_value: 40,
        bonuses: bonuses(0, 4, 0, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "scale_mail",
        name: "Scale Mail",
        kind: ItemKind::Armor,
        min_level: 8,
        rarity_floor: Rarity::Uncommon,
        base_value: 70,
        bonuses: bonuses(0, 6, 10, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "plate_armor",
        name: "Plate Armor",
        kind: ItemKind::Armor,
        min_level: 12,
        rarity_floor: Rarity::Rare,
        base_value: 120,
        bonuses: bonuses(0, 8, 20, 0, -1, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "dragonscale",
        name: "Dragonscale Hauberk",
        kind: ItemKind::Armor,
        min_level: 16,
        rarity_floor: Rarity::Epic,
        base_value: 180,
        bonuses: bonuses(0, 10, 30, 0, 0, 0.0),
        on_hit: None,
    },
    // Accessories
    ItemTemplate {
        id: "ring_of_vigor",
        name: "Ring of Vigor",
        kind: ItemKind::Accessory,
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 30,
        bonuses: bonuses(0, 0, 15, 0, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "amulet_of_focus",
        name: "Amulet of Focus",
        kind: ItemKind::Accessory,
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 30,
        bonuses: bonuses(0, 0, 0, 15, 0, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "swift_boots",
        name: "Swift Boots",
        kind: ItemKind::Accessory,
        min_level: 3,
        rarity_floor: Rarity::Uncommon,
        base_value: 40,
        bonuses: bonuses(0, 0, 0, 0, 2, 0.0),
        on_hit: None,
    },
    ItemTemplate {
        id: "lucky_charm",
        name: "Lucky Charm",
        kind: ItemKind::Accessory,
        min_level: 5,
        rarity_floor: Rarity::Uncommon,
        base_value: 55,
        bonuses: bonuses(0, 0, 0, 0, 0, 0.08),
        on_hit: None,
    },
    ItemTemplate {
        id: "band_of_might",
        name: "Band of Might",
        kind: ItemKind::Accessory,
        min_level: 9,
        rarity_floor: Rarity::Rare,
        base_value: 90,
        bonuses: bonuses(3, 0, 0, 0, 0, 0.0),
        on_hit: None,
    },
    // Consumables
    ItemTemplate {
        id: "health_potion",
        name: "Health Potion",
        kind: ItemKind::Consumable(ConsumableEffect::Heal(30)),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 10,
        bonuses: NO_BONUS,
        on_hit: None,
    },
    ItemTemplate {
        id: "mana_potion",
        name: "Mana Potion",
        kind: ItemKind::Consumable(ConsumableEffect::RestoreMana(25)),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 10,
        bonuses: NO_BONUS,
        on_hit: None,
    },
    ItemTemplate {
        id: "antidote",
        name: "Antidote",
        kind: ItemKind::Consumable(ConsumableEffect::Cleanse),
        min_level: 1,
        rarity_floor: Rarity::Common,
        base_value: 8,
        bonuses: NO_BONUS,
        on_hit: None,
    },
    ItemTemplate {
        id: "elixir_of_strength",
        name: "Elixir of Strength",
        kind: ItemKind::Consumable(ConsumableEffect::Empower {
            bonuses: bonuses(4, 0, 0, 0, 0, 0.0),
            turns: 3,
        }),
        min_level: 4,
        rarity_floor: Rarity::Common,
        base_value: 25,
        bonuses: NO_BONUS,
        on_hit: None,
    },
    ItemTemplate {
        id: "greater_health_potion",
        name: "Greater Health Potion",
        kind: ItemKind::Consumable(ConsumableEffect::Heal(70)),
        min_level: 8,
        rarity_floor: Rarity::Common,
        base_value: 30,
        bonuses: NO_BONUS,
        on_hit: None,
    },
];

/// Looks up a template by id.
pub fn find_template(id: &str) -> Option<&'static ItemTemplate> {
    ITEM_TEMPLATES.iter().find(|template| template.id == id)
}

/// Rarity weights at a dungeon level. Deeper levels shift weight upward.
pub fn rarity_weights(level: u32) -> [(Rarity, f64); 5] {
    let level = level as f64;
    [
        (Rarity::Common, (60.0 - level * 2.0).max(15.0)),
        (Rarity::Uncommon, 25.0 + level),
        (Rarity::Rare, 10.0 + level),
        (Rarity::Epic, 4.0 + level / 2.0),
        (Rarity::Legendary, 1.0 + level / 4.0),
    ]
}

/// Rolls a rarity for an item dropped at `level`.
pub fn roll_rarity(level: u32, rng: &mut GameRng) -> Rarity {
    let weights = rarity_weights(level);
    rng.weighted_choice(&weights)
        .copied()
        .unwrap_or(Rarity::Common)
}

/// Instantiates a template at a rarity and level.
///
/// Consumables ignore rarity. Equipment scales its bonuses and value by the
/// rarity multiplier and gains a rarity prefix above common.
pub fn instantiate(template: &ItemTemplate, rarity: Rarity, level: u32, rng: &mut GameRng) -> Item {
    let consumable = matches!(template.kind, ItemKind::Consumable(_));
    let rarity = if consumable {
        Rarity::Common
    } else {
        rarity.max(template.rarity_floor)
    };
    let multiplier = rarity.multiplier();
    let value = (template.base_value as f64 * multiplier * (1.0 + level as f64 * 0.05)).round();
    let name = if rarity == Rarity::Common {
        template.name.to_string()
    } else {
        format!("{} {}", rarity.label(), template.name)
    };

    Item {
        id: rng.uuid(),
        template_id: template.id.to_string(),
        name,
        kind: template.kind.clone(),
        rarity,
        level,
        value: value.max(1.0) as u32,
        bonuses: if consumable {
            template.bonuses
        } else {
            template.bonuses.scaled(multiplier)
        },
        on_hit: template.on_hit,
    }
}

/// Templates eligible at a level and rarity, widening when the tier is empty.
fn candidate_templates(level: u32, rarity: Rarity, equipment_only: bool) -> Vec<&'static ItemTemplate> {
    let kind_ok = |template: &ItemTemplate| {
        !equipment_only || !matches!(template.kind, ItemKind::Consumable(_))
    };

    let strict: Vec<_> = ITEM_TEMPLATES
        .iter()
        .filter(|t| kind_ok(t) && t.min_level <= level && t.rarity_floor <= rarity)
        .collect();
    if !strict.is_empty() {
        return strict;
    }

    debug!("No {:?} templates at level {}, widening pool", rarity, level);
    let by_level: Vec<_> = ITEM_TEMPLATES
        .iter()
        .filter(|t| kind_ok(t) && t.min_level <= level)
        .collect();
    if !by_level.is_empty() {
        return by_level;
    }
    ITEM_TEMPLATES.iter().filter(|t| kind_ok(t)).collect()
}

fn roll_item(level: u32, equipment_only: bool, rng: &mut GameRng) -> Option<Item> {
    let rarity = roll_rarity(level, rng);
    let pool = candidate_templates(level, rarity, equipment_only);
    let template = *rng.choice(&pool)?;
    Some(instantiate(template, rarity, level, rng))
}

/// Generates one or two items for a room at `level`.
///
/// With `guarantee_equipment` the first item is always equippable. Without
/// an RNG a fresh entropy-seeded one is used.
///
/// # Examples
///
/// ```
/// use delve::{generate_loot_for_level, GameRng};
///
/// let mut rng = GameRng::from_u64(5);
/// let loot = generate_loot_for_level(3, Some(&mut rng), true);
/// assert!(loot[0].is_equipment());
/// ```
pub fn generate_loot_for_level(
    level: u32,
    rng: Option<&mut GameRng>,
    guarantee_equipment: bool,
) -> Vec<Item> {
    with_rng(rng, |rng| {
        let count = rng.next_int(1, 2);
        let mut loot = Vec::new();
        for index in 0..count {
            let equipment_only = (guarantee_equipment && index == 0) || rng.chance(0.6);
            if let Some(item) = roll_item(level, equipment_only, rng) {
                loot.push(item);
            }
        }
        loot
    })
}

/// Copies an item under a fresh instance id.
pub fn clone_item(item: &Item, rng: Option<&mut GameRng>) -> Item {
    with_rng(rng, |rng| Item {
        id: rng.uuid(),
        ..item.clone()
    })
}

/// Merchant markup over item value.
pub const SHOP_MARKUP: f64 = 1.5;

/// Buy price for an item: value with markup, rounded up.
pub fn shop_price(item: &Item) -> u32 {
    (item.value as f64 * SHOP_MARKUP).ceil() as u32
}

/// Rolls four to six shop entries, always including a health potion.
pub fn generate_shop_inventory(level: u32, rng: &mut GameRng) -> Vec<ShopEntry> {
    let count = rng.next_int(4, 6) as usize;
    let mut entries = Vec::with_capacity(count);

    if let Some(potion) = find_template("health_potion") {
        let item = instantiate(potion, Rarity::Common, level, rng);
        entries.push(ShopEntry::new(item));
    }
    while entries.len() < count {
        let equipment_only = rng.chance(0.5);
        match roll_item(level, equipment_only, rng) {
            Some(item) => entries.push(ShopEntry::new(item)),
            None => break,
        }
    }
    entries
}

/// Equipment and bag contents a new character starts with.
pub fn starting_kit(class: &PlayerClass, rng: &mut GameRng) -> (Equipment, Vec<Item>) {
    let (weapon_id, armor_id) = match class {
        PlayerClass::Fighter => ("longsword", "leather_armor"),
        PlayerClass::Warlock { .. } => ("bone_wand", "padded_robe"),
    };

    let mut make = |id: &str| find_template(id).map(|t| instantiate(t, Rarity::Common, 1, rng));
    let equipment = Equipment {
        weapon: make(weapon_id),
        armor: make(armor_id),
        accessory: None,
    };
    let inventory = ["health_potion", "health_potion", "mana_potion"]
        .into_iter()
        .filter_map(|id| make(id))
        .collect();
    (equipment, inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_ids_are_unique() {
        let mut ids: Vec<_> = ITEM_TEMPLATES.iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ITEM_TEMPLATES.len());
    }

    #[test]
    fn test_rarity_shifts_with_depth() {
        let shallow = rarity_weights(1);
        let deep = rarity_weights(20);
        assert!(deep[0].1 < shallow[0].1);
        assert!(deep[4].1 > shallow[4].1);
    }

    #[test]
    fn test_guaranteed_equipment() {
        let mut rng = GameRng::from_u64(8);
        for level in 1..=20 {
            let loot = generate_loot_for_level(level, Some(&mut rng), true);
            assert!(!loot.is_empty() && loot.len() <= 2);
            assert!(loot[0].is_equipment());
        }
    }

    #[test]
    fn test_loot_is_seed_stable() {
        let a = generate_loot_for_level(6, Some(&mut GameRng::from_u64(77)), false);
        let b = generate_loot_for_level(6, Some(&mut GameRng::from_u64(77)), false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_loot_without_rng() {
        let loot = generate_loot_for_level(2, None, true);
        assert!(loot[0].is_equipment());
    }

    #[test]
    fn test_candidate_pool_respects_rarity_floor() {
        let pool = candidate_templates(1, Rarity::Legendary, true);
        assert!(!pool.is_empty());
        let common = candidate_templates(1, Rarity::Common, true);
        assert!(common.iter().all(|t| t.rarity_floor == Rarity::Common));
        let deep_epic = candidate_templates(20, Rarity::Epic, true);
        assert!(deep_epic.iter().any(|t| t.id == "stormcaller"));
        assert!(!common.iter().any(|t| t.id == "stormcaller"));
    }

    #[test]
    fn test_rarity_prefix_and_scaling() {
        let mut rng = GameRng::from_u64(1);
        let template = find_template("longsword").unwrap();
        let common = instantiate(template, Rarity::Common, 1, &mut rng);
        let rare = instantiate(template, Rarity::Rare, 1, &mut rng);
        assert_eq!(common.name, "Longsword");
        assert!(rare.name.starts_with(Rarity::Rare.label()));
        assert!(rare.bonuses.attack >= common.bonuses.attack);
        assert!(rare.value > common.value);
    }

    #[test]
    fn test_clone_item_gets_fresh_id() {
        let mut rng = GameRng::from_u64(4);
        let item = instantiate(find_template("dagger").unwrap(), Rarity::Common, 1, &mut rng);
        let copy = clone_item(&item, Some(&mut rng));
        assert_ne!(copy.id, item.id);
        assert_eq!(copy.template_id, item.template_id);
        assert_eq!(copy.name, item.name);
    }

    #[test]
    fn test_shop_inventory_shape() {
        let mut rng = GameRng::from_u64(21);
        for level in [1, 8, 15] {
            let stock = generate_shop_inventory(level, &mut rng);
            assert!((4..=6).contains(&stock.len()));
            assert!(stock.iter().any(|e| e.item.template_id == "health_potion"));
            for entry in &stock {
                assert_eq!(entry.price, shop_price(&entry.item));
                assert!(entry.price >= entry.item.value);
            }
        }
    }

    #[test]
    fn test_starting_kits() {
        let mut rng = GameRng::from_u64(2);
        let (fighter, bag) = starting_kit(&PlayerClass::Fighter, &mut rng);
        assert_eq!(fighter.weapon.as_ref().unwrap().template_id, "longsword");
        assert_eq!(bag.len(), 3);

        let (warlock, _) = starting_kit(&PlayerClass::warlock(), &mut rng);
        assert_eq!(warlock.armor.as_ref().unwrap().template_id, "padded_robe");
    }
}
