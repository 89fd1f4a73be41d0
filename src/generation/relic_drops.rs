//! # Relic Drops
//!
//! The relic table and the reward roll for a successfully disarmed trap.

use crate::{with_rng, AbilityId, GameRng, Relic, RelicEffect, StatBonuses};
use log::debug;

/// A relic kind in the drop table.
#[derive(Debug, Clone, Copy)]
pub struct RelicTemplate {
    pub base_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: u32,
    pub effect: RelicEffect,
}

const fn stat(attack: i32, defense: i32, max_health: i32, speed: i32) -> RelicEffect {
    RelicEffect::StatBoost(StatBonuses {
        attack,
        defense,
        max_health,
        max_mana: 0,
        speed,
        crit_chance: 0.0,
    })
}

pub const RELIC_TABLE: &[RelicTemplate] = &[
    RelicTemplate {
        base_id: "whetstone",
        name: "Whetstone Charm",
        description: "+2 attack",
        tier: 1,
        effect: stat(2, 0, 0, 0),
    },
    RelicTemplate {
        base_id: "iron_skin",
        name: "Iron Skin Talisman",
        description: "+2 defense",
        tier: 1,
        effect: stat(0, 2, 0, 0),
    },
    RelicTemplate {
        base_id: "lockpick_set",
        name: "Silver Lockpicks",
        description: "+3 to trap disarm checks",
        tier: 1,
        effect: RelicEffect::NimbleFingers { disarm_bonus: 3 },
    },
    RelicTemplate {
        base_id: "heart_stone",
        name: "Heart Stone",
        description: "+20 max health",
        tier: 2,
        effect: stat(0, 0, 20, 0),
    },
    RelicTemplate {
        base_id: "troll_blood",
        name: "Vial of Troll Blood",
        description: "Regenerate 3 health each turn",
        tier: 2,
        effect: RelicEffect::Regeneration { per_turn: 3 },
    },
    RelicTemplate {
        base_id: "bramble_mail",
        name: "Bramble Emblem",
        description: "Attackers take 4 damage",
        tier: 2,
        effect: RelicEffect::Thorns { damage: 4 },
    },
    RelicTemplate {
        base_id: "quickening_feather",
        name: "Quickening Feather",
        description: "+3 speed",
        tier: 2,
        effect: stat(0, 0, 0, 3),
    },
    RelicTemplate {
        base_id: "blood_chalice",
        name: "Blood Chalice",
        description: "Heal for 15% of damage dealt",
        tier: 3,
        effect: RelicEffect::Lifesteal { percent: 15 },
    },
    RelicTemplate {
        base_id: "tome_of_cleaving",
        name: "Tome of Cleaving",
        description: "Learn Cleave",
        tier: 3,
        effect: RelicEffect::GrantAbility(AbilityId::Cleave),
    },
    RelicTemplate {
        base_id: "giants_belt",
        name: "Giant's Belt",
        description: "+4 attack, +10 max health",
        tier: 3,
        effect: stat(4, 0, 10, 0),
    },
];

/// Highest relic tier a trap of this difficulty can award.
pub fn max_tier_for(dc: i32, level: u32) -> u32 {
    let base = match dc {
        i32::MIN..=12 => 1,
        13..=16 => 2,
        _ => 3,
    };
    if level >= 12 {
        (base + 1).min(3)
    } else {
        base
    }
}

/// Rolls the relic awarded for disarming a trap.
///
/// Relics whose base id is in `exclude_base_ids` are skipped. When every
/// eligible relic is excluded the exclusion is dropped, then the tier cap,
/// so a relic is always returned.
pub fn generate_trap_relic(
    dc: i32,
    level: u32,
    exclude_base_ids: &[&str],
    rng: Option<&mut GameRng>,
) -> Relic {
    let max_tier = max_tier_for(dc, level);
    let within_tier = |t: &&RelicTemplate| t.tier <= max_tier;
    let not_owned = |t: &&RelicTemplate| !exclude_base_ids.contains(&t.base_id);

    let mut pool: Vec<&RelicTemplate> = RELIC_TABLE.iter().filter(within_tier).filter(not_owned).collect();
    if pool.is_empty() {
        debug!("All tier <= {} relics owned, allowing duplicates", max_tier);
        pool = RELIC_TABLE.iter().filter(within_tier).collect();
    }
    if pool.is_empty() {
        pool = RELIC_TABLE.iter().collect();
    }

    with_rng(rng, |rng| {
        let template = pool[rng.next_index(pool.len())];
        Relic {
            base_id: template.base_id.to_string(),
            instance_id: rng.uuid(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            tier: template.tier,
            effect: template.effect,
        }
    })
}
