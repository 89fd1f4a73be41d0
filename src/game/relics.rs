//! # Relics
//!
//! Permanent player modifiers, mostly won by disarming traps.

use crate::{AbilityId, EntityId, StatBonuses};
use serde::{Deserialize, Serialize};

/// What owning a relic does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RelicEffect {
    /// Permanent additive stat bonus
    StatBoost(StatBonuses),
    /// Unlocks an ability outside the player's class table
    GrantAbility(AbilityId),
    /// Heals the player at the start of each of their turns
    Regeneration { per_turn: i32 },
    /// Heals for a share of every hit landed
    Lifesteal { percent: u32 },
    /// Reflects flat damage back at attackers
    Thorns { damage: i32 },
    /// Adds to trap disarm checks
    NimbleFingers { disarm_bonus: i32 },
}

/// An owned relic instance.
///
/// `base_id` names the relic kind and `instance_id` this particular copy, so
/// ownership checks never have to pick ids apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relic {
    pub base_id: String,
    pub instance_id: EntityId,
    pub name: String,
    pub description: String,
    /// 1 (minor) to 3 (major)
    pub tier: u32,
    pub effect: RelicEffect,
}

impl Relic {
    /// Stat bonus contributed by this relic.
    pub fn bonuses(&self) -> StatBonuses {
        match self.effect {
            RelicEffect::StatBoost(bonuses) => bonuses,
            _ => StatBonuses::default(),
        }
    }
}
