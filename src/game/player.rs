//! # Player
//!
//! The player character: one shared stat/equipment record plus a class tag
//! that carries class-only state (soul shards for warlocks).

use crate::config::{MAX_SOUL_SHARDS, STARTING_GOLD, XP_PER_LEVEL};
use crate::generation::starting_kit;
use crate::{
    ActionResult, CombatStats, Combatant, ConsumableEffect, DelveError, DelveResult, EntityId,
    EquipSlot, Equipment, GameRng, Item, ItemKind, Relic, RelicEffect, StatBonuses,
    StatusEffect,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Playable classes. Class-only state lives on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerClass {
    Fighter,
    Warlock { soul_shards: u32 },
}

impl PlayerClass {
    /// A fresh warlock with no shards.
    pub fn warlock() -> Self {
        PlayerClass::Warlock { soul_shards: 0 }
    }

    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            PlayerClass::Fighter => "Fighter",
            PlayerClass::Warlock { .. } => "Warlock",
        }
    }

    /// Base stats at character level 1.
    pub fn base_stats(&self) -> CombatStats {
        match self {
            PlayerClass::Fighter => CombatStats::new(120, 30, 12, 8, 10).with_crit(0.10, 2.0),
            PlayerClass::Warlock { .. } => CombatStats::new(85, 60, 10, 4, 12).with_crit(0.12, 2.0),
        }
    }

    /// Abilities from the class table.
    pub fn abilities(&self) -> &'static [AbilityId] {
        match self {
            PlayerClass::Fighter => &[
                AbilityId::PowerStrike,
                AbilityId::Cleave,
                AbilityId::ShieldBash,
                AbilityId::SecondWind,
            ],
            PlayerClass::Warlock { .. } => &[
                AbilityId::EldritchBlast,
                AbilityId::Hex,
                AbilityId::DrainLife,
                AbilityId::SoulRend,
            ],
        }
    }
}

impl FromStr for PlayerClass {
    type Err = DelveError;

    fn from_str(s: &str) -> DelveResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "fighter" => Ok(PlayerClass::Fighter),
            "warlock" => Ok(PlayerClass::warlock()),
            other => Err(DelveError::Parse(format!("unknown class '{}'", other))),
        }
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Every ability in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    PowerStrike,
    Cleave,
    ShieldBash,
    SecondWind,
    EldritchBlast,
    Hex,
    DrainLife,
    SoulRend,
}

/// Who an ability hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTarget {
    SingleEnemy,
    AllEnemies,
    Caster,
}

/// Static ability data. Effects are resolved by the combat engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityDef {
    pub id: AbilityId,
    pub name: &'static str,
    pub key: &'static str,
    pub mana_cost: i32,
    pub cooldown: u32,
    pub target: AbilityTarget,
    pub description: &'static str,
}

impl AbilityId {
    /// Every ability, fighter table first.
    pub const ALL: [AbilityId; 8] = [
        AbilityId::PowerStrike,
        AbilityId::Cleave,
        AbilityId::ShieldBash,
        AbilityId::SecondWind,
        AbilityId::EldritchBlast,
        AbilityId::Hex,
        AbilityId::DrainLife,
        AbilityId::SoulRend,
    ];

    /// Static data for this ability.
    pub fn def(self) -> AbilityDef {
        use AbilityTarget::*;
        let (name, key, mana_cost, cooldown, target, description) = match self {
            AbilityId::PowerStrike => (
                "Power Strike",
                "power_strike",
                10,
                2,
                SingleEnemy,
                "150% weapon damage",
            ),
            AbilityId::Cleave => (
                "Cleave",
                "cleave",
                15,
                3,
                AllEnemies,
                "75% weapon damage to every enemy",
            ),
            AbilityId::ShieldBash => (
                "Shield Bash",
                "shield_bash",
                12,
                3,
                SingleEnemy,
                "80% weapon damage and stuns for 1 turn",
            ),
            AbilityId::SecondWind => (
                "Second Wind",
                "second_wind",
                10,
                5,
                Caster,
                "heals 25% of maximum health",
            ),
            AbilityId::EldritchBlast => (
                "Eldritch Blast",
                "eldritch_blast",
                8,
                1,
                SingleEnemy,
                "130% weapon damage",
            ),
            AbilityId::Hex => (
                "Hex",
                "hex",
                10,
                3,
                SingleEnemy,
                "burns for (level + 2) damage over 3 turns",
            ),
            AbilityId::DrainLife => (
                "Drain Life",
                "drain_life",
                15,
                3,
                SingleEnemy,
                "100% weapon damage, heals half the damage dealt",
            ),
            AbilityId::SoulRend => (
                "Soul Rend",
                "soul_rend",
                20,
                4,
                SingleEnemy,
                "100% weapon damage +25% per soul shard consumed",
            ),
        };
        AbilityDef {
            id: self,
            name,
            key,
            mana_cost,
            cooldown,
            target,
            description,
        }
    }
}

impl FromStr for AbilityId {
    type Err = DelveError;

    fn from_str(s: &str) -> DelveResult<Self> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        AbilityId::ALL
            .iter()
            .copied()
            .find(|ability| ability.def().key == wanted)
            .ok_or_else(|| DelveError::Parse(format!("unknown ability '{}'", s)))
    }
}

/// A temporary stat modifier with a turn countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub name: String,
    pub bonuses: StatBonuses,
    pub remaining_turns: u32,
}

impl Buff {
    /// Creates a new buff.
    pub fn new(name: impl Into<String>, bonuses: StatBonuses, remaining_turns: u32) -> Self {
        Self {
            name: name.into(),
            bonuses,
            remaining_turns,
        }
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub class: PlayerClass,
    pub level: u32,
    pub experience: u64,
    pub gold: u32,
    pub stats: CombatStats,
    pub status_effects: Vec<StatusEffect>,
    pub equipment: Equipment,
    pub inventory: Vec<Item>,
    pub relics: Vec<Relic>,
    pub buffs: Vec<Buff>,
    pub cooldowns: BTreeMap<AbilityId, u32>,
}

impl Player {
    /// Creates a level 1 character with the class starting kit.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameRng, Player, PlayerClass};
    ///
    /// let mut rng = GameRng::from_u64(1);
    /// let hero = Player::new("Hero", PlayerClass::Fighter, &mut rng);
    /// assert_eq!(hero.level, 1);
    /// assert!(hero.equipment.weapon.is_some());
    /// ```
    pub fn new(name: impl Into<String>, class: PlayerClass, rng: &mut GameRng) -> Self {
        let (equipment, inventory) = starting_kit(&class, rng);
        let mut player = Self {
            name: name.into(),
            class,
            level: 1,
            experience: 0,
            gold: STARTING_GOLD,
            stats: class.base_stats(),
            status_effects: Vec::new(),
            equipment,
            inventory,
            relics: Vec::new(),
            buffs: Vec::new(),
            cooldowns: BTreeMap::new(),
        };
        player.restore_full();
        player
    }

    /// Equipment, buff and relic bonuses stacked together.
    pub fn total_bonuses(&self) -> StatBonuses {
        let buffs: StatBonuses = self.buffs.iter().map(|buff| buff.bonuses).sum();
        let relics: StatBonuses = self.relics.iter().map(Relic::bonuses).sum();
        self.equipment.total_bonuses() + buffs + relics
    }

    /// Mana cap after bonuses.
    pub fn max_mana(&self) -> i32 {
        (self.stats.max_mana + self.total_bonuses().max_mana).max(0)
    }

    /// Current mana.
    pub fn mana(&self) -> i32 {
        self.stats.mana
    }

    /// Average damage of the equipped weapon, or a bare fist.
    pub fn weapon_average(&self) -> f64 {
        self.equipment
            .weapon
            .as_ref()
            .and_then(Item::weapon_damage)
            .map(|dice| dice.average())
            .unwrap_or(1.5)
    }

    /// Fills health and mana to their caps.
    pub fn restore_full(&mut self) {
        self.stats.health = self.max_health();
        self.stats.mana = self.max_mana();
    }

    /// Restores mana up to the cap. Returns the amount restored.
    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        let before = self.stats.mana;
        self.stats.mana = (self.stats.mana + amount.max(0)).min(self.max_mana());
        self.stats.mana - before
    }

    /// Every ability the player can use: class table plus relic grants.
    pub fn abilities(&self) -> Vec<AbilityId> {
        let mut abilities = self.class.abilities().to_vec();
        for relic in &self.relics {
            if let RelicEffect::GrantAbility(ability) = relic.effect {
                if !abilities.contains(&ability) {
                    abilities.push(ability);
                }
            }
        }
        abilities
    }

    /// Turns left before an ability is ready.
    pub fn cooldown(&self, ability: AbilityId) -> u32 {
        self.cooldowns.get(&ability).copied().unwrap_or(0)
    }

    /// Checks that an ability is known, off cooldown and affordable.
    ///
    /// The error string is the message to show when re-prompting.
    pub fn check_ability(&self, ability: AbilityId) -> Result<AbilityDef, String> {
        let def = ability.def();
        if !self.abilities().contains(&ability) {
            return Err(format!("{} does not know {}", self.name, def.name));
        }
        let cooldown = self.cooldown(ability);
        if cooldown > 0 {
            return Err(format!("{} is on cooldown for {} more turn(s)", def.name, cooldown));
        }
        if self.stats.mana < def.mana_cost {
            return Err(format!(
                "Not enough mana for {} ({} needed, {} available)",
                def.name, def.mana_cost, self.stats.mana
            ));
        }
        Ok(def)
    }

    /// Pays mana and starts the cooldown. Call only after `check_ability`.
    pub fn commit_ability(&mut self, def: &AbilityDef) {
        self.stats.mana -= def.mana_cost;
        if def.cooldown > 0 {
            self.cooldowns.insert(def.id, def.cooldown);
        }
    }

    /// Counts every cooldown down by one turn.
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    /// Counts buffs down by one turn and drops expired ones.
    ///
    /// Returns the names of buffs that ran out.
    pub fn tick_buffs(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        for buff in &mut self.buffs {
            buff.remaining_turns = buff.remaining_turns.saturating_sub(1);
            if buff.remaining_turns == 0 {
                expired.push(buff.name.clone());
            }
        }
        self.buffs.retain(|buff| buff.remaining_turns > 0);
        self.clamp_resources();
        expired
    }

    /// Adds a buff, replacing one with the same name.
    pub fn add_buff(&mut self, buff: Buff) {
        self.buffs.retain(|existing| existing.name != buff.name);
        if buff.remaining_turns > 0 {
            self.buffs.push(buff);
        }
    }

    fn clamp_resources(&mut self) {
        self.stats.health = self.stats.health.min(self.max_health());
        self.stats.mana = self.stats.mana.min(self.max_mana());
    }

    /// Adds an item to the inventory.
    pub fn add_item(&mut self, item: Item) {
        self.inventory.push(item);
    }

    /// Removes an item from the inventory by id.
    pub fn take_item(&mut self, item_id: EntityId) -> Option<Item> {
        let index = self.inventory.iter().position(|item| item.id == item_id)?;
        Some(self.inventory.remove(index))
    }

    /// Finds an inventory item by id.
    pub fn find_item(&self, item_id: EntityId) -> Option<&Item> {
        self.inventory.iter().find(|item| item.id == item_id)
    }

    /// Equips an inventory item, moving the displaced one back to the bag.
    pub fn equip(&mut self, item_id: EntityId) -> ActionResult {
        let slot = match self.find_item(item_id) {
            None => return ActionResult::rejected("Item not found in inventory"),
            Some(item) => match item.slot() {
                Some(slot) => slot,
                None => return ActionResult::rejected(format!("{} cannot be equipped", item.name)),
            },
        };

        let Some(item) = self.take_item(item_id) else {
            return ActionResult::rejected("Item not found in inventory");
        };
        let name = item.name.clone();
        if let Some(previous) = self.equipment.set(slot, Some(item)) {
            self.inventory.push(previous);
        }
        self.clamp_resources();
        ActionResult::success(format!("Equipped {}", name))
    }

    /// Moves the item in `slot` back to the inventory.
    pub fn unequip(&mut self, slot: EquipSlot) -> ActionResult {
        match self.equipment.set(slot, None) {
            Some(item) => {
                let name = item.name.clone();
                self.inventory.push(item);
                self.clamp_resources();
                ActionResult::success(format!("Unequipped {}", name))
            }
            None => ActionResult::rejected("Nothing equipped in that slot"),
        }
    }

    /// Uses a consumable from the inventory.
    pub fn use_item(&mut self, item_id: EntityId) -> ActionResult {
        let effect = match self.find_item(item_id) {
            None => return ActionResult::rejected("Item not found in inventory"),
            Some(item) => match &item.kind {
                ItemKind::Consumable(effect) => *effect,
                _ => return ActionResult::rejected(format!("{} cannot be used", item.name)),
            },
        };

        let Some(item) = self.take_item(item_id) else {
            return ActionResult::rejected("Item not found in inventory");
        };
        let message = match effect {
            ConsumableEffect::Heal(amount) => {
                let healed = self.heal(amount);
                format!("{} restores {} health", item.name, healed)
            }
            ConsumableEffect::RestoreMana(amount) => {
                let restored = self.restore_mana(amount);
                format!("{} restores {} mana", item.name, restored)
            }
            ConsumableEffect::Empower { bonuses, turns } => {
                self.add_buff(Buff::new(item.name.clone(), bonuses, turns));
                format!("{} empowers you for {} turns", item.name, turns)
            }
            ConsumableEffect::Cleanse => {
                self.status_effects.clear();
                format!("{} washes away every affliction", item.name)
            }
        };
        ActionResult::success(message)
    }

    /// Experience needed to reach the next level.
    pub fn xp_to_next_level(&self) -> u64 {
        (self.level as u64 * XP_PER_LEVEL).saturating_sub(self.experience)
    }

    /// Adds experience and applies any level-ups. Returns levels gained.
    pub fn gain_experience(&mut self, amount: u64) -> u32 {
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= self.level as u64 * XP_PER_LEVEL {
            self.experience -= self.level as u64 * XP_PER_LEVEL;
            self.level += 1;
            self.stats.max_health += 10;
            self.stats.max_mana += 5;
            self.stats.attack += 2;
            self.stats.defense += 1;
            gained += 1;
        }
        if gained > 0 {
            self.restore_full();
        }
        gained
    }

    /// Soul shards held, zero for non-warlocks.
    pub fn soul_shards(&self) -> u32 {
        match self.class {
            PlayerClass::Warlock { soul_shards } => soul_shards,
            PlayerClass::Fighter => 0,
        }
    }

    /// Grants a soul shard on a kill if the class collects them.
    pub fn record_kill(&mut self) {
        if let PlayerClass::Warlock { soul_shards } = &mut self.class {
            *soul_shards = (*soul_shards + 1).min(MAX_SOUL_SHARDS);
        }
    }

    /// Consumes all soul shards, returning how many were spent.
    pub fn consume_soul_shards(&mut self) -> u32 {
        match &mut self.class {
            PlayerClass::Warlock { soul_shards } => std::mem::take(soul_shards),
            PlayerClass::Fighter => 0,
        }
    }

    /// Base ids of every owned relic.
    pub fn owned_relic_base_ids(&self) -> Vec<&str> {
        self.relics.iter().map(|relic| relic.base_id.as_str()).collect()
    }

    /// Adds a relic and applies any immediate stat effect.
    pub fn add_relic(&mut self, relic: Relic) {
        let grows_health = matches!(relic.effect, RelicEffect::StatBoost(b) if b.max_health > 0);
        let bonus = relic.bonuses().max_health;
        self.relics.push(relic);
        if grows_health {
            self.stats.health += bonus;
        }
        self.clamp_resources();
    }

    /// Health regenerated at the start of each turn from relics.
    pub fn regeneration_per_turn(&self) -> i32 {
        self.relics
            .iter()
            .map(|relic| match relic.effect {
                RelicEffect::Regeneration { per_turn } => per_turn,
                _ => 0,
            })
            .sum()
    }

    /// Percent of damage dealt returned as health by relics.
    pub fn relic_lifesteal_percent(&self) -> u32 {
        self.relics
            .iter()
            .map(|relic| match relic.effect {
                RelicEffect::Lifesteal { percent } => percent,
                _ => 0,
            })
            .sum()
    }

    /// Flat damage reflected onto attackers.
    pub fn thorns_damage(&self) -> i32 {
        self.relics
            .iter()
            .map(|relic| match relic.effect {
                RelicEffect::Thorns { damage } => damage,
                _ => 0,
            })
            .sum()
    }

    /// Bonus to trap disarm checks: half the level, the accessory's speed
    /// bonus and any relic grants.
    pub fn disarm_bonus(&self) -> i32 {
        let relic_bonus: i32 = self
            .relics
            .iter()
            .map(|relic| match relic.effect {
                RelicEffect::NimbleFingers { disarm_bonus } => disarm_bonus,
                _ => 0,
            })
            .sum();
        let accessory_bonus = self
            .equipment
            .accessory
            .as_ref()
            .map(|item| item.bonuses.speed.max(0))
            .unwrap_or(0);
        self.level as i32 / 2 + accessory_bonus + relic_bonus
    }
}

impl Combatant for Player {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn status_effects(&self) -> &[StatusEffect] {
        &self.status_effects
    }

    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffect> {
        &mut self.status_effects
    }

    fn attack_power(&self) -> i32 {
        let base = self.stats.attack + self.total_bonuses().attack;
        let weapon = self.weapon_average().round() as i32;
        (base + weapon - self.slow_penalty()).max(1)
    }

    fn effective_defense(&self) -> i32 {
        self.stats.defense + self.total_bonuses().defense
    }

    fn effective_speed(&self) -> i32 {
        self.stats.speed + self.total_bonuses().speed
    }

    fn crit_chance(&self) -> f64 {
        (self.stats.crit_chance + self.total_bonuses().crit_chance).clamp(0.0, 1.0)
    }

    fn max_health(&self) -> i32 {
        (self.stats.max_health + self.total_bonuses().max_health).max(1)
    }
}
