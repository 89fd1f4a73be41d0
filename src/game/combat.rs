//! # Combat Engine
//!
//! Turn-based resolution for one encounter.
//!
//! The engine copies the room's enemies when combat starts and works on
//! that copy; the session writes the roster back to the room after every
//! step. Turn order is fixed at the start by speed (the player wins ties)
//! and dead combatants are skipped as turns advance.
//!
//! Each turn has two halves. [`CombatEngine::start_turn`] runs status
//! effects for the acting combatant and may end the fight on its own if a
//! damage-over-time tick is lethal. The action half is either
//! [`CombatEngine::player_action`] or [`CombatEngine::enemy_turn`].

use crate::config::FLEE_CHANCE;
use crate::{
    AbilityId, AbilityTarget, ActionResult, CombatAction, Combatant, DelveError, DelveResult,
    Enemy, GameRng, OnHitEffect, OnHitKind, Player, Room, RoomId, RoomState, RoomType,
    StatusEffect, StatusKind,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Overall state of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStatus {
    InProgress,
    Victory,
    Defeat,
    Fled,
}

/// A position in the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnSlot {
    Player,
    /// Index into the engine's enemy list
    Enemy(usize),
}

/// What happened when a turn started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStart {
    pub actor: TurnSlot,
    /// The turn was lost to incapacitation or death and has already advanced
    pub skipped: bool,
    pub messages: Vec<String>,
}

/// Running totals for the encounter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTally {
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub enemies_defeated: u32,
}

struct Strike {
    dealt: i32,
    crit: bool,
    killed: bool,
    target_name: String,
}

impl Strike {
    fn describe(&self, verb: &str) -> String {
        let mut text = format!("{} {} for {} damage", verb, self.target_name, self.dealt);
        if self.crit {
            text.push_str(" (critical!)");
        }
        if self.killed {
            text.push_str(&format!(". {} falls", self.target_name));
        }
        text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEngine {
    room_id: RoomId,
    room_type: RoomType,
    enemies: Vec<Enemy>,
    turn_order: Vec<TurnSlot>,
    turn_index: usize,
    round: u32,
    turn_started: bool,
    status: CombatStatus,
    flee_chance: f64,
    tally: CombatTally,
    log: Vec<String>,
}

impl CombatEngine {
    /// Starts combat in an active hostile room with loaded, living enemies.
    pub fn start(room: &Room, player: &Player) -> DelveResult<Self> {
        if room.state != RoomState::Active {
            return Err(DelveError::InvalidAction(format!(
                "combat needs an active room, room {} is {}",
                room.id,
                room.state.label()
            )));
        }
        if !room.is_hostile() {
            return Err(DelveError::InvalidAction(format!(
                "room {} ({}) holds no enemies",
                room.id, room.room_type
            )));
        }
        let enemies = room.enemies.get().cloned().ok_or_else(|| {
            DelveError::InvalidAction(format!("enemies of room {} are not loaded", room.id))
        })?;
        if !enemies.iter().any(|enemy| enemy.is_alive()) {
            return Err(DelveError::InvalidAction(format!(
                "room {} has no living enemies",
                room.id
            )));
        }

        let mut turn_order = vec![TurnSlot::Player];
        turn_order.extend(
            enemies
                .iter()
                .enumerate()
                .filter(|(_, enemy)| enemy.is_alive())
                .map(|(index, _)| TurnSlot::Enemy(index)),
        );
        // Stable sort keeps the player ahead of equally fast enemies.
        turn_order.sort_by_key(|slot| {
            Reverse(match slot {
                TurnSlot::Player => player.effective_speed(),
                TurnSlot::Enemy(index) => enemies[*index].effective_speed(),
            })
        });

        let names: Vec<&str> = enemies.iter().map(|enemy| enemy.name.as_str()).collect();
        let opening = format!("Combat begins against {}", names.join(", "));
        debug!("Room {}: {}", room.id, opening);

        Ok(Self {
            room_id: room.id,
            room_type: room.room_type,
            enemies,
            turn_order,
            turn_index: 0,
            round: 1,
            turn_started: false,
            status: CombatStatus::InProgress,
            flee_chance: FLEE_CHANCE,
            tally: CombatTally::default(),
            log: vec![opening],
        })
    }

    /// Overrides the flee success chance.
    pub fn with_flee_chance(mut self, chance: f64) -> Self {
        self.flee_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn status(&self) -> CombatStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != CombatStatus::InProgress
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn turn_order(&self) -> &[TurnSlot] {
        &self.turn_order
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn tally(&self) -> CombatTally {
        self.tally
    }

    /// Every message the encounter has produced.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The combatant whose turn it is.
    pub fn current_actor(&self) -> Option<TurnSlot> {
        self.turn_order.get(self.turn_index).copied()
    }

    /// Whether the player may act right now.
    pub fn awaiting_player(&self) -> bool {
        self.status == CombatStatus::InProgress
            && self.turn_started
            && self.current_actor() == Some(TurnSlot::Player)
    }

    /// Living enemy indices.
    pub fn living_targets(&self) -> Vec<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_alive())
            .map(|(index, _)| index)
            .collect()
    }

    fn is_living_target(&self, index: usize) -> bool {
        self.enemies.get(index).map(|e| e.is_alive()).unwrap_or(false)
    }

    fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("[combat r{}] {}", self.round, message);
        self.log.push(message);
    }

    fn ensure_in_progress(&self) -> DelveResult<()> {
        if self.is_over() {
            Err(DelveError::InvalidAction(format!(
                "combat is over ({:?})",
                self.status
            )))
        } else {
            Ok(())
        }
    }

    /// Re-evaluates the outcome. Defeat takes precedence over victory.
    fn update_status(&mut self, player: &Player) {
        if self.status != CombatStatus::InProgress {
            return;
        }
        if !player.is_alive() {
            self.status = CombatStatus::Defeat;
            self.record(format!("{} has fallen", player.name));
        } else if !self.enemies.iter().any(|enemy| enemy.is_alive()) {
            self.status = CombatStatus::Victory;
            self.record("Victory!");
        }
    }

    fn slot_alive(&self, slot: TurnSlot) -> bool {
        match slot {
            TurnSlot::Player => true,
            TurnSlot::Enemy(index) => self.is_living_target(index),
        }
    }

    /// Moves to the next living combatant, wrapping into a new round.
    pub fn advance_turn(&mut self) {
        self.turn_started = false;
        if self.is_over() || self.turn_order.is_empty() {
            return;
        }
        for _ in 0..self.turn_order.len() {
            self.turn_index += 1;
            if self.turn_index >= self.turn_order.len() {
                self.turn_index = 0;
                self.round += 1;
            }
            if self.slot_alive(self.turn_order[self.turn_index]) {
                return;
            }
        }
    }

    fn on_enemy_defeated(&mut self, player: &mut Player) {
        self.tally.enemies_defeated += 1;
        player.record_kill();
    }

    /// Runs start-of-turn effects for the current combatant.
    ///
    /// Damage-over-time lands first, then incapacitation is checked. The
    /// player's cooldowns, buffs and relic regeneration also tick here. If
    /// the actor dies or is incapacitated the turn is skipped and the engine
    /// advances on its own.
    pub fn start_turn(&mut self, player: &mut Player) -> DelveResult<TurnStart> {
        self.ensure_in_progress()?;
        if self.turn_started {
            return Err(DelveError::InvalidState("turn already started".to_string()));
        }
        let actor = self
            .current_actor()
            .ok_or_else(|| DelveError::InvalidState("empty turn order".to_string()))?;

        let mut messages = Vec::new();
        let (tick, alive, name) = match actor {
            TurnSlot::Player => {
                let tick = player.tick_status_effects();
                if tick.damage > 0 {
                    self.tally.damage_taken += tick.damage as u64;
                    messages.push(format!("{} suffers {} damage from afflictions", player.name, tick.damage));
                }
                player.tick_cooldowns();
                for buff in player.tick_buffs() {
                    messages.push(format!("{} fades", buff));
                }
                let regen = player.regeneration_per_turn();
                if regen > 0 && player.is_alive() {
                    let healed = player.heal(regen);
                    if healed > 0 {
                        messages.push(format!("{} regenerates {} health", player.name, healed));
                    }
                }
                (tick, player.is_alive(), player.name.clone())
            }
            TurnSlot::Enemy(index) => {
                let enemy = &mut self.enemies[index];
                let was_alive = enemy.is_alive();
                let tick = enemy.tick_status_effects();
                enemy.special_cooldown = enemy.special_cooldown.saturating_sub(1);
                if tick.damage > 0 {
                    messages.push(format!("{} suffers {} damage from afflictions", enemy.name, tick.damage));
                }
                let alive = enemy.is_alive();
                let name = enemy.name.clone();
                self.tally.damage_dealt += tick.damage as u64;
                if was_alive && !alive {
                    messages.push(format!("{} succumbs", name));
                    self.on_enemy_defeated(player);
                }
                (tick, alive, name)
            }
        };
        for kind in &tick.expired {
            messages.push(format!("{} is no longer {}", name, kind.label()));
        }
        for message in &messages {
            self.record(message.clone());
        }
        self.update_status(player);

        let skipped = self.is_over() || !alive || tick.incapacitated;
        if !skipped {
            self.turn_started = true;
        } else if !self.is_over() {
            if alive {
                let text = format!("{} is incapacitated and loses the turn", name);
                self.record(text.clone());
                messages.push(text);
            }
            self.advance_turn();
        }

        Ok(TurnStart {
            actor,
            skipped,
            messages,
        })
    }

    /// Resolves the player's chosen action.
    ///
    /// Errors when it is not the player's turn. Invalid choices (bad target,
    /// unaffordable ability, unknown item, fleeing a boss) come back as a
    /// rejected [`ActionResult`] and the player keeps the turn.
    pub fn player_action(
        &mut self,
        action: CombatAction,
        player: &mut Player,
        rng: &mut GameRng,
    ) -> DelveResult<ActionResult> {
        self.ensure_in_progress()?;
        if self.current_actor() != Some(TurnSlot::Player) {
            return Err(DelveError::InvalidAction("it is not the player's turn".to_string()));
        }
        if !self.turn_started {
            return Err(DelveError::InvalidState("player turn has not started".to_string()));
        }

        let result = match action {
            CombatAction::Attack { target } => self.player_attack(target, player, rng),
            CombatAction::Ability { ability, target } => self.player_ability(ability, target, player, rng),
            CombatAction::UseItem { item_id } => player.use_item(item_id),
            CombatAction::Flee => self.attempt_flee(rng),
        };
        self.record(result.message.clone());

        if result.turn_consumed {
            self.update_status(player);
            self.advance_turn();
        }
        Ok(result)
    }

    fn strike(&mut self, target: usize, multiplier: f64, player: &mut Player, rng: &mut GameRng) -> Strike {
        let mut raw = (player.attack_power() as f64 * multiplier).round() as i32;
        let crit = rng.chance(player.crit_chance());
        if crit {
            raw = (raw as f64 * player.crit_multiplier()).round() as i32;
        }

        let enemy = &mut self.enemies[target];
        let dealt = enemy.receive_damage(raw);
        let killed = !enemy.is_alive();
        let target_name = enemy.name.clone();
        self.tally.damage_dealt += dealt as u64;

        let lifesteal = player.relic_lifesteal_percent();
        if lifesteal > 0 {
            player.heal(dealt * lifesteal as i32 / 100);
        }
        if killed {
            self.on_enemy_defeated(player);
        }
        Strike {
            dealt,
            crit,
            killed,
            target_name,
        }
    }

    fn player_attack(&mut self, target: usize, player: &mut Player, rng: &mut GameRng) -> ActionResult {
        if !self.is_living_target(target) {
            return ActionResult::rejected("No living enemy at that position");
        }
        let strike = self.strike(target, 1.0, player, rng);
        let mut message = strike.describe("You hit");

        let procs: Vec<OnHitEffect> = player.equipment.iter().filter_map(|item| item.on_hit).collect();
        for effect in procs {
            if !rng.chance(effect.chance) {
                continue;
            }
            match effect.kind {
                OnHitKind::Lifesteal { percent } => {
                    let healed = player.heal(strike.dealt * percent as i32 / 100);
                    if healed > 0 {
                        message.push_str(&format!(". You drain {} health", healed));
                    }
                }
                OnHitKind::Inflict {
                    status,
                    turns,
                    magnitude,
                } => {
                    let enemy = &mut self.enemies[target];
                    if enemy.is_alive() {
                        enemy.apply_status(StatusEffect::new(status, turns, magnitude));
                        message.push_str(&format!(". {} is {}", enemy.name, status.label()));
                    }
                }
            }
        }
        ActionResult::success(message)
    }

    fn player_ability(
        &mut self,
        ability: AbilityId,
        target: Option<usize>,
        player: &mut Player,
        rng: &mut GameRng,
    ) -> ActionResult {
        let def = match player.check_ability(ability) {
            Ok(def) => def,
            Err(reason) => return ActionResult::rejected(reason),
        };
        let target = match (def.target, target) {
            (AbilityTarget::SingleEnemy, Some(index)) if self.is_living_target(index) => index,
            (AbilityTarget::SingleEnemy, Some(_)) => {
                return ActionResult::rejected("No living enemy at that position")
            }
            (AbilityTarget::SingleEnemy, None) => match self.living_targets().first() {
                Some(&index) => index,
                None => return ActionResult::rejected("There is nothing to target"),
            },
            _ => 0,
        };
        player.commit_ability(&def);

        let message = match ability {
            AbilityId::PowerStrike => self.strike(target, 1.5, player, rng).describe("Power Strike hits"),
            AbilityId::EldritchBlast => self.strike(target, 1.3, player, rng).describe("Eldritch Blast sears"),
            AbilityId::Cleave => {
                let hits: Vec<String> = self
                    .living_targets()
                    .into_iter()
                    .map(|index| self.strike(index, 0.75, player, rng).describe("Cleave hits"))
                    .collect();
                hits.join(". ")
            }
            AbilityId::ShieldBash => {
                let strike = self.strike(target, 0.8, player, rng);
                let mut text = strike.describe("Shield Bash slams");
                if !strike.killed {
                    self.enemies[target].apply_status(StatusEffect::new(StatusKind::Stun, 1, 0));
                    text.push_str(&format!(". {} is stunned", strike.target_name));
                }
                text
            }
            AbilityId::SecondWind => {
                let amount = (player.max_health() as f64 * 0.25).round() as i32;
                let healed = player.heal(amount);
                format!("Second Wind restores {} health", healed)
            }
            AbilityId::Hex => {
                let magnitude = player.level as i32 + 2;
                let enemy = &mut self.enemies[target];
                enemy.apply_status(StatusEffect::new(StatusKind::Burn, 3, magnitude));
                format!("{} is hexed and begins to burn", enemy.name)
            }
            AbilityId::DrainLife => {
                let strike = self.strike(target, 1.0, player, rng);
                let healed = player.heal(strike.dealt / 2);
                format!("{}. You drain {} health", strike.describe("Drain Life siphons"), healed)
            }
            AbilityId::SoulRend => {
                let shards = player.consume_soul_shards();
                let strike = self.strike(target, 1.0 + 0.25 * shards as f64, player, rng);
                format!("{} ({} soul shards consumed)", strike.describe("Soul Rend tears"), shards)
            }
        };
        ActionResult::success(message)
    }

    fn attempt_flee(&mut self, rng: &mut GameRng) -> ActionResult {
        if self.room_type == RoomType::Boss {
            return ActionResult::rejected("There is no escape from this foe");
        }
        if rng.chance(self.flee_chance) {
            self.status = CombatStatus::Fled;
            ActionResult::success("You escape")
        } else {
            ActionResult::failed("You fail to escape")
        }
    }

    /// Resolves the current enemy's action with a simple AI: use the
    /// special when it is ready and its use roll passes, otherwise attack.
    pub fn enemy_turn(&mut self, player: &mut Player, rng: &mut GameRng) -> DelveResult<ActionResult> {
        self.ensure_in_progress()?;
        let Some(TurnSlot::Enemy(index)) = self.current_actor() else {
            return Err(DelveError::InvalidAction("it is not an enemy's turn".to_string()));
        };
        if !self.turn_started {
            return Err(DelveError::InvalidState("enemy turn has not started".to_string()));
        }

        let result = self.enemy_act(index, player, rng);
        self.record(result.message.clone());
        self.update_status(player);
        self.advance_turn();
        Ok(result)
    }

    fn enemy_act(&mut self, index: usize, player: &mut Player, rng: &mut GameRng) -> ActionResult {
        let enemy = &self.enemies[index];
        let special = enemy
            .special
            .clone()
            .filter(|special| enemy.special_ready() && rng.chance(special.use_chance));

        let multiplier = special.as_ref().map(|s| s.damage_multiplier).unwrap_or(1.0);
        let mut raw = (enemy.attack_power() as f64 * multiplier).round() as i32;
        let crit = rng.chance(enemy.crit_chance());
        if crit {
            raw = (raw as f64 * enemy.crit_multiplier()).round() as i32;
        }
        let enemy_name = enemy.name.clone();

        let dealt = player.receive_damage(raw);
        self.tally.damage_taken += dealt as u64;
        let mut message = match &special {
            Some(special) => format!("{} uses {} for {} damage", enemy_name, special.name, dealt),
            None => format!("{} attacks for {} damage", enemy_name, dealt),
        };
        if crit {
            message.push_str(" (critical!)");
        }

        if let Some(special) = &special {
            if let Some(status) = special.inflicts {
                player.apply_status(status);
                message.push_str(&format!(". You are {}", status.kind.label()));
            }
            self.enemies[index].special_cooldown = special.cooldown;
        }

        let thorns = player.thorns_damage();
        if thorns > 0 && player.is_alive() {
            let enemy = &mut self.enemies[index];
            let reflected = enemy.lose_health(thorns);
            let killed = !enemy.is_alive();
            self.tally.damage_dealt += reflected as u64;
            message.push_str(&format!(". Thorns deal {} back", reflected));
            if killed {
                message.push_str(&format!(". {} falls", enemy_name));
                self.on_enemy_defeated(player);
            }
        }
        ActionResult::success(message)
    }

    /// Runs enemy turns until the player can act or combat ends.
    ///
    /// Returns the messages produced along the way.
    pub fn run_until_player_turn(&mut self, player: &mut Player, rng: &mut GameRng) -> DelveResult<Vec<String>> {
        let start = self.log.len();
        while !self.is_over() {
            if !self.turn_started {
                let turn = self.start_turn(player)?;
                if turn.skipped {
                    continue;
                }
            }
            match self.current_actor() {
                Some(TurnSlot::Enemy(_)) => {
                    self.enemy_turn(player, rng)?;
                }
                _ => break,
            }
        }
        Ok(self.log[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CombatStats, Lazy, PlayerClass};

    fn hero() -> Player {
        Player::new("Hero", PlayerClass::Fighter, &mut GameRng::from_u64(1))
    }

    fn arena(room_type: RoomType, enemies: Vec<Enemy>) -> Room {
        let mut room = Room::new(7, room_type, 3, &mut GameRng::from_u64(2));
        room.state = RoomState::Active;
        room.enemies = Lazy::Loaded(enemies);
        room
    }

    fn dummy(name: &str, health: i32, speed: i32) -> Enemy {
        Enemy::new(
            GameRng::from_u64(health as u64).uuid(),
            name,
            1,
            CombatStats::new(health, 0, 5, 0, speed),
        )
    }

    #[test]
    fn test_start_preconditions() {
        let player = hero();
        let mut room = arena(RoomType::Combat, vec![dummy("Rat", 10, 5)]);
        room.state = RoomState::Available;
        assert!(CombatEngine::start(&room, &player).is_err());

        let mut unloaded = arena(RoomType::Combat, Vec::new());
        unloaded.enemies = Lazy::Unloaded;
        assert!(CombatEngine::start(&unloaded, &player).is_err());

        let treasure = arena(RoomType::Treasure, vec![dummy("Rat", 10, 5)]);
        assert!(CombatEngine::start(&treasure, &player).is_err());

        let dead = arena(RoomType::Combat, vec![dummy("Rat", 0, 5)]);
        assert!(CombatEngine::start(&dead, &player).is_err());
    }

    #[test]
    fn test_turn_order_by_speed_player_wins_ties() {
        let player = hero();
        let speed = player.effective_speed();
        let room = arena(
            RoomType::Combat,
            vec![dummy("Slow", 10, speed - 3), dummy("Tied", 10, speed), dummy("Fast", 10, speed + 5)],
        );
        let engine = CombatEngine::start(&room, &player).unwrap();
        assert_eq!(
            engine.turn_order(),
            &[TurnSlot::Enemy(2), TurnSlot::Player, TurnSlot::Enemy(1), TurnSlot::Enemy(0)]
        );
    }

    #[test]
    fn test_boss_flee_is_rejected() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(3);
        let room = arena(RoomType::Boss, vec![dummy("Boss Lich", 500, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();
        engine.run_until_player_turn(&mut player, &mut rng).unwrap();

        let result = engine.player_action(CombatAction::Flee, &mut player, &mut rng).unwrap();
        assert!(!result.success);
        assert!(!result.turn_consumed);
        assert_eq!(engine.status(), CombatStatus::InProgress);
        assert!(engine.awaiting_player());
    }

    #[test]
    fn test_certain_flee_ends_combat() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(3);
        let room = arena(RoomType::Combat, vec![dummy("Rat", 50, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap().with_flee_chance(1.0);
        engine.run_until_player_turn(&mut player, &mut rng).unwrap();
        let result = engine.player_action(CombatAction::Flee, &mut player, &mut rng).unwrap();
        assert!(result.success);
        assert_eq!(engine.status(), CombatStatus::Fled);
        assert!(engine.player_action(CombatAction::Flee, &mut player, &mut rng).is_err());
    }

    #[test]
    fn test_lethal_poison_ends_combat_at_turn_start() {
        let mut player = hero();
        player.stats.health = 3;
        player.apply_status(StatusEffect::new(StatusKind::Poison, 2, 5));
        let room = arena(RoomType::Combat, vec![dummy("Rat", 50, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();

        let turn = engine.start_turn(&mut player).unwrap();
        assert_eq!(turn.actor, TurnSlot::Player);
        assert!(turn.skipped);
        assert_eq!(player.health(), 0);
        assert_eq!(engine.status(), CombatStatus::Defeat);
    }

    #[test]
    fn test_lethal_burn_on_last_enemy_is_victory() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(3);
        let mut enemy = dummy("Imp", 3, 1);
        enemy.apply_status(StatusEffect::new(StatusKind::Burn, 2, 5));
        let room = arena(RoomType::Combat, vec![enemy]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();

        engine.start_turn(&mut player).unwrap();
        engine
            .player_action(CombatAction::Ability { ability: AbilityId::SecondWind, target: None }, &mut player, &mut rng)
            .unwrap();
        let turn = engine.start_turn(&mut player).unwrap();
        assert!(turn.skipped);
        assert_eq!(engine.status(), CombatStatus::Victory);
        assert_eq!(engine.tally().enemies_defeated, 1);
    }

    #[test]
    fn test_wrong_turn_is_an_error() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(3);
        let room = arena(RoomType::Combat, vec![dummy("Fast", 50, 99)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();
        assert_eq!(engine.current_actor(), Some(TurnSlot::Enemy(0)));
        assert!(engine
            .player_action(CombatAction::Attack { target: 0 }, &mut player, &mut rng)
            .is_err());
    }

    #[test]
    fn test_invalid_choices_keep_the_turn() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(3);
        let room = arena(RoomType::Combat, vec![dummy("Rat", 50, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();
        engine.run_until_player_turn(&mut player, &mut rng).unwrap();

        let bad_target = engine
            .player_action(CombatAction::Attack { target: 5 }, &mut player, &mut rng)
            .unwrap();
        assert!(!bad_target.turn_consumed);

        let unknown = engine
            .player_action(CombatAction::Ability { ability: AbilityId::Hex, target: Some(0) }, &mut player, &mut rng)
            .unwrap();
        assert!(!unknown.turn_consumed);

        player.stats.mana = 0;
        let broke = engine
            .player_action(CombatAction::Ability { ability: AbilityId::PowerStrike, target: Some(0) }, &mut player, &mut rng)
            .unwrap();
        assert!(!broke.turn_consumed);
        assert!(engine.awaiting_player());
    }

    #[test]
    fn test_fight_to_victory() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(11);
        let room = arena(RoomType::Combat, vec![dummy("Rat", 20, 1), dummy("Rat", 20, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();

        for _ in 0..100 {
            engine.run_until_player_turn(&mut player, &mut rng).unwrap();
            if engine.is_over() {
                break;
            }
            let target = engine.living_targets()[0];
            engine
                .player_action(CombatAction::Attack { target }, &mut player, &mut rng)
                .unwrap();
        }
        assert_eq!(engine.status(), CombatStatus::Victory);
        assert_eq!(engine.tally().enemies_defeated, 2);
        assert!(engine.enemies().iter().all(|e| !e.is_alive()));
    }

    #[test]
    fn test_shield_bash_stuns_for_one_turn() {
        let mut player = hero();
        let mut rng = GameRng::from_u64(4);
        let room = arena(RoomType::Combat, vec![dummy("Ogre", 500, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();
        engine.run_until_player_turn(&mut player, &mut rng).unwrap();
        engine
            .player_action(CombatAction::Ability { ability: AbilityId::ShieldBash, target: Some(0) }, &mut player, &mut rng)
            .unwrap();

        let health = player.health();
        let turn = engine.start_turn(&mut player).unwrap();
        assert_eq!(turn.actor, TurnSlot::Enemy(0));
        assert!(turn.skipped);
        assert_eq!(player.health(), health);
        assert!(engine.enemies()[0].status_effects.is_empty());
    }

    #[test]
    fn test_warlock_kills_grant_soul_shards() {
        let mut rng = GameRng::from_u64(4);
        let mut player = Player::new("Vex", PlayerClass::warlock(), &mut rng);
        let room = arena(RoomType::Combat, vec![dummy("Rat", 1, 1)]);
        let mut engine = CombatEngine::start(&room, &player).unwrap();
        engine.run_until_player_turn(&mut player, &mut rng).unwrap();
        engine
            .player_action(CombatAction::Attack { target: 0 }, &mut player, &mut rng)
            .unwrap();
        assert_eq!(engine.status(), CombatStatus::Victory);
        assert_eq!(player.soul_shards(), 1);
    }
}
