//! # Game State Module
//!
//! The session object. [`GameState`] owns the room graph, the player, the
//! active combat and the one [`GameRng`] every random decision draws from,
//! and exposes the operations a front end calls between player inputs.
//!
//! The whole session serialises to JSON, RNG stream included, so a saved
//! game resumes exactly where it stopped.

use crate::{
    sell_item, ActionResult, CombatAction, CombatEngine, CombatStatus, Combatant, DelveError,
    DelveResult, DisarmOutcome, DungeonGenerator, EnemyProvider, EntityId, EquipSlot, GameRng,
    GenerationConfig, Generator, InteractableKind, Lazy, Player, PlayerClass, PuzzleOutcome,
    Reward, Room, RoomGraph, RoomId, RoomType,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Between fights: move, loot, shop, solve
    Exploring,
    /// A combat engine is running in the current room
    Combat,
    /// The boss room is cleared
    Victory,
    /// The player died
    Defeat,
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Rooms entered, entrance included
    pub rooms_visited: u32,
    /// Rooms completed with their reward
    pub rooms_cleared: u32,
    pub enemies_defeated: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub gold_earned: u64,
    pub traps_disarmed: u32,
    pub puzzles_solved: u32,
    pub combats_fled: u32,
    /// Deepest dungeon level reached
    pub deepest_level: u32,
}

/// Central game state for one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Configuration the dungeon was generated from
    pub config: GenerationConfig,
    /// The session RNG stream
    rng: GameRng,
    /// The dungeon
    pub graph: RoomGraph,
    /// The player character
    pub player: Player,
    combat: Option<CombatEngine>,
    phase: GamePhase,
    /// Progress counters
    pub statistics: GameStatistics,
    /// Actions that consumed a turn
    pub turn_number: u64,
    journal: Vec<String>,
}

impl GameState {
    /// Generates a dungeon and places a new character at its entrance.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GameState, GamePhase, GenerationConfig, PlayerClass};
    ///
    /// let state = GameState::new(GenerationConfig::for_testing("doc"), "Hero", PlayerClass::Fighter).unwrap();
    /// assert_eq!(state.phase(), GamePhase::Exploring);
    /// assert_eq!(state.graph.current_room_id(), Some(state.graph.entrance_id()));
    /// ```
    pub fn new(config: GenerationConfig, name: impl Into<String>, class: PlayerClass) -> DelveResult<Self> {
        config.validate()?;
        let mut rng = config.create_rng();
        let mut graph = DungeonGenerator::new().generate(&config, &mut rng)?;
        let player = Player::new(name, class, &mut rng);
        graph.start_session(&mut rng)?;

        info!(
            "New run for {} the {}: {} rooms over {} levels",
            player.name,
            player.class,
            graph.len(),
            graph.level_count()
        );

        let mut state = Self {
            config,
            rng,
            graph,
            player,
            combat: None,
            phase: GamePhase::Exploring,
            statistics: GameStatistics {
                rooms_visited: 1,
                deepest_level: 1,
                ..GameStatistics::default()
            },
            turn_number: 0,
            journal: Vec::new(),
        };
        state.record("You stand at the dungeon entrance");
        Ok(state)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether the run has ended in victory or defeat.
    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Victory | GamePhase::Defeat)
    }

    /// The running fight, if any.
    pub fn combat(&self) -> Option<&CombatEngine> {
        self.combat.as_ref()
    }

    /// Every message the session has produced, oldest first.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.graph.current_room()
    }

    /// Rooms the player can move to from the current room.
    pub fn available_moves(&self) -> Vec<RoomId> {
        let Some(current) = self.graph.current_room_id() else {
            return Vec::new();
        };
        self.graph
            .successors(current)
            .into_iter()
            .filter(|id| self.graph.room(*id).map(Room::can_enter).unwrap_or(false))
            .collect()
    }

    fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        self.journal.push(message);
    }

    fn ensure_exploring(&self) -> DelveResult<()> {
        match self.phase {
            GamePhase::Exploring => Ok(()),
            other => Err(DelveError::InvalidState(format!(
                "not possible during {:?}",
                other
            ))),
        }
    }

    fn current_room_id(&self) -> DelveResult<RoomId> {
        self.graph
            .current_room_id()
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))
    }

    fn current_room_mut(&mut self) -> DelveResult<&mut Room> {
        self.graph
            .current_room_mut()
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))
    }

    /// Moves into a connected room and runs its arrival logic.
    ///
    /// Events resolve on arrival. Hostile rooms load their enemies from
    /// `provider` and open combat; enemies faster than the player act before
    /// this returns. Returns the messages produced.
    pub async fn enter_room(&mut self, room_id: RoomId, provider: &dyn EnemyProvider) -> DelveResult<Vec<String>> {
        self.ensure_exploring()?;
        let start = self.journal.len();
        self.graph.move_to_room(room_id, &mut self.rng)?;
        self.turn_number += 1;

        let room = self
            .graph
            .room_mut(room_id)
            .ok_or_else(|| DelveError::InvalidState(format!("room {} vanished", room_id)))?;
        let (room_type, level) = (room.room_type, room.level);
        let arrival = match room.event.get_mut() {
            Some(event) => {
                let result = event.resolve(&mut self.player);
                Some(format!("{}: {}. {}", event.title, event.description, result.message))
            }
            None => None,
        };

        self.statistics.rooms_visited += 1;
        self.statistics.deepest_level = self.statistics.deepest_level.max(level);
        self.record(format!("You enter room {} ({}) on level {}", room_id, room_type, level));
        if let Some(text) = arrival {
            self.record(text);
        }

        if room_type.is_hostile() {
            let room = self
                .graph
                .room_mut(room_id)
                .ok_or_else(|| DelveError::InvalidState(format!("room {} vanished", room_id)))?;
            room.ensure_enemies_loaded(provider, &mut self.rng).await?;
            if room.has_living_enemies() {
                let engine = CombatEngine::start(room, &self.player)?;
                if let Some(opening) = engine.log().first() {
                    self.journal.push(opening.clone());
                }
                self.combat = Some(engine);
                self.phase = GamePhase::Combat;
                self.advance_combat()?;
            }
        }
        Ok(self.journal[start..].to_vec())
    }

    /// Resolves a player combat action, then lets enemies act until the
    /// player is up again or the fight ends.
    pub fn combat_action(&mut self, action: CombatAction) -> DelveResult<ActionResult> {
        if self.phase != GamePhase::Combat {
            return Err(DelveError::InvalidState("no combat in progress".to_string()));
        }
        let engine = self
            .combat
            .as_mut()
            .ok_or_else(|| DelveError::InvalidState("combat engine missing".to_string()))?;
        let result = engine.player_action(action, &mut self.player, &mut self.rng)?;
        self.record(result.message.clone());
        if result.turn_consumed {
            self.turn_number += 1;
            self.advance_combat()?;
        }
        Ok(result)
    }

    fn advance_combat(&mut self) -> DelveResult<()> {
        if let Some(engine) = self.combat.as_mut() {
            let messages = engine.run_until_player_turn(&mut self.player, &mut self.rng)?;
            self.journal.extend(messages);
        }
        self.sync_enemies();
        if self.combat.as_ref().map(CombatEngine::is_over).unwrap_or(false) {
            self.finish_combat()?;
        }
        Ok(())
    }

    fn sync_enemies(&mut self) {
        if let Some(engine) = &self.combat {
            if let Some(room) = self.graph.room_mut(engine.room_id()) {
                room.enemies = Lazy::Loaded(engine.enemies().to_vec());
            }
        }
    }

    fn finish_combat(&mut self) -> DelveResult<()> {
        let Some(engine) = self.combat.take() else {
            return Ok(());
        };
        let tally = engine.tally();
        self.statistics.enemies_defeated += tally.enemies_defeated;
        self.statistics.damage_dealt += tally.damage_dealt;
        self.statistics.damage_taken += tally.damage_taken;

        match engine.status() {
            CombatStatus::Victory => {
                self.phase = GamePhase::Exploring;
                self.complete_current_room()?;
            }
            CombatStatus::Defeat => {
                self.phase = GamePhase::Defeat;
                info!(
                    "{} died on level {} after {} turns",
                    self.player.name, self.statistics.deepest_level, self.turn_number
                );
            }
            CombatStatus::Fled => {
                self.phase = GamePhase::Exploring;
                self.statistics.combats_fled += 1;
                self.record("The enemies remain. You may press on to another room");
            }
            CombatStatus::InProgress => self.combat = Some(engine),
        }
        Ok(())
    }

    /// Completes the current room and hands its reward to the player.
    ///
    /// Refused while enemies live or a puzzle is unsolved. Clearing the boss
    /// room wins the run.
    pub fn complete_current_room(&mut self) -> DelveResult<Reward> {
        self.ensure_exploring()?;
        let room = self.current_room_mut()?;
        if let Some(puzzle) = room.puzzle.get() {
            if !puzzle.is_resolved() {
                return Err(DelveError::InvalidAction(format!(
                    "room {} has an unsolved puzzle",
                    room.id
                )));
            }
        }
        let reward = room.complete()?;
        let (room_id, room_type) = (room.id, room.room_type);

        self.statistics.rooms_cleared += 1;
        self.apply_reward(&reward);
        self.record(format!("Room {} cleared", room_id));

        if room_type == RoomType::Boss {
            self.phase = GamePhase::Victory;
            info!(
                "{} cleared the dungeon in {} turns",
                self.player.name, self.turn_number
            );
        }
        Ok(reward)
    }

    fn apply_reward(&mut self, reward: &Reward) {
        if reward.gold > 0 {
            self.player.gold += reward.gold;
            self.statistics.gold_earned += reward.gold as u64;
            self.record(format!("You gain {} gold", reward.gold));
        }
        if reward.experience > 0 {
            let levels = self.player.gain_experience(reward.experience);
            self.record(format!("You gain {} experience", reward.experience));
            if levels > 0 {
                self.record(format!("You reach level {}", self.player.level));
            }
        }
        for item in &reward.items {
            self.record(format!("You find {}", item.name));
            self.player.add_item(item.clone());
        }
        if let Some(amount) = reward.health_restore {
            let healed = self.player.heal(amount);
            self.player.restore_mana(amount);
            self.record(format!("You rest and recover {} health", healed));
        }
    }

    fn in_shop(&self) -> bool {
        self.current_room()
            .map(|room| room.room_type == RoomType::Shop && room.shop.is_loaded())
            .unwrap_or(false)
    }

    /// Buys the shop entry at `index`.
    pub fn buy(&mut self, index: usize) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        if !self.in_shop() {
            return Ok(ActionResult::rejected("There is no merchant here"));
        }
        let room = self
            .graph
            .current_room_mut()
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))?;
        let result = match room.shop.get_mut() {
            Some(stock) => stock.buy(index, &mut self.player),
            None => ActionResult::rejected("There is no merchant here"),
        };
        self.record(result.message.clone());
        Ok(result)
    }

    /// Sells an inventory item to the merchant in the current room.
    pub fn sell(&mut self, item_id: EntityId) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        if !self.in_shop() {
            return Ok(ActionResult::rejected("There is no merchant here"));
        }
        let result = sell_item(&mut self.player, item_id);
        self.record(result.message.clone());
        Ok(result)
    }

    /// Answers the current room's puzzle.
    ///
    /// A solved puzzle completes the room. Running out of attempts clears
    /// the room without a reward.
    pub fn solve_puzzle(&mut self, answer: &str) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let room = self.current_room_mut()?;
        let Some(puzzle) = room.puzzle.get_mut() else {
            return Ok(ActionResult::rejected("There is no puzzle here"));
        };
        let outcome = puzzle.attempt(answer);
        self.settle_puzzle(outcome)
    }

    fn settle_puzzle(&mut self, outcome: PuzzleOutcome) -> DelveResult<ActionResult> {
        let result = match outcome {
            PuzzleOutcome::Solved => {
                self.statistics.puzzles_solved += 1;
                self.record("The mechanism yields");
                self.complete_current_room()?;
                ActionResult::success("Puzzle solved")
            }
            PuzzleOutcome::Incorrect { attempts_left } => {
                ActionResult::failed(format!("Nothing happens. {} attempt(s) left", attempts_left))
            }
            PuzzleOutcome::Failed => {
                self.current_room_mut()?.abandon();
                ActionResult::failed("The mechanism seizes for good. Whatever it guarded is lost")
            }
            PuzzleOutcome::Pending => ActionResult::success("Something clicks into place"),
            PuzzleOutcome::AlreadyResolved => ActionResult::rejected("The puzzle is already settled"),
        };
        self.record(result.message.clone());
        Ok(result)
    }

    /// Uses the interactable at `index` in the current room.
    ///
    /// Levers also feed a lever puzzle when the room has one. Nothing can be
    /// touched while enemies are alive.
    pub fn interact(&mut self, index: usize) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let gold_before = self.player.gold;
        let room = self
            .graph
            .current_room_mut()
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))?;
        if room.has_living_enemies() {
            return Ok(ActionResult::rejected("Not while enemies stand in your way"));
        }
        let lever_index = room
            .interactables
            .iter()
            .take(index)
            .filter(|object| matches!(object.kind, InteractableKind::Lever { .. }))
            .count();
        let Some(object) = room.interactables.get_mut(index) else {
            return Ok(ActionResult::rejected("There is nothing like that here"));
        };
        let is_lever = matches!(object.kind, InteractableKind::Lever { .. });
        let result = object.interact(&mut self.player);

        let lever_outcome = match room.puzzle.get_mut() {
            Some(puzzle) if is_lever && result.success => Some(puzzle.pull_lever(lever_index)),
            _ => None,
        };

        if self.player.gold > gold_before {
            self.statistics.gold_earned += (self.player.gold - gold_before) as u64;
        }
        self.record(result.message.clone());
        if result.turn_consumed {
            self.turn_number += 1;
        }
        match lever_outcome {
            Some(outcome) => self.settle_puzzle(outcome),
            None => Ok(result),
        }
    }

    /// Tries to disarm the trap at `index` in the current room.
    pub fn disarm_trap(&mut self, index: usize) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let room = self
            .graph
            .current_room_mut()
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))?;
        if room.has_living_enemies() {
            return Ok(ActionResult::rejected("Not while enemies stand in your way"));
        }
        let Some(object) = room.interactables.get_mut(index) else {
            return Ok(ActionResult::rejected("There is nothing like that here"));
        };
        let (result, outcome) = object.disarm(&mut self.player, &mut self.rng);
        if outcome == Some(DisarmOutcome::Success) {
            self.statistics.traps_disarmed += 1;
        }
        self.record(result.message.clone());
        if result.turn_consumed {
            self.turn_number += 1;
        }
        if !self.player.is_alive() {
            self.phase = GamePhase::Defeat;
            self.record(format!("{} has fallen", self.player.name));
        }
        Ok(result)
    }

    /// Uses a consumable outside of combat.
    pub fn use_item(&mut self, item_id: EntityId) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let result = self.player.use_item(item_id);
        self.record(result.message.clone());
        Ok(result)
    }

    pub fn equip(&mut self, item_id: EntityId) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let result = self.player.equip(item_id);
        self.record(result.message.clone());
        Ok(result)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> DelveResult<ActionResult> {
        self.ensure_exploring()?;
        let result = self.player.unequip(slot);
        self.record(result.message.clone());
        Ok(result)
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }

    /// Loads game state from JSON.
    pub fn load_from_json(json: &str) -> DelveResult<Self> {
        serde_json::from_str(json).map_err(DelveError::from)
    }

    /// Writes the save to `path`.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        fs::write(path, self.save_to_json()?)?;
        Ok(())
    }

    /// Reads a save from `path`.
    pub fn load_from_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        Self::load_from_json(&fs::read_to_string(path)?)
    }
}
