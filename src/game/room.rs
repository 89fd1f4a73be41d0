//! # Rooms
//!
//! A room is a node in the dungeon graph with a type, a level and a state
//! that only moves forward: `Locked → Available → Active → Cleared`.
//!
//! Cheap content (reward, interactables, planned enemy count) is rolled
//! when the room is created so the whole dungeon is fixed by the seed.
//! Expensive content (enemies, shop stock, puzzles, events) stays
//! [`Lazy::Unloaded`] until the room is first entered.

use crate::config::{
    BASE_REST_HEAL, BASE_ROOM_GOLD, BASE_ROOM_XP, REST_HEAL_PER_LEVEL, ROOM_GOLD_PER_LEVEL,
    ROOM_XP_PER_LEVEL, SHOP_ROOM_GOLD,
};
use crate::{
    generate_event, generate_interactables, generate_loot_for_level, generate_puzzle,
    generate_shop_inventory, Combatant, DelveError, DelveResult, DungeonEvent, Enemy,
    EnemyProvider, GameRng, Interactable, InteractableKind, Item, Puzzle, RoomId, ShopStock,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoomType {
    Entrance,
    Combat,
    Elite,
    Boss,
    Treasure,
    Rest,
    Shop,
    Event,
    Puzzle,
}

impl RoomType {
    pub const ALL: [RoomType; 9] = [
        RoomType::Entrance,
        RoomType::Combat,
        RoomType::Elite,
        RoomType::Boss,
        RoomType::Treasure,
        RoomType::Rest,
        RoomType::Shop,
        RoomType::Event,
        RoomType::Puzzle,
    ];

    /// Whether entering starts a fight.
    pub fn is_hostile(self) -> bool {
        matches!(self, RoomType::Combat | RoomType::Elite | RoomType::Boss)
    }

    pub fn label(self) -> &'static str {
        match self {
            RoomType::Entrance => "Entrance",
            RoomType::Combat => "Combat",
            RoomType::Elite => "Elite",
            RoomType::Boss => "Boss",
            RoomType::Treasure => "Treasure",
            RoomType::Rest => "Rest",
            RoomType::Shop => "Shop",
            RoomType::Event => "Event",
            RoomType::Puzzle => "Puzzle",
        }
    }

    /// Single-character map glyph.
    pub fn glyph(self) -> char {
        match self {
            RoomType::Entrance => 'E',
            RoomType::Combat => 'C',
            RoomType::Elite => 'X',
            RoomType::Boss => 'B',
            RoomType::Treasure => 'T',
            RoomType::Rest => 'R',
            RoomType::Shop => '$',
            RoomType::Event => '?',
            RoomType::Puzzle => 'P',
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomState {
    Locked,
    Available,
    Active,
    Cleared,
}

impl RoomState {
    pub fn label(self) -> &'static str {
        match self {
            RoomState::Locked => "locked",
            RoomState::Available => "available",
            RoomState::Active => "active",
            RoomState::Cleared => "cleared",
        }
    }
}

/// Content that materialises on first use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lazy<T> {
    Unloaded,
    Loaded(T),
}

impl<T> Lazy<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Lazy::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Loaded(value) => Some(value),
            Lazy::Unloaded => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Lazy::Loaded(value) => Some(value),
            Lazy::Unloaded => None,
        }
    }

    /// Loads the value with `f` unless already loaded.
    pub fn get_or_insert_with(&mut self, f: impl FnOnce() -> T) -> &mut T {
        if let Lazy::Unloaded = self {
            *self = Lazy::Loaded(f());
        }
        match self {
            Lazy::Loaded(value) => value,
            Lazy::Unloaded => unreachable!("lazy value loaded above"),
        }
    }
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy::Unloaded
    }
}

/// What completing a room grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub gold: u32,
    pub experience: u64,
    pub items: Vec<Item>,
    pub health_restore: Option<i32>,
}

impl Reward {
    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.experience == 0 && self.items.is_empty() && self.health_restore.is_none()
    }

    /// Rolls the reward for a room of `room_type` at `level`.
    pub fn roll(room_type: RoomType, level: u32, rng: &mut GameRng) -> Self {
        let gold = (BASE_ROOM_GOLD + ROOM_GOLD_PER_LEVEL * level) as f64;
        let experience = (BASE_ROOM_XP + ROOM_XP_PER_LEVEL * level as u64) as f64;
        let scaled = |gold_mult: f64, xp_mult: f64, items: Vec<Item>| Reward {
            gold: (gold * gold_mult).round() as u32,
            experience: (experience * xp_mult).round() as u64,
            items,
            health_restore: None,
        };
        let loot = |rng: &mut GameRng, guarantee: bool| generate_loot_for_level(level, Some(rng), guarantee);

        match room_type {
            RoomType::Entrance => Reward::default(),
            RoomType::Combat => {
                let items = if level <= 2 {
                    loot(rng, true)
                } else if rng.chance(0.4) {
                    loot(rng, false)
                } else {
                    Vec::new()
                };
                scaled(1.0, 1.0, items)
            }
            RoomType::Elite => scaled(1.5, 1.5, loot(rng, true)),
            RoomType::Boss => scaled(2.0, 3.0, loot(rng, true)),
            RoomType::Treasure => scaled(3.0, 1.0, loot(rng, true)),
            RoomType::Puzzle => {
                let items = if rng.chance(0.5) { loot(rng, false) } else { Vec::new() };
                scaled(0.5, 1.5, items)
            }
            RoomType::Event => {
                let items = if rng.chance(0.5) { loot(rng, false) } else { Vec::new() };
                scaled(0.75, 0.75, items)
            }
            RoomType::Rest => Reward {
                health_restore: Some(BASE_REST_HEAL + REST_HEAL_PER_LEVEL * level as i32),
                ..Reward::default()
            },
            RoomType::Shop => Reward {
                gold: SHOP_ROOM_GOLD,
                ..Reward::default()
            },
        }
    }
}

/// A node in the dungeon graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_type: RoomType,
    pub level: u32,
    pub state: RoomState,
    /// Neighbours one level up or down, stored on both ends
    pub connections: Vec<RoomId>,
    pub reward: Reward,
    pub interactables: Vec<Interactable>,
    /// Enemies fetched on first load
    pub planned_enemies: usize,
    pub enemies: Lazy<Vec<Enemy>>,
    pub shop: Lazy<ShopStock>,
    pub puzzle: Lazy<Puzzle>,
    pub event: Lazy<DungeonEvent>,
    pub visited: bool,
}

impl Room {
    /// Creates a locked room and rolls its eager content.
    pub fn new(id: RoomId, room_type: RoomType, level: u32, rng: &mut GameRng) -> Self {
        let reward = Reward::roll(room_type, level, rng);
        let interactables = generate_interactables(room_type, level, rng);
        let planned_enemies = match room_type {
            RoomType::Combat => rng.next_int(1, 3) as usize,
            RoomType::Elite | RoomType::Boss => 1,
            _ => 0,
        };

        Self {
            id,
            room_type,
            level,
            state: RoomState::Locked,
            connections: Vec::new(),
            reward,
            interactables,
            planned_enemies,
            enemies: Lazy::Unloaded,
            shop: Lazy::Unloaded,
            puzzle: Lazy::Unloaded,
            event: Lazy::Unloaded,
            visited: false,
        }
    }

    /// Records a neighbour, ignoring duplicates.
    pub fn add_connection(&mut self, other: RoomId) {
        if other != self.id && !self.connections.contains(&other) {
            self.connections.push(other);
        }
    }

    pub fn is_hostile(&self) -> bool {
        self.room_type.is_hostile()
    }

    pub fn is_cleared(&self) -> bool {
        self.state == RoomState::Cleared
    }

    /// Whether the room may become the current room.
    pub fn can_enter(&self) -> bool {
        match self.state {
            RoomState::Available => true,
            RoomState::Locked => self.room_type == RoomType::Entrance,
            RoomState::Active => false,
            RoomState::Cleared => false,
        }
    }

    /// `Locked → Available`. Other states are left alone.
    pub fn unlock(&mut self) -> bool {
        if self.state == RoomState::Locked {
            self.state = RoomState::Available;
            true
        } else {
            false
        }
    }

    /// `Available → Locked`, used when the player commits to another branch.
    pub fn lock(&mut self) -> bool {
        if self.state == RoomState::Available {
            self.state = RoomState::Locked;
            true
        } else {
            false
        }
    }

    /// Makes the room active and materialises its non-combat content.
    pub fn enter(&mut self, rng: &mut GameRng) -> DelveResult<()> {
        if !self.can_enter() {
            return Err(DelveError::InvalidAction(format!(
                "room {} is {} and cannot be entered",
                self.id,
                self.state.label()
            )));
        }
        self.state = RoomState::Active;
        self.visited = true;

        let level = self.level;
        match self.room_type {
            RoomType::Event => {
                self.event.get_or_insert_with(|| generate_event(level, rng));
            }
            RoomType::Shop => {
                self.shop
                    .get_or_insert_with(|| ShopStock::new(generate_shop_inventory(level, rng)));
            }
            RoomType::Puzzle => {
                let levers = self
                    .interactables
                    .iter()
                    .filter(|i| matches!(i.kind, InteractableKind::Lever { .. }))
                    .count();
                self.puzzle
                    .get_or_insert_with(|| generate_puzzle(level, levers, rng));
            }
            _ => {}
        }
        debug!("Entered room {} ({})", self.id, self.room_type);
        Ok(())
    }

    /// Fetches this room's enemies once. Later calls return the same roster.
    ///
    /// Elite rooms promote their enemy to 1.5x health and attack; the boss
    /// gets 3x health, 1.5x attack and 1.25x defense.
    pub async fn ensure_enemies_loaded(
        &mut self,
        provider: &dyn EnemyProvider,
        rng: &mut GameRng,
    ) -> DelveResult<&[Enemy]> {
        if !self.is_hostile() {
            return Ok(&[]);
        }
        if !self.enemies.is_loaded() {
            let fetched = provider
                .get_random_monsters_by_cr(self.level, self.planned_enemies, rng)
                .await?;
            let roster = match self.room_type {
                RoomType::Elite => fetched
                    .into_iter()
                    .map(|enemy| enemy.promoted("Elite", 1.5, 1.5, 1.0))
                    .collect(),
                RoomType::Boss => fetched
                    .into_iter()
                    .map(|enemy| enemy.promoted("Boss", 3.0, 1.5, 1.25))
                    .collect(),
                _ => fetched,
            };
            debug!(
                "Room {} loaded {} enemies from {}",
                self.id,
                roster.len(),
                provider.provider_name()
            );
            self.enemies = Lazy::Loaded(roster);
        }
        Ok(self.enemies.get().map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Enemies still standing. Empty when none are loaded.
    pub fn living_enemies(&self) -> Vec<&Enemy> {
        self.enemies
            .get()
            .map(|enemies| enemies.iter().filter(|e| e.is_alive()).collect())
            .unwrap_or_default()
    }

    pub fn has_living_enemies(&self) -> bool {
        !self.living_enemies().is_empty()
    }

    /// `Active → Cleared`, returning the reward.
    ///
    /// Refused while enemies are still alive, and for a hostile room whose
    /// enemies were never loaded.
    pub fn complete(&mut self) -> DelveResult<Reward> {
        if self.state != RoomState::Active {
            return Err(DelveError::InvalidAction(format!(
                "room {} is {} and cannot be completed",
                self.id,
                self.state.label()
            )));
        }
        if self.is_hostile() && !self.enemies.is_loaded() {
            return Err(DelveError::InvalidAction(format!(
                "room {} has not been fought yet",
                self.id
            )));
        }
        if self.has_living_enemies() {
            return Err(DelveError::InvalidAction(format!(
                "room {} still has living enemies",
                self.id
            )));
        }
        self.state = RoomState::Cleared;
        Ok(self.reward.clone())
    }

    /// `Active → Cleared` without a reward, when the player walks away.
    pub fn abandon(&mut self) {
        if self.state == RoomState::Active {
            self.state = RoomState::Cleared;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bestiary, CombatStats};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EnemyProvider for CountingProvider {
        async fn get_random_monsters_by_cr(
            &self,
            level: u32,
            count: usize,
            rng: &mut GameRng,
        ) -> DelveResult<Vec<Enemy>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..count)
                .map(|_| Enemy::new(rng.uuid(), "Dummy", level, CombatStats::new(10, 0, 4, 2, 5)))
                .collect())
        }
    }

    fn room(room_type: RoomType, level: u32) -> Room {
        Room::new(1, room_type, level, &mut GameRng::from_u64(9))
    }

    #[test]
    fn test_rewards_scale_by_type() {
        let mut rng = GameRng::from_u64(1);
        let combat = Reward::roll(RoomType::Combat, 4, &mut rng);
        assert_eq!(combat.gold, 30);
        assert_eq!(combat.experience, 55);

        let treasure = Reward::roll(RoomType::Treasure, 4, &mut rng);
        assert_eq!(treasure.gold, 90);
        assert!(treasure.items[0].is_equipment());

        let boss = Reward::roll(RoomType::Boss, 4, &mut rng);
        assert_eq!(boss.gold, 60);
        assert_eq!(boss.experience, 165);

        let rest = Reward::roll(RoomType::Rest, 4, &mut rng);
        assert_eq!(rest.health_restore, Some(40));
        assert_eq!(rest.gold, 0);

        let shop = Reward::roll(RoomType::Shop, 4, &mut rng);
        assert_eq!(shop.gold, 10);
        assert!(Reward::roll(RoomType::Entrance, 4, &mut rng).is_empty());
    }

    #[test]
    fn test_early_combat_guarantees_equipment() {
        let mut rng = GameRng::from_u64(2);
        for _ in 0..10 {
            let reward = Reward::roll(RoomType::Combat, 2, &mut rng);
            assert!(reward.items[0].is_equipment());
        }
    }

    #[test]
    fn test_state_machine_forward_only() {
        let mut rng = GameRng::from_u64(4);
        let mut room = room(RoomType::Treasure, 3);
        assert!(room.enter(&mut rng).is_err());
        assert!(room.complete().is_err());

        assert!(room.unlock());
        room.enter(&mut rng).unwrap();
        assert_eq!(room.state, RoomState::Active);
        let reward = room.complete().unwrap();
        assert_eq!(reward, room.reward);
        assert!(room.is_cleared());

        assert!(!room.unlock());
        assert!(!room.lock());
        assert!(room.enter(&mut rng).is_err());
        assert!(room.complete().is_err());
    }

    #[test]
    fn test_lazy_content_generated_once() {
        let mut rng = GameRng::from_u64(4);
        let mut room = room(RoomType::Shop, 6);
        assert!(!room.shop.is_loaded());
        room.unlock();
        room.enter(&mut rng).unwrap();
        let stock = room.shop.get().cloned().unwrap();

        room.state = RoomState::Available;
        room.enter(&mut rng).unwrap();
        assert_eq!(room.shop.get(), Some(&stock));
    }

    #[tokio::test]
    async fn test_enemies_load_once() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let mut rng = GameRng::from_u64(5);
        let mut room = room(RoomType::Combat, 3);
        let first: Vec<_> = room
            .ensure_enemies_loaded(&provider, &mut rng)
            .await
            .unwrap()
            .to_vec();
        let second = room
            .ensure_enemies_loaded(&provider, &mut rng)
            .await
            .unwrap()
            .to_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), room.planned_enemies);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_boss_is_promoted() {
        let mut rng = GameRng::from_u64(5);
        let mut room = room(RoomType::Boss, 20);
        let enemies = room
            .ensure_enemies_loaded(&Bestiary::new(), &mut rng)
            .await
            .unwrap();
        assert_eq!(enemies.len(), 1);
        assert!(enemies[0].name.starts_with("Boss "));
    }

    #[tokio::test]
    async fn test_complete_blocked_by_living_enemies() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let mut rng = GameRng::from_u64(5);
        let mut room = room(RoomType::Combat, 1);
        room.unlock();
        room.enter(&mut rng).unwrap();
        room.ensure_enemies_loaded(&provider, &mut rng).await.unwrap();
        assert!(room.complete().is_err());

        if let Some(enemies) = room.enemies.get_mut() {
            for enemy in enemies.iter_mut() {
                enemy.stats.health = 0;
            }
        }
        assert!(room.complete().is_ok());
    }

    #[test]
    fn test_unloaded_hostile_room_cannot_complete() {
        let mut rng = GameRng::from_u64(5);
        let mut room = room(RoomType::Elite, 5);
        room.unlock();
        room.enter(&mut rng).unwrap();
        assert!(room.complete().is_err());
        assert_eq!(room.state, RoomState::Active);

        room.abandon();
        assert!(room.is_cleared());
    }

    #[test]
    fn test_active_entrance_cannot_be_reentered() {
        let mut rng = GameRng::from_u64(6);
        let mut entrance = room(RoomType::Entrance, 1);
        assert!(entrance.can_enter());
        entrance.enter(&mut rng).unwrap();
        assert_eq!(entrance.state, RoomState::Active);
        assert!(!entrance.can_enter());
        assert!(entrance.enter(&mut rng).is_err());
    }

    #[tokio::test]
    async fn test_loaded_roster_comes_from_the_provider() {
        let mut rng = GameRng::from_u64(7);
        let mut room = room(RoomType::Combat, 4);
        room.planned_enemies = 3;
        let lone = Bestiary::with_entries(vec![crate::MonsterEntry {
            name: "Lone Rat",
            challenge: 4,
            health: 10,
            attack: 3,
            defense: 0,
            speed: 5,
            special: None,
        }]);
        let names: Vec<String> = room
            .ensure_enemies_loaded(&lone, &mut rng)
            .await
            .unwrap()
            .iter()
            .map(|enemy| enemy.name.clone())
            .collect();
        assert_eq!(names, vec!["Lone Rat"; 3]);
        assert_eq!(room.enemies.get().map(Vec::len), Some(3));
    }

    #[test]
    fn test_non_hostile_rooms_plan_no_enemies() {
        let mut rng = GameRng::from_u64(5);
        for room_type in RoomType::ALL {
            let room = Room::new(0, room_type, 5, &mut rng);
            assert_eq!(room.planned_enemies > 0, room_type.is_hostile());
        }
    }
}
