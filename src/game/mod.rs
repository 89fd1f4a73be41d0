//! # Game Module
//!
//! Core game state: the room graph, rooms, combat, the player and the
//! session that ties them together.
//!
//! This module contains the fundamental building blocks of the crawler:
//! - Room state machine and the leveled room graph
//! - Combatants, items, relics and the player character
//! - Turn-based combat resolution
//! - Session state and JSON persistence

pub mod actions;
pub mod autoplay;
pub mod combat;
pub mod entities;
pub mod graph;
pub mod interactables;
pub mod items;
pub mod player;
pub mod relics;
pub mod room;
pub mod shop;
pub mod state;

pub use actions::*;
pub use autoplay::*;
pub use combat::*;
pub use entities::*;
pub use graph::*;
pub use interactables::*;
pub use items::*;
pub use player::*;
pub use relics::*;
pub use room::*;
pub use shop::*;
pub use state::*;

use crate::GameRng;
use uuid::Uuid;

/// Dense room identifier, assigned in creation order.
pub type RoomId = u32;

/// Unique identifier for items, enemies and relic instances.
pub type EntityId = Uuid;

/// Draws a new entity ID from the session RNG.
///
/// Ids come from the seeded stream so a replayed session hands out the same
/// ids in the same order.
pub fn new_entity_id(rng: &mut GameRng) -> EntityId {
    rng.uuid()
}
