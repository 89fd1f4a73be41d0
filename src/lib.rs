//! # Delve
//!
//! A single-player, turn-based dungeon crawler built around a seeded,
//! reproducible room graph.
//!
//! ## Architecture Overview
//!
//! The engine is organised around a small coupled core and a ring of content
//! systems that feed it:
//!
//! - **Deterministic RNG**: one seeded [`GameRng`] per session; every random
//!   decision (layout, loot, combat rolls, traps) draws from it
//! - **Generation System**: builds a leveled, directed room graph from an
//!   entrance to a boss, plus loot, enemy, relic, event and puzzle content
//! - **Room State Machine**: rooms move `locked → available → active → cleared`
//!   and lazily materialise their content on first entry
//! - **Combat Engine**: a turn-ordered resolution loop with status effects,
//!   cooldowns and a simple enemy AI
//! - **Session State**: [`GameState`] threads the RNG through all of the above
//!   and round-trips through JSON
//!
//! Two sessions created from the same seed, fed the same commands, produce the
//! same dungeon and the same fights.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for the Delve engine.
///
/// Only precondition violations surface here. Actions the player may simply
/// retry (not enough mana, ability on cooldown, too little gold) come back as
/// an unsuccessful [`ActionResult`] instead.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Session or graph state does not allow the call
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// A room or combat transition was requested out of order
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// An external content lookup failed
    #[error("Content provider error: {0}")]
    ContentProvider(String),

    /// Text input could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default number of dungeon levels (entrance to boss, inclusive)
    pub const DEFAULT_LEVELS: u32 = 20;

    /// Default cap on rooms per level
    pub const DEFAULT_MAX_ROOMS_PER_LEVEL: u32 = 3;

    /// Default probability of extra forward connections
    pub const DEFAULT_CONVERGENCE_RATE: f64 = 0.3;

    /// Chance that a flee attempt succeeds outside boss rooms
    pub const FLEE_CHANCE: f64 = 0.5;

    /// Base gold granted by a room before level and type scaling
    pub const BASE_ROOM_GOLD: u32 = 10;

    /// Extra gold per dungeon level
    pub const ROOM_GOLD_PER_LEVEL: u32 = 5;

    /// Base experience granted by a room before level and type scaling
    pub const BASE_ROOM_XP: u64 = 15;

    /// Extra experience per dungeon level
    pub const ROOM_XP_PER_LEVEL: u64 = 10;

    /// Base health restored by a rest room
    pub const BASE_REST_HEAL: i32 = 20;

    /// Extra rest healing per dungeon level
    pub const REST_HEAL_PER_LEVEL: i32 = 5;

    /// Flat gold granted for leaving a shop room
    pub const SHOP_ROOM_GOLD: u32 = 10;

    /// Soul shards a warlock can hold
    pub const MAX_SOUL_SHARDS: u32 = 5;

    /// Attempts allowed on a puzzle before it locks
    pub const MAX_PUZZLE_ATTEMPTS: u32 = 3;

    /// Experience needed per character level (`level * XP_PER_LEVEL`)
    pub const XP_PER_LEVEL: u64 = 100;

    /// Disarm margin at which a trap goes off
    pub const TRAP_TRIGGER_MARGIN: i32 = 5;

    /// Starting gold for a new character
    pub const STARTING_GOLD: u32 = 25;
}
