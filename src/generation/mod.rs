//! # Generation Module
//!
//! Procedural content generation: the dungeon room graph and the content
//! tables that fill it (loot, enemies, relics, events, puzzles).
//!
//! Every generator takes the session [`GameRng`] explicitly, so one seed
//! reproduces the whole dungeon.

pub mod dungeon;
pub mod encounters;
pub mod events;
pub mod loot;
pub mod puzzles;
pub mod relic_drops;

pub use dungeon::*;
pub use encounters::*;
pub use events::*;
pub use loot::*;
pub use puzzles::*;
pub use relic_drops::*;

use crate::config::{DEFAULT_CONVERGENCE_RATE, DEFAULT_LEVELS, DEFAULT_MAX_ROOMS_PER_LEVEL};
use crate::{DelveError, DelveResult, GameRng, Seed};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for procedural generation.
///
/// Controls the shape of the room graph. Everything else about a dungeon
/// follows from these values plus the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: Seed,
    /// Number of levels, entrance and boss included
    pub levels: u32,
    /// Cap on rooms in any single level
    pub max_rooms_per_level: u32,
    /// Probability weight for extra forward connections (0.0 to 1.0)
    pub convergence_rate: f64,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new("abc");
    /// assert_eq!(config.levels, 20);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self {
            seed: seed.into(),
            levels: DEFAULT_LEVELS,
            max_rooms_per_level: DEFAULT_MAX_ROOMS_PER_LEVEL,
            convergence_rate: DEFAULT_CONVERGENCE_RATE,
        }
    }

    /// Creates a configuration for testing with a shorter dungeon.
    pub fn for_testing(seed: impl Into<Seed>) -> Self {
        Self {
            levels: 10,
            ..Self::new(seed)
        }
    }

    /// Creates a configuration with an explicit graph shape.
    pub fn with_shape(
        seed: impl Into<Seed>,
        levels: u32,
        max_rooms_per_level: u32,
        convergence_rate: f64,
    ) -> Self {
        Self {
            seed: seed.into(),
            levels,
            max_rooms_per_level,
            convergence_rate,
        }
    }

    /// Creates the session RNG for this configuration.
    pub fn create_rng(&self) -> GameRng {
        GameRng::from_seed(&self.seed)
    }

    /// Rejects shapes the generator cannot honour.
    pub fn validate(&self) -> DelveResult<()> {
        if self.levels < 3 {
            return Err(DelveError::InvalidState(format!(
                "a dungeon needs at least 3 levels, got {}",
                self.levels
            )));
        }
        if self.max_rooms_per_level == 0 {
            return Err(DelveError::InvalidState(
                "max_rooms_per_level must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.convergence_rate) {
            return Err(DelveError::InvalidState(format!(
                "convergence_rate must be within [0, 1], got {}",
                self.convergence_rate
            )));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42u64)
    }
}

/// Trait for procedural generators.
///
/// All structural generators implement this trait, giving a uniform
/// generate / validate interface for the CLI and tests.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut GameRng) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}
