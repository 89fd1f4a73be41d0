//! # Utilities Module
//!
//! Seeded randomness, dice and graph-walking helpers shared by every system.

pub mod dice;
pub mod reachability;
pub mod rng;

pub use dice::*;
pub use reachability::*;
pub use rng::*;
