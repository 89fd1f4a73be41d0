//! # Rendering Module
//!
//! Text output for terminal front ends, plus a serialisable summary of a
//! generated dungeon.

pub mod display;
pub mod ui;

pub use display::*;
pub use ui::*;

use crate::{validate_connectivity, DelveResult, GenerationConfig, RoomGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Shape and health of a generated dungeon, written by `--report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonReport {
    pub seed: String,
    pub levels: usize,
    pub room_count: usize,
    /// Rooms per level, entrance first
    pub layer_sizes: Vec<usize>,
    /// Room count per type label
    pub room_types: BTreeMap<String, usize>,
    /// Undirected connections
    pub connection_count: usize,
    /// Rooms on the shortest entrance-to-boss route
    pub shortest_route: Option<usize>,
    /// Connectivity problems; empty for a sound graph
    pub diagnostics: Vec<String>,
}

impl DungeonReport {
    pub fn from_graph(graph: &RoomGraph, config: &GenerationConfig) -> Self {
        let mut room_types = BTreeMap::new();
        for room in graph.rooms() {
            *room_types.entry(room.room_type.label().to_string()).or_insert(0) += 1;
        }
        let connection_count = graph.rooms().map(|room| room.connections.len()).sum::<usize>() / 2;

        Self {
            seed: config.seed.to_string(),
            levels: graph.level_count(),
            room_count: graph.len(),
            layer_sizes: graph.layers().iter().map(|layer| layer.room_ids.len()).collect(),
            room_types,
            connection_count,
            shortest_route: graph.route_to_boss(graph.entrance_id()).map(|route| route.len()),
            diagnostics: validate_connectivity(graph),
        }
    }

    pub fn to_json(&self) -> DelveResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
