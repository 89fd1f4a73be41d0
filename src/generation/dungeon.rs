//! # Dungeon Generation
//!
//! Procedural room-graph generation.
//!
//! A dungeon is a stack of levels. Level 1 holds the single entrance, the
//! last level holds the single boss, and every level in between holds a
//! handful of rooms whose count swells early and narrows toward the boss.
//! Consecutive levels are wired so that every room has a way forward and a
//! way back.

use crate::{
    reachable_set, DelveError, DelveResult, DungeonLayer, GameRng, GenerationConfig, Generator,
    Room, RoomGraph, RoomId, RoomType,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Depth band used for room type weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Early,
    Mid,
    Late,
}

impl Stage {
    /// Stage for `level` out of `levels`, by fractional progress.
    pub fn for_level(level: u32, levels: u32) -> Self {
        let progress = if levels > 1 {
            (level.saturating_sub(1)) as f64 / (levels - 1) as f64
        } else {
            0.0
        };
        if progress < 1.0 / 3.0 {
            Stage::Early
        } else if progress < 2.0 / 3.0 {
            Stage::Mid
        } else {
            Stage::Late
        }
    }

    /// Room type weights for interior levels in this stage.
    pub fn weights(self) -> [(RoomType, f64); 7] {
        let [combat, elite, treasure, shop, rest, puzzle, event] = match self {
            Stage::Early => [55.0, 5.0, 10.0, 5.0, 8.0, 7.0, 10.0],
            Stage::Mid => [45.0, 12.0, 10.0, 8.0, 8.0, 7.0, 10.0],
            Stage::Late => [40.0, 20.0, 8.0, 7.0, 10.0, 5.0, 10.0],
        };
        [
            (RoomType::Combat, combat),
            (RoomType::Elite, elite),
            (RoomType::Treasure, treasure),
            (RoomType::Shop, shop),
            (RoomType::Rest, rest),
            (RoomType::Puzzle, puzzle),
            (RoomType::Event, event),
        ]
    }
}

/// Room skeleton used while the graph shape is still being decided.
#[derive(Debug, Clone)]
struct RoomPlan {
    level: u32,
    room_type: RoomType,
    connections: BTreeSet<RoomId>,
}

/// Primary dungeon generator.
///
/// This generator builds dungeons by:
/// 1. Sizing each level from its depth and the previous level
/// 2. Wiring consecutive levels with positional, convergence and orphan passes
/// 3. Overlaying guaranteed rest, shop and treasure rooms
/// 4. Materialising rooms and validating connectivity
#[derive(Debug, Clone)]
pub struct DungeonGenerator {
    /// Whether guaranteed rest/shop/treasure placements are applied
    pub apply_overlays: bool,
    /// Whether connectivity problems fail generation instead of only logging
    pub strict_validation: bool,
}

impl DungeonGenerator {
    /// Creates a new dungeon generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{DungeonGenerator, GenerationConfig, Generator};
    ///
    /// let config = GenerationConfig::with_shape("abc", 20, 3, 0.3);
    /// let mut rng = config.create_rng();
    /// let graph = DungeonGenerator::new().generate(&config, &mut rng).unwrap();
    /// assert_eq!(graph.level_count(), 20);
    /// ```
    pub fn new() -> Self {
        Self {
            apply_overlays: true,
            strict_validation: false,
        }
    }

    /// Creates a generator that fails on any connectivity diagnostic.
    pub fn for_testing() -> Self {
        Self {
            apply_overlays: true,
            strict_validation: true,
        }
    }

    /// Room count for `level` given the previous level's count.
    ///
    /// The last five interior levels narrow toward the boss; before that,
    /// early levels grow by up to one room, levels 6 to 10 by up to two, and
    /// deeper levels drift by one either way.
    pub fn room_count_for_level(
        &self,
        level: u32,
        previous: usize,
        config: &GenerationConfig,
        rng: &mut GameRng,
    ) -> usize {
        let remaining = config.levels.saturating_sub(level);
        let (delta, minimum) = if remaining <= 5 {
            if remaining <= 2 {
                (-rng.next_int(1, 2), 1)
            } else {
                (-rng.next_int(0, 1), 1)
            }
        } else if level <= 5 {
            (rng.next_int(0, 1), 2)
        } else if level <= 10 {
            (rng.next_int(0, 2), 2)
        } else {
            (rng.next_int(-1, 1), 2)
        };

        let count = (previous as i64 + delta).max(minimum);
        count.min(config.max_rooms_per_level.max(1) as i64) as usize
    }

    fn roll_room_type(&self, level: u32, config: &GenerationConfig, rng: &mut GameRng) -> RoomType {
        let weights = Stage::for_level(level, config.levels).weights();
        rng.weighted_choice(&weights)
            .copied()
            .unwrap_or(RoomType::Combat)
    }

    fn link(plans: &mut [RoomPlan], a: RoomId, b: RoomId) {
        plans[a as usize].connections.insert(b);
        plans[b as usize].connections.insert(a);
    }

    /// Wires every room of `current` to at least one room of `previous`.
    fn connect_layers(
        &self,
        plans: &mut [RoomPlan],
        previous: &[RoomId],
        current: &[RoomId],
        config: &GenerationConfig,
        rng: &mut GameRng,
    ) {
        let (prev_len, cur_len) = (previous.len(), current.len());
        if prev_len == 0 || cur_len == 0 {
            return;
        }

        // Positional pass: spread each predecessor across the new level.
        for (i, &from) in previous.iter().enumerate() {
            let target = (i * cur_len / prev_len).min(cur_len - 1);
            Self::link(plans, from, current[target]);
        }

        // Convergence pass: extra links to neighbouring positions.
        let link_chance = (config.convergence_rate * prev_len as f64 / cur_len as f64).min(1.0);
        for (i, &from) in previous.iter().enumerate() {
            let base = i * cur_len / prev_len;
            for neighbour in [base.checked_sub(1), Some(base + 1)].into_iter().flatten() {
                if neighbour < cur_len && rng.chance(link_chance) {
                    Self::link(plans, from, current[neighbour]);
                }
            }
        }

        // Orphan pass: anything still unreachable gets a random predecessor.
        for &to in current {
            let has_predecessor = previous
                .iter()
                .any(|from| plans[to as usize].connections.contains(from));
            if !has_predecessor {
                let from = previous[rng.next_index(prev_len)];
                debug!("Room {} orphaned, linking from {}", to, from);
                Self::link(plans, from, to);
            }
        }
    }

    /// Forces guaranteed room types onto the skeleton.
    fn apply_room_overlays(
        &self,
        plans: &mut [RoomPlan],
        layers: &[Vec<RoomId>],
        config: &GenerationConfig,
        rng: &mut GameRng,
    ) {
        let last_interior = config.levels.saturating_sub(1);
        let layer = |level: u32| layers.get(level as usize - 1);

        // Every fifth level offers a rest stop in place of a fight.
        for level in (5..=last_interior).step_by(5) {
            if let Some(ids) = layer(level) {
                if let Some(&id) = rng.choice(ids) {
                    if plans[id as usize].room_type == RoomType::Combat {
                        plans[id as usize].room_type = RoomType::Rest;
                    }
                }
            }
        }

        let mut place = |low: u32, high: u32, room_type: RoomType, rng: &mut GameRng| {
            let levels: Vec<u32> = (low..=high.min(last_interior)).collect();
            let Some(&level) = rng.choice(&levels) else {
                return;
            };
            let Some(ids) = layer(level) else {
                return;
            };
            if let Some(&id) = rng.choice(ids) {
                let plan = &mut plans[id as usize];
                if room_type == RoomType::Treasure && plan.room_type == RoomType::Rest {
                    return;
                }
                plan.room_type = room_type;
            }
        };

        place(10, 15, RoomType::Shop, rng);
        place(3, 8, RoomType::Treasure, rng);
    }
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<RoomGraph> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut GameRng) -> DelveResult<RoomGraph> {
        config.validate()?;

        let mut plans = vec![RoomPlan {
            level: 1,
            room_type: RoomType::Entrance,
            connections: BTreeSet::new(),
        }];
        let mut layers: Vec<Vec<RoomId>> = vec![vec![0]];

        for level in 2..config.levels {
            let previous = layers[layers.len() - 1].clone();
            let count = self.room_count_for_level(level, previous.len(), config, rng);
            let mut current = Vec::with_capacity(count);
            for _ in 0..count {
                let id = plans.len() as RoomId;
                plans.push(RoomPlan {
                    level,
                    room_type: self.roll_room_type(level, config, rng),
                    connections: BTreeSet::new(),
                });
                current.push(id);
            }
            self.connect_layers(&mut plans, &previous, &current, config, rng);
            layers.push(current);
        }

        let boss_id = plans.len() as RoomId;
        plans.push(RoomPlan {
            level: config.levels,
            room_type: RoomType::Boss,
            connections: BTreeSet::new(),
        });
        for &from in &layers[layers.len() - 1] {
            Self::link(&mut plans, from, boss_id);
        }
        layers.push(vec![boss_id]);

        if self.apply_overlays {
            self.apply_room_overlays(&mut plans, &layers, config, rng);
        }

        let mut rooms = Vec::with_capacity(plans.len());
        for (id, plan) in plans.into_iter().enumerate() {
            let mut room = Room::new(id as RoomId, plan.room_type, plan.level, rng);
            for connection in plan.connections {
                room.add_connection(connection);
            }
            rooms.push(room);
        }

        let layers = layers
            .into_iter()
            .enumerate()
            .map(|(index, room_ids)| DungeonLayer {
                level: index as u32 + 1,
                room_ids,
            })
            .collect();
        let graph = RoomGraph::from_parts(rooms, layers, 0, boss_id)?;

        let diagnostics = validate_connectivity(&graph);
        for problem in &diagnostics {
            warn!("Connectivity: {}", problem);
        }
        if self.strict_validation {
            self.validate(&graph, config)?;
        }

        info!(
            "Generated dungeon: seed={} levels={} rooms={}",
            config.seed,
            graph.level_count(),
            graph.len()
        );
        Ok(graph)
    }

    fn validate(&self, graph: &RoomGraph, config: &GenerationConfig) -> DelveResult<()> {
        let mut problems = validate_connectivity(graph);
        if graph.level_count() != config.levels as usize {
            problems.push(format!(
                "expected {} levels, found {}",
                config.levels,
                graph.level_count()
            ));
        }
        if let Some(layer) = graph
            .layers()
            .iter()
            .find(|layer| layer.room_ids.len() > config.max_rooms_per_level.max(1) as usize)
        {
            problems.push(format!(
                "level {} has {} rooms, cap is {}",
                layer.level,
                layer.room_ids.len(),
                config.max_rooms_per_level
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DelveError::GenerationFailed(problems.join("; ")))
        }
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

/// Checks the structural guarantees of a room graph.
///
/// Returns one message per problem; an empty list means the graph is sound.
pub fn validate_connectivity(graph: &RoomGraph) -> Vec<String> {
    let mut problems = Vec::new();
    let levels = graph.level_count() as u32;

    match graph.room(graph.entrance_id()) {
        Some(room) if room.room_type == RoomType::Entrance && room.level == 1 => {}
        _ => problems.push("entrance missing from level 1".to_string()),
    }
    match graph.room(graph.boss_id()) {
        Some(room) if room.room_type == RoomType::Boss && room.level == levels => {}
        _ => problems.push(format!("boss missing from level {}", levels)),
    }
    for (level, expected) in [(1, graph.entrance_id()), (levels, graph.boss_id())] {
        if let Some(layer) = graph.layer(level) {
            if layer.room_ids != [expected] {
                problems.push(format!("level {} must hold exactly one room", level));
            }
        }
    }

    for room in graph.rooms() {
        if room.id != graph.entrance_id() && graph.predecessors(room.id).is_empty() {
            problems.push(format!("room {} has no predecessor", room.id));
        }
        if room.id != graph.boss_id() && graph.successors(room.id).is_empty() {
            problems.push(format!("room {} has no successor", room.id));
        }
        for &other in &room.connections {
            let symmetric = graph
                .room(other)
                .map(|target| target.connections.contains(&room.id))
                .unwrap_or(false);
            if !symmetric {
                problems.push(format!("connection {} -> {} is one-way", room.id, other));
            }
        }
    }

    if let Some(layer) = graph.layer(levels.saturating_sub(1)) {
        for &id in &layer.room_ids {
            if !graph.successors(id).contains(&graph.boss_id()) {
                problems.push(format!("room {} does not reach the boss directly", id));
            }
        }
    }

    let reachable = reachable_set(graph.entrance_id(), |&id| graph.successors(id));
    if !reachable.contains(&graph.boss_id()) {
        problems.push("boss is unreachable from the entrance".to_string());
    }

    problems
}
