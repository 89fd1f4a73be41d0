//! # Room Graph
//!
//! The dungeon as a leveled graph of rooms. Connections are stored on both
//! ends; "successors" are the neighbours one level deeper and
//! "predecessors" the neighbours one level up.
//!
//! Moving commits the player to a branch: siblings of the chosen room and
//! deeper rooms it can no longer reach are locked again. This re-locking of
//! `Available` rooms is the only backward state change in the game.

use crate::{reachable_set, shortest_route, DelveError, DelveResult, GameRng, Room, RoomId, RoomState};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The rooms on one level, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonLayer {
    pub level: u32,
    pub room_ids: Vec<RoomId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
    layers: Vec<DungeonLayer>,
    entrance_id: RoomId,
    boss_id: RoomId,
    current_room: Option<RoomId>,
}

impl RoomGraph {
    /// Assembles a graph from generated rooms.
    pub fn from_parts(
        rooms: Vec<Room>,
        layers: Vec<DungeonLayer>,
        entrance_id: RoomId,
        boss_id: RoomId,
    ) -> DelveResult<Self> {
        let rooms: BTreeMap<RoomId, Room> = rooms.into_iter().map(|room| (room.id, room)).collect();
        for id in [entrance_id, boss_id] {
            if !rooms.contains_key(&id) {
                return Err(DelveError::GenerationFailed(format!("room {} does not exist", id)));
            }
        }
        if let Some(missing) = layers
            .iter()
            .flat_map(|layer| layer.room_ids.iter())
            .find(|id| !rooms.contains_key(id))
        {
            return Err(DelveError::GenerationFailed(format!(
                "layer lists unknown room {}",
                missing
            )));
        }

        Ok(Self {
            rooms,
            layers,
            entrance_id,
            boss_id,
            current_room: None,
        })
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// All rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn layers(&self) -> &[DungeonLayer] {
        &self.layers
    }

    /// Layer for a 1-based level.
    pub fn layer(&self, level: u32) -> Option<&DungeonLayer> {
        self.layers.iter().find(|layer| layer.level == level)
    }

    pub fn level_count(&self) -> usize {
        self.layers.len()
    }

    pub fn entrance_id(&self) -> RoomId {
        self.entrance_id
    }

    pub fn boss_id(&self) -> RoomId {
        self.boss_id
    }

    pub fn current_room_id(&self) -> Option<RoomId> {
        self.current_room
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.current_room.and_then(|id| self.rooms.get(&id))
    }

    pub fn current_room_mut(&mut self) -> Option<&mut Room> {
        let id = self.current_room?;
        self.rooms.get_mut(&id)
    }

    fn neighbours_at(&self, id: RoomId, level_offset: i64) -> Vec<RoomId> {
        let Some(room) = self.rooms.get(&id) else {
            return Vec::new();
        };
        let wanted = room.level as i64 + level_offset;
        room.connections
            .iter()
            .copied()
            .filter(|other| {
                self.rooms
                    .get(other)
                    .map(|r| r.level as i64 == wanted)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Connected rooms one level deeper.
    pub fn successors(&self, id: RoomId) -> Vec<RoomId> {
        self.neighbours_at(id, 1)
    }

    /// Connected rooms one level up.
    pub fn predecessors(&self, id: RoomId) -> Vec<RoomId> {
        self.neighbours_at(id, -1)
    }

    /// Every room reachable by moving forward from `id`, `id` included.
    pub fn reachable_from(&self, id: RoomId) -> BTreeSet<RoomId> {
        reachable_set(id, |&room| self.successors(room))
    }

    /// Shortest forward route from `from` to the boss.
    pub fn route_to_boss(&self, from: RoomId) -> Option<Vec<RoomId>> {
        shortest_route(&from, &self.boss_id, |&room| self.successors(room))
    }

    /// Rooms the player may move to next.
    pub fn available_rooms(&self) -> Vec<RoomId> {
        self.rooms
            .values()
            .filter(|room| room.state == RoomState::Available)
            .map(|room| room.id)
            .collect()
    }

    pub fn is_boss_cleared(&self) -> bool {
        self.room(self.boss_id)
            .map(Room::is_cleared)
            .unwrap_or(false)
    }

    fn unlock_successors(&mut self, id: RoomId) {
        for next in self.successors(id) {
            if let Some(room) = self.rooms.get_mut(&next) {
                room.unlock();
            }
        }
    }

    /// Places the player in the entrance and opens its successors.
    pub fn start_session(&mut self, rng: &mut GameRng) -> DelveResult<()> {
        if self.current_room.is_some() {
            return Err(DelveError::InvalidState("session already started".to_string()));
        }
        let entrance_id = self.entrance_id;
        let entrance = self
            .rooms
            .get_mut(&entrance_id)
            .ok_or_else(|| DelveError::InvalidState("dungeon has no entrance".to_string()))?;
        entrance.state = RoomState::Available;
        entrance.enter(rng)?;
        self.current_room = Some(entrance_id);
        self.unlock_successors(entrance_id);
        Ok(())
    }

    /// Moves the player along a connection into `target`.
    ///
    /// The room being left is cleared (forfeiting any unclaimed reward),
    /// same-level alternatives lock, deeper rooms the target cannot reach
    /// lock, and the target's successors open up.
    pub fn move_to_room(&mut self, target: RoomId, rng: &mut GameRng) -> DelveResult<()> {
        let current = self
            .current_room
            .ok_or_else(|| DelveError::InvalidState("session has not started".to_string()))?;
        let from = self
            .rooms
            .get(&current)
            .ok_or_else(|| DelveError::InvalidState(format!("current room {} missing", current)))?;
        let to = self
            .rooms
            .get(&target)
            .ok_or_else(|| DelveError::InvalidAction(format!("room {} does not exist", target)))?;
        if !from.connections.contains(&target) {
            return Err(DelveError::InvalidAction(format!(
                "room {} is not connected to room {}",
                target, current
            )));
        }
        if !to.can_enter() {
            return Err(DelveError::InvalidAction(format!(
                "room {} is {}",
                target,
                to.state.label()
            )));
        }
        let target_level = to.level;

        if let Some(previous) = self.rooms.get_mut(&current) {
            previous.abandon();
        }

        let reachable = self.reachable_from(target);
        let mut locked = 0;
        for room in self.rooms.values_mut() {
            let sibling = room.level == target_level && room.id != target;
            let stranded = room.level > target_level && !reachable.contains(&room.id);
            if (sibling || stranded) && room.lock() {
                locked += 1;
            }
        }

        let room = self
            .rooms
            .get_mut(&target)
            .ok_or_else(|| DelveError::InvalidAction(format!("room {} does not exist", target)))?;
        room.enter(rng)?;
        self.current_room = Some(target);
        self.unlock_successors(target);
        debug!("Moved {} -> {} (locked {} rooms)", current, target, locked);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoomType;

    /// Entrance 0 → {1, 2} → 3 (boss), with 1 and 2 both feeding the boss.
    fn diamond() -> RoomGraph {
        let mut rng = GameRng::from_u64(1);
        let mut rooms = vec![
            Room::new(0, RoomType::Entrance, 1, &mut rng),
            Room::new(1, RoomType::Treasure, 2, &mut rng),
            Room::new(2, RoomType::Rest, 2, &mut rng),
            Room::new(3, RoomType::Boss, 3, &mut rng),
        ];
        for (a, b) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
            rooms[a].add_connection(b as RoomId);
            rooms[b].add_connection(a as RoomId);
        }
        let layers = vec![
            DungeonLayer { level: 1, room_ids: vec![0] },
            DungeonLayer { level: 2, room_ids: vec![1, 2] },
            DungeonLayer { level: 3, room_ids: vec![3] },
        ];
        RoomGraph::from_parts(rooms, layers, 0, 3).unwrap()
    }

    #[test]
    fn test_start_session_opens_successors() {
        let mut graph = diamond();
        let mut rng = GameRng::from_u64(2);
        graph.start_session(&mut rng).unwrap();
        assert_eq!(graph.current_room_id(), Some(0));
        assert_eq!(graph.room(0).unwrap().state, RoomState::Active);
        assert_eq!(graph.available_rooms(), vec![1, 2]);
        assert!(graph.start_session(&mut rng).is_err());
    }

    #[test]
    fn test_move_locks_siblings() {
        let mut graph = diamond();
        let mut rng = GameRng::from_u64(2);
        graph.start_session(&mut rng).unwrap();
        graph.move_to_room(1, &mut rng).unwrap();

        assert_eq!(graph.room(0).unwrap().state, RoomState::Cleared);
        assert_eq!(graph.room(1).unwrap().state, RoomState::Active);
        assert_eq!(graph.room(2).unwrap().state, RoomState::Locked);
        assert_eq!(graph.room(3).unwrap().state, RoomState::Available);
        assert!(graph.move_to_room(2, &mut rng).is_err());
    }

    #[test]
    fn test_move_requires_connection() {
        let mut graph = diamond();
        let mut rng = GameRng::from_u64(2);
        assert!(graph.move_to_room(1, &mut rng).is_err());
        graph.start_session(&mut rng).unwrap();
        assert!(graph.move_to_room(3, &mut rng).is_err());
        assert!(graph.move_to_room(42, &mut rng).is_err());
    }

    #[test]
    fn test_cannot_walk_back_into_cleared_room() {
        let mut graph = diamond();
        let mut rng = GameRng::from_u64(2);
        graph.start_session(&mut rng).unwrap();
        graph.move_to_room(2, &mut rng).unwrap();
        assert!(graph.move_to_room(0, &mut rng).is_err());
    }

    #[test]
    fn test_route_and_reachability() {
        let graph = diamond();
        assert_eq!(graph.route_to_boss(0).map(|r| r.len()), Some(3));
        assert_eq!(graph.reachable_from(1), [1, 3].into_iter().collect());
        assert_eq!(graph.successors(0), vec![1, 2]);
        assert_eq!(graph.predecessors(3), vec![1, 2]);
    }

    #[test]
    fn test_from_parts_rejects_unknown_ids() {
        let mut rng = GameRng::from_u64(1);
        let rooms = vec![Room::new(0, RoomType::Entrance, 1, &mut rng)];
        let layers = vec![DungeonLayer { level: 1, room_ids: vec![0] }];
        assert!(RoomGraph::from_parts(rooms, layers, 0, 9).is_err());
    }
}
