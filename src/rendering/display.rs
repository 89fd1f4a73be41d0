//! # Display Management
//!
//! Plain-text screens for a terminal front end: the layer map, the current
//! room, the character sheet and the combat view. Every method returns a
//! `String` so front ends decide where it goes.

use crate::rendering::{enemy_label, item_label, resource_bar, status_summary};
use crate::{
    Combatant, GameState, InteractableKind, Player, Room, RoomGraph, RoomState, TrapState,
    TurnSlot,
};

/// Text display with a rolling message panel.
#[derive(Debug, Clone)]
pub struct TerminalDisplay {
    /// Message history
    pub messages: Vec<String>,
    /// Maximum number of messages to keep
    pub max_messages: usize,
    /// Width of health and mana bars
    pub bar_width: usize,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn state_marker(state: RoomState) -> char {
    match state {
        RoomState::Locked => ' ',
        RoomState::Available => '+',
        RoomState::Active => '*',
        RoomState::Cleared => '.',
    }
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max_messages: 100,
            bar_width: 20,
        }
    }

    /// Adds a message, dropping the oldest past the limit.
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }

    /// The newest `count` messages, oldest first.
    pub fn recent_messages(&self, count: usize) -> &[String] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    /// One line per level: each room as glyph, id and state marker, with
    /// the current room in angle brackets.
    ///
    /// Markers: `+` available, `*` active, `.` cleared, blank when locked.
    pub fn render_map(&self, graph: &RoomGraph) -> String {
        let current = graph.current_room_id();
        let mut lines = Vec::with_capacity(graph.level_count() + 1);
        for layer in graph.layers() {
            let cells: Vec<String> = layer
                .room_ids
                .iter()
                .filter_map(|id| graph.room(*id))
                .map(|room| {
                    let cell = format!("{}{}{}", room.room_type.glyph(), room.id, state_marker(room.state));
                    if Some(room.id) == current {
                        format!("<{}>", cell)
                    } else {
                        format!(" {} ", cell)
                    }
                })
                .collect();
            lines.push(format!("L{:>2} |{}", layer.level, cells.join(" ")));
        }
        lines.push("     E entrance C combat X elite B boss T treasure R rest $ shop ? event P puzzle".to_string());
        lines.join("\n")
    }

    /// Describes a room and everything the player can do in it.
    pub fn render_room(&self, graph: &RoomGraph, room: &Room) -> String {
        let mut lines = vec![format!(
            "Room {}: {} (level {}, {})",
            room.id,
            room.room_type,
            room.level,
            room.state.label()
        )];

        for (index, enemy) in room.living_enemies().into_iter().enumerate() {
            lines.push(format!("  enemy {}", enemy_label(index, enemy)));
        }
        for (index, object) in room.interactables.iter().enumerate() {
            let note = match &object.kind {
                InteractableKind::Trap(trap) if trap.state == TrapState::Armed => format!("armed, DC {}", trap.dc),
                InteractableKind::Trap(_) => "spent".to_string(),
                InteractableKind::Lever { pulled } => (if *pulled { "down" } else { "up" }).to_string(),
                _ if object.used => "used".to_string(),
                _ => "untouched".to_string(),
            };
            lines.push(format!("  [{}] {} ({})", index, object.name(), note));
        }
        if let Some(stock) = room.shop.get() {
            lines.push("  The merchant offers:".to_string());
            for (index, entry) in stock.entries.iter().enumerate() {
                lines.push(format!("    {}. {} for {} gold", index, item_label(&entry.item), entry.price));
            }
        }
        if let Some(puzzle) = room.puzzle.get() {
            lines.push(format!("  Puzzle: {}", puzzle.prompt()));
            if !puzzle.is_resolved() {
                lines.push(format!("  {} attempt(s) left", puzzle.attempts_left));
            }
        }
        if let Some(event) = room.event.get() {
            lines.push(format!("  {}: {}", event.title, event.description));
        }

        let exits: Vec<String> = graph
            .successors(room.id)
            .into_iter()
            .filter_map(|id| graph.room(id))
            .filter(|next| next.can_enter())
            .map(|next| format!("{} ({})", next.id, next.room_type))
            .collect();
        if exits.is_empty() {
            lines.push("  No way onward".to_string());
        } else {
            lines.push(format!("  Exits: {}", exits.join(", ")));
        }
        lines.join("\n")
    }

    /// Character sheet summary.
    pub fn render_status(&self, player: &Player) -> String {
        let mut lines = vec![
            format!("{} the {} (level {})", player.name, player.class, player.level),
            format!(
                "HP {} {}/{}",
                resource_bar(player.health(), player.max_health(), self.bar_width),
                player.health(),
                player.max_health()
            ),
            format!(
                "MP {} {}/{}",
                resource_bar(player.mana(), player.max_mana(), self.bar_width),
                player.mana(),
                player.max_mana()
            ),
            format!(
                "ATK {}  DEF {}  SPD {}  Gold {}  XP {} (next in {})",
                player.attack_power(),
                player.effective_defense(),
                player.effective_speed(),
                player.gold,
                player.experience,
                player.xp_to_next_level()
            ),
        ];
        if player.soul_shards() > 0 {
            lines.push(format!("Soul shards: {}", player.soul_shards()));
        }
        if !player.status_effects.is_empty() {
            lines.push(format!("Afflictions: {}", status_summary(&player.status_effects)));
        }
        if !player.relics.is_empty() {
            let relics: Vec<&str> = player.relics.iter().map(|relic| relic.name.as_str()).collect();
            lines.push(format!("Relics: {}", relics.join(", ")));
        }
        lines.join("\n")
    }

    /// Equipment and numbered inventory slots.
    pub fn render_inventory(&self, player: &Player) -> String {
        let mut lines = vec!["Equipped:".to_string()];
        for item in player.equipment.iter() {
            lines.push(format!("  {}", item_label(item)));
        }
        lines.push("Pack:".to_string());
        if player.inventory.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for (index, item) in player.inventory.iter().enumerate() {
            lines.push(format!("  {}. {}", index, item_label(item)));
        }
        lines.join("\n")
    }

    /// The fight: enemies, turn order, abilities and cooldowns.
    pub fn render_combat(&self, state: &GameState) -> String {
        let Some(engine) = state.combat() else {
            return "No combat in progress".to_string();
        };
        let player = &state.player;
        let mut lines = vec![format!("Round {}", engine.round())];
        for (index, enemy) in engine.enemies().iter().enumerate() {
            lines.push(format!("  {}", enemy_label(index, enemy)));
        }

        let order: Vec<String> = engine
            .turn_order()
            .iter()
            .map(|slot| match slot {
                TurnSlot::Player => player.name.clone(),
                TurnSlot::Enemy(index) => engine
                    .enemies()
                    .get(*index)
                    .map(|enemy| enemy.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        lines.push(format!("Turn order: {}", order.join(" > ")));
        lines.push(format!(
            "You: {}/{} HP, {}/{} MP",
            player.health(),
            player.max_health(),
            player.mana(),
            player.max_mana()
        ));

        let abilities: Vec<String> = player
            .abilities()
            .into_iter()
            .map(|ability| {
                let def = ability.def();
                match player.cooldown(ability) {
                    0 => format!("{} ({} MP)", def.key, def.mana_cost),
                    turns => format!("{} (ready in {})", def.key, turns),
                }
            })
            .collect();
        lines.push(format!("Abilities: {}", abilities.join(", ")));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenerationConfig, PlayerClass};

    fn state() -> GameState {
        GameState::new(GenerationConfig::for_testing("display"), "Hero", PlayerClass::Fighter).unwrap()
    }

    #[test]
    fn test_map_has_a_line_per_level() {
        let state = state();
        let map = TerminalDisplay::new().render_map(&state.graph);
        assert_eq!(map.lines().count(), state.graph.level_count() + 1);
        assert!(map.lines().next().unwrap().contains("<E0*>"));
    }

    #[test]
    fn test_room_lists_exits() {
        let state = state();
        let display = TerminalDisplay::new();
        let text = display.render_room(&state.graph, state.current_room().unwrap());
        assert!(text.starts_with("Room 0: Entrance"));
        assert!(text.contains("Exits:"));
    }

    #[test]
    fn test_message_panel_is_bounded() {
        let mut display = TerminalDisplay::new();
        display.max_messages = 3;
        for n in 0..5 {
            display.add_message(format!("m{}", n));
        }
        assert_eq!(display.messages, vec!["m2", "m3", "m4"]);
        assert_eq!(display.recent_messages(2), ["m3", "m4"]);
    }

    #[test]
    fn test_status_and_combat_views() {
        let state = state();
        let display = TerminalDisplay::new();
        assert!(display.render_status(&state.player).contains("Hero the Fighter"));
        assert!(display.render_inventory(&state.player).contains("Pack:"));
        assert_eq!(display.render_combat(&state), "No combat in progress");
    }
}
