//! # Interactables
//!
//! Objects placed in rooms: chests, traps, altars, levers and NPCs.
//!
//! Traps are the interesting one. A disarm attempt rolls d20 plus the
//! player's disarm bonus against the trap's DC. Meeting the DC disarms it
//! and awards a relic; missing by less than [`TRAP_TRIGGER_MARGIN`] leaves
//! it armed for another try; missing by the margin or more sets it off.

use crate::config::TRAP_TRIGGER_MARGIN;
use crate::{
    generate_loot_for_level, generate_trap_relic, ActionResult, Buff, Combatant, GameRng, Item,
    Player, RoomType, StatBonuses, StatusEffect, StatusKind,
};
use serde::{Deserialize, Serialize};

/// Trap flavours, each with its own follow-up status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapKind {
    Spikes,
    PoisonDarts,
    FlameJet,
    FrostRune,
}

impl TrapKind {
    pub fn label(self) -> &'static str {
        match self {
            TrapKind::Spikes => "spike trap",
            TrapKind::PoisonDarts => "poison dart trap",
            TrapKind::FlameJet => "flame jet",
            TrapKind::FrostRune => "frost rune",
        }
    }

    fn status(self, level: u32) -> Option<StatusEffect> {
        let magnitude = 2 + level as i32 / 3;
        match self {
            TrapKind::Spikes => None,
            TrapKind::PoisonDarts => Some(StatusEffect::new(StatusKind::Poison, 3, magnitude)),
            TrapKind::FlameJet => Some(StatusEffect::new(StatusKind::Burn, 2, magnitude)),
            TrapKind::FrostRune => Some(StatusEffect::new(StatusKind::Slow, 3, magnitude)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapState {
    Armed,
    Disarmed,
    Triggered,
}

/// Result of comparing a disarm roll to a DC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisarmOutcome {
    Success,
    /// Missed by less than the trigger margin; the trap stays armed
    Failed { margin: i32 },
    Triggered { margin: i32 },
}

/// Pure disarm rule: `total >= dc` succeeds, a miss by
/// [`TRAP_TRIGGER_MARGIN`] or more triggers.
///
/// # Examples
///
/// ```
/// use delve::{resolve_disarm, DisarmOutcome};
///
/// assert_eq!(resolve_disarm(15, 15), DisarmOutcome::Success);
/// assert_eq!(resolve_disarm(15, 11), DisarmOutcome::Failed { margin: 4 });
/// assert_eq!(resolve_disarm(15, 10), DisarmOutcome::Triggered { margin: 5 });
/// ```
pub fn resolve_disarm(dc: i32, total: i32) -> DisarmOutcome {
    let margin = dc - total;
    if margin <= 0 {
        DisarmOutcome::Success
    } else if margin >= TRAP_TRIGGER_MARGIN {
        DisarmOutcome::Triggered { margin }
    } else {
        DisarmOutcome::Failed { margin }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trap {
    pub kind: TrapKind,
    pub dc: i32,
    pub damage: i32,
    pub level: u32,
    pub state: TrapState,
}

impl Trap {
    /// Rolls a trap for `level`. DC runs from 10 upward with depth.
    pub fn roll(level: u32, rng: &mut GameRng) -> Self {
        let kinds = [
            TrapKind::Spikes,
            TrapKind::PoisonDarts,
            TrapKind::FlameJet,
            TrapKind::FrostRune,
        ];
        let kind = kinds[rng.next_index(kinds.len())];
        Self {
            kind,
            dc: 10 + level as i32 / 2 + rng.next_int(0, 3) as i32,
            damage: 4 + level as i32 * 2,
            level,
            state: TrapState::Armed,
        }
    }

    /// Springs the trap on the player. Returns a description.
    pub fn trigger(&mut self, player: &mut Player) -> String {
        self.state = TrapState::Triggered;
        let lost = player.lose_health(self.damage);
        let mut message = format!("The {} goes off for {} damage", self.kind.label(), lost);
        if let Some(status) = self.kind.status(self.level) {
            player.apply_status(status);
            message.push_str(&format!(" and leaves you {}", status.kind.label()));
        }
        message
    }
}

/// Interactable variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractableKind {
    Chest { gold: u32, items: Vec<Item> },
    Trap(Trap),
    Altar { blessing: Buff },
    Lever { pulled: bool },
    Npc { name: String, line: String, gift: Option<Item> },
}

/// An object in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    pub kind: InteractableKind,
    /// Whether the one-shot interaction has happened
    pub used: bool,
}

impl Interactable {
    pub fn new(kind: InteractableKind) -> Self {
        Self { kind, used: false }
    }

    pub fn name(&self) -> String {
        match &self.kind {
            InteractableKind::Chest { .. } => "chest".to_string(),
            InteractableKind::Trap(trap) => trap.kind.label().to_string(),
            InteractableKind::Altar { .. } => "altar".to_string(),
            InteractableKind::Lever { .. } => "lever".to_string(),
            InteractableKind::Npc { name, .. } => name.clone(),
        }
    }

    pub fn is_trap(&self) -> bool {
        matches!(self.kind, InteractableKind::Trap(_))
    }

    /// Uses a chest, altar, lever or NPC.
    ///
    /// Levers toggle on every pull; the rest work once. Traps are handled by
    /// [`Interactable::disarm`].
    pub fn interact(&mut self, player: &mut Player) -> ActionResult {
        if let InteractableKind::Lever { pulled } = &mut self.kind {
            *pulled = !*pulled;
            let position = if *pulled { "down" } else { "up" };
            return ActionResult::success(format!("The lever clanks {}", position));
        }
        if self.is_trap() {
            return ActionResult::rejected("Traps must be disarmed, not handled");
        }
        if self.used {
            return ActionResult::rejected(format!("The {} has nothing more to offer", self.name()));
        }
        self.used = true;

        let message = match &mut self.kind {
            InteractableKind::Chest { gold, items } => {
                player.gold += *gold;
                let mut found = vec![format!("{} gold", gold)];
                for item in items.drain(..) {
                    found.push(item.name.clone());
                    player.add_item(item);
                }
                format!("You open the chest: {}", found.join(", "))
            }
            InteractableKind::Altar { blessing } => {
                player.add_buff(blessing.clone());
                format!("You kneel at the altar and receive {}", blessing.name)
            }
            InteractableKind::Npc { name, line, gift } => match gift.take() {
                Some(item) => {
                    let text = format!("{}: \"{}\" They hand you a {}", name, line, item.name);
                    player.add_item(item);
                    text
                }
                None => format!("{}: \"{}\"", name, line),
            },
            InteractableKind::Lever { .. } | InteractableKind::Trap(_) => String::new(),
        };
        ActionResult::success(message)
    }

    /// Attempts to disarm a trap with a d20 roll plus the player's bonus.
    pub fn disarm(&mut self, player: &mut Player, rng: &mut GameRng) -> (ActionResult, Option<DisarmOutcome>) {
        let InteractableKind::Trap(trap) = &mut self.kind else {
            return (ActionResult::rejected(format!("The {} is not a trap", self.name())), None);
        };
        if trap.state != TrapState::Armed {
            return (ActionResult::rejected("That trap is no longer armed"), None);
        }

        let roll = rng.d20();
        let total = roll + player.disarm_bonus();
        let outcome = resolve_disarm(trap.dc, total);
        let result = match outcome {
            DisarmOutcome::Success => {
                trap.state = TrapState::Disarmed;
                self.used = true;
                let owned = player.owned_relic_base_ids();
                let relic = generate_trap_relic(trap.dc, trap.level, &owned, Some(rng));
                let message = format!(
                    "You disarm the {} (rolled {} vs DC {}) and find the {}",
                    trap.kind.label(),
                    total,
                    trap.dc,
                    relic.name
                );
                player.add_relic(relic);
                ActionResult::success(message)
            }
            DisarmOutcome::Failed { margin } => ActionResult::failed(format!(
                "You fumble with the {} (missed by {}), but it holds",
                trap.kind.label(),
                margin
            )),
            DisarmOutcome::Triggered { margin } => {
                self.used = true;
                let text = trap.trigger(player);
                ActionResult::failed(format!("You slip (missed by {}). {}", margin, text))
            }
        };
        (result, Some(outcome))
    }
}

const NPC_LINES: &[(&str, &str)] = &[
    ("Wandering Monk", "The deeper halls reward patience."),
    ("Lost Cartographer", "Every path narrows before the end."),
    ("Old Sellsword", "Strike first, and strike hard."),
    ("Hooded Pilgrim", "The boss waits below. It cannot be fled."),
];

fn chest(level: u32, rng: &mut GameRng) -> Interactable {
    let gold = 5 + level * 3 + rng.next_int(0, 10) as u32;
    let items = if rng.chance(0.5) {
        generate_loot_for_level(level, Some(rng), false)
    } else {
        Vec::new()
    };
    Interactable::new(InteractableKind::Chest { gold, items })
}

fn altar(level: u32) -> Interactable {
    let bonus = StatBonuses {
        attack: 1 + level as i32 / 5,
        defense: 1 + level as i32 / 5,
        ..StatBonuses::default()
    };
    Interactable::new(InteractableKind::Altar {
        blessing: Buff::new("Altar Blessing", bonus, 6),
    })
}

fn npc(level: u32, rng: &mut GameRng, with_gift: bool) -> Interactable {
    let (name, line) = NPC_LINES[rng.next_index(NPC_LINES.len())];
    let gift = if with_gift && rng.chance(0.5) {
        generate_loot_for_level(level, Some(rng), false).into_iter().next()
    } else {
        None
    };
    Interactable::new(InteractableKind::Npc {
        name: name.to_string(),
        line: line.to_string(),
        gift,
    })
}

fn trap(level: u32, rng: &mut GameRng) -> Interactable {
    Interactable::new(InteractableKind::Trap(Trap::roll(level, rng)))
}

/// Rolls the interactables a room of `room_type` starts with.
pub fn generate_interactables(room_type: RoomType, level: u32, rng: &mut GameRng) -> Vec<Interactable> {
    let mut objects = Vec::new();
    match room_type {
        RoomType::Entrance => {}
        RoomType::Treasure => {
            for _ in 0..rng.next_int(1, 2) {
                objects.push(chest(level, rng));
            }
            if rng.chance(0.3) {
                objects.push(trap(level, rng));
            }
        }
        RoomType::Puzzle => {
            for _ in 0..rng.next_int(1, 3) {
                objects.push(Interactable::new(InteractableKind::Lever { pulled: false }));
            }
            if rng.chance(0.5) {
                objects.push(trap(level, rng));
            }
        }
        RoomType::Combat => {
            if rng.chance(0.2) {
                objects.push(chest(level, rng));
            }
            if rng.chance(0.15) {
                objects.push(trap(level, rng));
            }
        }
        RoomType::Elite | RoomType::Boss => objects.push(chest(level, rng)),
        RoomType::Rest => {
            if rng.chance(0.4) {
                objects.push(altar(level));
            }
            if rng.chance(0.3) {
                objects.push(npc(level, rng, true));
            }
        }
        RoomType::Shop => objects.push(npc(level, rng, false)),
        RoomType::Event => {
            if rng.chance(0.5) {
                objects.push(altar(level));
            }
            if rng.chance(0.3) {
                objects.push(npc(level, rng, true));
            }
        }
    }
    objects
}
