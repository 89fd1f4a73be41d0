//! # Dungeon Events
//!
//! One-shot narrative encounters for event rooms. An event is rolled when
//! the room is first entered and resolves exactly once.

use crate::{
    generate_loot_for_level, ActionResult, Buff, Combatant, GameRng, Item, Player, StatBonuses,
    StatusEffect, StatusKind,
};
use serde::{Deserialize, Serialize};

/// What resolving an event does to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventEffect {
    Heal(i32),
    /// Direct damage, never lethal
    Damage(i32),
    Gold(u32),
    Experience(u64),
    Item(Item),
    Blessing(Buff),
    Curse(StatusEffect),
    Nothing,
}

/// A rolled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonEvent {
    pub title: String,
    pub description: String,
    pub effect: EventEffect,
    pub resolved: bool,
}

impl DungeonEvent {
    /// Applies the effect to the player. A second call is rejected.
    pub fn resolve(&mut self, player: &mut Player) -> ActionResult {
        if self.resolved {
            return ActionResult::rejected(format!("{} has already run its course", self.title));
        }
        self.resolved = true;

        let outcome = match &self.effect {
            EventEffect::Heal(amount) => format!("You recover {} health", player.heal(*amount)),
            EventEffect::Damage(amount) => {
                let capped = (*amount).min(player.health() - 1).max(0);
                player.lose_health(capped);
                format!("You take {} damage", capped)
            }
            EventEffect::Gold(amount) => {
                player.gold += amount;
                format!("You find {} gold", amount)
            }
            EventEffect::Experience(amount) => {
                let levels = player.gain_experience(*amount);
                if levels > 0 {
                    format!("You gain {} experience and reach level {}", amount, player.level)
                } else {
                    format!("You gain {} experience", amount)
                }
            }
            EventEffect::Item(item) => {
                player.add_item(item.clone());
                format!("You take the {}", item.name)
            }
            EventEffect::Blessing(buff) => {
                player.add_buff(buff.clone());
                format!("{} settles over you", buff.name)
            }
            EventEffect::Curse(status) => {
                player.apply_status(*status);
                format!("You are afflicted with {}", status.kind.label())
            }
            EventEffect::Nothing => "Nothing happens".to_string(),
        };
        ActionResult::success(format!("{}. {}", self.description, outcome))
    }
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    HealingSpring,
    CollapsingCeiling,
    ForgottenPurse,
    AncientMural,
    AbandonedPack,
    ShrineOfValor,
    CursedIdol,
    EmptyHall,
}

const EVENT_WEIGHTS: [(EventKind, f64); 8] = [
    (EventKind::HealingSpring, 15.0),
    (EventKind::CollapsingCeiling, 10.0),
    (EventKind::ForgottenPurse, 15.0),
    (EventKind::AncientMural, 15.0),
    (EventKind::AbandonedPack, 12.0),
    (EventKind::ShrineOfValor, 10.0),
    (EventKind::CursedIdol, 8.0),
    (EventKind::EmptyHall, 5.0),
];

/// Rolls an event for a room at `level`.
pub fn generate_event(level: u32, rng: &mut GameRng) -> DungeonEvent {
    let kind = rng
        .weighted_choice(&EVENT_WEIGHTS)
        .copied()
        .unwrap_or(EventKind::EmptyHall);
    let level_i = level as i32;

    let (title, description, effect) = match kind {
        EventKind::HealingSpring => (
            "Healing Spring",
            "Clear water bubbles from a crack in the floor",
            EventEffect::Heal(20 + level_i * 3),
        ),
        EventKind::CollapsingCeiling => (
            "Collapsing Ceiling",
            "Stones rain down as the ceiling gives way",
            EventEffect::Damage(5 + level_i * 2),
        ),
        EventKind::ForgottenPurse => (
            "Forgotten Purse",
            "A rotted purse lies under a skeleton's hand",
            EventEffect::Gold(15 + level * 5),
        ),
        EventKind::AncientMural => (
            "Ancient Mural",
            "A faded mural recounts the battles of those who came before",
            EventEffect::Experience(20 + level as u64 * 8),
        ),
        EventKind::AbandonedPack => {
            let loot = generate_loot_for_level(level, Some(rng), false);
            let effect = loot
                .into_iter()
                .next()
                .map(EventEffect::Item)
                .unwrap_or(EventEffect::Nothing);
            ("Abandoned Pack", "A traveller's pack slumps against the wall", effect)
        }
        EventKind::ShrineOfValor => (
            "Shrine of Valor",
            "A soldier's shrine hums with old resolve",
            EventEffect::Blessing(Buff::new("Valor", StatBonuses::attack(3), 5)),
        ),
        EventKind::CursedIdol => (
            "Cursed Idol",
            "An idol's eyes flare green as you pass",
            EventEffect::Curse(StatusEffect::new(StatusKind::Poison, 3, 1 + level_i / 2)),
        ),
        EventKind::EmptyHall => (
            "Empty Hall",
            "Dust and silence fill the hall",
            EventEffect::Nothing,
        ),
    };

    DungeonEvent {
        title: title.to_string(),
        description: description.to_string(),
        effect,
        resolved: false,
    }
}
