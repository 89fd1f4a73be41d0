//! # User Interface Elements
//!
//! Small text widgets: resource bars, item and status labels.

use crate::{Combatant, Enemy, Item, ItemKind, StatusEffect};

/// Draws a fixed-width bar such as `[######----]`.
///
/// # Examples
///
/// ```
/// use delve::resource_bar;
///
/// assert_eq!(resource_bar(5, 10, 10), "[#####-----]");
/// assert_eq!(resource_bar(0, 0, 4), "[----]");
/// ```
pub fn resource_bar(current: i32, max: i32, width: usize) -> String {
    let filled = if max <= 0 {
        0
    } else {
        ((current.clamp(0, max) as f64 / max as f64) * width as f64).round() as usize
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled.min(width)))
}

/// Status effects as a compact list, e.g. `poisoned(2) stunned(1)`.
pub fn status_summary(effects: &[StatusEffect]) -> String {
    effects
        .iter()
        .map(|effect| format!("{}({})", effect.kind.label(), effect.remaining_turns))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line description of an item.
pub fn item_label(item: &Item) -> String {
    let detail = match &item.kind {
        ItemKind::Weapon { damage } => format!("weapon {}", damage),
        ItemKind::Armor => "armor".to_string(),
        ItemKind::Accessory => "accessory".to_string(),
        ItemKind::Consumable(_) => "consumable".to_string(),
    };
    format!("{} ({}, {}, {}g)", item.name, item.rarity.label(), detail, item.value)
}

/// One-line description of an enemy in a fight.
pub fn enemy_label(index: usize, enemy: &Enemy) -> String {
    if !enemy.is_alive() {
        return format!("{}. {} (defeated)", index, enemy.name);
    }
    let mut line = format!(
        "{}. {} {} {}/{}",
        index,
        enemy.name,
        resource_bar(enemy.health(), enemy.max_health(), 10),
        enemy.health(),
        enemy.max_health()
    );
    if !enemy.status_effects.is_empty() {
        line.push_str(&format!(" {}", status_summary(&enemy.status_effects)));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_bar_clamps() {
        assert_eq!(resource_bar(15, 10, 4), "[####]");
        assert_eq!(resource_bar(-3, 10, 4), "[----]");
        assert_eq!(resource_bar(1, 3, 3), "[#--]");
    }
}
