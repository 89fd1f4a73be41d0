//! # Entity System
//!
//! Combat-facing entity model shared by the player and enemies.
//!
//! Both sides of a fight implement [`Combatant`], which carries the stat
//! block, timed status effects and the damage/heal rules. The player adds
//! equipment, buffs and relics on top (see [`crate::Player`]).

use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Raw stat block of a combatant, before equipment, buffs or relics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
}

impl CombatStats {
    /// Stat block at full health and mana.
    pub fn new(max_health: i32, max_mana: i32, attack: i32, defense: i32, speed: i32) -> Self {
        Self {
            health: max_health,
            max_health,
            mana: max_mana,
            max_mana,
            attack,
            defense,
            speed,
            crit_chance: 0.05,
            crit_multiplier: 1.5,
        }
    }

    /// Overrides the critical hit profile.
    pub fn with_crit(mut self, chance: f64, multiplier: f64) -> Self {
        self.crit_chance = chance;
        self.crit_multiplier = multiplier;
        self
    }
}

/// Timed status effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage each turn
    Poison,
    /// Damage each turn
    Burn,
    /// Lowers attack power by the magnitude
    Slow,
    /// Skips turns
    Stun,
    /// Skips turns
    Freeze,
}

impl StatusKind {
    /// Ticks damage at the start of the afflicted combatant's turn.
    pub fn is_damage_over_time(self) -> bool {
        matches!(self, StatusKind::Poison | StatusKind::Burn)
    }

    /// Prevents the afflicted combatant from acting.
    pub fn incapacitates(self) -> bool {
        matches!(self, StatusKind::Stun | StatusKind::Freeze)
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Poison => "poison",
            StatusKind::Burn => "burn",
            StatusKind::Slow => "slow",
            StatusKind::Stun => "stun",
            StatusKind::Freeze => "freeze",
        }
    }
}

/// An active status effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining_turns: u32,
    /// Damage per tick for DOTs, attack penalty for slow, unused otherwise
    pub magnitude: i32,
}

impl StatusEffect {
    /// Creates a new status effect.
    pub fn new(kind: StatusKind, remaining_turns: u32, magnitude: i32) -> Self {
        Self {
            kind,
            remaining_turns,
            magnitude,
        }
    }
}

/// Outcome of one start-of-turn status pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTick {
    /// Total DOT damage taken this tick
    pub damage: i32,
    /// Whether a stun or freeze eats this turn
    pub incapacitated: bool,
    /// Effects that ran out during this tick
    pub expired: Vec<StatusKind>,
}

/// Damage left after defense: `raw - floor(defense / 2)`, never below 1.
///
/// # Examples
///
/// ```
/// use delve::mitigate_damage;
///
/// assert_eq!(mitigate_damage(10, 4), 8);
/// assert_eq!(mitigate_damage(3, 100), 1);
/// ```
pub fn mitigate_damage(raw: i32, defense: i32) -> i32 {
    (raw - defense.div_euclid(2)).max(1)
}

/// Adds a status, refreshing an existing one of the same kind.
///
/// A refresh keeps the longer duration and the larger magnitude, so repeated
/// procs never shorten an effect.
pub fn add_status(effects: &mut Vec<StatusEffect>, effect: StatusEffect) {
    if let Some(existing) = effects.iter_mut().find(|e| e.kind == effect.kind) {
        existing.remaining_turns = existing.remaining_turns.max(effect.remaining_turns);
        existing.magnitude = existing.magnitude.max(effect.magnitude);
    } else if effect.remaining_turns > 0 {
        effects.push(effect);
    }
}

/// Runs one start-of-turn pass: sums DOT damage, checks incapacitation,
/// decrements durations and drops expired effects.
pub fn tick_statuses(effects: &mut Vec<StatusEffect>) -> StatusTick {
    let mut tick = StatusTick::default();

    for effect in effects.iter_mut() {
        if effect.remaining_turns == 0 {
            continue;
        }
        if effect.kind.is_damage_over_time() {
            tick.damage += effect.magnitude.max(0);
        }
        if effect.kind.incapacitates() {
            tick.incapacitated = true;
        }
        effect.remaining_turns -= 1;
        if effect.remaining_turns == 0 {
            tick.expired.push(effect.kind);
        }
    }

    effects.retain(|effect| effect.remaining_turns > 0);
    tick
}

/// Capabilities shared by everything that fights.
pub trait Combatant {
    /// Display name.
    fn name(&self) -> &str;

    /// Raw stat block.
    fn stats(&self) -> &CombatStats;

    /// Raw stat block, mutably.
    fn stats_mut(&mut self) -> &mut CombatStats;

    /// Active status effects.
    fn status_effects(&self) -> &[StatusEffect];

    /// Active status effects, mutably.
    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffect>;

    /// Attack power after every modifier, before crits.
    fn attack_power(&self) -> i32;

    /// Defense after every modifier.
    fn effective_defense(&self) -> i32 {
        self.stats().defense
    }

    /// Speed used for turn order.
    fn effective_speed(&self) -> i32 {
        self.stats().speed
    }

    /// Critical hit chance in `[0, 1]`.
    fn crit_chance(&self) -> f64 {
        self.stats().crit_chance
    }

    /// Damage multiplier on a critical hit.
    fn crit_multiplier(&self) -> f64 {
        self.stats().crit_multiplier
    }

    /// Health cap after every modifier.
    fn max_health(&self) -> i32 {
        self.stats().max_health
    }

    /// Current health.
    fn health(&self) -> i32 {
        self.stats().health
    }

    /// Whether health is above zero.
    fn is_alive(&self) -> bool {
        self.health() > 0
    }

    /// Attack penalty from active slows.
    fn slow_penalty(&self) -> i32 {
        self.status_effects()
            .iter()
            .filter(|effect| effect.kind == StatusKind::Slow)
            .map(|effect| effect.magnitude.max(0))
            .sum()
    }

    /// Whether a stun or freeze is active.
    fn is_incapacitated(&self) -> bool {
        self.status_effects()
            .iter()
            .any(|effect| effect.kind.incapacitates() && effect.remaining_turns > 0)
    }

    /// Removes health directly, bypassing defense. Returns the amount lost.
    fn lose_health(&mut self, amount: i32) -> i32 {
        let stats = self.stats_mut();
        let lost = amount.max(0).min(stats.health.max(0));
        stats.health = (stats.health - amount.max(0)).max(0);
        lost
    }

    /// Applies a hit through defense. Returns the damage actually dealt.
    fn receive_damage(&mut self, raw: i32) -> i32 {
        let dealt = mitigate_damage(raw, self.effective_defense());
        self.lose_health(dealt);
        dealt
    }

    /// Restores health up to the cap. Returns the amount healed.
    fn heal(&mut self, amount: i32) -> i32 {
        let cap = self.max_health();
        let stats = self.stats_mut();
        let before = stats.health;
        stats.health = (stats.health + amount.max(0)).min(cap);
        stats.health - before
    }

    /// Adds or refreshes a status effect.
    fn apply_status(&mut self, effect: StatusEffect) {
        add_status(self.status_effects_mut(), effect);
    }

    /// Runs the start-of-turn status pass and applies its DOT damage.
    fn tick_status_effects(&mut self) -> StatusTick {
        let tick = tick_statuses(self.status_effects_mut());
        if tick.damage > 0 {
            self.lose_health(tick.damage);
        }
        tick
    }
}

/// A special attack an enemy can use instead of a basic hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpecial {
    pub name: String,
    /// Multiplier over the enemy's attack power
    pub damage_multiplier: f64,
    /// Status inflicted on hit, if any
    pub inflicts: Option<StatusEffect>,
    /// Chance the AI picks this when it is off cooldown
    pub use_chance: f64,
    pub cooldown: u32,
}

/// A hostile combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub name: String,
    /// Challenge level the enemy was drawn for
    pub challenge: u32,
    pub stats: CombatStats,
    pub status_effects: Vec<StatusEffect>,
    pub special: Option<EnemySpecial>,
    /// Turns until the special can be used again
    pub special_cooldown: u32,
}

impl Enemy {
    /// Creates a new enemy.
    pub fn new(id: EntityId, name: impl Into<String>, challenge: u32, stats: CombatStats) -> Self {
        Self {
            id,
            name: name.into(),
            challenge,
            stats,
            status_effects: Vec::new(),
            special: None,
            special_cooldown: 0,
        }
    }

    /// Attaches a special attack.
    pub fn with_special(mut self, special: EnemySpecial) -> Self {
        self.special = Some(special);
        self
    }

    /// Scales health, attack and defense and renames with a title prefix.
    pub fn promoted(mut self, title: &str, health: f64, attack: f64, defense: f64) -> Self {
        let scale = |value: i32, factor: f64| ((value as f64) * factor).round().max(1.0) as i32;
        self.stats.max_health = scale(self.stats.max_health, health);
        self.stats.health = self.stats.max_health;
        self.stats.attack = scale(self.stats.attack, attack);
        self.stats.defense = ((self.stats.defense as f64) * defense).round() as i32;
        self.name = format!("{} {}", title, self.name);
        self
    }

    /// Whether the special attack is ready.
    pub fn special_ready(&self) -> bool {
        self.special.is_some() && self.special_cooldown == 0
    }
}

impl Combatant for Enemy {
    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn status_effects(&self) -> &[StatusEffect] {
        &self.status_effects
    }

    fn status_effects_mut(&mut self) -> &mut Vec<StatusEffect> {
        &mut self.status_effects
    }

    fn attack_power(&self) -> i32 {
        (self.stats.attack - self.slow_penalty()).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn goblin() -> Enemy {
        Enemy::new(Uuid::nil(), "Goblin", 1, CombatStats::new(20, 0, 6, 4, 10))
    }

    #[test]
    fn test_damage_floor() {
        assert_eq!(mitigate_damage(1, 0), 1);
        assert_eq!(mitigate_damage(1, 50), 1);
        assert_eq!(mitigate_damage(10, 5), 8);
        assert_eq!(mitigate_damage(10, -4), 12);
    }

    #[test]
    fn test_receive_damage_uses_defense() {
        let mut enemy = goblin();
        let dealt = enemy.receive_damage(10);
        assert_eq!(dealt, 8);
        assert_eq!(enemy.health(), 12);
    }

    #[test]
    fn test_health_never_negative() {
        let mut enemy = goblin();
        enemy.lose_health(500);
        assert_eq!(enemy.health(), 0);
        assert!(!enemy.is_alive());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut enemy = goblin();
        enemy.lose_health(5);
        assert_eq!(enemy.heal(50), 5);
        assert_eq!(enemy.health(), 20);
    }

    #[test]
    fn test_status_tick_dot_and_expiry() {
        let mut enemy = goblin();
        enemy.apply_status(StatusEffect::new(StatusKind::Poison, 2, 3));
        enemy.apply_status(StatusEffect::new(StatusKind::Burn, 1, 2));

        let tick = enemy.tick_status_effects();
        assert_eq!(tick.damage, 5);
        assert!(!tick.incapacitated);
        assert_eq!(tick.expired, vec![StatusKind::Burn]);
        assert_eq!(enemy.health(), 15);

        let tick = enemy.tick_status_effects();
        assert_eq!(tick.damage, 3);
        assert!(enemy.status_effects().is_empty());
    }

    #[test]
    fn test_status_refresh_keeps_stronger() {
        let mut effects = Vec::new();
        add_status(&mut effects, StatusEffect::new(StatusKind::Poison, 3, 2));
        add_status(&mut effects, StatusEffect::new(StatusKind::Poison, 1, 5));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].remaining_turns, 3);
        assert_eq!(effects[0].magnitude, 5);
    }

    #[test]
    fn test_stun_incapacitates_once() {
        let mut enemy = goblin();
        enemy.apply_status(StatusEffect::new(StatusKind::Stun, 1, 0));
        assert!(enemy.is_incapacitated());
        assert!(enemy.tick_status_effects().incapacitated);
        assert!(!enemy.is_incapacitated());
    }

    #[test]
    fn test_slow_lowers_attack() {
        let mut enemy = goblin();
        enemy.apply_status(StatusEffect::new(StatusKind::Slow, 2, 4));
        assert_eq!(enemy.attack_power(), 2);
    }

    #[test]
    fn test_promotion() {
        let boss = goblin().promoted("Boss", 3.0, 1.5, 1.25);
        assert_eq!(boss.stats.max_health, 60);
        assert_eq!(boss.stats.health, 60);
        assert_eq!(boss.stats.attack, 9);
        assert_eq!(boss.stats.defense, 5);
        assert_eq!(boss.name, "Boss Goblin");
    }
}
