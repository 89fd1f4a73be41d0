//! # Encounter Generation
//!
//! Enemy lookup by challenge rating. Rooms fetch their enemies through the
//! [`EnemyProvider`] seam the first time they need them, so a provider may
//! be backed by anything from a static table to a remote catalog.

use crate::{CombatStats, DelveError, DelveResult, Enemy, EnemySpecial, GameRng, StatusEffect, StatusKind};
use async_trait::async_trait;
use log::debug;

/// Source of enemies for hostile rooms.
#[async_trait]
pub trait EnemyProvider: Send + Sync {
    /// Returns `count` enemies suited to dungeon `level`.
    async fn get_random_monsters_by_cr(
        &self,
        level: u32,
        count: usize,
        rng: &mut GameRng,
    ) -> DelveResult<Vec<Enemy>>;

    /// Provider name for logging.
    fn provider_name(&self) -> &'static str {
        "EnemyProvider"
    }
}

/// Special attack description in a bestiary entry.
#[derive(Debug, Clone, Copy)]
pub struct SpecialTemplate {
    pub name: &'static str,
    pub damage_multiplier: f64,
    pub inflicts: Option<(StatusKind, u32, i32)>,
    pub use_chance: f64,
    pub cooldown: u32,
}

/// One monster kind.
#[derive(Debug, Clone, Copy)]
pub struct MonsterEntry {
    pub name: &'static str,
    pub challenge: u32,
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub special: Option<SpecialTemplate>,
}

impl MonsterEntry {
    /// Instantiates the entry for `level`, scaling stats by 10% per level
    /// above its challenge rating.
    pub fn spawn(&self, level: u32, rng: &mut GameRng) -> Enemy {
        let gap = level.saturating_sub(self.challenge) as f64;
        let scale = |value: i32| (value as f64 * (1.0 + gap * 0.1)).round() as i32;
        let stats = CombatStats::new(scale(self.health), 0, scale(self.attack), self.defense, self.speed);
        let enemy = Enemy::new(rng.uuid(), self.name, self.challenge, stats);

        match self.special {
            Some(special) => enemy.with_special(EnemySpecial {
                name: special.name.to_string(),
                damage_multiplier: special.damage_multiplier,
                inflicts: special
                    .inflicts
                    .map(|(kind, turns, magnitude)| StatusEffect::new(kind, turns, magnitude)),
                use_chance: special.use_chance,
                cooldown: special.cooldown,
            }),
            None => enemy,
        }
    }
}

const fn plain(name: &'static str, challenge: u32, health: i32, attack: i32, defense: i32, speed: i32) -> MonsterEntry {
    MonsterEntry {
        name,
        challenge,
        health,
        attack,
        defense,
        speed,
        special: None,
    }
}

const fn special(
    base: MonsterEntry,
    name: &'static str,
    damage_multiplier: f64,
    inflicts: Option<(StatusKind, u32, i32)>,
    use_chance: f64,
    cooldown: u32,
) -> MonsterEntry {
    MonsterEntry {
        special: Some(SpecialTemplate {
            name,
            damage_multiplier,
            inflicts,
            use_chance,
            cooldown,
        }),
        ..base
    }
}

/// Built-in monster table, roughly ordered by challenge.
pub const DEFAULT_BESTIARY: &[MonsterEntry] = &[
    plain("Giant Rat", 1, 18, 6, 1, 12),
    special(plain("Cave Spider", 1, 16, 5, 1, 14), "Venomous Bite", 1.0, Some((StatusKind::Poison, 3, 2)), 0.4, 3),
    plain("Goblin", 2, 26, 8, 2, 11),
    special(plain("Kobold Slinger", 2, 22, 7, 1, 13), "Sling Volley", 1.3, None, 0.35, 2),
    plain("Skeleton", 3, 34, 9, 4, 8),
    special(plain("Marsh Witch", 4, 30, 10, 2, 10), "Hexing Gaze", 0.8, Some((StatusKind::Slow, 2, 3)), 0.4, 3),
    plain("Orc Raider", 5, 48, 12, 4, 9),
    special(plain("Ghoul", 6, 50, 12, 3, 10), "Paralyzing Claw", 1.0, Some((StatusKind::Stun, 1, 0)), 0.25, 4),
    special(plain("Fire Imp", 7, 42, 14, 3, 15), "Cinder Spit", 1.1, Some((StatusKind::Burn, 2, 4)), 0.4, 3),
    plain("Ogre", 8, 80, 16, 5, 6),
    special(plain("Wraith", 10, 70, 18, 6, 13), "Soul Chill", 1.2, Some((StatusKind::Freeze, 1, 0)), 0.25, 4),
    special(plain("Basilisk", 12, 95, 20, 8, 7), "Petrifying Glare", 0.9, Some((StatusKind::Slow, 3, 5)), 0.35, 3),
    plain("Troll", 13, 120, 22, 7, 8),
    special(plain("Vampire", 15, 110, 24, 8, 14), "Blood Drain", 1.5, None, 0.35, 3),
    special(plain("Wyvern", 17, 140, 27, 9, 12), "Tail Sting", 1.2, Some((StatusKind::Poison, 3, 6)), 0.35, 3),
    special(plain("Lich", 19, 150, 30, 10, 11), "Necrotic Nova", 1.6, Some((StatusKind::Burn, 2, 8)), 0.3, 4),
];

/// Static bestiary provider.
#[derive(Debug, Clone)]
pub struct Bestiary {
    entries: Vec<MonsterEntry>,
}

impl Bestiary {
    /// Creates a bestiary over the built-in table.
    pub fn new() -> Self {
        Self::with_entries(DEFAULT_BESTIARY.to_vec())
    }

    /// Creates a bestiary over a custom table.
    pub fn with_entries(entries: Vec<MonsterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MonsterEntry] {
        &self.entries
    }

    /// Entries whose challenge lies in `level - 2 ..= level + 1`, or the
    /// closest challenge band when that window is empty.
    pub fn candidates(&self, level: u32) -> Vec<&MonsterEntry> {
        let low = level.saturating_sub(2);
        let high = level + 1;
        let window: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| (low..=high).contains(&entry.challenge))
            .collect();
        if !window.is_empty() {
            return window;
        }

        let Some(closest) = self
            .entries
            .iter()
            .map(|entry| entry.challenge.abs_diff(level))
            .min()
        else {
            return Vec::new();
        };
        self.entries
            .iter()
            .filter(|entry| entry.challenge.abs_diff(level) == closest)
            .collect()
    }
}

impl Default for Bestiary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnemyProvider for Bestiary {
    async fn get_random_monsters_by_cr(
        &self,
        level: u32,
        count: usize,
        rng: &mut GameRng,
    ) -> DelveResult<Vec<Enemy>> {
        let candidates = self.candidates(level);
        if candidates.is_empty() {
            return Err(DelveError::ContentProvider(
                "bestiary has no entries".to_string(),
            ));
        }

        let mut enemies = Vec::with_capacity(count);
        for _ in 0..count {
            let entry = candidates[rng.next_index(candidates.len())];
            enemies.push(entry.spawn(level, rng));
        }
        debug!(
            "Bestiary produced {} enemies for level {}",
            enemies.len(),
            level
        );
        Ok(enemies)
    }

    fn provider_name(&self) -> &'static str {
        "Bestiary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Combatant;

    #[tokio::test]
    async fn test_bestiary_returns_requested_count() {
        let bestiary = Bestiary::new();
        let mut rng = GameRng::from_u64(10);
        let enemies = bestiary
            .get_random_monsters_by_cr(4, 3, &mut rng)
            .await
            .unwrap();
        assert_eq!(enemies.len(), 3);
        assert!(enemies.iter().all(|e| e.is_alive()));
        assert!(enemies.iter().all(|e| (2..=5).contains(&e.challenge)));
    }

    #[test]
    fn test_candidates_fall_back_to_closest() {
        let bestiary = Bestiary::with_entries(vec![plain("Dragon", 30, 300, 40, 12, 10)]);
        let picks = bestiary.candidates(5);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].name, "Dragon");
    }

    #[test]
    fn test_empty_bestiary_errors() {
        let bestiary = Bestiary::with_entries(Vec::new());
        let mut rng = GameRng::from_u64(1);
        let result =
            tokio_test::block_on(bestiary.get_random_monsters_by_cr(1, 1, &mut rng));
        assert!(matches!(result, Err(DelveError::ContentProvider(_))));
    }

    #[test]
    fn test_spawn_scales_with_level_gap() {
        let mut rng = GameRng::from_u64(3);
        let entry = plain("Goblin", 2, 20, 10, 2, 10);
        let native = entry.spawn(2, &mut rng);
        let deeper = entry.spawn(7, &mut rng);
        assert_eq!(native.stats.max_health, 20);
        assert_eq!(deeper.stats.max_health, 30);
        assert_eq!(deeper.stats.attack, 15);
    }

    #[test]
    fn test_specials_carry_status() {
        let mut rng = GameRng::from_u64(3);
        let spider = DEFAULT_BESTIARY
            .iter()
            .find(|entry| entry.name == "Cave Spider")
            .unwrap()
            .spawn(1, &mut rng);
        let special = spider.special.as_ref().unwrap();
        assert_eq!(special.inflicts.unwrap().kind, StatusKind::Poison);
        assert!(spider.special_ready());
    }
}
