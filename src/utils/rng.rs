//! # Deterministic RNG
//!
//! The single source of randomness for a game session.
//!
//! A [`GameRng`] is built once from a [`Seed`] and then threaded by mutable
//! reference into generation, loot, combat, traps and puzzles. It is never
//! cloned: a copy would fork the stream and desynchronise the simulation.

use crate::{DelveError, DelveResult};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::DiceRoll;

/// A session seed, either typed by the player or picked numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seed {
    /// Free-form text, hashed into the numeric seed
    Text(String),
    /// Numeric seed used as-is
    Number(u64),
}

impl Seed {
    /// Reduces the seed to the 64-bit value that seeds the generator.
    ///
    /// Text seeds use the first eight bytes of their SHA-256 digest, so the
    /// mapping is stable across platforms and releases.
    pub fn to_u64(&self) -> u64 {
        match self {
            Seed::Number(value) => *value,
            Seed::Text(text) => {
                let digest = Sha256::digest(text.as_bytes());
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&digest[..8]);
                u64::from_le_bytes(bytes)
            }
        }
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed::Number(value)
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Text(value)
    }
}

impl FromStr for Seed {
    type Err = DelveError;

    /// Digits-only input becomes a numeric seed; anything else is text.
    fn from_str(s: &str) -> DelveResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DelveError::Parse("seed cannot be empty".to_string()));
        }
        Ok(match trimmed.parse::<u64>() {
            Ok(value) => Seed::Number(value),
            Err(_) => Seed::Text(trimmed.to_string()),
        })
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Text(text) => write!(f, "{}", text),
            Seed::Number(value) => write!(f, "{}", value),
        }
    }
}

/// Seeded pseudo-random generator shared by every subsystem.
///
/// Two instances built from the same seed produce identical output for every
/// method, forever.
///
/// # Examples
///
/// ```
/// use delve::{GameRng, Seed};
///
/// let mut a = GameRng::from_seed(&Seed::from("abc"));
/// let mut b = GameRng::from_seed(&Seed::from("abc"));
/// assert_eq!(a.next_u32(), b.next_u32());
/// assert_eq!(a.next_int(-3, 3), b.next_int(-3, 3));
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct GameRng {
    inner: ChaCha8Rng,
    deterministic: bool,
}

impl GameRng {
    /// Creates a generator from a session seed.
    pub fn from_seed(seed: &Seed) -> Self {
        Self::from_u64(seed.to_u64())
    }

    /// Creates a generator from a raw numeric seed.
    pub fn from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            deterministic: true,
        }
    }

    /// Creates an unseeded generator for calls made outside a session.
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
            deterministic: false,
        }
    }

    /// Whether this generator replays from a seed.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Next raw unsigned draw.
    pub fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[min, max]`, inclusive on both ends.
    ///
    /// Reversed bounds are normalised rather than rejected.
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        if low == high {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "next_index called with an empty range");
        if len <= 1 {
            return 0;
        }
        self.inner.gen_range(0..len)
    }

    /// Picks one element uniformly. `None` only for an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        match items.len() {
            0 => None,
            1 => items.first(),
            len => items.get(self.next_index(len)),
        }
    }

    /// Picks one element with probability proportional to its weight.
    ///
    /// Non-positive weights never win. Returns `None` when no weight is
    /// positive.
    pub fn weighted_choice<'a, T>(&mut self, options: &'a [(T, f64)]) -> Option<&'a T> {
        let total: f64 = options
            .iter()
            .map(|(_, weight)| weight.max(0.0))
            .sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = self.next_float() * total;
        let mut last_positive = None;
        for (item, weight) in options {
            if *weight <= 0.0 {
                continue;
            }
            if roll < *weight {
                return Some(item);
            }
            roll -= weight;
            last_positive = Some(item);
        }

        // Float rounding can leave a sliver past the final bucket.
        last_positive
    }

    /// Permutes the slice in place and hands the same slice back.
    pub fn shuffle<'a, T>(&mut self, items: &'a mut [T]) -> &'a mut [T] {
        items.shuffle(&mut self.inner);
        items
    }

    /// `true` with probability `p`; exactly never at 0 and always at 1.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.next_float() < p
    }

    /// Same as [`GameRng::chance`] with `p` on a 0-100 scale.
    pub fn percent_chance(&mut self, percent: f64) -> bool {
        self.chance(percent / 100.0)
    }

    /// Rolls dice and adds the modifier.
    pub fn roll(&mut self, dice: &DiceRoll) -> i32 {
        let mut total = dice.bonus;
        for _ in 0..dice.count {
            total += self.next_int(1, dice.sides.max(1) as i64) as i32;
        }
        total
    }

    /// A single twenty-sided die.
    pub fn d20(&mut self) -> i32 {
        self.next_int(1, 20) as i32
    }

    /// A version-4 style id drawn from the stream, so ids replay with the seed.
    pub fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// Runs `f` with the session RNG, or with a throwaway unseeded one.
///
/// This is the only place an unseeded source is created. Code that belongs
/// to a session always passes its RNG; the fallback covers helpers invoked
/// before a session exists.
pub fn with_rng<R>(rng: Option<&mut GameRng>, f: impl FnOnce(&mut GameRng) -> R) -> R {
    match rng {
        Some(rng) => f(rng),
        None => {
            let mut fallback = GameRng::from_entropy();
            f(&mut fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = GameRng::from_seed(&Seed::from("abc"));
        let mut b = GameRng::from_seed(&Seed::from("abc"));
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
            assert_eq!(a.next_float(), b.next_float());
            assert_eq!(a.next_int(-50, 50), b.next_int(-50, 50));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = GameRng::from_u64(1);
        let mut b = GameRng::from_u64(2);
        let draws_a: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let draws_b: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_seed_parsing() {
        assert_eq!("12345".parse::<Seed>().unwrap(), Seed::Number(12345));
        assert_eq!("abc".parse::<Seed>().unwrap(), Seed::Text("abc".to_string()));
        assert!("   ".parse::<Seed>().is_err());
        assert_eq!(Seed::from("abc").to_u64(), Seed::from("abc").to_u64());
        assert_ne!(Seed::from("abc").to_u64(), Seed::from("abd").to_u64());
    }

    #[test]
    fn test_next_int_degenerate_and_negative() {
        let mut rng = GameRng::from_u64(7);
        assert_eq!(rng.next_int(4, 4), 4);
        assert_eq!(rng.next_int(-9, -9), -9);
        for _ in 0..200 {
            let value = rng.next_int(-10, -2);
            assert!((-10..=-2).contains(&value));
            let crossing = rng.next_int(-3, 3);
            assert!((-3..=3).contains(&crossing));
            let reversed = rng.next_int(5, 1);
            assert!((1..=5).contains(&reversed));
        }
    }

    #[test]
    fn test_chance_boundaries() {
        let mut rng = GameRng::from_u64(99);
        for _ in 0..150 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
            assert!(!rng.percent_chance(0.0));
            assert!(rng.percent_chance(100.0));
        }
    }

    #[test]
    fn test_choice() {
        let mut rng = GameRng::from_u64(3);
        let empty: [u8; 0] = [];
        assert!(rng.choice(&empty).is_none());
        assert_eq!(rng.choice(&["only"]), Some(&"only"));
        let items = [1, 2, 3];
        for _ in 0..20 {
            assert!(items.contains(rng.choice(&items).unwrap()));
        }
    }

    #[test]
    fn test_weighted_choice_skips_zero_weights() {
        let mut rng = GameRng::from_u64(11);
        let options = [("never", 0.0), ("always", 2.0), ("negative", -1.0)];
        for _ in 0..50 {
            assert_eq!(rng.weighted_choice(&options), Some(&"always"));
        }
        let dead: [(&str, f64); 1] = [("nothing", 0.0)];
        assert!(rng.weighted_choice(&dead).is_none());
    }

    #[test]
    fn test_shuffle_preserves_elements() {
        let mut rng = GameRng::from_u64(5);
        let mut items = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let shuffled = rng.shuffle(&mut items).to_vec();
        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(shuffled, items);
    }

    #[test]
    fn test_dice_rolls_stay_in_range() {
        let mut rng = GameRng::from_u64(8);
        let dice = DiceRoll::new(2, 6, 1);
        for _ in 0..100 {
            let value = rng.roll(&dice);
            assert!((3..=13).contains(&value));
            assert!((1..=20).contains(&rng.d20()));
        }
    }

    #[test]
    fn test_uuids_replay_with_seed() {
        let mut a = GameRng::from_u64(42);
        let mut b = GameRng::from_u64(42);
        assert_eq!(a.uuid(), b.uuid());
        assert_ne!(a.uuid(), a.uuid());
    }

    #[test]
    fn test_with_rng_fallback() {
        let value = with_rng(None, |rng| {
            assert!(!rng.is_deterministic());
            rng.next_int(1, 6)
        });
        assert!((1..=6).contains(&value));

        let mut seeded = GameRng::from_u64(1);
        let deterministic = with_rng(Some(&mut seeded), |rng| rng.is_deterministic());
        assert!(deterministic);
    }

    #[test]
    fn test_rng_survives_serialization() {
        let mut rng = GameRng::from_u64(1234);
        rng.next_u32();
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng.next_u32(), restored.next_u32());
    }

    proptest! {
        #[test]
        fn prop_next_int_stays_in_bounds(
            seed in any::<u64>(),
            a in -1_000_000i64..1_000_000,
            b in -1_000_000i64..1_000_000,
        ) {
            let mut rng = GameRng::from_u64(seed);
            let (low, high) = (a.min(b), a.max(b));
            for _ in 0..32 {
                let value = rng.next_int(a, b);
                prop_assert!(low <= value && value <= high);
            }
            prop_assert_eq!(rng.next_int(a, a), a);
        }

        #[test]
        fn prop_chance_boundaries_hold(seed in any::<u64>()) {
            let mut rng = GameRng::from_u64(seed);
            for _ in 0..32 {
                prop_assert!(!rng.chance(0.0));
                prop_assert!(rng.chance(1.0));
                prop_assert!(!rng.percent_chance(0.0));
                prop_assert!(rng.percent_chance(100.0));
            }
        }

        #[test]
        fn prop_same_seed_replays_every_draw(seed in any::<u64>(), len in 0usize..40) {
            let mut a = GameRng::from_u64(seed);
            let mut b = GameRng::from_u64(seed);
            for _ in 0..16 {
                prop_assert_eq!(a.next_u32(), b.next_u32());
                prop_assert_eq!(a.next_float().to_bits(), b.next_float().to_bits());
                prop_assert_eq!(a.next_int(-100, 100), b.next_int(-100, 100));
            }
            let mut left: Vec<usize> = (0..len).collect();
            let mut right = left.clone();
            a.shuffle(&mut left);
            b.shuffle(&mut right);
            prop_assert_eq!(left, right);
        }
    }
}
