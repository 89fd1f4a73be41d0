//! # Dice
//!
//! Tabletop-style dice expressions (`2d6+1`) used for weapon damage and trap
//! checks.

use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dice expression: `count` dice with `sides` faces plus a flat `bonus`.
///
/// # Examples
///
/// ```
/// use delve::DiceRoll;
///
/// let dice: DiceRoll = "2d6+1".parse().unwrap();
/// assert_eq!(dice, DiceRoll::new(2, 6, 1));
/// assert_eq!(dice.average(), 8.0);
/// assert_eq!(dice.to_string(), "2d6+1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DiceRoll {
    /// Creates a new dice expression.
    pub const fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self { count, sides, bonus }
    }

    /// Expected value of a roll.
    pub fn average(&self) -> f64 {
        self.count as f64 * (self.sides as f64 + 1.0) / 2.0 + self.bonus as f64
    }

    /// Lowest possible roll.
    pub fn min(&self) -> i32 {
        self.count as i32 + self.bonus
    }

    /// Highest possible roll.
    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.bonus
    }
}

impl FromStr for DiceRoll {
    type Err = DelveError;

    fn from_str(s: &str) -> DelveResult<Self> {
        let text = s.trim().to_lowercase();
        let (count_part, rest) = text
            .split_once('d')
            .ok_or_else(|| DelveError::Parse(format!("'{}' is not a dice expression", s)))?;

        let count = if count_part.is_empty() {
            1
        } else {
            count_part
                .parse::<u32>()
                .map_err(|_| DelveError::Parse(format!("bad dice count in '{}'", s)))?
        };

        let (sides_part, bonus) = if let Some((sides, bonus)) = rest.split_once('+') {
            (sides, parse_bonus(bonus, s)?)
        } else if let Some((sides, bonus)) = rest.split_once('-') {
            (sides, -parse_bonus(bonus, s)?)
        } else {
            (rest, 0)
        };

        let sides = sides_part
            .parse::<u32>()
            .map_err(|_| DelveError::Parse(format!("bad dice sides in '{}'", s)))?;
        if sides == 0 {
            return Err(DelveError::Parse(format!("dice in '{}' have no faces", s)));
        }

        Ok(Self::new(count, sides, bonus))
    }
}

fn parse_bonus(text: &str, original: &str) -> DelveResult<i32> {
    text.parse::<i32>()
        .map_err(|_| DelveError::Parse(format!("bad dice modifier in '{}'", original)))
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            bonus if bonus > 0 => write!(f, "+{}", bonus),
            bonus => write!(f, "{}", bonus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("d20".parse::<DiceRoll>().unwrap(), DiceRoll::new(1, 20, 0));
        assert_eq!("1d4-1".parse::<DiceRoll>().unwrap(), DiceRoll::new(1, 4, -1));
        assert_eq!("3D8+2".parse::<DiceRoll>().unwrap(), DiceRoll::new(3, 8, 2));
        assert!("banana".parse::<DiceRoll>().is_err());
        assert!("2d0".parse::<DiceRoll>().is_err());
    }

    #[test]
    fn test_bounds_and_average() {
        let dice = DiceRoll::new(1, 8, 0);
        assert_eq!(dice.min(), 1);
        assert_eq!(dice.max(), 8);
        assert_eq!(dice.average(), 4.5);
        assert_eq!(DiceRoll::new(1, 4, -1).to_string(), "1d4-1");
    }
}
