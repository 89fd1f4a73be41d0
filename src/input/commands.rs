//! # Command Definitions
//!
//! Text commands typed at the prompt and their parser.

use crate::{AbilityId, DelveError, DelveResult, EquipSlot, RoomId};
use std::str::FromStr;

/// Help shown for the `help` command.
pub const HELP_TEXT: &str = "\
Exploring:
  go <room>           move to a connected room
  claim               complete the current room and take its reward
  interact <n>        use an object in the room
  disarm <n>          try to disarm a trap
  answer <text>       answer the room's puzzle
  buy <n> / sell <n>  trade with a merchant (sell takes an inventory slot)
  use <n>             use an inventory item
  equip <n>           equip an inventory item
  unequip <slot>      weapon, armor or accessory
Combat:
  attack [n]          basic attack on enemy n (default: first standing)
  cast <ability> [n]  use an ability, e.g. `cast power_strike 0`
  use <n>             drink a potion
  flee                try to escape (never works on a boss)
Any time:
  map, status, inventory, save <path>, help, quit";

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Go(RoomId),
    Claim,
    Interact(usize),
    Disarm(usize),
    Answer(String),
    Buy(usize),
    Sell(usize),
    Use(usize),
    Equip(usize),
    Unequip(EquipSlot),
    Attack(Option<usize>),
    Cast {
        ability: AbilityId,
        target: Option<usize>,
    },
    Flee,
    Map,
    Status,
    Inventory,
    Save(String),
    Help,
    Quit,
}

fn index_arg(verb: &str, arg: Option<&str>) -> DelveResult<usize> {
    let arg = arg.ok_or_else(|| DelveError::Parse(format!("`{}` needs a number", verb)))?;
    arg.parse()
        .map_err(|_| DelveError::Parse(format!("`{}` is not a number", arg)))
}

fn optional_index(arg: Option<&str>) -> DelveResult<Option<usize>> {
    arg.map(|value| {
        value
            .parse()
            .map_err(|_| DelveError::Parse(format!("`{}` is not a number", value)))
    })
    .transpose()
}

fn slot_arg(arg: Option<&str>) -> DelveResult<EquipSlot> {
    match arg.map(str::to_lowercase).as_deref() {
        Some("weapon") => Ok(EquipSlot::Weapon),
        Some("armor") | Some("armour") => Ok(EquipSlot::Armor),
        Some("accessory") => Ok(EquipSlot::Accessory),
        Some(other) => Err(DelveError::Parse(format!("unknown slot '{}'", other))),
        None => Err(DelveError::Parse("`unequip` needs a slot".to_string())),
    }
}

impl FromStr for PlayerCommand {
    type Err = DelveError;

    /// Parses one line of input.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{AbilityId, PlayerCommand};
    ///
    /// assert_eq!("go 4".parse::<PlayerCommand>().unwrap(), PlayerCommand::Go(4));
    /// assert_eq!(
    ///     "cast hex 1".parse::<PlayerCommand>().unwrap(),
    ///     PlayerCommand::Cast { ability: AbilityId::Hex, target: Some(1) }
    /// );
    /// ```
    fn from_str(line: &str) -> DelveResult<Self> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| DelveError::Parse("empty command".to_string()))?
            .to_lowercase();

        let command = match verb.as_str() {
            "go" | "move" | "enter" => {
                let room = index_arg(&verb, words.next())?;
                PlayerCommand::Go(room as RoomId)
            }
            "claim" | "complete" => PlayerCommand::Claim,
            "interact" | "open" | "touch" => PlayerCommand::Interact(index_arg(&verb, words.next())?),
            "disarm" => PlayerCommand::Disarm(index_arg(&verb, words.next())?),
            "answer" | "solve" => {
                let answer = words.collect::<Vec<_>>().join(" ");
                if answer.is_empty() {
                    return Err(DelveError::Parse("`answer` needs some text".to_string()));
                }
                PlayerCommand::Answer(answer)
            }
            "buy" => PlayerCommand::Buy(index_arg(&verb, words.next())?),
            "sell" => PlayerCommand::Sell(index_arg(&verb, words.next())?),
            "use" | "drink" => PlayerCommand::Use(index_arg(&verb, words.next())?),
            "equip" | "wear" | "wield" => PlayerCommand::Equip(index_arg(&verb, words.next())?),
            "unequip" | "remove" => PlayerCommand::Unequip(slot_arg(words.next())?),
            "attack" | "a" => PlayerCommand::Attack(optional_index(words.next())?),
            "cast" | "ability" | "c" => {
                let name = words
                    .next()
                    .ok_or_else(|| DelveError::Parse("`cast` needs an ability".to_string()))?;
                PlayerCommand::Cast {
                    ability: name.parse()?,
                    target: optional_index(words.next())?,
                }
            }
            "flee" | "run" => PlayerCommand::Flee,
            "map" | "m" => PlayerCommand::Map,
            "status" | "s" => PlayerCommand::Status,
            "inventory" | "inv" | "i" => PlayerCommand::Inventory,
            "save" => {
                let path = words
                    .next()
                    .ok_or_else(|| DelveError::Parse("`save` needs a path".to_string()))?;
                PlayerCommand::Save(path.to_string())
            }
            "help" | "?" => PlayerCommand::Help,
            "quit" | "exit" | "q" => PlayerCommand::Quit,
            other => return Err(DelveError::Parse(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> DelveResult<PlayerCommand> {
        line.parse()
    }

    #[test]
    fn test_parse_movement_and_room_actions() {
        assert_eq!(parse("go 3").unwrap(), PlayerCommand::Go(3));
        assert_eq!(parse("  MOVE   12 ").unwrap(), PlayerCommand::Go(12));
        assert_eq!(parse("claim").unwrap(), PlayerCommand::Claim);
        assert_eq!(parse("disarm 0").unwrap(), PlayerCommand::Disarm(0));
        assert_eq!(
            parse("answer  the river ").unwrap(),
            PlayerCommand::Answer("the river".to_string())
        );
        assert_eq!(parse("unequip armour").unwrap(), PlayerCommand::Unequip(EquipSlot::Armor));
    }

    #[test]
    fn test_parse_combat() {
        assert_eq!(parse("attack").unwrap(), PlayerCommand::Attack(None));
        assert_eq!(parse("a 2").unwrap(), PlayerCommand::Attack(Some(2)));
        assert_eq!(
            parse("cast Power-Strike").unwrap(),
            PlayerCommand::Cast { ability: AbilityId::PowerStrike, target: None }
        );
        assert_eq!(parse("flee").unwrap(), PlayerCommand::Flee);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("dance").is_err());
        assert!(parse("go").is_err());
        assert!(parse("go north").is_err());
        assert!(parse("cast fireball").is_err());
        assert!(parse("answer").is_err());
        assert!(parse("unequip hat").is_err());
    }
}
