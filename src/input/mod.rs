//! # Input Module
//!
//! Line-based input handling and command parsing for player interactions.

pub mod commands;

pub use commands::*;

use crate::{CombatAction, DelveError, DelveResult, GameState};
use std::io::{BufRead, Write};

/// Reads player commands from any buffered reader.
///
/// Blank lines are skipped. Reading stops at end of input.
pub struct InputHandler<R: BufRead> {
    reader: R,
    /// Prompt written before each read, if any
    pub prompt: Option<String>,
}

impl<R: BufRead> InputHandler<R> {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{InputHandler, PlayerCommand};
    ///
    /// let mut input = InputHandler::new("\n go 2\nquit\n".as_bytes());
    /// assert_eq!(input.next_command().unwrap(), Some(PlayerCommand::Go(2)));
    /// assert_eq!(input.next_command().unwrap(), Some(PlayerCommand::Quit));
    /// assert_eq!(input.next_command().unwrap(), None);
    /// ```
    pub fn new(reader: R) -> Self {
        Self { reader, prompt: None }
    }

    /// Writes `prompt` to stdout before each read.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Reads the next non-empty line and parses it.
    ///
    /// Returns `Ok(None)` at end of input and a `Parse` error for an
    /// unrecognised line; the caller can report it and read again.
    pub fn next_command(&mut self) -> DelveResult<Option<PlayerCommand>> {
        loop {
            if let Some(prompt) = &self.prompt {
                let mut stdout = std::io::stdout();
                write!(stdout, "{}", prompt)?;
                stdout.flush()?;
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            return line.parse().map(Some);
        }
    }
}

/// Converts a command to a combat action against the current fight.
///
/// Inventory slots become item ids and a missing attack target becomes the
/// first standing enemy. Returns `None` for commands that are not combat
/// actions.
pub fn command_to_combat_action(command: &PlayerCommand, state: &GameState) -> DelveResult<Option<CombatAction>> {
    let engine = state
        .combat()
        .ok_or_else(|| DelveError::InvalidState("no combat in progress".to_string()))?;
    let first_standing = engine.living_targets().first().copied().unwrap_or(0);

    let action = match command {
        PlayerCommand::Attack(target) => CombatAction::Attack {
            target: target.unwrap_or(first_standing),
        },
        PlayerCommand::Cast { ability, target } => CombatAction::Ability {
            ability: *ability,
            target: *target,
        },
        PlayerCommand::Use(slot) => {
            let item = state
                .player
                .inventory
                .get(*slot)
                .ok_or_else(|| DelveError::InvalidAction(format!("no item in slot {}", slot)))?;
            CombatAction::UseItem { item_id: item.id }
        }
        PlayerCommand::Flee => CombatAction::Flee,
        _ => return Ok(None),
    };
    Ok(Some(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenerationConfig, PlayerClass};

    #[test]
    fn test_reader_reports_bad_lines_and_continues() {
        let mut input = InputHandler::new("bogus\nstatus\n".as_bytes());
        assert!(input.next_command().is_err());
        assert_eq!(input.next_command().unwrap(), Some(PlayerCommand::Status));
        assert_eq!(input.next_command().unwrap(), None);
    }

    #[test]
    fn test_combat_conversion_needs_combat() {
        let state = GameState::new(GenerationConfig::for_testing("input"), "Hero", PlayerClass::Fighter).unwrap();
        assert!(command_to_combat_action(&PlayerCommand::Flee, &state).is_err());
    }
}
