//! # Action System
//!
//! Player decisions during combat and the uniform result type for actions
//! that may be rejected.

use crate::{AbilityId, EntityId};
use serde::{Deserialize, Serialize};

/// A player choice on their combat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    /// Basic weapon attack on the enemy at this index
    Attack { target: usize },
    /// Class or relic ability; single-target abilities need a target
    Ability {
        ability: AbilityId,
        target: Option<usize>,
    },
    /// Drink or use an inventory item
    UseItem { item_id: EntityId },
    /// Try to escape the encounter
    Flee,
}

/// Outcome of an action the caller may have to re-prompt for.
///
/// Rejected actions (`success == false`, `turn_consumed == false`) leave the
/// game untouched. A failed flee is unsuccessful but still spends the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub turn_consumed: bool,
}

impl ActionResult {
    /// The action happened.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            turn_consumed: true,
        }
    }

    /// The action was refused; nothing changed.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            turn_consumed: false,
        }
    }

    /// The action was attempted and did not work out.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            turn_consumed: true,
        }
    }
}
