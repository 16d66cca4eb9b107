//! Player actions and the read-only queries built on them.
//!
//! These are pure functions of an [`ActionGate`] and the configuration, so
//! the engine and a presentation layer always agree on what is allowed.

use super::state::CombatResources;
use crate::config::EnvironmentConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four therapeutic actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Illuminate,
    Reflect,
    Endure,
    Embrace,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Illuminate,
        ActionKind::Reflect,
        ActionKind::Endure,
        ActionKind::Embrace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Illuminate => "ILLUMINATE",
            ActionKind::Reflect => "REFLECT",
            ActionKind::Endure => "ENDURE",
            ActionKind::Embrace => "EMBRACE",
        }
    }

    /// Key used for the sound cue of this action.
    pub fn sound_id(&self) -> &'static str {
        match self {
            ActionKind::Illuminate => "illuminate",
            ActionKind::Reflect => "reflect",
            ActionKind::Endure => "endure",
            ActionKind::Embrace => "embrace",
        }
    }

    /// Display name for log entries.
    pub fn title(&self) -> &'static str {
        match self {
            ActionKind::Illuminate => "Illuminate",
            ActionKind::Reflect => "Reflect",
            ActionKind::Endure => "Endure",
            ActionKind::Embrace => "Embrace",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for ActionKind {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ILLUMINATE" => Ok(ActionKind::Illuminate),
            "REFLECT" => Ok(ActionKind::Reflect),
            "ENDURE" => Ok(ActionKind::Endure),
            "EMBRACE" => Ok(ActionKind::Embrace),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// LP an ILLUMINATE costs.
pub const ILLUMINATE_LP_COST: u32 = 2;
/// SP a REFLECT costs.
pub const REFLECT_SP_COST: u32 = 3;
/// SP needed before EMBRACE can be attempted. EMBRACE then consumes all SP.
pub const EMBRACE_SP_THRESHOLD: u32 = 5;

/// What an action costs, for display and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionCost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<u32>,
}

/// The slice of engine state that decides whether an action may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionGate {
    pub is_active: bool,
    pub is_player_turn: bool,
    pub resources: CombatResources,
    pub player_energy: u32,
}

/// Whether `action` may be executed right now.
pub fn can_use_action(gate: &ActionGate, config: &EnvironmentConfig, action: ActionKind) -> bool {
    if !gate.is_active || !gate.is_player_turn {
        return false;
    }

    match action {
        ActionKind::Illuminate => gate.resources.lp >= ILLUMINATE_LP_COST,
        ActionKind::Reflect => gate.resources.sp >= REFLECT_SP_COST,
        ActionKind::Endure => gate.player_energy >= config.energy_cost(ActionKind::Endure),
        ActionKind::Embrace => gate.resources.sp >= EMBRACE_SP_THRESHOLD,
    }
}

/// Cost descriptor for `action`.
///
/// Only ENDURE reports energy: it is the only action that spends it in combat.
pub fn action_cost(config: &EnvironmentConfig, action: ActionKind) -> ActionCost {
    match action {
        ActionKind::Illuminate => ActionCost {
            lp: Some(ILLUMINATE_LP_COST),
            ..ActionCost::default()
        },
        ActionKind::Reflect => ActionCost {
            sp: Some(REFLECT_SP_COST),
            ..ActionCost::default()
        },
        ActionKind::Endure => ActionCost {
            energy: Some(config.energy_cost(ActionKind::Endure)),
            ..ActionCost::default()
        },
        ActionKind::Embrace => ActionCost {
            sp: Some(EMBRACE_SP_THRESHOLD),
            ..ActionCost::default()
        },
    }
}

pub fn action_description(action: ActionKind) -> &'static str {
    match action {
        ActionKind::Illuminate => {
            "Shine light on the shadow, revealing the truth behind it. Deals damage based on your level."
        }
        ActionKind::Reflect => {
            "Turn shadow into understanding. Converts shadow points into light and restores a little health."
        }
        ActionKind::Endure => {
            "Stand firm and let the moment pass. Spends energy to gain a point of light."
        }
        ActionKind::Embrace => {
            "Accept the shadow as part of yourself. Releases all shadow points as damage."
        }
    }
}

/// Whether the player is at or below the configured low-energy threshold.
pub fn is_low_energy(player_energy: u32, config: &EnvironmentConfig) -> bool {
    player_energy <= config.low_energy_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(lp: u32, sp: u32, energy: u32) -> ActionGate {
        ActionGate {
            is_active: true,
            is_player_turn: true,
            resources: CombatResources::new(lp, sp),
            player_energy: energy,
        }
    }

    #[test]
    fn test_inactive_or_enemy_turn_blocks_everything() {
        let config = EnvironmentConfig::default();
        let mut inactive = gate(10, 10, 100);
        inactive.is_active = false;
        let mut enemy_turn = gate(10, 10, 100);
        enemy_turn.is_player_turn = false;

        for action in ActionKind::ALL {
            assert!(!can_use_action(&inactive, &config, action));
            assert!(!can_use_action(&enemy_turn, &config, action));
        }
    }

    #[test]
    fn test_resource_floors() {
        let config = EnvironmentConfig::default();

        assert!(can_use_action(&gate(2, 0, 0), &config, ActionKind::Illuminate));
        assert!(!can_use_action(&gate(1, 0, 0), &config, ActionKind::Illuminate));

        assert!(can_use_action(&gate(0, 3, 0), &config, ActionKind::Reflect));
        assert!(!can_use_action(&gate(0, 2, 0), &config, ActionKind::Reflect));

        assert!(can_use_action(&gate(0, 5, 0), &config, ActionKind::Embrace));
        assert!(!can_use_action(&gate(0, 4, 0), &config, ActionKind::Embrace));
    }

    #[test]
    fn test_endure_needs_energy() {
        let config = EnvironmentConfig::default();
        let cost = config.energy_cost(ActionKind::Endure);

        assert!(can_use_action(&gate(0, 0, cost), &config, ActionKind::Endure));
        assert!(!can_use_action(&gate(0, 0, cost - 1), &config, ActionKind::Endure));
    }

    #[test]
    fn test_only_endure_reports_energy() {
        let config = EnvironmentConfig::default();
        for action in ActionKind::ALL {
            let cost = action_cost(&config, action);
            assert_eq!(cost.energy.is_some(), action == ActionKind::Endure, "{action}");
        }
        assert_eq!(action_cost(&config, ActionKind::Illuminate).lp, Some(2));
        assert_eq!(action_cost(&config, ActionKind::Reflect).sp, Some(3));
    }

    #[test]
    fn test_parse_and_display() {
        for action in ActionKind::ALL {
            assert_eq!(action.to_string().parse::<ActionKind>(), Ok(action));
        }
        assert_eq!("embrace".parse::<ActionKind>(), Ok(ActionKind::Embrace));
        assert!("dance".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_descriptions_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for action in ActionKind::ALL {
            assert!(seen.insert(action_description(action)));
        }
    }

    #[test]
    fn test_low_energy() {
        let config = EnvironmentConfig::default();
        assert!(is_low_energy(20, &config));
        assert!(!is_low_energy(21, &config));
    }
}
