//! Environment configuration consumed by the combat engine.
//!
//! Values come from [`EnvironmentConfig::default`], optionally overridden by
//! `LUMINARI_*` environment variables via [`EnvironmentConfig::from_env`].

use crate::combat::ActionKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Delay before the shadow answers a player action.
pub const DEFAULT_ENEMY_TURN_DELAY: Duration = Duration::from_millis(2500);

/// Energy each action would cost.
///
/// Only [`ActionKind::Endure`] actually draws from the energy pool during
/// combat; the other entries exist for the rest of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyCosts {
    pub illuminate: u32,
    pub reflect: u32,
    pub endure: u32,
    pub embrace: u32,
}

impl EnergyCosts {
    pub fn cost(&self, action: ActionKind) -> u32 {
        match action {
            ActionKind::Illuminate => self.illuminate,
            ActionKind::Reflect => self.reflect,
            ActionKind::Endure => self.endure,
            ActionKind::Embrace => self.embrace,
        }
    }
}

impl Default for EnergyCosts {
    fn default() -> Self {
        Self {
            illuminate: 10,
            reflect: 5,
            endure: 5,
            embrace: 15,
        }
    }
}

/// Configuration surface the engine reads from its environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Per-action energy cost table.
    pub energy_costs: EnergyCosts,

    /// Energy at or below which the player counts as exhausted.
    pub low_energy_threshold: u32,

    /// Effectiveness multiplier the wider game applies while exhausted.
    pub low_energy_penalty: f32,

    /// How long the shadow takes to answer. Never zero.
    pub enemy_turn_delay: Duration,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            energy_costs: EnergyCosts::default(),
            low_energy_threshold: 20,
            low_energy_penalty: 0.5,
            enemy_turn_delay: DEFAULT_ENEMY_TURN_DELAY,
        }
    }
}

impl EnvironmentConfig {
    /// Defaults overridden by any `LUMINARI_*` variables that parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(cost) = read_env("LUMINARI_ENERGY_COST_ILLUMINATE") {
            config.energy_costs.illuminate = cost;
        }
        if let Some(cost) = read_env("LUMINARI_ENERGY_COST_REFLECT") {
            config.energy_costs.reflect = cost;
        }
        if let Some(cost) = read_env("LUMINARI_ENERGY_COST_ENDURE") {
            config.energy_costs.endure = cost;
        }
        if let Some(cost) = read_env("LUMINARI_ENERGY_COST_EMBRACE") {
            config.energy_costs.embrace = cost;
        }
        if let Some(threshold) = read_env("LUMINARI_LOW_ENERGY_THRESHOLD") {
            config.low_energy_threshold = threshold;
        }
        if let Some(penalty) = read_env::<f32>("LUMINARI_LOW_ENERGY_PENALTY") {
            config.low_energy_penalty = penalty.clamp(0.0, 1.0);
        }
        if let Some(ms) = read_env::<u64>("LUMINARI_ENEMY_TURN_DELAY_MS") {
            config = config.with_enemy_turn_delay(Duration::from_millis(ms));
        }

        config
    }

    /// Replace the energy cost table.
    pub fn with_energy_costs(mut self, costs: EnergyCosts) -> Self {
        self.energy_costs = costs;
        self
    }

    /// Set the low-energy threshold.
    pub fn with_low_energy_threshold(mut self, threshold: u32) -> Self {
        self.low_energy_threshold = threshold;
        self
    }

    /// Set the enemy turn delay. A zero delay is raised to one millisecond.
    pub fn with_enemy_turn_delay(mut self, delay: Duration) -> Self {
        self.enemy_turn_delay = delay.max(Duration::from_millis(1));
        self
    }

    pub fn energy_cost(&self, action: ActionKind) -> u32 {
        self.energy_costs.cost(action)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}
