//! Combat resource model.
//!
//! [`CarriedState`] is what survives between encounters and is persisted.
//! Everything else here describes a single encounter and is session-only.

use super::actions::ActionKind;
use crate::shadows::ShadowManifestation;
use crate::sync::{generate_checksum, SyncState};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Player health ceiling.
pub const MAX_HEALTH: u32 = 100;

/// SP ceiling for the growth granted by enemy turns.
pub const MAX_ADVERSITY_SP: u32 = 10;

// ============================================================================
// IDs
// ============================================================================

/// Unique identifier for one combat encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatId(pub Uuid);

impl CombatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Resources
// ============================================================================

/// Light and shadow points held by the combat domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatResources {
    pub lp: u32,
    pub sp: u32,
}

impl CombatResources {
    pub fn new(lp: u32, sp: u32) -> Self {
        Self { lp, sp }
    }
}

/// Checksum and the timestamp it was computed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStamp {
    pub checksum: String,
    pub timestamp: u64,
}

/// Snapshot of progression resources handed to the engine at combat start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResources {
    pub light_points: u32,
    pub shadow_points: u32,
    pub player_health: u32,
    pub player_level: u32,
    pub player_energy: u32,
    pub max_player_energy: u32,
    pub sync: Option<SyncStamp>,
}

impl GameResources {
    /// Attach a checksum over the light/shadow totals at `timestamp`.
    pub fn stamp(mut self, timestamp: u64) -> Self {
        self.sync = Some(SyncStamp {
            checksum: generate_checksum(self.light_points, self.shadow_points, timestamp),
            timestamp,
        });
        self
    }

    /// Attach an externally produced checksum as-is.
    pub fn with_checksum(mut self, checksum: impl Into<String>, timestamp: u64) -> Self {
        self.sync = Some(SyncStamp {
            checksum: checksum.into(),
            timestamp,
        });
        self
    }

    pub fn sync_state(&self) -> SyncState {
        SyncState {
            lp: self.light_points,
            sp: self.shadow_points,
            player_health: self.player_health,
            player_energy: self.player_energy,
        }
    }
}

/// Persisted feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatFlags {
    /// Send cues to the sound sink.
    pub sound_enabled: bool,
    /// Log checksums and transaction ids at debug level.
    pub debug_sync: bool,
}

impl Default for CombatFlags {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            debug_sync: false,
        }
    }
}

/// Usage count per action kind over the current encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreferredActions {
    pub illuminate: u32,
    pub reflect: u32,
    pub endure: u32,
    pub embrace: u32,
}

impl PreferredActions {
    pub fn get(&self, action: ActionKind) -> u32 {
        match action {
            ActionKind::Illuminate => self.illuminate,
            ActionKind::Reflect => self.reflect,
            ActionKind::Endure => self.endure,
            ActionKind::Embrace => self.embrace,
        }
    }

    pub fn increment(&mut self, action: ActionKind) {
        let slot = match action {
            ActionKind::Illuminate => &mut self.illuminate,
            ActionKind::Reflect => &mut self.reflect,
            ActionKind::Endure => &mut self.endure,
            ActionKind::Embrace => &mut self.embrace,
        };
        *slot = slot.saturating_add(1);
    }

    /// The most used action, if any was used. Ties go to the earlier kind.
    pub fn favourite(&self) -> Option<ActionKind> {
        ActionKind::ALL
            .iter()
            .copied()
            .filter(|a| self.get(*a) > 0)
            .fold(None, |best: Option<ActionKind>, a| match best {
                Some(b) if self.get(b) >= self.get(a) => Some(b),
                _ => Some(a),
            })
    }

    pub fn total(&self) -> u32 {
        ActionKind::ALL.iter().map(|a| self.get(*a)).sum()
    }
}

/// Player state that outlives a single encounter.
///
/// This is the only engine state that is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarriedState {
    pub resources: CombatResources,
    pub player_health: u32,
    pub player_level: u32,
    pub player_energy: u32,
    pub max_player_energy: u32,
    pub preferred_actions: PreferredActions,
    #[serde(default)]
    pub flags: CombatFlags,
}

impl Default for CarriedState {
    fn default() -> Self {
        Self {
            resources: CombatResources::new(10, 0),
            player_health: MAX_HEALTH,
            player_level: 1,
            player_energy: 100,
            max_player_energy: 100,
            preferred_actions: PreferredActions::default(),
            flags: CombatFlags::default(),
        }
    }
}

impl CarriedState {
    pub fn sync_state(&self) -> SyncState {
        SyncState {
            lp: self.resources.lp,
            sp: self.resources.sp,
            player_health: self.player_health,
            player_energy: self.player_energy,
        }
    }

    /// Clamp every field into its legal range.
    pub fn normalized(mut self) -> Self {
        self.player_health = self.player_health.min(MAX_HEALTH);
        self.player_level = self.player_level.max(1);
        self.player_energy = self.player_energy.min(self.max_player_energy);
        self
    }
}

// ============================================================================
// Encounter state
// ============================================================================

/// Temporary combat modifiers.
///
/// Counters tick down at the end of each enemy turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Factor applied to player damage.
    pub damage_multiplier: f32,
    /// Fraction of incoming damage absorbed, in `0.0..=1.0`.
    pub damage_reduction: f32,
    /// Turns during which REFLECT does not heal.
    pub healing_blocked: u32,
    /// Turns during which actions grant no LP.
    pub lp_generation_blocked: u32,
    /// The shadow loses its next turn.
    pub skip_next_turn: bool,
    pub consecutive_endures: u32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            damage_reduction: 0.0,
            healing_blocked: 0,
            lp_generation_blocked: 0,
            skip_next_turn: false,
            consecutive_endures: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Player,
    Shadow,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Player => write!(f, "PLAYER"),
            Actor::Shadow => write!(f, "SHADOW"),
        }
    }
}

/// One line of the combat log. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLogEntry {
    pub turn: u32,
    pub actor: Actor,
    pub action: String,
    pub effect: String,
    pub message: String,
    pub timestamp: u64,
}

/// Terminal marker for an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatEndStatus {
    pub is_ended: bool,
    pub victory: bool,
    pub reason: String,
}

/// Resource levels captured at a point of the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub lp: u32,
    pub sp: u32,
    pub energy: u32,
    pub health: u32,
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    Idle,
    PlayerTurn,
    EnemyTurn,
    Ended { victory: bool },
}

/// A recorded sync problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncErrorEntry {
    /// ISO-8601 timestamp.
    pub timestamp: String,
    pub message: String,
}

/// Health of the cross-domain sync as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_valid: bool,
    /// When the last successful import was validated (ms epoch).
    pub last_validation: Option<u64>,
    pub errors: Vec<SyncErrorEntry>,
}

/// Read-only copy of everything a presentation layer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub combat_id: Option<CombatId>,
    pub is_active: bool,
    pub enemy: Option<ShadowManifestation>,
    pub resources: CombatResources,
    pub player_health: u32,
    pub player_level: u32,
    pub player_energy: u32,
    pub max_player_energy: u32,
    pub turn: u32,
    pub is_player_turn: bool,
    pub end_status: CombatEndStatus,
    pub status_effects: StatusEffects,
    pub log: Vec<CombatLogEntry>,
    pub preferred_actions: PreferredActions,
}

/// Outcome of a finished encounter, for the progression side to reconcile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSummary {
    pub combat_id: CombatId,
    pub victory: bool,
    pub reason: String,
    pub turns: u32,
    pub enemy_name: String,
    pub therapeutic_insight: String,
    pub lp_bonus: u32,
    pub experience: u32,
    pub growth_message: String,
    pub resources_at_start: ResourceSnapshot,
    pub resources_at_end: ResourceSnapshot,
    pub preferred_actions: PreferredActions,
}

impl CombatSummary {
    pub fn lp_delta(&self) -> i64 {
        i64::from(self.resources_at_end.lp) - i64::from(self.resources_at_start.lp)
    }

    pub fn sp_delta(&self) -> i64 {
        i64::from(self.resources_at_end.sp) - i64::from(self.resources_at_start.sp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::validate_checksum;
    use crate::sync::{SyncSource, SyncValidation};

    #[test]
    fn test_preferred_actions() {
        let mut preferred = PreferredActions::default();
        assert_eq!(preferred.favourite(), None);

        preferred.increment(ActionKind::Reflect);
        preferred.increment(ActionKind::Endure);
        preferred.increment(ActionKind::Endure);

        assert_eq!(preferred.get(ActionKind::Endure), 2);
        assert_eq!(preferred.total(), 3);
        assert_eq!(preferred.favourite(), Some(ActionKind::Endure));
    }

    #[test]
    fn test_favourite_tie_goes_to_earlier_kind() {
        let mut preferred = PreferredActions::default();
        preferred.increment(ActionKind::Embrace);
        preferred.increment(ActionKind::Illuminate);
        assert_eq!(preferred.favourite(), Some(ActionKind::Illuminate));
    }

    #[test]
    fn test_stamp_validates() {
        let resources = GameResources {
            light_points: 12,
            shadow_points: 4,
            player_health: 100,
            player_level: 1,
            player_energy: 80,
            max_player_energy: 100,
            sync: None,
        }
        .stamp(1_700_000_000_000);

        let stamp = resources.sync.unwrap();
        let validation = SyncValidation {
            checksum: stamp.checksum,
            timestamp: stamp.timestamp,
            source: SyncSource::Game,
            lp: 12,
            sp: 4,
        };
        assert!(validate_checksum(&validation));
    }

    #[test]
    fn test_carried_state_normalized() {
        let carried = CarriedState {
            player_health: 250,
            player_level: 0,
            player_energy: 150,
            ..CarriedState::default()
        }
        .normalized();

        assert_eq!(carried.player_health, MAX_HEALTH);
        assert_eq!(carried.player_level, 1);
        assert_eq!(carried.player_energy, 100);
    }

    #[test]
    fn test_log_actor_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Actor::Shadow).unwrap(), "\"SHADOW\"");
    }
}
