//! The progression side of the sync protocol.
//!
//! [`ProgressionLedger`] holds the player's totals outside of combat. It
//! hands checksummed [`GameResources`] to the engine when an encounter
//! starts and takes the results back through a `combat-to-game`
//! transaction once the encounter has ended.

use crate::combat::{CombatEngine, CombatId, CombatSummary, GameResources, MAX_HEALTH};
use crate::ports::Clock;
use crate::sync::{SyncError, SyncState, SyncTransaction, TransactionKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Experience needed per level: reaching level `n + 1` costs `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u64 = 100;

/// Levels stop accruing here.
pub const MAX_LEVEL: u32 = 1_000;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("No finished combat to reconcile")]
    NothingToReconcile,

    #[error("Combat {0} was already reconciled")]
    AlreadyReconciled(CombatId),

    #[error("Experience total overflowed")]
    ExperienceOverflow,

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// What a successful reconciliation changed.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub transaction: SyncTransaction,
    pub summary: CombatSummary,
    pub levels_gained: u32,
}

/// Player totals held by the progression domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionLedger {
    pub light_points: u32,
    pub shadow_points: u32,
    pub player_health: u32,
    pub player_level: u32,
    pub player_energy: u32,
    pub max_player_energy: u32,
    pub experience: u64,
    #[serde(default)]
    last_reconciled: Option<CombatId>,
}

impl Default for ProgressionLedger {
    fn default() -> Self {
        Self {
            light_points: 10,
            shadow_points: 0,
            player_health: MAX_HEALTH,
            player_level: 1,
            player_energy: 100,
            max_player_energy: 100,
            experience: 0,
            last_reconciled: None,
        }
    }
}

impl ProgressionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, light_points: u32, shadow_points: u32) -> Self {
        self.light_points = light_points;
        self.shadow_points = shadow_points;
        self
    }

    /// Snapshot for `start_combat`, stamped with the clock's current time.
    pub fn game_resources(&self, clock: &dyn Clock) -> GameResources {
        GameResources {
            light_points: self.light_points,
            shadow_points: self.shadow_points,
            player_health: self.player_health,
            player_level: self.player_level,
            player_energy: self.player_energy,
            max_player_energy: self.max_player_energy,
            sync: None,
        }
        .stamp(clock.now_ms())
    }

    pub fn sync_state(&self) -> SyncState {
        SyncState {
            lp: self.light_points,
            sp: self.shadow_points,
            player_health: self.player_health,
            player_energy: self.player_energy,
        }
    }

    /// Pull the results of a finished encounter into the ledger.
    ///
    /// On victory the shadow's LP bonus and experience are added. The ledger
    /// only changes once the transaction commits; the engine's end status is
    /// cleared afterwards.
    pub fn reconcile(&mut self, engine: &mut CombatEngine) -> Result<Reconciliation, ReconcileError> {
        let summary = engine.summary().ok_or(ReconcileError::NothingToReconcile)?;
        if self.last_reconciled == Some(summary.combat_id) {
            return Err(ReconcileError::AlreadyReconciled(summary.combat_id));
        }

        let end = summary.resources_at_end;
        let target = SyncState {
            lp: end.lp.saturating_add(summary.lp_bonus),
            sp: end.sp,
            player_health: end.health,
            player_energy: end.energy,
        };

        let tx = match engine
            .sync_manager_mut()
            .begin(TransactionKind::CombatToGame, self.sync_state(), target)
        {
            Ok(tx) => tx,
            Err(err) => {
                engine.log_sync_error(format!("Combat results rejected: {err}"));
                return Err(err.into());
            }
        };

        let Some(experience) = self.experience.checked_add(u64::from(summary.experience)) else {
            warn!(id = %tx.id, "experience overflow, rolling back");
            engine.rollback_sync(tx.id)?;
            return Err(ReconcileError::ExperienceOverflow);
        };

        let tx = engine.commit_sync(tx.id)?;

        self.light_points = tx.target_state.lp;
        self.shadow_points = tx.target_state.sp;
        self.player_health = tx.target_state.player_health;
        self.player_energy = tx.target_state.player_energy.min(self.max_player_energy);
        self.experience = experience;
        let levels_gained = self.apply_level_ups();
        self.last_reconciled = Some(summary.combat_id);

        engine.clear_combat_end();

        info!(
            combat_id = %summary.combat_id,
            victory = summary.victory,
            lp = self.light_points,
            experience = self.experience,
            levels_gained,
            "combat results reconciled"
        );

        Ok(Reconciliation {
            transaction: tx,
            summary,
            levels_gained,
        })
    }

    /// Experience still needed for the next level.
    pub fn experience_to_next_level(&self) -> u64 {
        self.level_threshold().saturating_sub(self.experience)
    }

    fn level_threshold(&self) -> u64 {
        level_threshold(self.player_level)
    }

    fn apply_level_ups(&mut self) -> u32 {
        let mut gained = 0;
        while self.player_level < MAX_LEVEL && self.experience >= self.level_threshold() {
            self.player_level += 1;
            gained += 1;
        }
        gained
    }
}

/// Cumulative experience needed to leave `level`, saturating at `u64::MAX`.
fn level_threshold(level: u32) -> u64 {
    let n = u64::from(level);
    n.checked_mul(n + 1)
        .and_then(|steps| steps.checked_mul(XP_PER_LEVEL))
        .map_or(u64::MAX, |total| total / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadows::{whisper_of_doubt, ShadowKind, ShadowManifestation};
    use crate::sync::TransactionStatus;
    use crate::testing::CombatHarness;

    #[test]
    fn test_game_resources_are_stamped() {
        let harness = CombatHarness::new();
        let resources = ProgressionLedger::new().game_resources(&harness.clock);
        let stamp = resources.sync.unwrap();
        assert_eq!(stamp.timestamp, crate::testing::TEST_EPOCH_MS);
    }

    #[test]
    fn test_nothing_to_reconcile() {
        let mut harness = CombatHarness::new();
        let mut ledger = ProgressionLedger::new();
        assert!(matches!(
            ledger.reconcile(&mut harness.engine),
            Err(ReconcileError::NothingToReconcile)
        ));
    }

    #[test]
    fn test_victory_reconciles_reward() {
        let mut harness = CombatHarness::new();
        let mut ledger = ProgressionLedger::new();
        ledger.experience = 60;

        let resources = ledger.game_resources(&harness.clock);
        harness.start_with(whisper_of_doubt().with_current_hp(4), resources);
        harness.act(crate::combat::ActionKind::Illuminate);
        assert!(harness.engine.end_status().victory);

        let result = ledger.reconcile(&mut harness.engine).unwrap();
        assert_eq!(result.transaction.kind, TransactionKind::CombatToGame);
        assert_eq!(result.transaction.status, TransactionStatus::Committed);
        // 10 - 2 for ILLUMINATE, + 3 reward.
        assert_eq!(ledger.light_points, 11);
        assert_eq!(ledger.experience, 110);
        assert_eq!(ledger.player_level, 2);
        assert_eq!(result.levels_gained, 1);
        assert_eq!(ledger.experience_to_next_level(), 190);

        assert!(!harness.engine.end_status().is_ended);
        assert_eq!(harness.engine.sync_transaction_history().len(), 2);
    }

    #[test]
    fn test_defeat_brings_back_health_without_reward() {
        let mut harness = CombatHarness::new();
        let mut ledger = ProgressionLedger::new();
        let resources = ledger.game_resources(&harness.clock);
        let wall = ShadowManifestation::new("wall", "The Wall", ShadowKind::Overwhelm, 500);
        harness.start_with(wall, resources);

        harness.engine.end_turn();
        harness.finish_enemy_turn();
        harness.engine.surrender();

        let result = ledger.reconcile(&mut harness.engine).unwrap();
        assert!(!result.summary.victory);
        assert_eq!(ledger.player_health, 97);
        assert_eq!(ledger.shadow_points, 1);
        assert_eq!(ledger.experience, 0);
    }

    #[test]
    fn test_experience_overflow_rolls_back() {
        let mut harness = CombatHarness::new();
        let mut ledger = ProgressionLedger::new();
        ledger.experience = u64::MAX;
        let resources = ledger.game_resources(&harness.clock);
        harness.start_with(whisper_of_doubt().with_current_hp(1), resources);
        harness.act(crate::combat::ActionKind::Illuminate);

        let before = ledger.clone();
        assert!(matches!(
            ledger.reconcile(&mut harness.engine),
            Err(ReconcileError::ExperienceOverflow)
        ));
        assert_eq!(ledger, before);

        let history = harness.engine.sync_transaction_history();
        assert_eq!(history.last().unwrap().status, TransactionStatus::RolledBack);
        // The end status stays so the caller can retry or inspect it.
        assert!(harness.engine.end_status().is_ended);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_threshold(1), 100);
        assert_eq!(level_threshold(2), 300);
        assert_eq!(level_threshold(3), 600);
        assert_eq!(level_threshold(u32::MAX), u64::MAX);
    }

    #[test]
    fn test_huge_experience_levels_up_to_cap() {
        let mut ledger = ProgressionLedger::new();
        ledger.experience = u64::MAX;
        assert_eq!(ledger.apply_level_ups(), MAX_LEVEL - 1);
        assert_eq!(ledger.player_level, MAX_LEVEL);

        ledger.player_level = u32::MAX;
        assert_eq!(ledger.apply_level_ups(), 0);
        assert_eq!(ledger.experience_to_next_level(), 0);
    }

    #[test]
    fn test_reconcile_only_once() {
        let mut harness = CombatHarness::new();
        let mut ledger = ProgressionLedger::new();
        let resources = ledger.game_resources(&harness.clock);
        harness.start_with(whisper_of_doubt(), resources);
        harness.engine.surrender();

        let first = ledger.reconcile(&mut harness.engine).unwrap();
        // Clear happened; nothing left to pull.
        assert!(matches!(
            ledger.reconcile(&mut harness.engine),
            Err(ReconcileError::NothingToReconcile)
        ));
        assert_eq!(ledger.last_reconciled, Some(first.summary.combat_id));
    }
}
