//! The combat state machine.
//!
//! ```text
//! Idle ──start──▶ PlayerTurn ──action/end_turn──▶ EnemyTurn ──▶ PlayerTurn
//!                     │                               │
//!                     └──enemy HP 0──▶ Ended(victory) └──health 0──▶ Ended(defeat)
//! ```
//!
//! The engine is single-threaded and owns every combat resource. The enemy
//! turn is resolved after a delay handed to the injected [`TurnScheduler`];
//! whoever owns the engine feeds the resulting ticket back through
//! [`CombatEngine::resolve_enemy_turn`].

use super::actions::{
    self, ActionCost, ActionGate, ActionKind, ILLUMINATE_LP_COST, REFLECT_SP_COST,
};
use super::state::{
    Actor, CarriedState, CombatEndStatus, CombatFlags, CombatId, CombatLogEntry, CombatPhase,
    CombatResources, CombatSnapshot, CombatSummary, GameResources, PreferredActions,
    ResourceSnapshot, StatusEffects, SyncErrorEntry, SyncStatus, MAX_ADVERSITY_SP, MAX_HEALTH,
};
use crate::config::EnvironmentConfig;
use crate::ports::{Clock, EnemyTurnTicket, NullSoundSink, SoundSink, SystemClock, TurnScheduler};
use crate::shadows::ShadowManifestation;
use crate::sync::{
    generate_checksum, validate_checksum, SyncError, SyncManager, SyncSource, SyncTransaction,
    SyncValidation, TransactionId, TransactionKind,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Base damage of the shadow's attack before LP mitigation.
const ENEMY_BASE_DAMAGE: i64 = 8;

/// Flat part of ILLUMINATE damage.
const ILLUMINATE_BASE_DAMAGE: u32 = 3;

/// Per-encounter state. Never persisted.
#[derive(Debug, Clone)]
struct Encounter {
    combat_id: Option<CombatId>,
    is_active: bool,
    enemy: Option<ShadowManifestation>,
    turn: u32,
    is_player_turn: bool,
    end_status: CombatEndStatus,
    status_effects: StatusEffects,
    log: Vec<CombatLogEntry>,
    resources_at_start: Option<ResourceSnapshot>,
}

impl Default for Encounter {
    fn default() -> Self {
        Self {
            combat_id: None,
            is_active: false,
            enemy: None,
            turn: 1,
            is_player_turn: true,
            end_status: CombatEndStatus::default(),
            status_effects: StatusEffects::default(),
            log: Vec::new(),
            resources_at_start: None,
        }
    }
}

/// Turn-based combat engine for one game session.
pub struct CombatEngine {
    config: EnvironmentConfig,
    clock: Arc<dyn Clock>,
    scheduler: Box<dyn TurnScheduler>,
    sound: Arc<dyn SoundSink>,
    rng: StdRng,
    sync: SyncManager,
    carried: CarriedState,
    encounter: Encounter,
    sync_status: SyncStatus,
}

impl CombatEngine {
    /// Create an idle engine with default carried state.
    pub fn new(config: EnvironmentConfig, scheduler: Box<dyn TurnScheduler>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            config,
            sync: SyncManager::new(Arc::clone(&clock)),
            clock,
            scheduler,
            sound: Arc::new(NullSoundSink),
            rng: StdRng::from_entropy(),
            carried: CarriedState::default(),
            encounter: Encounter::default(),
            sync_status: SyncStatus {
                is_valid: true,
                ..SyncStatus::default()
            },
        }
    }

    /// Use a different time source. Resets the transaction manager.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.sync = SyncManager::new(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// Route action and shadow sounds to `sound`.
    pub fn with_sound_sink(mut self, sound: Arc<dyn SoundSink>) -> Self {
        self.sound = sound;
        self
    }

    /// Seed the RNG used for REFLECT healing.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start from a previously saved [`CarriedState`].
    pub fn with_carried_state(mut self, state: CarriedState) -> Self {
        self.carried = state.normalized();
        self
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Begin an encounter against `enemy`.
    ///
    /// When `resources` are supplied they are imported through a
    /// `game-to-combat` transaction. A missing or wrong checksum is logged
    /// but never prevents combat from starting; a rejected transaction makes
    /// the engine fall back to default resources.
    pub fn start_combat(&mut self, enemy: ShadowManifestation, resources: Option<GameResources>) {
        let combat_id = CombatId::new();
        info!(%combat_id, enemy = %enemy.name, "starting combat");

        let mut adopted = self.carried.clone();
        let mut open_transaction = None;

        if let Some(resources) = resources {
            self.validate_import(&resources);

            let source = self.carried.sync_state();
            let target = resources.sync_state();
            match self.sync.begin(TransactionKind::GameToCombat, source, target) {
                Ok(tx) => {
                    if self.carried.flags.debug_sync {
                        debug!(id = %tx.id, checksum = %tx.validation.checksum, "import transaction opened");
                    }
                    adopted = self.imported_state(&resources);
                    open_transaction = Some(tx.id);
                }
                Err(err) => {
                    self.log_sync_error(format!("Combat import rejected, using defaults: {err}"));
                    adopted = self.fallback_state(resources.player_level);
                }
            }
        }

        let mut enemy = enemy;
        enemy.current_hp = enemy.current_hp.min(enemy.max_hp);

        self.carried = adopted;
        self.carried.preferred_actions = PreferredActions::default();
        self.encounter = Encounter {
            combat_id: Some(combat_id),
            is_active: true,
            enemy: Some(enemy),
            ..Encounter::default()
        };

        if let Some(id) = open_transaction {
            match self.sync.commit(id) {
                Ok(tx) => self.apply_import(&tx),
                Err(err) => {
                    self.log_sync_error(format!("Combat import commit failed, using defaults: {err}"));
                    let level = self.carried.player_level;
                    let preferred = self.carried.preferred_actions;
                    self.carried = self.fallback_state(level);
                    self.carried.preferred_actions = preferred;
                }
            }
        }

        let (name, description) = match &self.encounter.enemy {
            Some(enemy) => (enemy.name.clone(), enemy.description.clone()),
            None => (String::new(), String::new()),
        };
        let message = if description.is_empty() {
            format!("{name} emerges from the darkness.")
        } else {
            format!("{name} emerges from the darkness. {description}")
        };
        self.push_log(Actor::Shadow, "Combat Started", format!("{name} appears"), message);

        self.encounter.resources_at_start = Some(self.resource_snapshot());
    }

    /// Resolve a player action, then hand the turn to the shadow.
    ///
    /// Does nothing unless [`CombatEngine::can_use_action`] allows it.
    pub fn execute_action(&mut self, action: ActionKind) {
        if !self.can_use_action(action) {
            return;
        }

        let level = self.carried.player_level.max(1);
        let effects = self.encounter.status_effects;
        let lp_blocked = effects.lp_generation_blocked > 0;
        let lp_gain = if lp_blocked { 0 } else { 1 };

        let mut damage = 0;
        let (effect, message) = match action {
            ActionKind::Illuminate => {
                self.carried.resources.lp = self.carried.resources.lp.saturating_sub(ILLUMINATE_LP_COST);
                let base = ILLUMINATE_BASE_DAMAGE.saturating_add(level.saturating_mul(3) / 2);
                damage = scale(base, effects.damage_multiplier);
                (
                    format!("Dealt {damage} damage"),
                    format!("Your light reveals the truth behind the shadow, dealing {damage} damage."),
                )
            }
            ActionKind::Reflect => {
                let resources = &mut self.carried.resources;
                resources.sp = resources.sp.saturating_sub(REFLECT_SP_COST);
                resources.lp = resources.lp.saturating_add(lp_gain);

                let heal = if effects.healing_blocked > 0 {
                    0
                } else {
                    self.rng.gen_range(1..=level)
                };
                let before = self.carried.player_health;
                self.carried.player_health = before.saturating_add(heal).min(MAX_HEALTH);
                let healed = self.carried.player_health - before;
                (
                    format!("Converted {REFLECT_SP_COST} SP into {lp_gain} LP, healed {healed}"),
                    format!(
                        "You reflect on the shadow and find understanding. Gained {lp_gain} LP and {healed} health."
                    ),
                )
            }
            ActionKind::Endure => {
                let cost = self.config.energy_cost(ActionKind::Endure);
                self.carried.player_energy = self.carried.player_energy.saturating_sub(cost);
                self.carried.resources.lp = self.carried.resources.lp.saturating_add(lp_gain);
                (
                    format!("Gained {lp_gain} LP, spent {cost} energy"),
                    format!("You stand firm and endure. Gained {lp_gain} LP (-{cost} energy)."),
                )
            }
            ActionKind::Embrace => {
                let released = self.carried.resources.sp;
                damage = scale((released / 2).max(1), effects.damage_multiplier);
                self.carried.resources.sp = 0;
                (
                    format!("Released {released} SP for {damage} damage"),
                    format!("You embrace your shadow and release its weight, dealing {damage} damage."),
                )
            }
        };

        let status = &mut self.encounter.status_effects;
        status.consecutive_endures = match action {
            ActionKind::Endure => status.consecutive_endures.saturating_add(1),
            _ => 0,
        };

        let mut defeated = false;
        if let Some(enemy) = self.encounter.enemy.as_mut() {
            enemy.current_hp = enemy.current_hp.saturating_sub(damage);
            defeated = enemy.is_defeated();
        }

        debug!(%action, damage, lp = self.carried.resources.lp, sp = self.carried.resources.sp, "player action resolved");
        self.push_log(Actor::Player, action.title(), effect, message);
        self.carried.preferred_actions.increment(action);
        self.play_sound(action.sound_id(), None);

        if defeated {
            self.end_combat(true);
            return;
        }

        self.begin_enemy_turn();
    }

    /// Pass the turn to the shadow without acting.
    pub fn end_turn(&mut self) {
        if !self.encounter.is_active || !self.encounter.is_player_turn {
            return;
        }
        debug!(turn = self.encounter.turn, "player passes");
        self.begin_enemy_turn();
    }

    /// Resolve a scheduled enemy turn.
    ///
    /// Tickets that arrive after combat ended, after the turn already
    /// resolved, or from an earlier encounter are ignored. Returns whether
    /// the ticket was applied.
    pub fn resolve_enemy_turn(&mut self, ticket: EnemyTurnTicket) -> bool {
        let current = self.encounter.is_active
            && !self.encounter.is_player_turn
            && self.encounter.combat_id == Some(ticket.combat_id)
            && self.encounter.turn == ticket.turn;
        if !current {
            trace!(?ticket, "ignoring stale enemy turn");
            return false;
        }

        let effects = self.encounter.status_effects;
        if effects.skip_next_turn {
            self.encounter.status_effects.skip_next_turn = false;
            self.push_log(
                Actor::Shadow,
                "Hesitate",
                "No damage".to_string(),
                "The shadow falters and loses its chance to strike.".to_string(),
            );
        } else {
            let mitigation = i64::from(self.carried.resources.lp / 2);
            let base = (ENEMY_BASE_DAMAGE - mitigation).max(1) as u32;
            let absorbed = (base as f32 * effects.damage_reduction.clamp(0.0, 1.0)).floor() as u32;
            let damage = base - absorbed.min(base);

            self.carried.player_health = self.carried.player_health.saturating_sub(damage);
            if self.carried.resources.sp < MAX_ADVERSITY_SP {
                self.carried.resources.sp += 1;
            }

            let label = match &self.encounter.enemy {
                Some(enemy) if enemy.is_desperate() => "Desperate Strike",
                _ => "Shadow Attack",
            };
            debug!(damage, health = self.carried.player_health, label, "enemy turn resolved");
            self.push_log(
                Actor::Shadow,
                label,
                format!("Dealt {damage} damage"),
                format!("The shadow lashes out for {damage} damage. You gain 1 SP from facing adversity."),
            );
            self.play_sound("shadow-attack", None);
        }

        let status = &mut self.encounter.status_effects;
        status.healing_blocked = status.healing_blocked.saturating_sub(1);
        status.lp_generation_blocked = status.lp_generation_blocked.saturating_sub(1);

        if self.carried.player_health == 0 {
            self.end_combat(false);
        } else {
            self.encounter.turn += 1;
            self.encounter.is_player_turn = true;
        }
        true
    }

    /// Retreat from the encounter. Allowed on either side's turn.
    pub fn surrender(&mut self) {
        if !self.encounter.is_active {
            return;
        }
        let name = self.enemy_name();
        self.finish(
            false,
            format!("You chose to retreat from {name}. Stepping back to regroup is also an act of courage."),
        );
    }

    /// End the encounter. Has no effect once combat is already over.
    ///
    /// Resource reconciliation with the progression domain is left to the
    /// caller that observes the end status.
    pub fn end_combat(&mut self, victory: bool) {
        if !self.encounter.is_active {
            return;
        }
        let reason = match (&self.encounter.enemy, victory) {
            (Some(enemy), true) => format!("You have overcome {}. {}", enemy.name, enemy.therapeutic_insight)
                .trim_end()
                .to_string(),
            (None, true) => "You have overcome the shadow.".to_string(),
            (_, false) => "The shadow overwhelmed you this time, but every setback carries a lesson. Rest, and try again.".to_string(),
        };
        self.finish(victory, reason);
    }

    /// Forget the end status so a new encounter can begin cleanly.
    pub fn clear_combat_end(&mut self) {
        self.encounter.end_status = CombatEndStatus::default();
    }

    /// Replace the carried state between encounters, e.g. after loading a save.
    ///
    /// Ignored while combat is active. Returns whether the state was applied.
    pub fn restore_carried_state(&mut self, state: CarriedState) -> bool {
        if self.encounter.is_active {
            warn!("refusing to restore carried state during combat");
            return false;
        }
        self.carried = state.normalized();
        true
    }

    /// Install combat modifiers for the current encounter.
    ///
    /// Ignored unless combat is active. Counters tick down after each enemy
    /// turn and everything resets when the next encounter starts.
    pub fn set_status_effects(&mut self, effects: StatusEffects) -> bool {
        if !self.encounter.is_active {
            return false;
        }
        self.encounter.status_effects = StatusEffects {
            damage_reduction: effects.damage_reduction.clamp(0.0, 1.0),
            damage_multiplier: effects.damage_multiplier.max(0.0),
            ..effects
        };
        true
    }

    /// Replace the persisted sound and sync-debug toggles.
    pub fn set_flags(&mut self, flags: CombatFlags) {
        self.carried.flags = flags;
    }

    // ========================================================================
    // Sync introspection
    // ========================================================================

    /// Record a sync problem. Never interrupts play.
    pub fn log_sync_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "sync error");
        self.sync_status.is_valid = false;
        self.sync_status.errors.push(SyncErrorEntry {
            timestamp: iso_timestamp(self.clock.now_ms()),
            message,
        });
    }

    /// Validity of the last import plus every sync error logged so far.
    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status.clone()
    }

    /// Settled transactions, oldest first.
    pub fn sync_transaction_history(&self) -> Vec<SyncTransaction> {
        self.sync.history()
    }

    /// The transaction manager, for collaborators running the reverse
    /// `combat-to-game` transfer.
    pub fn sync_manager_mut(&mut self) -> &mut SyncManager {
        &mut self.sync
    }

    /// Commit a pending transaction, logging any failure as a sync error.
    pub fn commit_sync(&mut self, id: TransactionId) -> Result<SyncTransaction, SyncError> {
        match self.sync.commit(id) {
            Ok(tx) => Ok(tx),
            Err(err) => {
                self.log_sync_error(format!("Sync commit failed: {err}"));
                Err(err)
            }
        }
    }

    /// Roll back a pending transaction, logging any failure as a sync error.
    pub fn rollback_sync(&mut self, id: TransactionId) -> Result<SyncTransaction, SyncError> {
        match self.sync.rollback(id) {
            Ok(tx) => Ok(tx),
            Err(err) => {
                self.log_sync_error(format!("Sync rollback failed: {err}"));
                Err(err)
            }
        }
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    /// Inputs the action selectors decide on.
    pub fn action_gate(&self) -> ActionGate {
        ActionGate {
            is_active: self.encounter.is_active,
            is_player_turn: self.encounter.is_player_turn,
            resources: self.carried.resources,
            player_energy: self.carried.player_energy,
        }
    }

    pub fn can_use_action(&self, action: ActionKind) -> bool {
        actions::can_use_action(&self.action_gate(), &self.config, action)
    }

    pub fn action_cost(&self, action: ActionKind) -> ActionCost {
        actions::action_cost(&self.config, action)
    }

    pub fn action_description(&self, action: ActionKind) -> &'static str {
        actions::action_description(action)
    }

    /// Whether energy has fallen below the configured warning threshold.
    pub fn is_low_energy(&self) -> bool {
        actions::is_low_energy(self.carried.player_energy, &self.config)
    }

    /// Where the encounter is in its lifecycle.
    pub fn phase(&self) -> CombatPhase {
        if self.encounter.is_active {
            if self.encounter.is_player_turn {
                CombatPhase::PlayerTurn
            } else {
                CombatPhase::EnemyTurn
            }
        } else if self.encounter.end_status.is_ended {
            CombatPhase::Ended {
                victory: self.encounter.end_status.victory,
            }
        } else {
            CombatPhase::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.encounter.is_active
    }

    pub fn is_player_turn(&self) -> bool {
        self.encounter.is_player_turn
    }

    /// Current turn number, starting at 1.
    pub fn turn(&self) -> u32 {
        self.encounter.turn
    }

    /// Id of the current or most recent encounter.
    pub fn combat_id(&self) -> Option<CombatId> {
        self.encounter.combat_id
    }

    pub fn enemy(&self) -> Option<&ShadowManifestation> {
        self.encounter.enemy.as_ref()
    }

    pub fn resources(&self) -> CombatResources {
        self.carried.resources
    }

    pub fn player_health(&self) -> u32 {
        self.carried.player_health
    }

    pub fn player_level(&self) -> u32 {
        self.carried.player_level
    }

    pub fn player_energy(&self) -> u32 {
        self.carried.player_energy
    }

    pub fn max_player_energy(&self) -> u32 {
        self.carried.max_player_energy
    }

    /// How the last encounter ended, until [`CombatEngine::clear_combat_end`].
    pub fn end_status(&self) -> &CombatEndStatus {
        &self.encounter.end_status
    }

    /// Temporary effects on the current encounter.
    pub fn status_effects(&self) -> &StatusEffects {
        &self.encounter.status_effects
    }

    /// Encounter log, oldest first.
    pub fn log(&self) -> &[CombatLogEntry] {
        &self.encounter.log
    }

    /// How often each action has been used this encounter.
    pub fn preferred_actions(&self) -> &PreferredActions {
        &self.carried.preferred_actions
    }

    /// Resources as they stood once the encounter began.
    pub fn resources_at_start(&self) -> Option<ResourceSnapshot> {
        self.encounter.resources_at_start
    }

    /// The persisted subset of engine state.
    pub fn carried_state(&self) -> &CarriedState {
        &self.carried
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Owned copy of everything a view needs to render the encounter.
    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            combat_id: self.encounter.combat_id,
            is_active: self.encounter.is_active,
            enemy: self.encounter.enemy.clone(),
            resources: self.carried.resources,
            player_health: self.carried.player_health,
            player_level: self.carried.player_level,
            player_energy: self.carried.player_energy,
            max_player_energy: self.carried.max_player_energy,
            turn: self.encounter.turn,
            is_player_turn: self.encounter.is_player_turn,
            end_status: self.encounter.end_status.clone(),
            status_effects: self.encounter.status_effects,
            log: self.encounter.log.clone(),
            preferred_actions: self.carried.preferred_actions,
        }
    }

    /// Outcome of the finished encounter, while its end status is set.
    pub fn summary(&self) -> Option<CombatSummary> {
        let status = &self.encounter.end_status;
        if !status.is_ended {
            return None;
        }
        let combat_id = self.encounter.combat_id?;
        let enemy = self.encounter.enemy.as_ref()?;
        let resources_at_end = self.resource_snapshot();
        let victory = status.victory;

        Some(CombatSummary {
            combat_id,
            victory,
            reason: status.reason.clone(),
            turns: self.encounter.turn,
            enemy_name: enemy.name.clone(),
            therapeutic_insight: enemy.therapeutic_insight.clone(),
            lp_bonus: if victory { enemy.victory_reward.lp_bonus } else { 0 },
            experience: if victory { enemy.victory_reward.experience } else { 0 },
            growth_message: if victory {
                enemy.victory_reward.growth_message.clone()
            } else {
                String::new()
            },
            resources_at_start: self.encounter.resources_at_start.unwrap_or(resources_at_end),
            resources_at_end,
            preferred_actions: self.carried.preferred_actions,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn validate_import(&mut self, resources: &GameResources) {
        let Some(stamp) = &resources.sync else {
            self.log_sync_error("Missing sync checksum for combat import");
            return;
        };

        let validation = SyncValidation {
            checksum: stamp.checksum.clone(),
            timestamp: stamp.timestamp,
            source: SyncSource::Game,
            lp: resources.light_points,
            sp: resources.shadow_points,
        };
        if validate_checksum(&validation) {
            self.sync_status.is_valid = true;
            self.sync_status.last_validation = Some(self.clock.now_ms());
        } else {
            let expected = generate_checksum(validation.lp, validation.sp, validation.timestamp);
            self.log_sync_error(format!(
                "Invalid sync checksum: expected {expected}, received {}",
                stamp.checksum
            ));
        }
    }

    fn imported_state(&self, resources: &GameResources) -> CarriedState {
        CarriedState {
            resources: CombatResources::new(resources.light_points, resources.shadow_points),
            player_health: resources.player_health,
            player_level: resources.player_level,
            player_energy: resources.player_energy,
            max_player_energy: resources.max_player_energy,
            preferred_actions: PreferredActions::default(),
            flags: self.carried.flags,
        }
        .normalized()
    }

    fn fallback_state(&self, player_level: u32) -> CarriedState {
        CarriedState {
            player_level,
            flags: self.carried.flags,
            ..CarriedState::default()
        }
        .normalized()
    }

    fn apply_import(&mut self, tx: &SyncTransaction) {
        if tx.kind != TransactionKind::GameToCombat {
            return;
        }
        let target = tx.target_state;
        self.carried.resources = CombatResources::new(target.lp, target.sp);
        self.carried.player_health = target.player_health.min(MAX_HEALTH);
        self.carried.player_energy = target.player_energy.min(self.carried.max_player_energy);
    }

    fn begin_enemy_turn(&mut self) {
        self.encounter.is_player_turn = false;
        let Some(combat_id) = self.encounter.combat_id else {
            return;
        };
        let ticket = EnemyTurnTicket {
            combat_id,
            turn: self.encounter.turn,
        };
        self.scheduler.schedule(self.config.enemy_turn_delay, ticket);
    }

    fn finish(&mut self, victory: bool, reason: String) {
        self.encounter.is_active = false;
        self.encounter.end_status = CombatEndStatus {
            is_ended: true,
            victory,
            reason,
        };
        info!(
            combat_id = ?self.encounter.combat_id,
            victory,
            turns = self.encounter.turn,
            "combat ended"
        );
        self.play_sound(if victory { "victory" } else { "defeat" }, None);
    }

    fn push_log(&mut self, actor: Actor, action: &str, effect: String, message: String) {
        let entry = CombatLogEntry {
            turn: self.encounter.turn,
            actor,
            action: action.to_string(),
            effect,
            message,
            timestamp: self.clock.now_ms(),
        };
        self.encounter.log.push(entry);
    }

    fn play_sound(&self, id: &str, duration_secs: Option<f32>) {
        if !self.carried.flags.sound_enabled {
            return;
        }
        if let Err(err) = self.sound.play(id, duration_secs) {
            warn!(sound = id, %err, "sound cue failed");
        }
    }

    fn resource_snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            lp: self.carried.resources.lp,
            sp: self.carried.resources.sp,
            energy: self.carried.player_energy,
            health: self.carried.player_health,
        }
    }

    fn enemy_name(&self) -> String {
        self.encounter
            .enemy
            .as_ref()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "the shadow".to_string())
    }
}

impl fmt::Debug for CombatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatEngine")
            .field("phase", &self.phase())
            .field("carried", &self.carried)
            .field("encounter", &self.encounter)
            .field("sync", &self.sync)
            .finish()
    }
}

fn scale(base: u32, multiplier: f32) -> u32 {
    (base as f32 * multiplier.max(0.0)).floor() as u32
}

fn iso_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}
