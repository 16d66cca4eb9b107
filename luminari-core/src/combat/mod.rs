//! Turn-based therapeutic combat.
//!
//! - [`state`]: resource model, log entries, snapshots
//! - [`actions`]: the four player actions and their selectors
//! - [`engine`]: the [`CombatEngine`] state machine

pub mod actions;
pub mod engine;
pub mod state;

pub use actions::{
    action_cost, action_description, can_use_action, is_low_energy, ActionCost, ActionGate,
    ActionKind, ParseActionError, EMBRACE_SP_THRESHOLD, ILLUMINATE_LP_COST, REFLECT_SP_COST,
};
pub use engine::CombatEngine;
pub use state::{
    Actor, CarriedState, CombatEndStatus, CombatFlags, CombatId, CombatLogEntry, CombatPhase,
    CombatResources, CombatSnapshot, CombatSummary, GameResources, PreferredActions,
    ResourceSnapshot, StatusEffects, SyncErrorEntry, SyncStamp, SyncStatus, MAX_ADVERSITY_SP,
    MAX_HEALTH,
};
