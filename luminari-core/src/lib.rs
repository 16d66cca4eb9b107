//! Combat engine and cross-store sync protocol for Luminari's Quest.
//!
//! This crate provides:
//! - A turn-based combat state machine with four therapeutic actions
//! - Checksummed, transactional resource transfer between combat and progression
//! - Injected ports for time, enemy-turn scheduling and sound
//! - Profile persistence
//!
//! # Quick Start
//!
//! ```ignore
//! use luminari_core::{shadows, ActionKind, CombatEngine, EnvironmentConfig, ProgressionLedger};
//! use luminari_core::ports::{SystemClock, TokioScheduler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (scheduler, mut due) = TokioScheduler::new(tokio::runtime::Handle::current());
//!     let mut engine = CombatEngine::new(EnvironmentConfig::from_env(), Box::new(scheduler));
//!     let mut ledger = ProgressionLedger::new();
//!
//!     engine.start_combat(shadows::whisper_of_doubt(), Some(ledger.game_resources(&SystemClock)));
//!     engine.execute_action(ActionKind::Illuminate);
//!
//!     while let Some(ticket) = due.recv().await {
//!         engine.resolve_enemy_turn(ticket);
//!         if !engine.is_active() {
//!             break;
//!         }
//!         engine.execute_action(ActionKind::Illuminate);
//!     }
//!
//!     ledger.reconcile(&mut engine).ok();
//! }
//! ```

pub mod combat;
pub mod config;
pub mod persist;
pub mod ports;
pub mod progression;
pub mod shadows;
pub mod sync;
pub mod testing;

// Primary public API
pub use combat::{
    ActionCost, ActionKind, CarriedState, CombatEngine, CombatPhase, CombatSnapshot,
    CombatSummary, GameResources,
};
pub use config::{EnergyCosts, EnvironmentConfig};
pub use persist::{PersistError, SavedCombatProfile};
pub use progression::{ProgressionLedger, ReconcileError};
pub use shadows::ShadowManifestation;
pub use sync::{SyncError, SyncManager, SyncTransaction};
pub use testing::CombatHarness;
