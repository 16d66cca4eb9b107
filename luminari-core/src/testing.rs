//! Testing utilities for the combat engine.
//!
//! This module provides deterministic stand-ins for the engine's ports:
//! - `ManualClock` for controlled timestamps
//! - `ManualScheduler` for enemy turns that fire only when time is advanced
//! - `RecordingSoundSink` for asserting on sound cues
//! - `CombatHarness` for scripted combat scenarios

use crate::combat::{ActionKind, CombatEngine, GameResources};
use crate::config::EnvironmentConfig;
use crate::ports::{Clock, EnemyTurnTicket, SoundError, SoundSink, TurnScheduler};
use crate::shadows::ShadowManifestation;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Default start time for test clocks: 2023-11-14T22:13:20Z.
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A clock that only moves when told to.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(TEST_EPOCH_MS)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A scheduler that queues tickets against a [`ManualClock`].
///
/// Tickets come due when the clock is advanced past their deadline through
/// [`ManualScheduler::advance`]. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    queue: Arc<Mutex<Vec<(u64, EnemyTurnTicket)>>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Move time forward and return the tickets that came due, earliest first.
    pub fn advance(&self, by: Duration) -> Vec<EnemyTurnTicket> {
        self.clock.advance(by);
        let now = self.clock.now_ms();

        let mut queue = lock(&self.queue);
        let mut due: Vec<(u64, EnemyTurnTicket)> = Vec::new();
        queue.retain(|entry| {
            if entry.0 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, ticket)| ticket).collect()
    }

    /// Number of tickets still waiting.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl TurnScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, ticket: EnemyTurnTicket) {
        let deadline = self.clock.now_ms() + delay.as_millis() as u64;
        lock(&self.queue).push((deadline, ticket));
    }
}

/// Records every sound cue. Can be switched to fail every request.
#[derive(Debug, Clone, Default)]
pub struct RecordingSoundSink {
    played: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSoundSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sound ids successfully played, in order.
    pub fn played(&self) -> Vec<String> {
        lock(&self.played).clone()
    }

    pub fn fail_all(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl SoundSink for RecordingSoundSink {
    fn play(&self, id: &str, _duration_secs: Option<f32>) -> Result<(), SoundError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SoundError::Unavailable("audio device disabled".to_string()));
        }
        lock(&self.played).push(id.to_string());
        Ok(())
    }
}

/// Test harness for running combat scenarios.
///
/// Wires an engine to a manual clock, a manual scheduler and a recording
/// sound sink. The RNG is seeded so REFLECT heals are reproducible.
pub struct CombatHarness {
    pub engine: CombatEngine,
    pub clock: ManualClock,
    pub scheduler: ManualScheduler,
    pub sound: RecordingSoundSink,
}

impl CombatHarness {
    /// Create a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EnvironmentConfig::default())
    }

    pub fn with_config(config: EnvironmentConfig) -> Self {
        let clock = ManualClock::default();
        let scheduler = ManualScheduler::new(clock.clone());
        let sound = RecordingSoundSink::new();
        let engine = CombatEngine::new(config, Box::new(scheduler.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_sound_sink(Arc::new(sound.clone()))
            .with_rng_seed(7);

        Self {
            engine,
            clock,
            scheduler,
            sound,
        }
    }

    /// Start combat with the engine's carried state.
    pub fn start(&mut self, enemy: ShadowManifestation) -> &mut Self {
        self.engine.start_combat(enemy, None);
        self
    }

    /// Start combat importing `resources`.
    pub fn start_with(&mut self, enemy: ShadowManifestation, resources: GameResources) -> &mut Self {
        self.engine.start_combat(enemy, Some(resources));
        self
    }

    /// Start combat importing `resources` stamped at the current time.
    pub fn start_stamped(&mut self, enemy: ShadowManifestation, resources: GameResources) -> &mut Self {
        let now = self.clock.now_ms();
        self.start_with(enemy, resources.stamp(now))
    }

    pub fn act(&mut self, action: ActionKind) -> &mut Self {
        self.engine.execute_action(action);
        self
    }

    /// Advance time and resolve every ticket that came due.
    ///
    /// Returns how many tickets the engine actually applied.
    pub fn advance(&mut self, by: Duration) -> usize {
        self.scheduler
            .advance(by)
            .into_iter()
            .filter(|ticket| self.engine.resolve_enemy_turn(*ticket))
            .count()
    }

    /// Advance by the configured enemy-turn delay.
    pub fn finish_enemy_turn(&mut self) -> usize {
        let delay = self.engine.config().enemy_turn_delay;
        self.advance(delay)
    }

    /// Act, then let the shadow answer.
    pub fn round(&mut self, action: ActionKind) -> &mut Self {
        self.act(action);
        self.finish_enemy_turn();
        self
    }

    /// Current player health and the enemy's current HP.
    pub fn health(&self) -> (u32, Option<u32>) {
        (
            self.engine.player_health(),
            self.engine.enemy().map(|e| e.current_hp),
        )
    }
}

impl Default for CombatHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatId;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(Duration::from_millis(50));
        assert_eq!(other.now_ms(), 150);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_manual_scheduler_orders_by_deadline() {
        let clock = ManualClock::new(0);
        let scheduler = ManualScheduler::new(clock);
        let id = CombatId::new();

        scheduler.schedule(Duration::from_millis(300), EnemyTurnTicket { combat_id: id, turn: 2 });
        scheduler.schedule(Duration::from_millis(100), EnemyTurnTicket { combat_id: id, turn: 1 });

        assert!(scheduler.advance(Duration::from_millis(99)).is_empty());
        let due = scheduler.advance(Duration::from_millis(300));
        assert_eq!(due.iter().map(|t| t.turn).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSoundSink::new();
        sink.play("victory", None).unwrap();
        sink.fail_all(true);
        assert!(sink.play("defeat", Some(1.0)).is_err());
        assert_eq!(sink.played(), vec!["victory".to_string()]);
    }
}
