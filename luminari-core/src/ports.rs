//! Injected collaborators of the combat engine.
//!
//! The engine never reads the wall clock, starts a timer, or plays a sound
//! directly. It talks to these ports instead, so a driver can wire real
//! implementations and tests can substitute deterministic ones
//! (see [`crate::testing`]).

use crate::combat::CombatId;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

// ============================================================================
// Clock
// ============================================================================

/// Source of millisecond timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

// ============================================================================
// Turn scheduling
// ============================================================================

/// A pending enemy turn.
///
/// The ticket identifies the encounter and the turn it was issued for, so a
/// late delivery can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyTurnTicket {
    pub combat_id: CombatId,
    pub turn: u32,
}

/// Delivers an [`EnemyTurnTicket`] back to whoever owns the engine after a
/// delay.
///
/// Implementations must not block. Delivery is the owner's concern: it hands
/// due tickets to [`crate::CombatEngine::resolve_enemy_turn`].
pub trait TurnScheduler: Send {
    fn schedule(&self, delay: Duration, ticket: EnemyTurnTicket);
}

/// Scheduler backed by tokio timers.
///
/// Each ticket is delivered on the receiver returned from [`TokioScheduler::new`]
/// once its delay has elapsed.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
    tx: mpsc::UnboundedSender<EnemyTurnTicket>,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> (Self, mpsc::UnboundedReceiver<EnemyTurnTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { handle, tx }, rx)
    }
}

impl TurnScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, ticket: EnemyTurnTicket) {
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(ticket).is_err() {
                tracing::trace!(?ticket, "enemy turn receiver dropped");
            }
        });
    }
}

// ============================================================================
// Sound
// ============================================================================

/// Errors a sound sink may report. The engine logs and discards them.
#[derive(Debug, Error)]
pub enum SoundError {
    #[error("Sound '{0}' is not available")]
    Unavailable(String),

    #[error("Sound playback failed: {0}")]
    Playback(String),
}

/// Fire-and-forget sound playback.
///
/// `id` is a lowercase action name (`illuminate`, `reflect`, ...) or one of
/// the fixed cues `shadow-attack`, `victory`, `defeat`.
pub trait SoundSink: Send + Sync {
    fn play(&self, id: &str, duration_secs: Option<f32>) -> Result<(), SoundError>;
}

/// Discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSoundSink;

impl SoundSink for NullSoundSink {
    fn play(&self, _id: &str, _duration_secs: Option<f32>) -> Result<(), SoundError> {
        Ok(())
    }
}

/// Writes each cue to the log instead of the speakers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSoundSink;

impl SoundSink for LogSoundSink {
    fn play(&self, id: &str, duration_secs: Option<f32>) -> Result<(), SoundError> {
        tracing::info!(sound = id, ?duration_secs, "sound cue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_delivers_after_delay() {
        let (scheduler, mut rx) = TokioScheduler::new(Handle::current());
        let ticket = EnemyTurnTicket {
            combat_id: CombatId::new(),
            turn: 3,
        };

        scheduler.schedule(Duration::from_millis(2500), ticket);
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2500)).await;
        let delivered = rx.recv().await;
        assert_eq!(delivered, Some(ticket));
    }
}
