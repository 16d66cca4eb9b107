//! Transactional resource transfer between the combat and progression domains.
//!
//! Every cross-domain exchange goes through [`SyncManager::begin`] followed by
//! [`SyncManager::commit`] or [`SyncManager::rollback`]. A transaction leaves
//! `Pending` exactly once, and only a transaction that passes validation at
//! commit time ever reaches `Committed`.

use super::checksum::{validate_checksum, SyncSource, SyncValidation};
use crate::ports::Clock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Maximum LP or SP swing a single transaction may carry.
pub const MAX_RESOURCE_DELTA: i64 = 100;

/// Upper bound for player health on either side of the boundary.
pub const MAX_PLAYER_HEALTH: u32 = 100;

/// Number of settled transactions kept for auditing.
pub const HISTORY_LIMIT: usize = 50;

/// Unique identifier for sync transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    GameToCombat,
    CombatToGame,
}

impl TransactionKind {
    /// The domain whose values are being fingerprinted.
    pub fn source(&self) -> SyncSource {
        match self {
            TransactionKind::GameToCombat => SyncSource::Game,
            TransactionKind::CombatToGame => SyncSource::Combat,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::GameToCombat => write!(f, "game-to-combat"),
            TransactionKind::CombatToGame => write!(f, "combat-to-game"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    Pending,
    Committed,
    RolledBack,
    Failed,
}

/// Resource values on one side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncState {
    pub lp: u32,
    pub sp: u32,
    pub player_health: u32,
    pub player_energy: u32,
}

/// A single cross-domain transfer and its audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTransaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub timestamp: u64,
    pub source_state: SyncState,
    pub target_state: SyncState,
    pub validation: SyncValidation,
    pub status: TransactionStatus,
    pub error_message: Option<String>,
}

impl SyncTransaction {
    fn settle(&mut self, status: TransactionStatus, error: Option<String>) {
        debug_assert_eq!(self.status, TransactionStatus::Pending);
        self.status = status;
        self.error_message = error;
    }
}

/// The rule a transaction broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("checksum does not match target state")]
    InvalidChecksum,

    #[error("LP delta of {0} exceeds the safety bound of {max}", max = MAX_RESOURCE_DELTA)]
    LpDeltaExceeded(i64),

    #[error("SP delta of {0} exceeds the safety bound of {max}", max = MAX_RESOURCE_DELTA)]
    SpDeltaExceeded(i64),

    #[error("player health {0} is outside 0..={max}", max = MAX_PLAYER_HEALTH)]
    HealthOutOfRange(u32),
}

/// Errors from the transaction protocol.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Transaction {} rejected: {issue}", .transaction.id)]
    Rejected {
        transaction: Box<SyncTransaction>,
        issue: ValidationIssue,
    },

    #[error("Transaction {0} not found in pending set")]
    NotFound(TransactionId),
}

/// Check a transaction against the sync rules.
pub fn check_transaction(tx: &SyncTransaction) -> Result<(), ValidationIssue> {
    if !validate_checksum(&tx.validation)
        || tx.validation.lp != tx.target_state.lp
        || tx.validation.sp != tx.target_state.sp
    {
        return Err(ValidationIssue::InvalidChecksum);
    }

    let lp_delta = i64::from(tx.target_state.lp) - i64::from(tx.source_state.lp);
    if lp_delta.abs() > MAX_RESOURCE_DELTA {
        return Err(ValidationIssue::LpDeltaExceeded(lp_delta));
    }

    let sp_delta = i64::from(tx.target_state.sp) - i64::from(tx.source_state.sp);
    if sp_delta.abs() > MAX_RESOURCE_DELTA {
        return Err(ValidationIssue::SpDeltaExceeded(sp_delta));
    }

    if tx.target_state.player_health > MAX_PLAYER_HEALTH {
        return Err(ValidationIssue::HealthOutOfRange(tx.target_state.player_health));
    }

    Ok(())
}

pub fn validate_transaction(tx: &SyncTransaction) -> bool {
    check_transaction(tx).is_ok()
}

/// Owns pending transactions and the bounded audit history.
pub struct SyncManager {
    clock: Arc<dyn Clock>,
    pending: Vec<SyncTransaction>,
    history: VecDeque<SyncTransaction>,
}

impl SyncManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pending: Vec::new(),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Build a pending transaction fingerprinting `target` at the current time.
    pub fn create_transaction(
        &self,
        kind: TransactionKind,
        source_state: SyncState,
        target_state: SyncState,
    ) -> SyncTransaction {
        let timestamp = self.clock.now_ms();
        SyncTransaction {
            id: TransactionId::new(),
            kind,
            timestamp,
            source_state,
            target_state,
            validation: SyncValidation::new(
                target_state.lp,
                target_state.sp,
                timestamp,
                kind.source(),
            ),
            status: TransactionStatus::Pending,
            error_message: None,
        }
    }

    /// Create and validate a transaction, opening it on success.
    ///
    /// A rejected transaction is marked `Failed` and recorded in the history,
    /// but never enters the pending set.
    pub fn begin(
        &mut self,
        kind: TransactionKind,
        source_state: SyncState,
        target_state: SyncState,
    ) -> Result<SyncTransaction, SyncError> {
        let tx = self.create_transaction(kind, source_state, target_state);
        self.open(tx)
    }

    fn open(&mut self, mut tx: SyncTransaction) -> Result<SyncTransaction, SyncError> {
        if let Err(issue) = check_transaction(&tx) {
            tracing::warn!(id = %tx.id, kind = %tx.kind, %issue, "sync transaction rejected");
            tx.settle(TransactionStatus::Failed, Some(issue.to_string()));
            self.record(tx.clone());
            return Err(SyncError::Rejected {
                transaction: Box::new(tx),
                issue,
            });
        }

        tracing::debug!(id = %tx.id, kind = %tx.kind, "sync transaction opened");
        self.pending.push(tx.clone());
        Ok(tx)
    }

    /// Re-validate and commit a pending transaction.
    ///
    /// The manager does not touch either domain's resources; the owner of
    /// the target domain applies `target_state` once this returns `Ok`.
    pub fn commit(&mut self, id: TransactionId) -> Result<SyncTransaction, SyncError> {
        let mut tx = self.take_pending(id)?;

        if let Err(issue) = check_transaction(&tx) {
            tracing::warn!(%id, %issue, "sync transaction failed final validation");
            tx.settle(TransactionStatus::Failed, Some(issue.to_string()));
            self.record(tx.clone());
            return Err(SyncError::Rejected {
                transaction: Box::new(tx),
                issue,
            });
        }

        tx.settle(TransactionStatus::Committed, None);
        tracing::debug!(%id, kind = %tx.kind, "sync transaction committed");
        self.record(tx.clone());
        Ok(tx)
    }

    /// Abandon a pending transaction.
    pub fn rollback(&mut self, id: TransactionId) -> Result<SyncTransaction, SyncError> {
        let mut tx = self.take_pending(id)?;
        tx.settle(TransactionStatus::RolledBack, None);
        tracing::debug!(%id, "sync transaction rolled back");
        self.record(tx.clone());
        Ok(tx)
    }

    /// Settled transactions, oldest first.
    pub fn history(&self) -> Vec<SyncTransaction> {
        self.history.iter().cloned().collect()
    }

    pub fn pending(&self) -> &[SyncTransaction] {
        &self.pending
    }

    fn take_pending(&mut self, id: TransactionId) -> Result<SyncTransaction, SyncError> {
        let Some(index) = self.pending.iter().position(|tx| tx.id == id) else {
            tracing::warn!(%id, "sync transaction not found in pending set");
            return Err(SyncError::NotFound(id));
        };
        Ok(self.pending.remove(index))
    }

    fn record(&mut self, tx: SyncTransaction) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(tx);
    }
}

impl fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("pending", &self.pending.len())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;

    fn manager() -> SyncManager {
        SyncManager::new(Arc::new(ManualClock::new(1_700_000_000_000)))
    }

    fn state(lp: u32, sp: u32, health: u32) -> SyncState {
        SyncState {
            lp,
            sp,
            player_health: health,
            player_energy: 100,
        }
    }

    #[test]
    fn test_create_transaction_is_pending_and_valid() {
        let manager = manager();
        let tx = manager.create_transaction(
            TransactionKind::GameToCombat,
            state(10, 0, 100),
            state(12, 4, 100),
        );

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.validation.lp, 12);
        assert_eq!(tx.validation.sp, 4);
        assert_eq!(tx.validation.source, SyncSource::Game);
        assert_eq!(tx.timestamp, 1_700_000_000_000);
        assert!(validate_transaction(&tx));
    }

    #[test]
    fn test_lp_delta_bound() {
        let mut manager = manager();
        let result = manager.begin(
            TransactionKind::GameToCombat,
            state(10, 0, 100),
            state(200, 0, 100),
        );

        match result {
            Err(SyncError::Rejected { transaction, issue }) => {
                assert_eq!(transaction.status, TransactionStatus::Failed);
                assert_eq!(issue, ValidationIssue::LpDeltaExceeded(190));
                assert!(transaction.error_message.is_some());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(manager.pending().is_empty());
        assert_eq!(manager.history().len(), 1);
    }

    #[test]
    fn test_delta_of_exactly_100_is_allowed() {
        let mut manager = manager();
        assert!(manager
            .begin(
                TransactionKind::CombatToGame,
                state(0, 100, 50),
                state(100, 0, 50)
            )
            .is_ok());
    }

    #[test]
    fn test_sp_delta_bound() {
        let manager = manager();
        let tx = manager.create_transaction(
            TransactionKind::CombatToGame,
            state(0, 150, 100),
            state(0, 10, 100),
        );
        assert_eq!(
            check_transaction(&tx),
            Err(ValidationIssue::SpDeltaExceeded(-140))
        );
    }

    #[test]
    fn test_health_bound() {
        let manager = manager();
        let tx = manager.create_transaction(
            TransactionKind::GameToCombat,
            state(10, 0, 100),
            state(10, 0, 101),
        );
        assert_eq!(
            check_transaction(&tx),
            Err(ValidationIssue::HealthOutOfRange(101))
        );
    }

    #[test]
    fn test_validation_issue_messages() {
        assert_eq!(
            ValidationIssue::LpDeltaExceeded(190).to_string(),
            "LP delta of 190 exceeds the safety bound of 100"
        );
        assert_eq!(
            ValidationIssue::SpDeltaExceeded(-140).to_string(),
            "SP delta of -140 exceeds the safety bound of 100"
        );
        assert_eq!(
            ValidationIssue::HealthOutOfRange(101).to_string(),
            "player health 101 is outside 0..=100"
        );
    }

    #[test]
    fn test_tampered_checksum_rejected() {
        let manager = manager();
        let mut tx = manager.create_transaction(
            TransactionKind::GameToCombat,
            state(10, 0, 100),
            state(12, 0, 100),
        );
        tx.validation.checksum = "garbage".to_string();
        assert_eq!(check_transaction(&tx), Err(ValidationIssue::InvalidChecksum));

        let mut tx = manager.create_transaction(
            TransactionKind::GameToCombat,
            state(10, 0, 100),
            state(12, 0, 100),
        );
        tx.target_state.lp = 50;
        assert_eq!(check_transaction(&tx), Err(ValidationIssue::InvalidChecksum));
    }

    #[test]
    fn test_commit_moves_to_history() {
        let mut manager = manager();
        let tx = manager
            .begin(
                TransactionKind::GameToCombat,
                state(10, 0, 100),
                state(12, 4, 100),
            )
            .unwrap();
        assert_eq!(manager.pending().len(), 1);

        let committed = manager.commit(tx.id).unwrap();
        assert_eq!(committed.status, TransactionStatus::Committed);
        assert!(manager.pending().is_empty());
        assert_eq!(manager.history().last().unwrap().id, tx.id);
    }

    #[test]
    fn test_commit_unknown_id() {
        let mut manager = manager();
        let id = TransactionId::new();
        assert!(matches!(manager.commit(id), Err(SyncError::NotFound(found)) if found == id));
        assert!(matches!(manager.rollback(id), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_commit_twice_fails() {
        let mut manager = manager();
        let tx = manager
            .begin(
                TransactionKind::GameToCombat,
                state(10, 0, 100),
                state(10, 0, 100),
            )
            .unwrap();
        manager.commit(tx.id).unwrap();
        assert!(matches!(manager.commit(tx.id), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_rollback() {
        let mut manager = manager();
        let tx = manager
            .begin(
                TransactionKind::CombatToGame,
                state(5, 5, 80),
                state(6, 0, 70),
            )
            .unwrap();

        let rolled = manager.rollback(tx.id).unwrap();
        assert_eq!(rolled.status, TransactionStatus::RolledBack);
        assert!(manager.pending().is_empty());
        assert_eq!(manager.history()[0].status, TransactionStatus::RolledBack);
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut manager = manager();
        let mut ids = Vec::new();
        for lp in 0..(HISTORY_LIMIT as u32 + 5) {
            let tx = manager
                .begin(
                    TransactionKind::GameToCombat,
                    state(lp, 0, 100),
                    state(lp, 0, 100),
                )
                .unwrap();
            manager.commit(tx.id).unwrap();
            ids.push(tx.id);
        }

        let history = manager.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.first().unwrap().id, ids[5]);
        assert_eq!(history.last().unwrap().id, *ids.last().unwrap());
    }

    #[test]
    fn test_transaction_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&TransactionKind::GameToCombat).unwrap();
        assert_eq!(json, "\"game-to-combat\"");
        let json = serde_json::to_string(&TransactionStatus::RolledBack).unwrap();
        assert_eq!(json, "\"rolled-back\"");
    }
}
