//! Cross-domain resource synchronization.
//!
//! [`checksum`] fingerprints resource values; [`transaction`] moves them
//! between the combat and progression domains under validation.

pub mod checksum;
pub mod transaction;

pub use checksum::{
    generate_checksum, generate_checksum_now, validate_checksum, SyncSource, SyncValidation,
};
pub use transaction::{
    check_transaction, validate_transaction, SyncError, SyncManager, SyncState, SyncTransaction,
    TransactionId, TransactionKind, TransactionStatus, ValidationIssue, HISTORY_LIMIT,
    MAX_PLAYER_HEALTH, MAX_RESOURCE_DELTA,
};
