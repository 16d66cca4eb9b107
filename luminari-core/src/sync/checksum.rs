//! Resource fingerprints exchanged between the combat and progression domains.
//!
//! The checksum is a 32-bit string hash, not a cryptographic digest. It
//! catches mis-wired or corrupted values crossing the boundary; it does not
//! protect against deliberate tampering.

use crate::ports::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which domain produced a [`SyncValidation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    Game,
    Combat,
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncSource::Game => write!(f, "game"),
            SyncSource::Combat => write!(f, "combat"),
        }
    }
}

/// A fingerprinted (LP, SP) pair at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncValidation {
    pub checksum: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub source: SyncSource,
    pub lp: u32,
    pub sp: u32,
}

impl SyncValidation {
    /// Fingerprint `lp`/`sp` at `timestamp`.
    pub fn new(lp: u32, sp: u32, timestamp: u64, source: SyncSource) -> Self {
        Self {
            checksum: generate_checksum(lp, sp, timestamp),
            timestamp,
            source,
            lp,
            sp,
        }
    }

    pub fn is_valid(&self) -> bool {
        validate_checksum(self)
    }
}

/// Compute the checksum of `"{lp}:{sp}:{timestamp}"`.
///
/// Uses the classic `h = h * 31 + c` string hash with 32-bit signed
/// wrap-around, then renders the absolute value in base 36.
pub fn generate_checksum(lp: u32, sp: u32, timestamp: u64) -> String {
    let input = format!("{lp}:{sp}:{timestamp}");
    let mut hash: i32 = 0;
    for byte in input.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    to_base36(i64::from(hash).unsigned_abs())
}

/// Compute the checksum using the clock's current time as the timestamp.
///
/// Returns the timestamp alongside the checksum; a validator needs both.
pub fn generate_checksum_now(lp: u32, sp: u32, clock: &dyn Clock) -> (String, u64) {
    let timestamp = clock.now_ms();
    (generate_checksum(lp, sp, timestamp), timestamp)
}

/// Recompute the checksum of a validation record and compare.
pub fn validate_checksum(validation: &SyncValidation) -> bool {
    generate_checksum(validation.lp, validation.sp, validation.timestamp) == validation.checksum
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    // Only ASCII digits and lowercase letters were pushed.
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        let a = generate_checksum(12, 4, 1_700_000_000_000);
        let b = generate_checksum(12, 4, 1_700_000_000_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_checksum_sensitive_to_each_input() {
        let base = generate_checksum(12, 4, 1_700_000_000_000);
        assert_ne!(base, generate_checksum(13, 4, 1_700_000_000_000));
        assert_ne!(base, generate_checksum(12, 5, 1_700_000_000_000));
        assert_ne!(base, generate_checksum(12, 4, 1_700_000_000_001));
    }

    #[test]
    fn test_checksum_is_order_sensitive() {
        assert_ne!(
            generate_checksum(4, 12, 1_000),
            generate_checksum(12, 4, 1_000)
        );
    }

    #[test]
    fn test_checksum_alphabet() {
        for (lp, sp, ts) in [(0, 0, 0), (999, 999, u64::MAX), (10, 0, 1_699_999_999_999)] {
            let checksum = generate_checksum(lp, sp, ts);
            assert!(!checksum.is_empty());
            assert!(checksum
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_known_hash_value() {
        // "0:0:0" -> 48*31^4 + 58*31^3 + 48*31^2 + 58*31 + 48
        let expected: u64 = 48 * 31u64.pow(4) + 58 * 31u64.pow(3) + 48 * 31u64.pow(2) + 58 * 31 + 48;
        assert_eq!(generate_checksum(0, 0, 0), to_base36(expected));
    }

    #[test]
    fn test_round_trip_validation() {
        for (lp, sp) in [(0, 0), (1, 1), (12, 4), (999, 999)] {
            let validation = SyncValidation::new(lp, sp, 1_700_000_000_000, SyncSource::Game);
            assert!(validate_checksum(&validation), "lp={lp} sp={sp}");
        }
    }

    #[test]
    fn test_mutated_checksum_fails() {
        let mut validation = SyncValidation::new(12, 4, 42, SyncSource::Combat);
        validation.checksum.push('x');
        assert!(!validation.is_valid());

        let mut validation = SyncValidation::new(12, 4, 42, SyncSource::Combat);
        validation.lp = 13;
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(2_147_483_648), "zik0zk");
    }
}
