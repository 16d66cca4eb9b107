//! Save/load of the state that outlives a session.
//!
//! Only [`CarriedState`] is ever written for the engine. Encounter state,
//! sync errors and transaction history are session-only and never persisted.

use crate::combat::{CarriedState, CombatEngine};
use crate::progression::ProgressionLedger;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
pub const SAVE_VERSION: u32 = 1;

/// A saved player profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCombatProfile {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created (ISO-8601).
    pub saved_at: String,

    /// The engine's carried state.
    pub state: CarriedState,

    /// Progression totals, when the saving driver keeps a ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<ProgressionLedger>,
}

impl SavedCombatProfile {
    pub fn new(state: CarriedState) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            state,
            progression: None,
        }
    }

    /// Capture the engine's carried state.
    pub fn from_engine(engine: &CombatEngine) -> Self {
        Self::new(engine.carried_state().clone())
    }

    pub fn with_progression(mut self, ledger: ProgressionLedger) -> Self {
        self.progression = Some(ledger);
        self
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// File name for a profile save.
pub fn profile_save_path(base_dir: impl AsRef<Path>, profile_name: &str) -> PathBuf {
    let sanitized = profile_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}_profile.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_save_path_is_sanitized() {
        let path = profile_save_path("/tmp/saves", "Luminari's Quest");
        assert_eq!(path, PathBuf::from("/tmp/saves/Luminari_s_Quest_profile.json"));
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = SavedCombatProfile::new(CarriedState::default());
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["version"], SAVE_VERSION);
        assert_eq!(value["state"]["resources"]["lp"], 10);
        assert!(value.get("progression").is_none());
        assert!(value["saved_at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_missing_flags_default() {
        let json = r#"{
            "version": 1,
            "saved_at": "2024-01-01T00:00:00Z",
            "state": {
                "resources": { "lp": 3, "sp": 7 },
                "player_health": 55,
                "player_level": 2,
                "player_energy": 40,
                "max_player_energy": 100,
                "preferred_actions": { "illuminate": 1, "reflect": 0, "endure": 2, "embrace": 0 }
            }
        }"#;
        let profile: SavedCombatProfile = serde_json::from_str(json).unwrap();
        assert!(profile.state.flags.sound_enabled);
        assert!(profile.progression.is_none());
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");

        let mut profile = SavedCombatProfile::new(CarriedState::default());
        profile.version = SAVE_VERSION + 1;
        profile.save_json(&path).await.unwrap();

        match SavedCombatProfile::load_json(&path).await {
            Err(PersistError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SavedCombatProfile::load_json(dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(PersistError::Io(_))));
    }
}
