//! Shadow manifestations: the enemies of a combat encounter.
//!
//! Each shadow embodies a psychological struggle. The engine only relies on
//! the HP fields; the rest is carried through to the combat summary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The struggle a shadow represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowKind {
    Doubt,
    Isolation,
    Overwhelm,
    PastPain,
}

impl ShadowKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShadowKind::Doubt => "Doubt",
            ShadowKind::Isolation => "Isolation",
            ShadowKind::Overwhelm => "Overwhelm",
            ShadowKind::PastPain => "Past Pain",
        }
    }
}

impl fmt::Display for ShadowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the player takes away from overcoming a shadow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryReward {
    pub lp_bonus: u32,
    pub experience: u32,
    pub growth_message: String,
}

/// An enemy in a combat encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowManifestation {
    pub id: String,
    pub name: String,
    pub kind: ShadowKind,
    pub description: String,
    pub max_hp: u32,
    pub current_hp: u32,
    pub therapeutic_insight: String,
    pub victory_reward: VictoryReward,
}

impl ShadowManifestation {
    /// Create a shadow at full health.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ShadowKind,
        max_hp: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: String::new(),
            max_hp,
            current_hp: max_hp,
            therapeutic_insight: String::new(),
            victory_reward: VictoryReward {
                lp_bonus: 0,
                experience: 0,
                growth_message: String::new(),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.therapeutic_insight = insight.into();
        self
    }

    pub fn with_reward(mut self, reward: VictoryReward) -> Self {
        self.victory_reward = reward;
        self
    }

    /// Set current HP, clamped to `max_hp`.
    pub fn with_current_hp(mut self, hp: u32) -> Self {
        self.current_hp = hp.min(self.max_hp);
        self
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    /// Below half health the shadow fights desperately.
    pub fn is_desperate(&self) -> bool {
        u64::from(self.current_hp) * 2 < u64::from(self.max_hp)
    }
}

/// The Whisper of Doubt.
pub fn whisper_of_doubt() -> ShadowManifestation {
    ShadowManifestation::new("whisper-of-doubt", "The Whisper of Doubt", ShadowKind::Doubt, 15)
        .with_description("A voice that questions every step you take.")
        .with_insight("Doubt is a question, not a verdict. You can answer it with action.")
        .with_reward(VictoryReward {
            lp_bonus: 3,
            experience: 50,
            growth_message: "You trust your own footing a little more.".to_string(),
        })
}

/// The Veil of Isolation.
pub fn veil_of_isolation() -> ShadowManifestation {
    ShadowManifestation::new("veil-of-isolation", "The Veil of Isolation", ShadowKind::Isolation, 20)
        .with_description("A grey fog that muffles every voice reaching for you.")
        .with_insight("Reaching out is a strength. Connection begins with a single word.")
        .with_reward(VictoryReward {
            lp_bonus: 4,
            experience: 75,
            growth_message: "The fog thins, and you hear others calling your name.".to_string(),
        })
}

/// The Storm of Overwhelm.
pub fn storm_of_overwhelm() -> ShadowManifestation {
    ShadowManifestation::new("storm-of-overwhelm", "The Storm of Overwhelm", ShadowKind::Overwhelm, 25)
        .with_description("A whirlwind of tasks and fears that never settles.")
        .with_insight("You do not have to calm the whole storm. One breath at a time is enough.")
        .with_reward(VictoryReward {
            lp_bonus: 5,
            experience: 100,
            growth_message: "In the eye of the storm, you find stillness.".to_string(),
        })
}

/// The Echo of Past Pain.
pub fn echo_of_past_pain() -> ShadowManifestation {
    ShadowManifestation::new("echo-of-past-pain", "The Echo of Past Pain", ShadowKind::PastPain, 30)
        .with_description("Old wounds that speak in a familiar voice.")
        .with_insight("The past shaped you; it does not define what you become.")
        .with_reward(VictoryReward {
            lp_bonus: 6,
            experience: 150,
            growth_message: "The echo softens into memory, and memory into wisdom.".to_string(),
        })
}

/// All sample shadows, weakest first.
pub fn roster() -> Vec<ShadowManifestation> {
    vec![
        whisper_of_doubt(),
        veil_of_isolation(),
        storm_of_overwhelm(),
        echo_of_past_pain(),
    ]
}

/// Look up a sample shadow by id.
pub fn by_id(id: &str) -> Option<ShadowManifestation> {
    roster().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_starts_at_full_health() {
        for shadow in roster() {
            assert_eq!(shadow.current_hp, shadow.max_hp, "{}", shadow.name);
            assert!(!shadow.therapeutic_insight.is_empty());
        }
    }

    #[test]
    fn test_desperation_threshold() {
        let shadow = whisper_of_doubt();
        assert!(!shadow.is_desperate());
        assert!(!shadow.clone().with_current_hp(8).is_desperate());
        assert!(shadow.clone().with_current_hp(7).is_desperate());
    }

    #[test]
    fn test_current_hp_is_clamped() {
        let shadow = whisper_of_doubt().with_current_hp(999);
        assert_eq!(shadow.current_hp, 15);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(by_id("veil-of-isolation").unwrap().kind, ShadowKind::Isolation);
        assert!(by_id("nope").is_none());
    }
}
