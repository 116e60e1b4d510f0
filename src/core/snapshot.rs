use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::state::{Boss, GameState, Habit, Pet, UserState};

/// Persisted form of an achievement. The predicate lives in the catalog and is
/// reattached on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    pub id: String,
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// The whole engine state as it goes to and from a document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub user: UserState,
    pub pet: Pet,
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub active_boss: Option<Boss>,
    #[serde(default)]
    pub achievements: Vec<AchievementRecord>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Snapshot {
            user: state.user.clone(),
            pet: state.pet.clone(),
            habits: state.habits.clone(),
            active_boss: state.active_boss.clone(),
            achievements: state
                .achievements
                .iter()
                .map(|a| AchievementRecord {
                    id: a.id.clone(),
                    unlocked: a.unlocked,
                    unlocked_at: a.unlocked_at,
                })
                .collect(),
        }
    }

    /// Rebuild live state. Every catalog achievement is present afterwards;
    /// records for ids the catalog no longer knows are dropped.
    pub fn into_state(self, catalog: &Catalog) -> GameState {
        let mut achievements = catalog.fresh_achievements();
        for achievement in achievements.iter_mut() {
            if let Some(record) = self.achievements.iter().find(|r| r.id == achievement.id) {
                achievement.unlocked = record.unlocked;
                achievement.unlocked_at = record.unlocked_at;
            }
        }
        GameState {
            user: self.user,
            pet: self.pet,
            habits: self.habits,
            active_boss: self.active_boss,
            achievements,
        }
    }
}

/// A snapshot pushed by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUpdate {
    pub snapshot: Snapshot,
    /// Set when the store is echoing a write this process made and has not
    /// yet acknowledged.
    pub has_pending_writes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Applied,
    IgnoredLocalEcho,
    IgnoredUnchanged,
}
