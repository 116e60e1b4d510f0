use serde::Serialize;

use super::catalog::ItemKind;
use super::state::{PetStage, SecondaryPet};

/// Something worth telling the player about. Sound and animation layers
/// subscribe to these; nothing in the engine reads them back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    DailyReset,
    StreakBroken { previous: u32 },
    HabitCompleted { habit_id: String },
    HabitUnchecked { habit_id: String },
    RewardApplied { ep: u64, gold: u64 },
    StreakChanged { streak: u32 },
    StageEvolved { from: PetStage, to: PetStage },
    LevelUp { level: u32 },
    EggProgressed { progress: u32, target_days: u32 },
    EggHatched { companion: SecondaryPet },
    BossSummoned { name: String, max_hp: u64 },
    BossDamaged { damage: u64, remaining_hp: u64 },
    BossDefeated { name: String, bonus_gold: u64 },
    AchievementUnlocked { id: String },
    PetInteraction { kind: &'static str },
    ItemPurchased { item_id: String },
    ItemUsed { item_id: String, kind: ItemKind },
    Equipped { slot: &'static str, item_id: Option<String> },
    AdventureStarted,
    AdventureShortened { seconds: u64 },
    AdventureFinished,
    FriendGreeted { friend_id: String },
    RemoteSnapshotApplied,
}
