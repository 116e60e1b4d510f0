use thiserror::Error;

/// A precondition that was not met. The action is a no-op and the state is
/// left exactly as it was; the message is meant to be shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Not enough gold! (need {needed}, have {available})")]
    InsufficientGold { needed: u64, available: u64 },

    #[error("Already owned!")]
    AlreadyOwned(String),

    #[error("Item not in inventory!")]
    NotInInventory(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item is not unlocked: {0}")]
    NotUnlocked(String),

    #[error("No active adventure to speed up!")]
    NoActiveAdventure,

    #[error("An adventure is already underway")]
    AdventureInProgress,

    #[error("Adventure still has {remaining_seconds}s to go")]
    AdventureNotFinished { remaining_seconds: i64 },

    #[error("Need {required} EP today to start an adventure (have {daily_ep})")]
    NotEnoughDailyEp { required: u64, daily_ep: u64 },

    #[error("No active egg in hatchery!")]
    NoActiveEgg,

    #[error("A boss is already active")]
    BossAlreadyActive,

    #[error("No bosses to summon")]
    EmptyRoster,

    #[error("Your pet is already full")]
    PetFull,

    #[error("Your pet is already as happy as can be")]
    PetHappy,

    #[error("Your pet is too tired to train")]
    PetTooTired,

    #[error("Onboarding is already complete")]
    OnboardingComplete,

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error("Friend not found: {0}")]
    FriendNotFound(String),
}

/// Failure talking to a [`DocumentStore`](crate::core::store::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Backend(String),
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
