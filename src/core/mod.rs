pub mod adventure;
pub mod boss;
pub mod catalog;
pub mod clock;
pub mod daily;
pub mod engine;
pub mod error;
pub mod events;
pub mod friends;
pub mod habits;
pub mod modifiers;
pub mod pet;
pub mod reward;
pub mod shop;
pub mod snapshot;
pub mod state;
pub mod store;

pub use adventure::AdventureStatus;
pub use boss::BossPhase;
pub use catalog::{Catalog, ItemCategory, ItemKind, ShopItem};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::{ActionError, ActionResult, StoreError};
pub use events::EngineEvent;
pub use friends::Greeting;
pub use habits::{Completion, CompletionReceipt};
pub use modifiers::ActiveModifiers;
pub use pet::{Interaction, Starter};
pub use reward::RewardOutcome;
pub use snapshot::{AchievementRecord, RemoteUpdate, Snapshot, SyncOutcome};
pub use state::{GameState, HabitKind, PetStage, Rarity};
pub use store::{DocumentStore, JsonFileStore, MemoryStore, Persister};
