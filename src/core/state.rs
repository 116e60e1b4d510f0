use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Days of linked-habit completion needed to hatch a fresh egg.
pub const DEFAULT_EGG_TARGET_DAYS: u32 = 7;

pub const MAX_VITAL: f64 = 100.0;

/// Life-cycle phase of the main pet. Ordered so that `max` never demotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PetStage {
    Egg,
    Baby,
    Adult,
}

impl PetStage {
    /// Stage implied by cumulative EP alone.
    pub fn for_total_ep(total_ep: u64) -> Self {
        match total_ep {
            ep if ep >= 500 => PetStage::Adult,
            ep if ep >= 100 => PetStage::Baby,
            _ => PetStage::Egg,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PetStage::Egg => "Mystic Egg",
            PetStage::Baby => "Wisp",
            PetStage::Adult => "Guardian",
        }
    }
}

impl std::fmt::Display for PetStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PetStage::Egg => write!(f, "EGG"),
            PetStage::Baby => write!(f, "BABY"),
            PetStage::Adult => write!(f, "ADULT"),
        }
    }
}

pub fn level_for_total_ep(total_ep: u64) -> u32 {
    (total_ep / 100) as u32 + 1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub compassion: f64,
    pub intelligence: f64,
    pub strength: f64,
    pub agility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    pub stage: PetStage,
    pub total_ep: u64,
    pub level: u32,
    pub hunger: f64,
    pub happiness: f64,
    pub traits: Traits,
}

impl Default for Pet {
    fn default() -> Self {
        Pet {
            id: "1".to_string(),
            stage: PetStage::Egg,
            total_ep: 0,
            level: 1,
            hunger: 80.0,
            happiness: 80.0,
            traits: Traits::default(),
        }
    }
}

impl Pet {
    /// Add EP and bring stage and level up to date. Stage only moves forward.
    pub fn grow(&mut self, ep: u64) {
        self.total_ep = self.total_ep.saturating_add(ep);
        self.stage = self.stage.max(PetStage::for_total_ep(self.total_ep));
        self.level = level_for_total_ep(self.total_ep);
    }

    pub fn set_hunger(&mut self, value: f64) {
        self.hunger = value.clamp(0.0, MAX_VITAL);
    }

    pub fn set_happiness(&mut self, value: f64) {
        self.happiness = value.clamp(0.0, MAX_VITAL);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    Boolean,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: HabitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<u32>,
    #[serde(default)]
    pub current_value: u32,
    pub completed_today: bool,
    #[serde(default)]
    pub last_completed: Option<NaiveDate>,
    pub ep_reward: u64,
}

impl Habit {
    pub fn new(id: String, title: String, kind: HabitKind, ep_reward: u64) -> Self {
        Habit {
            id,
            title,
            kind,
            target_value: None,
            current_value: 0,
            completed_today: false,
            last_completed: None,
            ep_reward: ep_reward.max(1),
        }
    }
}

/// The starter habit list a brand new user sees.
pub fn default_habits() -> Vec<Habit> {
    let mut water = Habit::new("2".into(), "Drink 2L Water".into(), HabitKind::Numeric, 5);
    water.target_value = Some(2000);
    vec![
        Habit::new("1".into(), "Morning Meditation".into(), HabitKind::Boolean, 5),
        water,
        Habit::new("3".into(), "Read 30 Minutes".into(), HabitKind::Boolean, 5),
        Habit::new("4".into(), "No Sugar".into(), HabitKind::Boolean, 5),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "Common"),
            Rarity::Uncommon => write!(f, "Uncommon"),
            Rarity::Rare => write!(f, "Rare"),
            Rarity::Legendary => write!(f, "Legendary"),
        }
    }
}

/// A hatched collectible. Never removed once added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryPet {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub rarity: Rarity,
    pub hatched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEgg {
    pub linked_habit_id: Option<String>,
    pub progress: u32,
    pub target_days: u32,
}

impl Default for ActiveEgg {
    fn default() -> Self {
        ActiveEgg {
            linked_habit_id: None,
            progress: 0,
            target_days: DEFAULT_EGG_TARGET_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hatchery {
    pub active_egg: Option<ActiveEgg>,
    #[serde(rename = "inventory")]
    pub companions: Vec<SecondaryPet>,
}

impl Default for Hatchery {
    fn default() -> Self {
        Hatchery {
            active_egg: Some(ActiveEgg::default()),
            companions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adventure {
    pub start_time: DateTime<Utc>,
    pub reduction_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub item_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub last_interaction: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub has_completed_onboarding: bool,
    pub gold: u64,
    pub daily_ep: u64,
    pub current_streak: u32,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_streak_update: Option<NaiveDate>,
    #[serde(default)]
    pub current_adventure: Option<Adventure>,
    #[serde(default)]
    pub hatchery: Hatchery,
    #[serde(default)]
    pub inventory: Vec<InventoryEntry>,
    #[serde(default)]
    pub friends: Vec<Friend>,
    #[serde(default)]
    pub unlocked_costumes: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_decor: BTreeSet<String>,
    #[serde(default)]
    pub active_costume: Option<String>,
    #[serde(default)]
    pub active_decor: Option<String>,
}

impl Default for UserState {
    fn default() -> Self {
        UserState {
            display_name: None,
            has_completed_onboarding: false,
            gold: 0,
            daily_ep: 0,
            current_streak: 0,
            last_reset_date: None,
            last_streak_update: None,
            current_adventure: None,
            hatchery: Hatchery::default(),
            inventory: Vec::new(),
            friends: Vec::new(),
            unlocked_costumes: BTreeSet::new(),
            unlocked_decor: BTreeSet::new(),
            active_costume: None,
            active_decor: None,
        }
    }
}

impl UserState {
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory
            .iter()
            .find(|entry| entry.item_id == item_id)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn add_item(&mut self, item_id: &str) {
        match self.inventory.iter_mut().find(|entry| entry.item_id == item_id) {
            Some(entry) => entry.count += 1,
            None => self.inventory.push(InventoryEntry {
                item_id: item_id.to_string(),
                count: 1,
            }),
        }
    }

    /// Take one of `item_id` out of the inventory. Returns false when there
    /// was none to take; entries that hit zero are removed.
    pub fn take_item(&mut self, item_id: &str) -> bool {
        let Some(index) = self
            .inventory
            .iter()
            .position(|entry| entry.item_id == item_id && entry.count > 0)
        else {
            return false;
        };
        self.inventory[index].count -= 1;
        if self.inventory[index].count == 0 {
            self.inventory.remove(index);
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossReward {
    pub gold: u64,
    pub ep: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boss {
    pub id: String,
    pub name: String,
    pub description: String,
    pub max_hp: u64,
    pub current_hp: u64,
    /// Pet level at summon time. Informational only.
    pub level: u32,
    pub reward: BossReward,
    pub image: String,
    pub active: bool,
    pub defeated: bool,
}

/// Predicate an achievement unlocks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum AchievementCondition {
    StreakAtLeast(u32),
    GoldAtLeast(u64),
    LevelAtLeast(u32),
}

impl AchievementCondition {
    pub fn is_met(&self, user: &UserState, pet: &Pet) -> bool {
        match *self {
            AchievementCondition::StreakAtLeast(n) => user.current_streak >= n,
            AchievementCondition::GoldAtLeast(n) => user.gold >= n,
            AchievementCondition::LevelAtLeast(n) => pet.level >= n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub condition: AchievementCondition,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    /// Unlock if not already unlocked. The timestamp is written exactly once.
    pub fn unlock(&mut self, at: DateTime<Utc>) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(at);
        true
    }
}

/// Everything the engine owns.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub user: UserState,
    pub pet: Pet,
    pub habits: Vec<Habit>,
    pub active_boss: Option<Boss>,
    pub achievements: Vec<Achievement>,
}

impl GameState {
    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    pub fn habit_mut(&mut self, habit_id: &str) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == habit_id)
    }
}
