use serde::Serialize;

use super::state::{Achievement, AchievementCondition, Rarity};

/// What using (or buying) an item does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    RestoreEp,
    BoostCompassion,
    BoostIntelligence,
    ReduceAdventureTime,
    HatcheryProgress,
    InstantHatch,
    GambleGold,
    UnlockCostume,
    UnlockDecor,
}

impl ItemKind {
    pub fn is_unlock(&self) -> bool {
        matches!(self, ItemKind::UnlockCostume | ItemKind::UnlockDecor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Consumable,
    Pet,
    Adventure,
    Hatchery,
    Costume,
    Decor,
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemCategory::Consumable => write!(f, "consumable"),
            ItemCategory::Pet => write!(f, "pet"),
            ItemCategory::Adventure => write!(f, "adventure"),
            ItemCategory::Hatchery => write!(f, "hatchery"),
            ItemCategory::Costume => write!(f, "costume"),
            ItemCategory::Decor => write!(f, "decor"),
        }
    }
}

/// Bonuses granted while an item is equipped. Absent fields count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Modifiers {
    pub ep_multiplier: Option<f64>,
    pub gold_multiplier: Option<f64>,
    pub boss_damage_multiplier: Option<f64>,
    pub adventure_speed_multiplier: Option<f64>,
    pub happiness_bonus: Option<f64>,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ep_multiplier: None,
        gold_multiplier: None,
        boss_damage_multiplier: None,
        adventure_speed_multiplier: None,
        happiness_bonus: None,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub kind: ItemKind,
    /// Magnitude of the effect: EP restored, seconds saved, max gold won...
    pub value: u64,
    pub category: ItemCategory,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanionTemplate {
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossTemplate {
    pub name: &'static str,
    pub hp: u64,
    pub reward_gold: u64,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: AchievementCondition,
}

impl AchievementDef {
    pub fn instantiate(&self) -> Achievement {
        Achievement {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            icon: self.icon.to_string(),
            condition: self.condition,
            unlocked: false,
            unlocked_at: None,
        }
    }
}

const fn item(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    cost: u64,
    kind: ItemKind,
    value: u64,
    category: ItemCategory,
    modifiers: Modifiers,
) -> ShopItem {
    ShopItem { id, name, description, cost, kind, value, category, modifiers }
}

const fn companion(
    name: &'static str,
    emoji: &'static str,
    description: &'static str,
    rarity: Rarity,
) -> CompanionTemplate {
    CompanionTemplate { name, emoji, description, rarity }
}

pub static SHOP_ITEMS: &[ShopItem] = &[
    item(
        "green_tea",
        "Green Tea Elixir",
        "A soothing brew that restores 10 Energy Points.",
        50,
        ItemKind::RestoreEp,
        10,
        ItemCategory::Consumable,
        Modifiers::NONE,
    ),
    item(
        "lotus_nectar",
        "Lotus Nectar",
        "Potent essence that restores 25 Energy Points.",
        100,
        ItemKind::RestoreEp,
        25,
        ItemCategory::Consumable,
        Modifiers::NONE,
    ),
    item(
        "scroll_wisdom",
        "Scroll of Wisdom",
        "Ancient texts that increase your Pet's Intelligence by 5.",
        200,
        ItemKind::BoostIntelligence,
        5,
        ItemCategory::Pet,
        Modifiers::NONE,
    ),
    item(
        "spirit_treat",
        "Spirit Treat",
        "A glowing snack that increases your Pet's Compassion by 5.",
        200,
        ItemKind::BoostCompassion,
        5,
        ItemCategory::Pet,
        Modifiers::NONE,
    ),
    item(
        "wind_chime",
        "Wind Chime",
        "Calls a favorable wind. Reduces Adventure time by 30 minutes.",
        150,
        ItemKind::ReduceAdventureTime,
        30 * 60,
        ItemCategory::Adventure,
        Modifiers::NONE,
    ),
    item(
        "dragon_incense",
        "Dragon Incense",
        "Intense aroma that speeds up time. Reduces Adventure time by 2 hours.",
        400,
        ItemKind::ReduceAdventureTime,
        2 * 60 * 60,
        ItemCategory::Adventure,
        Modifiers::NONE,
    ),
    item(
        "warm_lamp",
        "Incubation Lamp",
        "Provides gentle warmth. Advances current egg progress by 1 day.",
        500,
        ItemKind::HatcheryProgress,
        1,
        ItemCategory::Hatchery,
        Modifiers::NONE,
    ),
    item(
        "phoenix_ash",
        "Phoenix Ash",
        "Legendary dust that instantly hatches the current egg.",
        1200,
        ItemKind::InstantHatch,
        1,
        ItemCategory::Hatchery,
        Modifiers::NONE,
    ),
    item(
        "fortune_cookie",
        "Fortune Cookie",
        "Crack it open! Grants 0-100 Gold randomly.",
        50,
        ItemKind::GambleGold,
        100,
        ItemCategory::Consumable,
        Modifiers::NONE,
    ),
    item(
        "zen_pebble",
        "Zen Pebble",
        "A small token of mindfulness. Restores 50 Energy Points.",
        300,
        ItemKind::RestoreEp,
        50,
        ItemCategory::Consumable,
        Modifiers::NONE,
    ),
    // Costumes
    item(
        "ninja_headband",
        "Ninja Headband",
        "A sleek headband for the stealthy pet.",
        500,
        ItemKind::UnlockCostume,
        1,
        ItemCategory::Costume,
        Modifiers {
            boss_damage_multiplier: Some(0.1),
            ep_multiplier: Some(0.05),
            ..Modifiers::NONE
        },
    ),
    item(
        "wizard_hat",
        "Wizard Hat",
        "Sparkling with arcane energy.",
        750,
        ItemKind::UnlockCostume,
        1,
        ItemCategory::Costume,
        Modifiers {
            ep_multiplier: Some(0.15),
            ..Modifiers::NONE
        },
    ),
    item(
        "samurai_armor",
        "Samurai Armor",
        "Traditional plating for the warrior spirit.",
        1200,
        ItemKind::UnlockCostume,
        1,
        ItemCategory::Costume,
        Modifiers {
            boss_damage_multiplier: Some(0.2),
            ..Modifiers::NONE
        },
    ),
    item(
        "flower_crown",
        "Flower Crown",
        "Blooming with eternal spring.",
        300,
        ItemKind::UnlockCostume,
        1,
        ItemCategory::Costume,
        Modifiers {
            gold_multiplier: Some(0.1),
            happiness_bonus: Some(0.1),
            ..Modifiers::NONE
        },
    ),
    item(
        "mech_suit",
        "Mech Suit",
        "High-tech protection from the future.",
        2000,
        ItemKind::UnlockCostume,
        1,
        ItemCategory::Costume,
        Modifiers {
            boss_damage_multiplier: Some(0.15),
            gold_multiplier: Some(0.15),
            ..Modifiers::NONE
        },
    ),
    // Home decor
    item(
        "zen_garden",
        "Zen Garden",
        "Raked sand and peaceful stones.",
        800,
        ItemKind::UnlockDecor,
        1,
        ItemCategory::Decor,
        Modifiers {
            ep_multiplier: Some(0.1),
            ..Modifiers::NONE
        },
    ),
    item(
        "bamboo_grove",
        "Bamboo Grove",
        "Tall bamboo swaying in the wind.",
        600,
        ItemKind::UnlockDecor,
        1,
        ItemCategory::Decor,
        Modifiers::NONE,
    ),
    item(
        "cherry_blossom",
        "Cherry Blossom Tree",
        "Pink petals falling gently.",
        1000,
        ItemKind::UnlockDecor,
        1,
        ItemCategory::Decor,
        Modifiers {
            happiness_bonus: Some(0.2),
            ..Modifiers::NONE
        },
    ),
    item(
        "hot_spring",
        "Hot Spring",
        "Steaming water for relaxation.",
        1500,
        ItemKind::UnlockDecor,
        1,
        ItemCategory::Decor,
        Modifiers::NONE,
    ),
    item(
        "floating_island",
        "Floating Island",
        "Defy gravity with this magical base.",
        2500,
        ItemKind::UnlockDecor,
        1,
        ItemCategory::Decor,
        Modifiers {
            adventure_speed_multiplier: Some(0.2),
            ep_multiplier: Some(0.1),
            ..Modifiers::NONE
        },
    ),
];

pub static COMPANIONS: &[CompanionTemplate] = &[
    companion("Moss Turtle", "🐢", "A steady friend who reminds you to breathe.", Rarity::Common),
    companion("Paper Crane", "🦢", "Carries your hopes on delicate wings.", Rarity::Common),
    companion("Lantern Firefly", "🏮", "A tiny light in the darkest times.", Rarity::Common),
    companion("Ripple Koi", "🐟", "Swims persistently against the current.", Rarity::Common),
    companion("Bonsai Ent", "🪴", "Patient growth leads to great strength.", Rarity::Common),
    companion("Root Golem", "🪨", "Grounded and unshakeable.", Rarity::Common),
    companion("Ink Squid", "🦑", "Flows with creativity and expression.", Rarity::Common),
    companion("Cloud Sheep", "🐑", "Soft, dreamy, and peaceful.", Rarity::Common),
    companion("Mist Fox", "🦊", "Clever and elusive, seen only in quiet moments.", Rarity::Uncommon),
    companion("Crystal Moth", "🦋", "Transformed by the light of focus.", Rarity::Uncommon),
    companion("Jade Serpent", "🐍", "Brings wisdom and good fortune.", Rarity::Uncommon),
    companion("Bloom Deer", "🦌", "Where it steps, flowers bloom.", Rarity::Uncommon),
    companion("Shadow Cat", "🐈‍⬛", "Observes the world with silent grace.", Rarity::Uncommon),
    companion("Ember Sprite", "🔥", "A spark of passion and energy.", Rarity::Uncommon),
    companion("Moon Owl", "🦉", "Keeper of secrets and nocturnal wisdom.", Rarity::Rare),
    companion("Storm Griffin", "🦅", "Rides the winds of change.", Rarity::Rare),
    companion("Star Jelly", "🪼", "Drifts through the cosmic ocean.", Rarity::Rare),
    companion("Cloud Whale", "🐋", "A gentle giant of the skies.", Rarity::Rare),
    companion("Sun Phoenix", "🐦‍🔥", "Born anew from the ashes of old habits.", Rarity::Legendary),
    companion("Time Snail", "🐌", "Exists in the eternal now.", Rarity::Legendary),
    companion("Void Ray", "🛸", "Silent watcher from the deep unknown.", Rarity::Legendary),
    companion("Zen Dragon", "🐉", "The ultimate symbol of balance and power.", Rarity::Legendary),
];

pub static BOSSES: &[BossTemplate] = &[
    BossTemplate {
        name: "Procrastination Demon",
        hp: 100,
        reward_gold: 50,
        emoji: "👹",
    },
    BossTemplate {
        name: "Chaos Dragon",
        hp: 200,
        reward_gold: 100,
        emoji: "🐉",
    },
    BossTemplate {
        name: "Sloth Slime",
        hp: 50,
        reward_gold: 25,
        emoji: "🦠",
    },
];

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "streak_7",
        title: "Week Warrior",
        description: "Reach a 7 day streak",
        icon: "🔥",
        condition: AchievementCondition::StreakAtLeast(7),
    },
    AchievementDef {
        id: "hoarder_1000",
        title: "Gold Hoarder",
        description: "Amass 1000 Gold",
        icon: "💰",
        condition: AchievementCondition::GoldAtLeast(1000),
    },
    AchievementDef {
        id: "pet_level_10",
        title: "Best Friends",
        description: "Reach Pet Level 10",
        icon: "❤️",
        condition: AchievementCondition::LevelAtLeast(10),
    },
];

/// Read-only lookup tables shared by every engine.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub items: &'static [ShopItem],
    pub companions: &'static [CompanionTemplate],
    pub bosses: &'static [BossTemplate],
    pub achievements: &'static [AchievementDef],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Catalog {
            items: SHOP_ITEMS,
            companions: COMPANIONS,
            bosses: BOSSES,
            achievements: ACHIEVEMENTS,
        }
    }

    pub fn item(&self, id: &str) -> Option<&'static ShopItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items_in(&self, category: ItemCategory) -> impl Iterator<Item = &'static ShopItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    pub fn companions_of(&self, rarity: Rarity) -> Vec<&'static CompanionTemplate> {
        self.companions.iter().filter(|c| c.rarity == rarity).collect()
    }

    pub fn fresh_achievements(&self) -> Vec<Achievement> {
        self.achievements.iter().map(AchievementDef::instantiate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_item_ids_are_unique() {
        let ids: HashSet<_> = SHOP_ITEMS.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), SHOP_ITEMS.len());
    }

    #[test]
    fn test_unlock_items_match_category() {
        for item in SHOP_ITEMS {
            let cosmetic = matches!(item.category, ItemCategory::Costume | ItemCategory::Decor);
            assert_eq!(item.kind.is_unlock(), cosmetic, "{}", item.id);
            match item.kind {
                ItemKind::UnlockCostume => assert_eq!(item.category, ItemCategory::Costume),
                ItemKind::UnlockDecor => assert_eq!(item.category, ItemCategory::Decor),
                _ => assert!(item.modifiers == Modifiers::NONE, "{} has modifiers", item.id),
            }
        }
    }

    #[test]
    fn test_every_rarity_has_companions() {
        let catalog = Catalog::builtin();
        for rarity in [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Legendary] {
            assert!(!catalog.companions_of(rarity).is_empty(), "empty pool for {rarity}");
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.item("wind_chime").map(|i| i.value), Some(1800));
        assert!(catalog.item("nope").is_none());
        assert_eq!(catalog.items_in(ItemCategory::Decor).count(), 5);
    }
}
