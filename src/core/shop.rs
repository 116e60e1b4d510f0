use rand::Rng;
use serde::Serialize;

use super::catalog::{ItemKind, ShopItem};
use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::reward::{add_egg_progress, Transition};
use super::state::{GameState, SecondaryPet};

/// Which effect fired when an item was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    RestoredEp { amount: u64 },
    BoostedCompassion { amount: u64 },
    BoostedIntelligence { amount: u64 },
    ShortenedAdventure { seconds: u64 },
    EggProgressed { hatched: Option<SecondaryPet> },
    WonGold { amount: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub message: String,
    pub effect: Option<ItemEffect>,
}

pub fn buy(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    item: &ShopItem,
) -> ActionResult<ItemOutcome> {
    let user = &mut state.user;
    if user.gold < item.cost {
        return Err(ActionError::InsufficientGold {
            needed: item.cost,
            available: user.gold,
        });
    }
    if item.kind.is_unlock() {
        let owned = match item.kind {
            ItemKind::UnlockCostume => &user.unlocked_costumes,
            _ => &user.unlocked_decor,
        };
        if owned.contains(item.id) {
            return Err(ActionError::AlreadyOwned(item.id.to_string()));
        }
    }

    user.gold -= item.cost;
    match item.kind {
        ItemKind::UnlockCostume => {
            user.unlocked_costumes.insert(item.id.to_string());
        }
        ItemKind::UnlockDecor => {
            user.unlocked_decor.insert(item.id.to_string());
        }
        _ => user.add_item(item.id),
    }

    tracing::debug!(item = item.id, cost = item.cost, "item purchased");
    tx.emit(EngineEvent::ItemPurchased { item_id: item.id.to_string() });
    Ok(ItemOutcome {
        item_id: item.id.to_string(),
        message: format!("Purchased {}!", item.name),
        effect: None,
    })
}

/// Consume one of `item` from the inventory and apply its effect.
///
/// Checks run before the count is touched, so a failed use never costs the
/// item.
pub fn use_item(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    item: &ShopItem,
) -> ActionResult<ItemOutcome> {
    if state.user.item_count(item.id) == 0 {
        return Err(ActionError::NotInInventory(item.id.to_string()));
    }
    match item.kind {
        ItemKind::ReduceAdventureTime if state.user.current_adventure.is_none() => {
            return Err(ActionError::NoActiveAdventure);
        }
        ItemKind::HatcheryProgress | ItemKind::InstantHatch
            if state.user.hatchery.active_egg.is_none() =>
        {
            return Err(ActionError::NoActiveEgg);
        }
        _ => {}
    }
    state.user.take_item(item.id);

    let mut message = format!("Used {}!", item.name);
    let effect = match item.kind {
        ItemKind::RestoreEp => {
            state.user.daily_ep = state.user.daily_ep.saturating_add(item.value);
            state.pet.grow(item.value);
            Some(ItemEffect::RestoredEp { amount: item.value })
        }
        ItemKind::BoostCompassion => {
            state.pet.traits.compassion += item.value as f64;
            Some(ItemEffect::BoostedCompassion { amount: item.value })
        }
        ItemKind::BoostIntelligence => {
            state.pet.traits.intelligence += item.value as f64;
            Some(ItemEffect::BoostedIntelligence { amount: item.value })
        }
        ItemKind::ReduceAdventureTime => {
            if let Some(adventure) = state.user.current_adventure.as_mut() {
                adventure.reduction_seconds =
                    adventure.reduction_seconds.saturating_add(item.value);
            }
            tx.emit(EngineEvent::AdventureShortened { seconds: item.value });
            Some(ItemEffect::ShortenedAdventure { seconds: item.value })
        }
        ItemKind::HatcheryProgress | ItemKind::InstantHatch => {
            let days = match (item.kind, state.user.hatchery.active_egg.as_ref()) {
                (ItemKind::InstantHatch, Some(egg)) => egg.target_days,
                _ => u32::try_from(item.value).unwrap_or(u32::MAX),
            };
            let hatched = add_egg_progress(state, tx, days);
            if let Some(pet) = &hatched {
                message = format!("Used {}! {} {} hatched!", item.name, pet.emoji, pet.name);
            }
            Some(ItemEffect::EggProgressed { hatched })
        }
        ItemKind::GambleGold => {
            let amount = if item.value == 0 { 0 } else { tx.rng.gen_range(0..item.value) };
            state.user.gold = state.user.gold.saturating_add(amount);
            message = format!("Opened {} and found {} Gold!", item.name, amount);
            Some(ItemEffect::WonGold { amount })
        }
        // Unlocks never land in the inventory; a stray entry is just consumed.
        ItemKind::UnlockCostume | ItemKind::UnlockDecor => None,
    };

    tracing::debug!(item = item.id, ?effect, "item used");
    tx.emit(EngineEvent::ItemUsed { item_id: item.id.to_string(), kind: item.kind });
    Ok(ItemOutcome {
        item_id: item.id.to_string(),
        message,
        effect,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Costume,
    Decor,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Costume => "costume",
            Slot::Decor => "decor",
        }
    }
}

/// Equip an unlocked item, or clear the slot with `None`.
pub fn equip(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    slot: Slot,
    item_id: Option<&str>,
) -> ActionResult<()> {
    let user = &mut state.user;
    let (unlocked, active) = match slot {
        Slot::Costume => (&user.unlocked_costumes, &mut user.active_costume),
        Slot::Decor => (&user.unlocked_decor, &mut user.active_decor),
    };
    if let Some(id) = item_id {
        if !unlocked.contains(id) {
            return Err(ActionError::NotUnlocked(id.to_string()));
        }
    }
    *active = item_id.map(str::to_string);
    tx.emit(EngineEvent::Equipped {
        slot: slot.name(),
        item_id: item_id.map(str::to_string),
    });
    Ok(())
}
