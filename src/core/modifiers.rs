use serde::Serialize;

use super::catalog::{Catalog, Modifiers, ShopItem};
use super::state::UserState;

/// Aggregate bonuses from everything currently equipped.
///
/// Sources add together and the result multiplies the base amount, so a +10%
/// costume and a +10% decor give 1.2x, never 1.21x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveModifiers {
    pub ep_multiplier: f64,
    pub gold_multiplier: f64,
    pub boss_damage_multiplier: f64,
    pub adventure_speed_multiplier: f64,
    /// Additive, only used by pet interactions.
    pub happiness_bonus: f64,
}

impl Default for ActiveModifiers {
    fn default() -> Self {
        ActiveModifiers {
            ep_multiplier: 1.0,
            gold_multiplier: 1.0,
            boss_damage_multiplier: 1.0,
            adventure_speed_multiplier: 1.0,
            happiness_bonus: 0.0,
        }
    }
}

impl ActiveModifiers {
    pub fn resolve(user: &UserState, catalog: &Catalog) -> Self {
        let equipped = [equipped_costume(user, catalog), equipped_decor(user, catalog)];
        let sources: Vec<&Modifiers> = equipped
            .into_iter()
            .flatten()
            .map(|item| &item.modifiers)
            .collect();

        let sum = |field: fn(&Modifiers) -> Option<f64>| -> f64 {
            sources.iter().map(|m| field(m).unwrap_or(0.0)).sum()
        };

        ActiveModifiers {
            ep_multiplier: 1.0 + sum(|m| m.ep_multiplier),
            gold_multiplier: 1.0 + sum(|m| m.gold_multiplier),
            boss_damage_multiplier: 1.0 + sum(|m| m.boss_damage_multiplier),
            adventure_speed_multiplier: 1.0 + sum(|m| m.adventure_speed_multiplier),
            happiness_bonus: sum(|m| m.happiness_bonus),
        }
    }

    pub fn apply_ep(&self, base: u64) -> u64 {
        scale(base, self.ep_multiplier)
    }

    pub fn apply_gold(&self, base: u64) -> u64 {
        scale(base, self.gold_multiplier)
    }
}

/// `floor(base * multiplier)`, never below zero.
pub fn scale(base: u64, multiplier: f64) -> u64 {
    let scaled = (base as f64 * multiplier).floor();
    if scaled.is_finite() && scaled > 0.0 {
        scaled as u64
    } else {
        0
    }
}

// An equipped id only counts when the catalog knows it and the user owns it.
fn equipped_costume(user: &UserState, catalog: &Catalog) -> Option<&'static ShopItem> {
    let id = user.active_costume.as_deref()?;
    if !user.unlocked_costumes.contains(id) {
        return None;
    }
    catalog.item(id)
}

fn equipped_decor(user: &UserState, catalog: &Catalog) -> Option<&'static ShopItem> {
    let id = user.active_decor.as_deref()?;
    if !user.unlocked_decor.contains(id) {
        return None;
    }
    catalog.item(id)
}
