use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::error::{ActionError, ActionResult};
use super::modifiers::ActiveModifiers;
use super::state::{GameState, PetStage, MAX_VITAL};

/// Gold spent on supplies for feeding or playing.
pub const INTERACTION_COST: u64 = 5;

/// Vitals below this leave the pet too depleted to train.
pub const TRAIN_MIN_VITAL: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Feed,
    Play,
    Train,
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Feed => "feed",
            Interaction::Play => "play",
            Interaction::Train => "train",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionOutcome {
    pub kind: Interaction,
    pub ep_gained: u64,
    pub gold_spent: u64,
    pub level: u32,
}

/// Feed, play with or train the main pet.
///
/// Skips the reward machinery: no modifiers on EP,
/// no streak, no boss damage and no achievement checks.
pub fn interact(
    state: &mut GameState,
    catalog: &Catalog,
    kind: Interaction,
) -> ActionResult<InteractionOutcome> {
    let pet = &state.pet;
    let user = &state.user;

    match kind {
        Interaction::Feed | Interaction::Play if user.gold < INTERACTION_COST => {
            return Err(ActionError::InsufficientGold {
                needed: INTERACTION_COST,
                available: user.gold,
            });
        }
        Interaction::Feed if pet.hunger >= MAX_VITAL => return Err(ActionError::PetFull),
        Interaction::Play if pet.happiness >= MAX_VITAL => return Err(ActionError::PetHappy),
        Interaction::Train if pet.hunger < TRAIN_MIN_VITAL || pet.happiness < TRAIN_MIN_VITAL => {
            return Err(ActionError::PetTooTired)
        }
        _ => {}
    }

    let happiness_factor = 1.0 + ActiveModifiers::resolve(&state.user, catalog).happiness_bonus;
    let pet = &mut state.pet;

    let (ep_gained, gold_spent) = match kind {
        Interaction::Feed => {
            pet.set_hunger(pet.hunger + 30.0);
            pet.set_happiness(pet.happiness + 5.0 * happiness_factor);
            pet.traits.compassion += 0.5;
            (2, INTERACTION_COST)
        }
        Interaction::Play => {
            pet.set_happiness(pet.happiness + 20.0 * happiness_factor);
            pet.set_hunger(pet.hunger - 10.0);
            pet.traits.agility += 0.5;
            (5, INTERACTION_COST)
        }
        Interaction::Train => {
            pet.set_hunger(pet.hunger - 20.0);
            pet.set_happiness(pet.happiness - 10.0);
            pet.traits.strength += 1.0;
            pet.traits.intelligence += 1.0;
            (20, 0)
        }
    };

    // Interactions only move the level; stage follows habit rewards.
    pet.total_ep = pet.total_ep.saturating_add(ep_gained);
    pet.level = super::state::level_for_total_ep(pet.total_ep);
    state.user.gold -= gold_spent;

    Ok(InteractionOutcome {
        kind,
        ep_gained,
        gold_spent,
        level: state.pet.level,
    })
}

/// Starter companions offered during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Starter {
    Turtle,
    Dragon,
    Owl,
    Cat,
}

impl std::str::FromStr for Starter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "turtle" => Ok(Starter::Turtle),
            "dragon" => Ok(Starter::Dragon),
            "owl" => Ok(Starter::Owl),
            "cat" => Ok(Starter::Cat),
            other => Err(format!("unknown starter: {other} (turtle, dragon, owl, cat)")),
        }
    }
}

/// Pick the starting pet. Only allowed once, before onboarding completes.
pub fn choose_starter(state: &mut GameState, starter: Starter, pet_id: String) -> ActionResult<()> {
    if state.user.has_completed_onboarding {
        return Err(ActionError::OnboardingComplete);
    }
    let pet = &mut state.pet;
    pet.id = pet_id;
    pet.stage = PetStage::Baby;
    pet.hunger = MAX_VITAL;
    pet.happiness = MAX_VITAL;
    pet.total_ep = 0;
    pet.level = 1;
    pet.traits = Default::default();
    match starter {
        Starter::Turtle => pet.traits.compassion = 5.0,
        Starter::Dragon => pet.traits.strength = 5.0,
        Starter::Owl => pet.traits.intelligence = 5.0,
        Starter::Cat => pet.traits.agility = 5.0,
    }
    state.user.has_completed_onboarding = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{Pet, UserState};

    fn state(gold: u64, hunger: f64, happiness: f64) -> GameState {
        GameState {
            user: UserState { gold, ..UserState::default() },
            pet: Pet { hunger, happiness, ..Pet::default() },
            habits: Vec::new(),
            active_boss: None,
            achievements: Vec::new(),
        }
    }

    #[test]
    fn test_feed() {
        let mut s = state(10, 80.0, 50.0);
        let outcome = interact(&mut s, &Catalog::builtin(), Interaction::Feed).unwrap();
        assert_eq!(outcome.gold_spent, 5);
        assert_eq!(s.pet.hunger, 100.0);
        assert_eq!(s.pet.happiness, 55.0);
        assert_eq!(s.pet.total_ep, 2);
        assert_eq!(s.pet.traits.compassion, 0.5);
        assert_eq!(s.user.gold, 5);
    }

    #[test]
    fn test_play_uses_happiness_bonus() {
        let mut s = state(10, 5.0, 50.0);
        s.user.unlocked_decor.insert("cherry_blossom".into());
        s.user.active_decor = Some("cherry_blossom".into());
        interact(&mut s, &Catalog::builtin(), Interaction::Play).unwrap();
        // 20 * 1.2
        assert!((s.pet.happiness - 74.0).abs() < 1e-9);
        assert_eq!(s.pet.hunger, 0.0);
        assert_eq!(s.pet.traits.agility, 0.5);
    }

    #[test]
    fn test_train_is_free() {
        let mut s = state(0, 50.0, 50.0);
        s.pet.total_ep = 90;
        let outcome = interact(&mut s, &Catalog::builtin(), Interaction::Train).unwrap();
        assert_eq!(s.user.gold, 0);
        assert_eq!(s.pet.hunger, 30.0);
        assert_eq!(s.pet.happiness, 40.0);
        assert_eq!(s.pet.total_ep, 110);
        assert_eq!(outcome.level, 2);
        assert_eq!(s.pet.traits.strength, 1.0);
        assert_eq!(s.pet.traits.intelligence, 1.0);
    }

    #[test]
    fn test_preconditions_leave_state_alone() {
        let catalog = Catalog::builtin();
        let cases = [
            (state(4, 50.0, 50.0), Interaction::Feed),
            (state(100, 100.0, 50.0), Interaction::Feed),
            (state(100, 50.0, 100.0), Interaction::Play),
            (state(100, 19.0, 80.0), Interaction::Train),
            (state(100, 80.0, 19.5), Interaction::Train),
        ];
        for (mut s, kind) in cases {
            let before = s.clone();
            assert!(interact(&mut s, &catalog, kind).is_err(), "{kind:?} should no-op");
            assert_eq!(s, before);
        }
    }

    #[test]
    fn test_vitals_stay_in_range() {
        let catalog = Catalog::builtin();
        let mut s = state(1_000, 60.0, 60.0);
        s.user.unlocked_costumes.insert("flower_crown".into());
        s.user.active_costume = Some("flower_crown".into());
        let kinds = [Interaction::Play, Interaction::Feed, Interaction::Train];
        for kind in kinds.iter().cycle().take(60) {
            let _ = interact(&mut s, &catalog, *kind);
            assert!((0.0..=100.0).contains(&s.pet.hunger));
            assert!((0.0..=100.0).contains(&s.pet.happiness));
        }
    }

    #[test]
    fn test_starter_only_once() {
        let mut s = state(0, 10.0, 10.0);
        choose_starter(&mut s, Starter::Owl, "p1".into()).unwrap();
        assert_eq!(s.pet.stage, PetStage::Baby);
        assert_eq!(s.pet.traits.intelligence, 5.0);
        assert_eq!(s.pet.hunger, 100.0);
        assert_eq!(
            choose_starter(&mut s, Starter::Cat, "p2".into()),
            Err(ActionError::OnboardingComplete)
        );
        assert_eq!(s.pet.id, "p1");
    }
}
