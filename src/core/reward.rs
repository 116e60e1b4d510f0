use chrono::{DateTime, NaiveDate, Utc};
use rand::{Rng, RngCore};
use serde::Serialize;
use uuid::Uuid;

use super::catalog::{Catalog, CompanionTemplate};
use super::clock::days_between;
use super::events::EngineEvent;
use super::modifiers::{scale, ActiveModifiers};
use super::state::{ActiveEgg, GameState, PetStage, Rarity, SecondaryPet};

/// Everything a transition needs besides the state itself.
pub struct Transition<'a> {
    pub catalog: &'a Catalog,
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
    pub rng: &'a mut dyn RngCore,
    pub events: &'a mut Vec<EngineEvent>,
}

impl Transition<'_> {
    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    Unchanged,
    Extended,
    Restarted,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RewardOutcome {
    pub final_ep: u64,
    pub final_gold: u64,
    pub boss_damage: u64,
    pub bonus_gold: u64,
    pub evolved_to: Option<PetStage>,
    pub hatched: Option<SecondaryPet>,
    pub unlocked_achievements: Vec<String>,
    pub streak_change: Option<StreakChange>,
}

impl RewardOutcome {
    pub fn gold_gained(&self) -> u64 {
        self.final_gold + self.bonus_gold
    }
}

/// Turn a raw (EP, gold) reward into a full state update.
///
/// Order matters: modifiers, pet growth, streak, hatchery, boss, then
/// achievements against the resulting state. The caller runs this on a
/// draft so nothing is observable until the whole thing has been applied.
pub fn apply_reward(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    base_ep: u64,
    base_gold: u64,
    linked_habit_id: Option<&str>,
) -> RewardOutcome {
    let mods = ActiveModifiers::resolve(&state.user, tx.catalog);
    let mut outcome = RewardOutcome {
        final_ep: mods.apply_ep(base_ep),
        final_gold: mods.apply_gold(base_gold),
        ..RewardOutcome::default()
    };

    // Boss damage scales with EP banked before this reward.
    let ep_before = state.pet.total_ep;

    let (old_stage, old_level) = (state.pet.stage, state.pet.level);
    state.pet.grow(outcome.final_ep);
    if state.pet.stage != old_stage {
        tracing::info!(from = %old_stage, to = %state.pet.stage, "pet evolved");
        outcome.evolved_to = Some(state.pet.stage);
        tx.emit(EngineEvent::StageEvolved { from: old_stage, to: state.pet.stage });
    }
    if state.pet.level > old_level {
        tx.emit(EngineEvent::LevelUp { level: state.pet.level });
    }

    let streak_change = update_streak(state, tx.today);
    if streak_change != StreakChange::Unchanged {
        tx.emit(EngineEvent::StreakChanged { streak: state.user.current_streak });
    }
    outcome.streak_change = Some(streak_change);

    if let Some(habit_id) = linked_habit_id {
        outcome.hatched = advance_linked_egg(state, tx, habit_id);
    }

    if let Some((damage, bonus)) = strike_boss(state, tx, ep_before, mods.boss_damage_multiplier) {
        outcome.boss_damage = damage;
        outcome.bonus_gold = bonus;
    }

    state.user.gold = state.user.gold.saturating_add(outcome.final_gold + outcome.bonus_gold);
    state.user.daily_ep = state.user.daily_ep.saturating_add(outcome.final_ep);

    outcome.unlocked_achievements = evaluate_achievements(state, tx);

    tracing::debug!(
        ep = outcome.final_ep,
        gold = outcome.gold_gained(),
        total_ep = state.pet.total_ep,
        "reward applied"
    );
    tx.emit(EngineEvent::RewardApplied { ep: outcome.final_ep, gold: outcome.gold_gained() });

    outcome
}

/// Active streak path. Only ever moves the streak on a positive action.
pub fn update_streak(state: &mut GameState, today: NaiveDate) -> StreakChange {
    let user = &mut state.user;
    match user.last_streak_update.map(|last| days_between(last, today)) {
        Some(0) => StreakChange::Unchanged,
        Some(1) => {
            user.current_streak += 1;
            user.last_streak_update = Some(today);
            StreakChange::Extended
        }
        _ => {
            user.current_streak = 1;
            user.last_streak_update = Some(today);
            StreakChange::Restarted
        }
    }
}

fn advance_linked_egg(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    habit_id: &str,
) -> Option<SecondaryPet> {
    // The egg only holds a weak reference; a deleted habit no longer counts.
    if state.habit(habit_id).is_none() {
        return None;
    }
    let egg = state.user.hatchery.active_egg.as_ref()?;
    if egg.linked_habit_id.as_deref() != Some(habit_id) {
        return None;
    }
    add_egg_progress(state, tx, 1)
}

/// Move the active egg forward by `days`, hatching it when it reaches its
/// target. Progress is capped at the target. Returns the hatched companion.
pub fn add_egg_progress(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    days: u32,
) -> Option<SecondaryPet> {
    let egg = state.user.hatchery.active_egg.as_mut()?;
    egg.progress = egg.progress.saturating_add(days).min(egg.target_days);
    tx.emit(EngineEvent::EggProgressed {
        progress: egg.progress,
        target_days: egg.target_days,
    });
    if egg.progress < egg.target_days {
        return None;
    }

    let companion = hatch_companion(tx.catalog, tx.rng, tx.now);
    tracing::info!(name = %companion.name, rarity = %companion.rarity, "egg hatched");
    state.user.hatchery.companions.push(companion.clone());
    state.user.hatchery.active_egg = Some(ActiveEgg::default());
    tx.emit(EngineEvent::EggHatched { companion: companion.clone() });
    Some(companion)
}

/// Companion resolver: 50% common, 30% uncommon, 15% rare, 5% legendary,
/// then a uniform pick inside the pool.
pub fn roll_rarity(rng: &mut dyn RngCore) -> Rarity {
    let roll: f64 = rng.gen();
    match roll {
        r if r < 0.50 => Rarity::Common,
        r if r < 0.80 => Rarity::Uncommon,
        r if r < 0.95 => Rarity::Rare,
        _ => Rarity::Legendary,
    }
}

pub fn hatch_companion(
    catalog: &Catalog,
    rng: &mut dyn RngCore,
    now: DateTime<Utc>,
) -> SecondaryPet {
    let rarity = roll_rarity(rng);
    let mut pool = catalog.companions_of(rarity);
    if pool.is_empty() {
        pool = catalog.companions.iter().collect();
    }
    let template: Option<&CompanionTemplate> = if pool.is_empty() {
        None
    } else {
        Some(pool[rng.gen_range(0..pool.len())])
    };

    match template {
        Some(t) => SecondaryPet {
            id: Uuid::new_v4().to_string(),
            name: t.name.to_string(),
            emoji: t.emoji.to_string(),
            description: t.description.to_string(),
            rarity: t.rarity,
            hatched_at: now,
        },
        None => SecondaryPet {
            id: Uuid::new_v4().to_string(),
            name: "Mystery Sprite".to_string(),
            emoji: "✨".to_string(),
            description: String::new(),
            rarity,
            hatched_at: now,
        },
    }
}

/// Combat step. Returns `(damage, bonus_gold)` when a boss was hit.
fn strike_boss(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    ep_before: u64,
    damage_multiplier: f64,
) -> Option<(u64, u64)> {
    let boss = state.active_boss.as_mut().filter(|b| b.active && !b.defeated)?;

    let damage = scale(10 + ep_before / 50, damage_multiplier);
    boss.current_hp = boss.current_hp.saturating_sub(damage);
    tx.emit(EngineEvent::BossDamaged { damage, remaining_hp: boss.current_hp });

    let mut bonus = 0;
    if boss.current_hp == 0 {
        boss.defeated = true;
        boss.active = false;
        bonus = boss.reward.gold;
        tracing::info!(boss = %boss.name, bonus, "boss defeated");
        tx.emit(EngineEvent::BossDefeated { name: boss.name.clone(), bonus_gold: bonus });
    }
    Some((damage, bonus))
}

fn evaluate_achievements(state: &mut GameState, tx: &mut Transition<'_>) -> Vec<String> {
    let GameState { user, pet, achievements, .. } = state;
    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut().filter(|a| !a.unlocked) {
        if achievement.condition.is_met(user, pet) && achievement.unlock(tx.now) {
            tracing::info!(id = %achievement.id, "achievement unlocked");
            unlocked.push(achievement.id.clone());
        }
    }
    for id in &unlocked {
        tx.emit(EngineEvent::AchievementUnlocked { id: id.clone() });
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{Boss, BossReward, Habit, HabitKind, Pet, UserState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state() -> GameState {
        GameState {
            user: UserState::default(),
            pet: Pet::default(),
            habits: vec![Habit::new("h1".into(), "Read".into(), HabitKind::Boolean, 5)],
            active_boss: None,
            achievements: Catalog::builtin().fresh_achievements(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn run(
        state: &mut GameState,
        today: NaiveDate,
        ep: u64,
        gold: u64,
        habit: Option<&str>,
    ) -> (RewardOutcome, Vec<EngineEvent>) {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let mut events = Vec::new();
        let mut tx = Transition {
            catalog: &catalog,
            now: today.and_hms_opt(9, 0, 0).unwrap().and_utc(),
            today,
            rng: &mut rng,
            events: &mut events,
        };
        let outcome = apply_reward(state, &mut tx, ep, gold, habit);
        (outcome, events)
    }

    fn boss(current_hp: u64) -> Boss {
        Boss {
            id: "b".into(),
            name: "Sloth Slime".into(),
            description: String::new(),
            max_hp: 50,
            current_hp,
            level: 1,
            reward: BossReward { gold: 25, ep: 12 },
            image: "🦠".into(),
            active: true,
            defeated: false,
        }
    }

    #[test]
    fn test_reward_crosses_into_baby() {
        let mut s = state();
        s.pet.total_ep = 95;
        let (outcome, events) = run(&mut s, day(10), 5, 5, None);

        assert_eq!(s.pet.total_ep, 100);
        assert_eq!(s.pet.stage, PetStage::Baby);
        assert_eq!(s.pet.level, 2);
        assert_eq!(s.user.gold, 5);
        assert_eq!(s.user.daily_ep, 5);
        assert_eq!(outcome.evolved_to, Some(PetStage::Baby));
        assert!(events.contains(&EngineEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_streak_extends_from_yesterday() {
        let mut s = state();
        s.user.current_streak = 4;
        s.user.last_streak_update = Some(day(9));
        run(&mut s, day(10), 5, 5, None);
        assert_eq!(s.user.current_streak, 5);
        assert_eq!(s.user.last_streak_update, Some(day(10)));
    }

    #[test]
    fn test_streak_restarts_after_gap() {
        let mut s = state();
        s.user.current_streak = 4;
        s.user.last_streak_update = Some(day(7));
        run(&mut s, day(10), 5, 5, None);
        assert_eq!(s.user.current_streak, 1);
        assert_eq!(s.user.last_streak_update, Some(day(10)));
    }

    #[test]
    fn test_streak_same_day_unchanged() {
        let mut s = state();
        s.user.current_streak = 3;
        s.user.last_streak_update = Some(day(10));
        assert_eq!(update_streak(&mut s, day(10)), StreakChange::Unchanged);
        assert_eq!(s.user.current_streak, 3);
    }

    #[test]
    fn test_streak_marker_in_future_restarts() {
        let mut s = state();
        s.user.current_streak = 3;
        s.user.last_streak_update = Some(day(10));
        assert_eq!(update_streak(&mut s, day(8)), StreakChange::Restarted);
        assert_eq!(s.user.current_streak, 1);
        assert_eq!(s.user.last_streak_update, Some(day(8)));
    }

    #[test]
    fn test_first_reward_starts_streak() {
        let mut s = state();
        run(&mut s, day(10), 5, 5, None);
        assert_eq!(s.user.current_streak, 1);
    }

    #[test]
    fn test_boss_takes_damage() {
        let mut s = state();
        s.active_boss = Some(boss(12));
        let (outcome, _) = run(&mut s, day(10), 5, 5, None);

        let b = s.active_boss.as_ref().unwrap();
        assert_eq!(outcome.boss_damage, 10);
        assert_eq!(b.current_hp, 2);
        assert!(b.active && !b.defeated);
        assert_eq!(s.user.gold, 5);
    }

    #[test]
    fn test_boss_defeat_pays_bonus_once() {
        let mut s = state();
        s.active_boss = Some(boss(8));
        let (outcome, events) = run(&mut s, day(10), 5, 5, None);

        let b = s.active_boss.as_ref().unwrap();
        assert_eq!(b.current_hp, 0);
        assert!(b.defeated && !b.active);
        assert_eq!(outcome.bonus_gold, 25);
        assert_eq!(s.user.gold, 30);

        // A defeated boss is not hit again.
        run(&mut s, day(10), 5, 5, None);
        assert_eq!(s.user.gold, 35);
        assert_eq!(
            events.iter().filter(|e| matches!(e, EngineEvent::BossDefeated { .. })).count(),
            1
        );
    }

    #[test]
    fn test_boss_damage_scales_with_prior_ep_and_gear() {
        let mut s = state();
        s.pet.total_ep = 120;
        s.user.unlocked_costumes.insert("samurai_armor".into());
        s.user.active_costume = Some("samurai_armor".into());
        s.active_boss = Some(Boss { max_hp: 200, ..boss(200) });
        let (outcome, _) = run(&mut s, day(10), 5, 0, None);
        // floor((10 + 120/50) * 1.2) = floor(14.4)
        assert_eq!(outcome.boss_damage, 14);
    }

    #[test]
    fn test_linked_habit_hatches_on_target() {
        let mut s = state();
        s.user.hatchery.active_egg = Some(ActiveEgg {
            linked_habit_id: Some("h1".into()),
            progress: 6,
            target_days: 7,
        });
        let (outcome, _) = run(&mut s, day(10), 5, 5, Some("h1"));

        assert!(outcome.hatched.is_some());
        assert_eq!(s.user.hatchery.companions.len(), 1);
        assert_eq!(s.user.hatchery.active_egg, Some(ActiveEgg::default()));
    }

    #[test]
    fn test_unlinked_or_deleted_habit_does_not_progress_egg() {
        let mut s = state();
        s.user.hatchery.active_egg = Some(ActiveEgg {
            linked_habit_id: Some("gone".into()),
            progress: 2,
            target_days: 7,
        });
        run(&mut s, day(10), 5, 5, Some("gone"));
        run(&mut s, day(10), 5, 5, Some("h1"));
        assert_eq!(s.user.hatchery.active_egg.as_ref().unwrap().progress, 2);
    }

    #[test]
    fn test_achievements_see_resulting_gold() {
        let mut s = state();
        s.user.gold = 990;
        s.active_boss = Some(boss(5));
        let (outcome, _) = run(&mut s, day(10), 5, 5, None);
        // 990 + 5 + 25 bonus
        assert_eq!(s.user.gold, 1020);
        assert_eq!(outcome.unlocked_achievements, vec!["hoarder_1000".to_string()]);
        let hoarder = s.achievements.iter().find(|a| a.id == "hoarder_1000").unwrap();
        assert!(hoarder.unlocked && hoarder.unlocked_at.is_some());
    }

    #[test]
    fn test_level_achievement_uses_new_level() {
        let mut s = state();
        s.pet.total_ep = 895;
        let (outcome, _) = run(&mut s, day(10), 5, 0, None);
        assert_eq!(s.pet.level, 10);
        assert!(outcome.unlocked_achievements.contains(&"pet_level_10".to_string()));
    }

    #[test]
    fn test_rarity_distribution_is_plausible() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        for _ in 0..10_000 {
            let idx = match roll_rarity(&mut rng) {
                Rarity::Common => 0,
                Rarity::Uncommon => 1,
                Rarity::Rare => 2,
                Rarity::Legendary => 3,
            };
            counts[idx] += 1;
        }
        assert!((4_500..5_500).contains(&counts[0]), "{counts:?}");
        assert!((2_500..3_500).contains(&counts[1]), "{counts:?}");
        assert!((1_100..1_900).contains(&counts[2]), "{counts:?}");
        assert!((250..800).contains(&counts[3]), "{counts:?}");
    }

    #[test]
    fn test_hatched_companion_matches_rarity_pool() {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let pet = hatch_companion(&catalog, &mut rng, Utc::now());
            let template = catalog.companions.iter().find(|c| c.name == pet.name).unwrap();
            assert_eq!(template.rarity, pet.rarity);
        }
    }
}
