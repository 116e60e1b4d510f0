use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::reward::Transition;
use super::state::{Boss, BossReward, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BossPhase {
    /// No boss, or the last one has been beaten and a new one can be called.
    Summonable,
    Active,
    Defeated,
}

pub fn phase(boss: Option<&Boss>) -> BossPhase {
    match boss {
        None => BossPhase::Summonable,
        Some(b) if b.defeated => BossPhase::Defeated,
        Some(b) if b.active => BossPhase::Active,
        Some(_) => BossPhase::Summonable,
    }
}

/// Pick a boss from the roster. Fails while another boss is still active;
/// a defeated boss is replaced.
pub fn summon(state: &mut GameState, tx: &mut Transition<'_>) -> ActionResult<Boss> {
    if phase(state.active_boss.as_ref()) == BossPhase::Active {
        return Err(ActionError::BossAlreadyActive);
    }
    let roster = tx.catalog.bosses;
    if roster.is_empty() {
        return Err(ActionError::EmptyRoster);
    }
    let template = &roster[tx.rng.gen_range(0..roster.len())];

    let boss = Boss {
        id: Uuid::new_v4().to_string(),
        name: template.name.to_string(),
        description: "A fearsome foe appears! Complete habits to deal damage.".to_string(),
        max_hp: template.hp,
        current_hp: template.hp,
        level: state.pet.level,
        reward: BossReward {
            gold: template.reward_gold,
            ep: template.reward_gold / 2,
        },
        image: template.emoji.to_string(),
        active: true,
        defeated: false,
    };

    tracing::info!(boss = %boss.name, hp = boss.max_hp, "boss summoned");
    tx.emit(EngineEvent::BossSummoned { name: boss.name.clone(), max_hp: boss.max_hp });
    state.active_boss = Some(boss.clone());
    Ok(boss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::state::{Pet, UserState};
    use chrono::{NaiveDate, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn summon_with(state: &mut GameState, seed: u64) -> ActionResult<Boss> {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut events = Vec::new();
        let mut tx = Transition {
            catalog: &catalog,
            now: Utc::now(),
            today: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            rng: &mut rng,
            events: &mut events,
        };
        summon(state, &mut tx)
    }

    fn empty() -> GameState {
        GameState {
            user: UserState::default(),
            pet: Pet { level: 4, ..Pet::default() },
            habits: Vec::new(),
            active_boss: None,
            achievements: Vec::new(),
        }
    }

    #[test]
    fn test_summon_from_roster() {
        let mut s = empty();
        let boss = summon_with(&mut s, 9).unwrap();
        let template = Catalog::builtin().bosses.iter().find(|b| b.name == boss.name).unwrap();
        assert_eq!(boss.max_hp, template.hp);
        assert_eq!(boss.current_hp, template.hp);
        assert_eq!(boss.reward.gold, template.reward_gold);
        assert_eq!(boss.level, 4);
        assert_eq!(phase(s.active_boss.as_ref()), BossPhase::Active);
    }

    #[test]
    fn test_only_one_active_boss() {
        let mut s = empty();
        summon_with(&mut s, 1).unwrap();
        let first = s.active_boss.clone();
        assert_eq!(summon_with(&mut s, 2), Err(ActionError::BossAlreadyActive));
        assert_eq!(s.active_boss, first);
    }

    #[test]
    fn test_defeated_boss_can_be_replaced() {
        let mut s = empty();
        summon_with(&mut s, 1).unwrap();
        if let Some(boss) = s.active_boss.as_mut() {
            boss.current_hp = 0;
            boss.active = false;
            boss.defeated = true;
        }
        assert_eq!(phase(s.active_boss.as_ref()), BossPhase::Defeated);
        summon_with(&mut s, 2).unwrap();
        assert_eq!(phase(s.active_boss.as_ref()), BossPhase::Active);
    }
}
