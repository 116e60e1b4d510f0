use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::modifiers::{scale, ActiveModifiers};
use super::reward::{apply_reward, RewardOutcome, Transition};
use super::state::{GameState, Habit, HabitKind};

/// Gold paid for checking off any habit.
pub const HABIT_GOLD_REWARD: u64 = 5;

/// Seconds knocked off a running adventure per completed habit.
pub const HABIT_ADVENTURE_REDUCTION_SECS: u64 = 10 * 60;

/// What the confirmation service needs to hear about a completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReceipt {
    pub habit_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Completion {
    Completed {
        reward: RewardOutcome,
        adventure_reduction: u64,
        receipt: CompletionReceipt,
    },
    /// Tapping a completed habit again only clears the check-mark.
    Unchecked,
}

pub fn add_habit<'a>(
    state: &'a mut GameState,
    id: String,
    title: &str,
    kind: HabitKind,
    ep_reward: u64,
    target_value: Option<u32>,
) -> &'a Habit {
    let mut habit = Habit::new(id, title.trim().to_string(), kind, ep_reward);
    if kind == HabitKind::Numeric {
        habit.target_value = target_value;
    }
    state.habits.push(habit);
    &state.habits[state.habits.len() - 1]
}

pub fn update_habit(
    state: &mut GameState,
    habit_id: &str,
    title: Option<&str>,
    ep_reward: Option<u64>,
) -> ActionResult<()> {
    let habit = state
        .habit_mut(habit_id)
        .ok_or_else(|| ActionError::HabitNotFound(habit_id.to_string()))?;
    if let Some(title) = title {
        habit.title = title.trim().to_string();
    }
    if let Some(ep) = ep_reward {
        habit.ep_reward = ep.max(1);
    }
    Ok(())
}

/// Remove a habit. An egg linked to it keeps the dangling id; reward
/// processing ignores links to habits that no longer exist.
pub fn delete_habit(state: &mut GameState, habit_id: &str) -> ActionResult<Habit> {
    let index = state
        .habits
        .iter()
        .position(|h| h.id == habit_id)
        .ok_or_else(|| ActionError::HabitNotFound(habit_id.to_string()))?;
    Ok(state.habits.remove(index))
}

pub fn link_to_egg(state: &mut GameState, habit_id: &str) -> ActionResult<()> {
    if state.habit(habit_id).is_none() {
        return Err(ActionError::HabitNotFound(habit_id.to_string()));
    }
    let egg = state
        .user
        .hatchery
        .active_egg
        .as_mut()
        .ok_or(ActionError::NoActiveEgg)?;
    egg.linked_habit_id = Some(habit_id.to_string());
    Ok(())
}

/// Check off a habit and pay out its reward. Numeric habits complete the
/// same way as boolean ones.
pub fn complete(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    habit_id: &str,
) -> ActionResult<Completion> {
    let today = tx.today;
    let habit = state
        .habit_mut(habit_id)
        .ok_or_else(|| ActionError::HabitNotFound(habit_id.to_string()))?;

    if habit.completed_today {
        habit.completed_today = false;
        tx.emit(EngineEvent::HabitUnchecked { habit_id: habit_id.to_string() });
        return Ok(Completion::Unchecked);
    }

    habit.completed_today = true;
    habit.last_completed = Some(today);
    if let Some(target) = habit.target_value {
        habit.current_value = habit.current_value.max(target);
    }
    let ep_reward = habit.ep_reward;
    tx.emit(EngineEvent::HabitCompleted { habit_id: habit_id.to_string() });

    let speed = ActiveModifiers::resolve(&state.user, tx.catalog).adventure_speed_multiplier;
    let reward = apply_reward(state, tx, ep_reward, HABIT_GOLD_REWARD, Some(habit_id));

    let mut adventure_reduction = 0;
    if let Some(adventure) = state.user.current_adventure.as_mut() {
        adventure_reduction = scale(HABIT_ADVENTURE_REDUCTION_SECS, speed);
        adventure.reduction_seconds =
            adventure.reduction_seconds.saturating_add(adventure_reduction);
        tx.emit(EngineEvent::AdventureShortened { seconds: adventure_reduction });
    }

    Ok(Completion::Completed {
        reward,
        adventure_reduction,
        receipt: CompletionReceipt {
            habit_id: habit_id.to_string(),
            timestamp: tx.now,
        },
    })
}
