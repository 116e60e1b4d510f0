use chrono::NaiveDate;
use serde::Serialize;

use super::clock::days_between;
use super::events::EngineEvent;
use super::state::GameState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyCheck {
    pub reset: bool,
    pub streak_broken: bool,
}

/// Day-boundary housekeeping. Safe to call as often as you like: on the same
/// day a second call changes nothing.
pub fn run_checks(
    state: &mut GameState,
    today: NaiveDate,
    events: &mut Vec<EngineEvent>,
) -> DailyCheck {
    let mut check = DailyCheck::default();

    if state.user.last_reset_date != Some(today) {
        state.user.daily_ep = 0;
        state.user.last_reset_date = Some(today);
        for habit in state.habits.iter_mut() {
            habit.completed_today = false;
        }
        tracing::info!(%today, "new day, daily progress reset");
        events.push(EngineEvent::DailyReset);
        check.reset = true;
    }

    // Passive decay: a streak survives only if it was last extended today or
    // yesterday. A marker ahead of today counts as neither.
    if let Some(last) = state.user.last_streak_update {
        let delta = days_between(last, today);
        if !(0..=1).contains(&delta) && state.user.current_streak > 0 {
            let previous = state.user.current_streak;
            state.user.current_streak = 0;
            tracing::info!(previous, "streak broken");
            events.push(EngineEvent::StreakBroken { previous });
            check.streak_broken = true;
        }
    }

    check
}
