use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::reward::Transition;
use super::state::{Adventure, GameState};

/// Daily EP needed before an adventure can be started.
pub const ADVENTURE_DAILY_EP_THRESHOLD: u64 = 35;

pub const ADVENTURE_BASE_SECS: i64 = 6 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureStatus {
    pub end_time: DateTime<Utc>,
    pub remaining_seconds: i64,
    /// 0.0 to 100.0
    pub progress_percent: f64,
}

impl AdventureStatus {
    pub fn is_finished(&self) -> bool {
        self.remaining_seconds == 0
    }
}

/// Derive the timer from the stored start and reduction. Nothing about the
/// adventure's end is persisted.
pub fn status(adventure: &Adventure, now: DateTime<Utc>) -> AdventureStatus {
    // Reductions past the full duration just end the run at its start.
    let reduction = adventure.reduction_seconds.min(ADVENTURE_BASE_SECS as u64) as i64;
    let end_time = adventure.start_time + Duration::seconds(ADVENTURE_BASE_SECS - reduction);
    let remaining_seconds = (end_time - now).num_seconds().max(0);
    let elapsed = ADVENTURE_BASE_SECS - remaining_seconds.min(ADVENTURE_BASE_SECS);
    let progress_percent = elapsed as f64 * 100.0 / ADVENTURE_BASE_SECS as f64;
    AdventureStatus {
        end_time,
        remaining_seconds,
        progress_percent,
    }
}

pub fn start(state: &mut GameState, tx: &mut Transition<'_>) -> ActionResult<Adventure> {
    if state.user.current_adventure.is_some() {
        return Err(ActionError::AdventureInProgress);
    }
    if state.user.daily_ep < ADVENTURE_DAILY_EP_THRESHOLD {
        return Err(ActionError::NotEnoughDailyEp {
            required: ADVENTURE_DAILY_EP_THRESHOLD,
            daily_ep: state.user.daily_ep,
        });
    }
    let adventure = Adventure {
        start_time: tx.now,
        reduction_seconds: 0,
    };
    state.user.current_adventure = Some(adventure.clone());
    tracing::info!(daily_ep = state.user.daily_ep, "adventure started");
    tx.emit(EngineEvent::AdventureStarted);
    Ok(adventure)
}

/// Clear a completed adventure so a new one can be started.
pub fn finish(state: &mut GameState, tx: &mut Transition<'_>) -> ActionResult<()> {
    let adventure = state
        .user
        .current_adventure
        .as_ref()
        .ok_or(ActionError::NoActiveAdventure)?;
    let current = status(adventure, tx.now);
    if !current.is_finished() {
        return Err(ActionError::AdventureNotFinished {
            remaining_seconds: current.remaining_seconds,
        });
    }
    state.user.current_adventure = None;
    tx.emit(EngineEvent::AdventureFinished);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::state::{Pet, UserState};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, hour, min, 0).unwrap()
    }

    fn state(daily_ep: u64) -> GameState {
        GameState {
            user: UserState { daily_ep, ..UserState::default() },
            pet: Pet::default(),
            habits: Vec::new(),
            active_boss: None,
            achievements: Vec::new(),
        }
    }

    fn run<T>(
        s: &mut GameState,
        now: DateTime<Utc>,
        f: fn(&mut GameState, &mut Transition<'_>) -> T,
    ) -> T {
        let catalog = Catalog::builtin();
        let mut rng = StdRng::seed_from_u64(0);
        let mut events = Vec::new();
        let mut tx = Transition {
            catalog: &catalog,
            now,
            today: now.date_naive(),
            rng: &mut rng,
            events: &mut events,
        };
        f(s, &mut tx)
    }

    #[test]
    fn test_timer_is_derived() {
        let adventure = Adventure { start_time: at(8, 0), reduction_seconds: 30 * 60 };
        let st = status(&adventure, at(12, 0));
        assert_eq!(st.end_time, at(13, 30));
        assert_eq!(st.remaining_seconds, 90 * 60);
        assert!(!st.is_finished());

        let st = status(&adventure, at(14, 0));
        assert_eq!(st.remaining_seconds, 0);
        assert_eq!(st.progress_percent, 100.0);
    }

    #[test]
    fn test_oversized_reduction_clamps_to_zero() {
        let adventure = Adventure { start_time: at(8, 0), reduction_seconds: u64::MAX };
        let timer = status(&adventure, at(8, 0));
        assert!(timer.is_finished());
        assert_eq!(timer.end_time, at(8, 0));
        assert_eq!(timer.progress_percent, 100.0);
    }

    #[test]
    fn test_start_needs_daily_ep() {
        let mut s = state(34);
        let err = run(&mut s, at(9, 0), start).unwrap_err();
        assert_eq!(err, ActionError::NotEnoughDailyEp { required: 35, daily_ep: 34 });
        assert!(s.user.current_adventure.is_none());

        let mut s = state(35);
        run(&mut s, at(9, 0), start).unwrap();
        assert_eq!(s.user.current_adventure.as_ref().unwrap().start_time, at(9, 0));
        assert_eq!(run(&mut s, at(9, 5), start), Err(ActionError::AdventureInProgress));
    }

    #[test]
    fn test_finish_only_when_done() {
        let mut s = state(40);
        run(&mut s, at(9, 0), start).unwrap();
        assert!(matches!(
            run(&mut s, at(10, 0), finish),
            Err(ActionError::AdventureNotFinished { remaining_seconds: 18_000 })
        ));
        run(&mut s, at(15, 0), finish).unwrap();
        assert!(s.user.current_adventure.is_none());
        assert_eq!(run(&mut s, at(15, 1), finish), Err(ActionError::NoActiveAdventure));
    }
}
