use serde::{Deserialize, Serialize};

use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::reward::{apply_reward, RewardOutcome, Transition};
use super::state::{Friend, GameState};

/// EP granted for the first encouragement of the day.
pub const ENCOURAGE_EP: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Greeting {
    Encourage,
    Hug,
}

pub fn add_friend<'a>(state: &'a mut GameState, id: String, name: &str) -> &'a Friend {
    let name = name.trim();
    let avatar = name
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string());
    state.user.friends.push(Friend {
        id,
        name: name.to_string(),
        avatar,
        last_interaction: None,
    });
    &state.user.friends[state.user.friends.len() - 1]
}

/// Record a greeting. Returns the reward if this was the day's first
/// encouragement.
pub fn greet(
    state: &mut GameState,
    tx: &mut Transition<'_>,
    friend_id: &str,
    greeting: Greeting,
) -> ActionResult<Option<RewardOutcome>> {
    let today = tx.today;
    let friend = state
        .user
        .friends
        .iter_mut()
        .find(|f| f.id == friend_id)
        .ok_or_else(|| ActionError::FriendNotFound(friend_id.to_string()))?;
    let first_today = friend.last_interaction != Some(today);
    friend.last_interaction = Some(today);
    tx.emit(EngineEvent::FriendGreeted { friend_id: friend_id.to_string() });

    if greeting == Greeting::Encourage && first_today {
        return Ok(Some(apply_reward(state, tx, ENCOURAGE_EP, 0, None)));
    }
    Ok(None)
}
