use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use super::adventure::{self, AdventureStatus};
use super::boss::{self, BossPhase};
use super::catalog::Catalog;
use super::clock::Clock;
use super::daily::{self, DailyCheck};
use super::error::{ActionError, ActionResult};
use super::events::EngineEvent;
use super::friends::{self, Greeting};
use super::habits::{self, Completion};
use super::modifiers::ActiveModifiers;
use super::pet::{self, Interaction, InteractionOutcome, Starter};
use super::reward::{self, RewardOutcome, Transition};
use super::shop::{self, ItemOutcome, Slot};
use super::snapshot::{RemoteUpdate, Snapshot, SyncOutcome};
use super::state::{default_habits, Adventure, Boss, GameState, HabitKind, Pet, UserState};

/// The progression engine. Owns the game state and is the only thing that
/// mutates it.
///
/// Every action runs against a draft copy; the draft replaces the live state
/// only when the action succeeds, so a rejected action leaves no trace.
pub struct Engine {
    state: GameState,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    events: Vec<EngineEvent>,
    revision: u64,
}

impl Engine {
    /// A brand new player.
    pub fn new(clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let catalog = Catalog::builtin();
        let state = GameState {
            user: UserState::default(),
            pet: Pet::default(),
            habits: default_habits(),
            active_boss: None,
            achievements: catalog.fresh_achievements(),
        };
        Self::with_state(state, catalog, clock, rng)
    }

    pub fn from_snapshot(snapshot: Snapshot, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let catalog = Catalog::builtin();
        let state = snapshot.into_state(&catalog);
        Self::with_state(state, catalog, clock, rng)
    }

    /// Pick up a stored player, or start a new one, and bring the state up to
    /// today before anything reads it.
    pub fn resume(snapshot: Option<Snapshot>, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        let mut engine = match snapshot {
            Some(snapshot) => Self::from_snapshot(snapshot, clock, rng),
            None => {
                tracing::info!("starting a new player");
                Self::new(clock, rng)
            }
        };
        engine.tick();
        engine
    }

    pub fn with_state(
        state: GameState,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Engine {
            state,
            catalog,
            clock,
            rng,
            events: Vec::new(),
            revision: 0,
        }
    }

    /// Seed from entropy, or from `seed` for reproducible runs.
    pub fn rng_from(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Bumped on every committed action. Remote replacements do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    pub fn modifiers(&self) -> ActiveModifiers {
        ActiveModifiers::resolve(&self.state.user, &self.catalog)
    }

    /// Take everything that happened since the last drain.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn transact<T>(
        &mut self,
        action: impl FnOnce(&mut GameState, &mut Transition<'_>) -> ActionResult<T>,
    ) -> ActionResult<T> {
        let mut draft = self.state.clone();
        let mut events = Vec::new();
        let now = self.clock.now();
        let today = self.clock.today();

        daily::run_checks(&mut draft, today, &mut events);
        let mut tx = Transition {
            catalog: &self.catalog,
            now,
            today,
            rng: &mut self.rng,
            events: &mut events,
        };
        let result = action(&mut draft, &mut tx);

        match result {
            Ok(value) => {
                self.state = draft;
                self.events.append(&mut events);
                self.revision += 1;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(error = %err, "action rejected");
                Err(err)
            }
        }
    }

    /// Periodic day-boundary check.
    pub fn tick(&mut self) -> DailyCheck {
        let today = self.clock.today();
        let mut events = Vec::new();
        let check = daily::run_checks(&mut self.state, today, &mut events);
        if check != DailyCheck::default() {
            self.events.append(&mut events);
            self.revision += 1;
        }
        check
    }

    pub fn apply_reward(
        &mut self,
        base_ep: u64,
        base_gold: u64,
        linked_habit_id: Option<&str>,
    ) -> RewardOutcome {
        let outcome = self.transact(|state, tx| {
            Ok(reward::apply_reward(state, tx, base_ep, base_gold, linked_habit_id))
        });
        outcome.unwrap_or_default()
    }

    pub fn add_habit(
        &mut self,
        title: &str,
        kind: HabitKind,
        ep_reward: u64,
        target_value: Option<u32>,
    ) -> ActionResult<String> {
        let id = Uuid::new_v4().to_string();
        self.transact(|state, _| {
            let habit = habits::add_habit(state, id, title, kind, ep_reward, target_value);
            Ok(habit.id.clone())
        })
    }

    pub fn update_habit(
        &mut self,
        habit_id: &str,
        title: Option<&str>,
        ep_reward: Option<u64>,
    ) -> ActionResult<()> {
        self.transact(|state, _| habits::update_habit(state, habit_id, title, ep_reward))
    }

    pub fn delete_habit(&mut self, habit_id: &str) -> ActionResult<()> {
        self.transact(|state, _| habits::delete_habit(state, habit_id).map(|_| ()))
    }

    pub fn complete_habit(&mut self, habit_id: &str) -> ActionResult<Completion> {
        self.transact(|state, tx| habits::complete(state, tx, habit_id))
    }

    pub fn link_habit_to_egg(&mut self, habit_id: &str) -> ActionResult<()> {
        self.transact(|state, _| habits::link_to_egg(state, habit_id))
    }

    pub fn interact(&mut self, kind: Interaction) -> ActionResult<InteractionOutcome> {
        self.transact(|state, tx| {
            let outcome = pet::interact(state, tx.catalog, kind)?;
            tx.emit(EngineEvent::PetInteraction { kind: kind.name() });
            Ok(outcome)
        })
    }

    pub fn choose_starter(&mut self, starter: Starter) -> ActionResult<()> {
        let pet_id = Uuid::new_v4().to_string();
        self.transact(|state, _| pet::choose_starter(state, starter, pet_id))
    }

    pub fn buy_item(&mut self, item_id: &str) -> ActionResult<ItemOutcome> {
        let item = self.lookup(item_id)?;
        self.transact(|state, tx| shop::buy(state, tx, item))
    }

    pub fn use_item(&mut self, item_id: &str) -> ActionResult<ItemOutcome> {
        let item = self.lookup(item_id)?;
        self.transact(|state, tx| shop::use_item(state, tx, item))
    }

    pub fn equip_costume(&mut self, item_id: Option<&str>) -> ActionResult<()> {
        self.transact(|state, tx| shop::equip(state, tx, Slot::Costume, item_id))
    }

    pub fn equip_decor(&mut self, item_id: Option<&str>) -> ActionResult<()> {
        self.transact(|state, tx| shop::equip(state, tx, Slot::Decor, item_id))
    }

    fn lookup(&self, item_id: &str) -> ActionResult<&'static super::catalog::ShopItem> {
        self.catalog
            .item(item_id)
            .ok_or_else(|| ActionError::UnknownItem(item_id.to_string()))
    }

    pub fn summon_boss(&mut self) -> ActionResult<Boss> {
        self.transact(boss::summon)
    }

    pub fn boss_phase(&self) -> BossPhase {
        boss::phase(self.state.active_boss.as_ref())
    }

    pub fn start_adventure(&mut self) -> ActionResult<Adventure> {
        self.transact(adventure::start)
    }

    pub fn adventure_status(&self) -> Option<AdventureStatus> {
        self.state
            .user
            .current_adventure
            .as_ref()
            .map(|a| adventure::status(a, self.clock.now()))
    }

    pub fn finish_adventure(&mut self) -> ActionResult<()> {
        self.transact(adventure::finish)
    }

    pub fn add_friend(&mut self, name: &str) -> ActionResult<String> {
        let id = Uuid::new_v4().to_string();
        self.transact(|state, _| Ok(friends::add_friend(state, id, name).id.clone()))
    }

    pub fn greet_friend(
        &mut self,
        friend_id: &str,
        greeting: Greeting,
    ) -> ActionResult<Option<RewardOutcome>> {
        self.transact(|state, tx| friends::greet(state, tx, friend_id, greeting))
    }

    /// Replace the whole state with a snapshot from the store, unless it is an
    /// echo of a local write or identical to what we already have.
    pub fn apply_remote(&mut self, update: RemoteUpdate) -> SyncOutcome {
        if update.has_pending_writes {
            return SyncOutcome::IgnoredLocalEcho;
        }
        if update.snapshot == self.snapshot() {
            return SyncOutcome::IgnoredUnchanged;
        }
        self.state = update.snapshot.into_state(&self.catalog);
        tracing::debug!("remote snapshot applied");
        self.events.push(EngineEvent::RemoteSnapshotApplied);
        SyncOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::NaiveDate;

    fn engine() -> (Engine, ManualClock) {
        let clock = ManualClock::at_day(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        let engine = Engine::new(Arc::new(clock.clone()), StdRng::seed_from_u64(11));
        (engine, clock)
    }

    #[test]
    fn test_rejected_action_leaves_no_trace() {
        let (mut engine, _) = engine();
        engine.tick();
        engine.drain_events();
        let before = engine.state().clone();
        let revision = engine.revision();

        assert!(engine.buy_item("wizard_hat").is_err());
        assert_eq!(engine.state(), &before);
        assert_eq!(engine.revision(), revision);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_daily_checks_run_before_each_action() {
        let (mut engine, clock) = engine();
        engine.complete_habit("1").unwrap();
        assert_eq!(engine.state().user.daily_ep, 5);

        clock.advance_days(1);
        engine.complete_habit("1").unwrap();
        let user = &engine.state().user;
        assert_eq!(user.daily_ep, 5);
        assert_eq!(user.current_streak, 2);
    }

    #[test]
    fn test_failed_action_does_not_commit_daily_reset() {
        let (mut engine, clock) = engine();
        engine.complete_habit("1").unwrap();
        clock.advance_days(1);
        assert!(engine.use_item("green_tea").is_err());
        assert_eq!(engine.state().user.daily_ep, 5);
        assert!(engine.tick().reset);
        assert_eq!(engine.state().user.daily_ep, 0);
    }

    #[test]
    fn test_unknown_item() {
        let (mut engine, _) = engine();
        assert_eq!(engine.use_item("nope"), Err(ActionError::UnknownItem("nope".into())));
    }

    #[test]
    fn test_remote_gate() {
        let (mut engine, _) = engine();
        let mut snapshot = engine.snapshot();
        let echo = |snapshot: &Snapshot, has_pending_writes| RemoteUpdate {
            snapshot: snapshot.clone(),
            has_pending_writes,
        };
        assert_eq!(
            engine.apply_remote(echo(&snapshot, false)),
            SyncOutcome::IgnoredUnchanged
        );

        snapshot.user.gold = 999;
        assert_eq!(
            engine.apply_remote(echo(&snapshot, true)),
            SyncOutcome::IgnoredLocalEcho
        );
        assert_eq!(engine.state().user.gold, 0);

        assert_eq!(
            engine.apply_remote(RemoteUpdate { snapshot, has_pending_writes: false }),
            SyncOutcome::Applied
        );
        assert_eq!(engine.state().user.gold, 999);
        assert_eq!(engine.drain_events(), vec![EngineEvent::RemoteSnapshotApplied]);
    }
}
