use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::*;
use tokio::task::JoinHandle;

use habitpet::config::Config;
use habitpet::core::catalog::ItemCategory;
use habitpet::core::clock::offset_from_minutes;
use habitpet::core::{
    ActionError, BossPhase, Clock, Completion, DocumentStore, Engine, EngineEvent, Greeting,
    HabitKind, Interaction, JsonFileStore, ManualClock, Persister, Starter, SystemClock,
};
#[cfg(feature = "remote")]
use habitpet::service::{self, HttpConfirmationClient};

pub use commands::Commands;
use commands::*;

mod commands;

/// One CLI invocation: load the user's snapshot, act, save.
pub struct Session {
    config: Config,
    engine: Engine,
    persister: Persister,
    saved_revision: u64,
    pending_calls: Vec<JoinHandle<()>>,
    #[cfg(feature = "remote")]
    confirmation: Option<Arc<HttpConfirmationClient>>,
}

impl Session {
    pub fn open(data_dir: Option<PathBuf>, date: Option<NaiveDate>) -> Result<Self> {
        let config = Config::new(data_dir)?;
        let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::new(config.data_dir.clone()));

        let clock: Arc<dyn Clock> = match date {
            Some(day) => Arc::new(ManualClock::at_day(day)),
            None => Arc::new(SystemClock::new(offset_from_minutes(config.utc_offset_minutes))),
        };
        let rng = Engine::rng_from(config.rng_seed);
        let snapshot = store
            .load(&config.user_id)
            .with_context(|| format!("Failed to load data for {}", config.user_id))?;
        let engine = Engine::resume(snapshot, clock, rng);
        let persister = Persister::spawn(store, config.user_id.clone(), config.persist_debounce());

        #[cfg(feature = "remote")]
        let confirmation = match &config.confirmation {
            Some(c) => {
                let timeout = std::time::Duration::from_secs(c.timeout_secs);
                let client = HttpConfirmationClient::new(&c.base_url, timeout)
                    .context("Failed to create confirmation client")?;
                Some(Arc::new(client))
            }
            None => None,
        };

        Ok(Session {
            // Anything past a freshly built engine, the day rollover included,
            // gets saved on close.
            saved_revision: 0,
            config,
            engine,
            persister,
            pending_calls: Vec::new(),
            #[cfg(feature = "remote")]
            confirmation,
        })
    }

    /// Save if anything changed, and let outstanding confirmations finish.
    pub async fn close(self) -> Result<()> {
        if self.engine.revision() != self.saved_revision {
            self.persister.schedule(self.engine.snapshot());
        }
        self.persister.close().await;
        for call in self.pending_calls {
            if let Err(e) = call.await {
                tracing::warn!(error = %e, "confirmation task ended abnormally");
            }
        }
        Ok(())
    }

    fn print_events(&mut self) {
        for event in self.engine.drain_events() {
            if let Some(line) = describe(&event) {
                println!("  {}", line);
            }
        }
    }
}

pub async fn run(
    command: Commands,
    data_dir: Option<PathBuf>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let mut session = Session::open(data_dir, date)?;

    match command {
        Commands::Status => show_status(&session.engine),
        Commands::Habit { command } => handle_habit(&mut session, command),
        Commands::Pet { command } => handle_pet(&mut session, command),
        Commands::Shop { command } => handle_shop(&mut session, command),
        Commands::Inventory => show_inventory(&session.engine),
        Commands::Boss { command } => handle_boss(&mut session, command),
        Commands::Adventure { command } => handle_adventure(&mut session, command).await,
        Commands::Friend { command } => handle_friend(&mut session, command),
        Commands::Achievements => show_achievements(&session.engine),
        Commands::Tick => {
            let check = session.engine.tick();
            if !check.reset && !check.streak_broken {
                println!("Nothing to do, still the same day.");
            }
        }
    }
    session.print_events();
    session.close().await
}

fn report<T>(result: Result<T, ActionError>, on_ok: impl FnOnce(T)) {
    match result {
        Ok(value) => on_ok(value),
        Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
    }
}

fn show_status(engine: &Engine) {
    let state = engine.state();
    let pet = &state.pet;
    let user = &state.user;

    println!("{}", "habitpet Status".cyan().bold());
    println!("Pet: {} ({}) Lv.{}", pet.stage.label(), pet.stage, pet.level);
    println!("EP: {} total, {} today", pet.total_ep, user.daily_ep);
    println!("Hunger: {:.0}/100  Happiness: {:.0}/100", pet.hunger, pet.happiness);
    println!(
        "Traits: compassion {:.1}, intelligence {:.1}, strength {:.1}, agility {:.1}",
        pet.traits.compassion, pet.traits.intelligence, pet.traits.strength, pet.traits.agility
    );
    println!("Gold: {}", user.gold.to_string().yellow());
    println!("Streak: {} day(s) 🔥", user.current_streak);

    let mods = engine.modifiers();
    if mods != Default::default() {
        println!(
            "Bonuses: EP x{:.2}, Gold x{:.2}, Boss x{:.2}, Adventure x{:.2}, Happiness +{:.0}%",
            mods.ep_multiplier,
            mods.gold_multiplier,
            mods.boss_damage_multiplier,
            mods.adventure_speed_multiplier,
            mods.happiness_bonus * 100.0
        );
    }

    if let Some(egg) = &user.hatchery.active_egg {
        let linked = egg
            .linked_habit_id
            .as_deref()
            .and_then(|id| state.habit(id))
            .map(|h| h.title.as_str())
            .unwrap_or("no habit linked");
        println!("Egg: {}/{} ({})", egg.progress, egg.target_days, linked);
    }

    println!("\n{}", "Today's Habits".cyan().bold());
    print_habits(engine);

    if !user.has_completed_onboarding {
        println!("\n{}", "Tip: pick a starter with `habitpet pet starter <kind>`".dimmed());
    }
}

fn print_habits(engine: &Engine) {
    let habits = &engine.state().habits;
    if habits.is_empty() {
        println!("No habits yet.");
        return;
    }
    for habit in habits {
        let mark = if habit.completed_today { "✅" } else { "⬜" };
        let target = habit
            .target_value
            .map(|t| format!(" [{}/{}]", habit.current_value, t))
            .unwrap_or_default();
        println!(
            "{} {} {}{} (+{} EP)",
            mark,
            habit.id.dimmed(),
            habit.title,
            target,
            habit.ep_reward
        );
    }
}

fn handle_habit(session: &mut Session, command: HabitCommands) {
    let engine = &mut session.engine;
    match command {
        HabitCommands::Add { title, kind, ep, target } => {
            let kind = match kind {
                HabitType::Boolean => HabitKind::Boolean,
                HabitType::Numeric => HabitKind::Numeric,
            };
            report(engine.add_habit(&title, kind, ep, target), |id| {
                println!("✅ Added habit {}", id);
            });
        }
        HabitCommands::List => print_habits(engine),
        HabitCommands::Done { id } => match engine.complete_habit(&id) {
            Ok(Completion::Completed { reward, adventure_reduction, receipt }) => {
                println!("✅ +{} EP, +{} Gold", reward.final_ep, reward.gold_gained());
                if adventure_reduction > 0 {
                    println!("⏩ Adventure shortened by {} min", adventure_reduction / 60);
                }
                #[cfg(feature = "remote")]
                if let Some(client) = &session.confirmation {
                    let user_id = session.config.user_id.clone();
                    let call = service::dispatch_completion(client.clone(), user_id, receipt);
                    session.pending_calls.push(call);
                }
                #[cfg(not(feature = "remote"))]
                let _ = receipt;
            }
            Ok(Completion::Unchecked) => println!("↩️  Unchecked {}", id),
            Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
        },
        HabitCommands::Edit { id, title, ep } => {
            report(engine.update_habit(&id, title.as_deref(), ep), |_| {
                println!("✅ Updated {}", id)
            });
        }
        HabitCommands::Remove { id } => {
            report(engine.delete_habit(&id), |_| println!("🗑️  Removed {}", id));
        }
        HabitCommands::Link { id } => {
            report(engine.link_habit_to_egg(&id), |_| println!("🥚 Egg linked to {}", id));
        }
    }
}

fn handle_pet(session: &mut Session, command: PetCommands) {
    let engine = &mut session.engine;
    let kind = match command {
        PetCommands::Feed => Interaction::Feed,
        PetCommands::Play => Interaction::Play,
        PetCommands::Train => Interaction::Train,
        PetCommands::Starter { kind } => {
            let starter = match kind {
                StarterKind::Turtle => Starter::Turtle,
                StarterKind::Dragon => Starter::Dragon,
                StarterKind::Owl => Starter::Owl,
                StarterKind::Cat => Starter::Cat,
            };
            report(engine.choose_starter(starter), |_| println!("🐣 Welcome your new companion!"));
            return;
        }
    };
    report(engine.interact(kind), |outcome| {
        println!(
            "✅ {}: +{} EP, -{} Gold (Lv.{})",
            outcome.kind.name(),
            outcome.ep_gained,
            outcome.gold_spent,
            outcome.level
        );
    });
}

fn handle_shop(session: &mut Session, command: ShopCommands) {
    let engine = &mut session.engine;
    match command {
        ShopCommands::List => {
            let catalog = *engine.catalog();
            let gold = engine.state().user.gold;
            for category in [
                ItemCategory::Consumable,
                ItemCategory::Pet,
                ItemCategory::Adventure,
                ItemCategory::Hatchery,
                ItemCategory::Costume,
                ItemCategory::Decor,
            ] {
                println!("{}", category.to_string().cyan().bold());
                for item in catalog.items_in(category) {
                    let cost = if item.cost <= gold {
                        item.cost.to_string().yellow()
                    } else {
                        item.cost.to_string().red()
                    };
                    println!(
                        "  {} {} ({}g) {}",
                        item.id.dimmed(),
                        item.name,
                        cost,
                        item.description
                    );
                }
            }
        }
        ShopCommands::Buy { item } => {
            report(engine.buy_item(&item), |o| println!("🛍️  {}", o.message));
        }
        ShopCommands::Use { item } => {
            report(engine.use_item(&item), |o| println!("✨ {}", o.message));
        }
        ShopCommands::EquipCostume { item } => {
            report(engine.equip_costume(item.as_deref()), |_| println!("👕 Costume updated"));
        }
        ShopCommands::EquipDecor { item } => {
            report(engine.equip_decor(item.as_deref()), |_| println!("🏯 Decor updated"));
        }
    }
}

fn show_inventory(engine: &Engine) {
    let user = &engine.state().user;
    let catalog = engine.catalog();
    println!("{}", "Inventory".cyan().bold());
    if user.inventory.is_empty() {
        println!("  (empty)");
    }
    for entry in &user.inventory {
        let name = catalog.item(&entry.item_id).map(|i| i.name).unwrap_or(entry.item_id.as_str());
        println!("  {} x{}", name, entry.count);
    }

    println!("{}", "Wardrobe".cyan().bold());
    for id in &user.unlocked_costumes {
        let equipped = if user.active_costume.as_ref() == Some(id) { " (equipped)" } else { "" };
        println!("  {}{}", id, equipped.green());
    }
    for id in &user.unlocked_decor {
        let equipped = if user.active_decor.as_ref() == Some(id) { " (equipped)" } else { "" };
        println!("  {}{}", id, equipped.green());
    }

    println!("{}", "Companions".cyan().bold());
    for companion in &user.hatchery.companions {
        println!("  {} {} [{}]", companion.emoji, companion.name, companion.rarity);
    }
}

fn handle_boss(session: &mut Session, command: BossCommands) {
    let engine = &mut session.engine;
    match command {
        BossCommands::Summon => report(engine.summon_boss(), |boss| {
            println!("{} {} appears with {} HP!", boss.image, boss.name.red().bold(), boss.max_hp);
        }),
        BossCommands::Status => match (engine.boss_phase(), engine.state().active_boss.as_ref()) {
            (BossPhase::Active, Some(boss)) => {
                println!(
                    "{} {}: {}/{} HP",
                    boss.image,
                    boss.name.red().bold(),
                    boss.current_hp,
                    boss.max_hp
                );
                println!("Reward: {} gold", boss.reward.gold);
            }
            (BossPhase::Defeated, Some(boss)) => {
                println!("🏆 {} was defeated. Summon another!", boss.name)
            }
            _ => println!("No boss around. Summon one with `habitpet boss summon`."),
        },
    }
}

async fn handle_adventure(session: &mut Session, command: AdventureCommands) {
    match command {
        AdventureCommands::Start => {
            let result = session.engine.start_adventure();
            let started = result.is_ok();
            report(result, |_| println!("🗺️  Your pet sets off on an adventure!"));

            #[cfg(feature = "remote")]
            if started {
                if let Some(client) = &session.confirmation {
                    let daily_ep = session.engine.state().user.daily_ep;
                    let user_id = &session.config.user_id;
                    let request = service::request_adventure(client.as_ref(), user_id, daily_ep);
                    if let Err(e) = request.await {
                        tracing::warn!(error = %e, "adventure confirmation failed");
                    }
                }
            }
            #[cfg(not(feature = "remote"))]
            let _ = started;
        }
        AdventureCommands::Status => match session.engine.adventure_status() {
            Some(status) if status.is_finished() => {
                println!("🎉 Adventure complete! Run `habitpet adventure finish`.")
            }
            Some(status) => println!(
                "⏳ {}h {:02}m left ({:.0}%)",
                status.remaining_seconds / 3600,
                (status.remaining_seconds % 3600) / 60,
                status.progress_percent
            ),
            None => println!("No adventure underway."),
        },
        AdventureCommands::Finish => {
            report(session.engine.finish_adventure(), |_| println!("🏠 Your pet is back home."));
        }
    }
}

fn handle_friend(session: &mut Session, command: FriendCommands) {
    let engine = &mut session.engine;
    let (id, greeting) = match command {
        FriendCommands::Add { name } => {
            report(engine.add_friend(&name), |id| println!("🤝 Added {} ({})", name, id));
            return;
        }
        FriendCommands::List => {
            let today = engine.clock().today();
            for friend in &engine.state().user.friends {
                let greeted = if friend.last_interaction == Some(today) { " 💌" } else { "" };
                println!("{} {} {}{}", friend.avatar, friend.name, friend.id.dimmed(), greeted);
            }
            return;
        }
        FriendCommands::Encourage { id } => (id, Greeting::Encourage),
        FriendCommands::Hug { id } => (id, Greeting::Hug),
    };
    report(engine.greet_friend(&id, greeting), |reward| match reward {
        Some(r) => println!("💌 Sent! Gained {} Energy Points!", r.final_ep),
        None => println!("💌 Sent!"),
    });
}

fn show_achievements(engine: &Engine) {
    println!("{}", "Achievements".cyan().bold());
    for a in &engine.state().achievements {
        match a.unlocked_at {
            Some(at) if a.unlocked => {
                println!(
                    "{} {} - {} ({})",
                    a.icon,
                    a.title.green(),
                    a.description,
                    at.format("%Y-%m-%d")
                );
            }
            _ => println!("🔒 {} - {}", a.title.dimmed(), a.description),
        }
    }
}

fn describe(event: &EngineEvent) -> Option<String> {
    let line = match event {
        EngineEvent::DailyReset => "🌅 A new day begins".to_string(),
        EngineEvent::StreakBroken { previous } => {
            format!("💔 Streak of {} lost", previous).red().to_string()
        }
        EngineEvent::StreakChanged { streak } => format!("🔥 Streak: {}", streak),
        EngineEvent::StageEvolved { to, .. } => format!("🌟 Your pet evolved into a {}!", to.label())
            .yellow()
            .bold()
            .to_string(),
        EngineEvent::LevelUp { level } => format!("⬆️  Level {}", level),
        EngineEvent::EggProgressed { progress, target_days } => {
            format!("🥚 Egg {}/{}", progress, target_days)
        }
        EngineEvent::EggHatched { companion } => {
            let line = format!(
                "🐣 {} {} hatched! ({})",
                companion.emoji, companion.name, companion.rarity
            );
            line.green().to_string()
        }
        EngineEvent::BossDamaged { damage, remaining_hp } => {
            format!("⚔️  {} damage, {} HP left", damage, remaining_hp)
        }
        EngineEvent::BossDefeated { name, bonus_gold } => {
            format!("🏆 {} defeated! +{} bonus gold", name, bonus_gold).yellow().to_string()
        }
        EngineEvent::AchievementUnlocked { id } => {
            format!("🏅 Achievement unlocked: {}", id).green().to_string()
        }
        _ => return None,
    };
    Some(line)
}
