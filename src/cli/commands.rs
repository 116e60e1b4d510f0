use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum Commands {
    /// Show pet, wallet, streak and today's habits
    Status,
    /// Manage and complete habits
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Look after the main pet
    Pet {
        #[command(subcommand)]
        command: PetCommands,
    },
    /// Browse and use the shop
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
    /// List owned consumables and unlocked cosmetics
    Inventory,
    /// Boss encounters
    Boss {
        #[command(subcommand)]
        command: BossCommands,
    },
    /// Send the pet on an adventure
    Adventure {
        #[command(subcommand)]
        command: AdventureCommands,
    },
    /// Friends and daily encouragement
    Friend {
        #[command(subcommand)]
        command: FriendCommands,
    },
    /// Show achievements and when they were unlocked
    Achievements,
    /// Run the day-boundary checks without doing anything else
    Tick,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HabitType {
    Boolean,
    Numeric,
}

#[derive(Subcommand)]
pub enum HabitCommands {
    /// Add a new habit
    Add {
        title: String,
        #[arg(long, value_enum, default_value = "boolean")]
        kind: HabitType,
        /// EP granted on completion
        #[arg(long, default_value = "5")]
        ep: u64,
        /// Target for numeric habits
        #[arg(long)]
        target: Option<u32>,
    },
    /// List habits
    List,
    /// Check off a habit (again to undo)
    Done { id: String },
    /// Change a habit's title or EP reward
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        ep: Option<u64>,
    },
    /// Delete a habit
    Remove { id: String },
    /// Link a habit to the hatchery egg
    Link { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StarterKind {
    Turtle,
    Dragon,
    Owl,
    Cat,
}

#[derive(Subcommand)]
pub enum PetCommands {
    /// Feed the pet (5 gold)
    Feed,
    /// Play with the pet (5 gold)
    Play,
    /// Train the pet
    Train,
    /// Choose a starter pet (onboarding only)
    Starter {
        #[arg(value_enum)]
        kind: StarterKind,
    },
}

#[derive(Subcommand)]
pub enum ShopCommands {
    /// List shop items
    List,
    /// Buy an item
    Buy { item: String },
    /// Use an item from the inventory
    Use { item: String },
    /// Equip an unlocked costume, or unequip without an id
    EquipCostume { item: Option<String> },
    /// Equip unlocked decor, or unequip without an id
    EquipDecor { item: Option<String> },
}

#[derive(Subcommand)]
pub enum BossCommands {
    /// Summon a boss from the roster
    Summon,
    /// Show the current boss
    Status,
}

#[derive(Subcommand)]
pub enum AdventureCommands {
    /// Start an adventure (needs 35 EP today)
    Start,
    /// Show the remaining time
    Status,
    /// Collect a finished adventure
    Finish,
}

#[derive(Subcommand)]
pub enum FriendCommands {
    /// Add a friend
    Add { name: String },
    /// List friends
    List,
    /// Send encouragement (first greeting of the day grants EP)
    Encourage { id: String },
    /// Send a hug
    Hug { id: String },
}
