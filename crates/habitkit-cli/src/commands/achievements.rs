use clap::Subcommand;
use habitkit_core::storage::HabitDb;
use habitkit_core::{AchievementCatalog, AchievementEngine, Config, LogNotifier, NullNotifier, Notifier};

use crate::common;

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Catalog definitions
    List,
    /// A user's unlocks
    Unlocked {
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Seed the baseline catalog into the store
    Seed,
    /// Administrative unlock of one achievement
    Unlock {
        /// Achievement key
        key: String,
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
        /// Free-form JSON attached to the unlock
        #[arg(long)]
        meta: Option<String>,
    },
}

fn engine() -> Result<AchievementEngine, Box<dyn std::error::Error>> {
    let notifier: Box<dyn Notifier> = if Config::load()?.notifications.enabled {
        Box::new(LogNotifier)
    } else {
        Box::new(NullNotifier)
    };
    Ok(AchievementEngine::new(AchievementCatalog::baseline(), notifier))
}

pub fn run(action: AchievementsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;

    match action {
        AchievementsAction::List => {
            let defs = db.list_achievements()?;
            println!("{}", serde_json::to_string_pretty(&defs)?);
        }
        AchievementsAction::Unlocked { user } => {
            let user_id = common::resolve_user(user)?;
            let unlocks = db.list_unlocks(&user_id)?;
            println!("{}", serde_json::to_string_pretty(&unlocks)?);
        }
        AchievementsAction::Seed => {
            let engine = engine()?;
            let rt = common::runtime()?;
            let created = rt.block_on(engine.seed_catalog(&db))?;
            println!("seeded {created} new achievements");
        }
        AchievementsAction::Unlock { key, user, meta } => {
            let user_id = common::resolve_user(user)?;
            let meta = meta.map(|s| serde_json::from_str(&s)).transpose()?;
            let engine = engine()?;
            let rt = common::runtime()?;
            let created = rt.block_on(engine.unlock_manually(&db, &user_id, &key, meta))?;
            if created {
                println!("unlocked {key} for {user_id}");
            } else {
                println!("{key} already unlocked for {user_id}");
            }
        }
    }
    Ok(())
}
