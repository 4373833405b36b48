use std::time::Duration;

use clap::Subcommand;
use habitkit_core::storage::HabitDb;
use habitkit_core::{batch, AchievementCatalog, AchievementEngine, Config, LogNotifier};

use crate::common;

#[derive(Subcommand)]
pub enum BatchAction {
    /// Run the streak + achievement refresh over all users
    Run {
        /// Evaluation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: BatchAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BatchAction::Run { date } => {
            let db = HabitDb::open()?;
            let config = Config::load()?;
            let date = common::parse_date_arg(date.as_deref())?;
            let engine = AchievementEngine::new(AchievementCatalog::baseline(), Box::new(LogNotifier));
            let timeout = config.batch.per_user_timeout_secs.map(Duration::from_secs);

            let rt = common::runtime()?;
            let report = rt.block_on(async {
                engine.seed_catalog(&db).await?;
                batch::run_batch(&db, &engine, date, config.streak.horizon, timeout).await
            })?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
