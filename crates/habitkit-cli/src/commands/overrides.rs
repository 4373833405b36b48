use clap::Subcommand;
use habitkit_core::overrides;
use habitkit_core::storage::HabitDb;
use habitkit_core::HabitPatch;

use crate::common;

#[derive(Subcommand)]
pub enum OverrideAction {
    /// Hide a habit on one date
    Hide {
        /// Habit id
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Patch a habit's projected view on one date
    Patch {
        /// Habit id
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        target: Option<u32>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Remove the override for one date
    Clear {
        /// Habit id
        habit_id: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: OverrideAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;
    let rt = common::runtime()?;

    match action {
        OverrideAction::Hide { habit_id, date } => {
            let date = common::parse_date_arg(date.as_deref())?;
            let ov = rt.block_on(overrides::hide_on_date(&db, &habit_id, date))?;
            println!("{}", serde_json::to_string_pretty(&ov)?);
        }
        OverrideAction::Patch {
            habit_id,
            date,
            name,
            category,
            target,
            unit,
        } => {
            let date = common::parse_date_arg(date.as_deref())?;
            let patch = HabitPatch {
                name,
                category,
                target,
                unit,
            };
            if patch.is_empty() {
                return Err("nothing to patch: pass at least one field".into());
            }
            let ov = rt.block_on(overrides::patch_on_date(&db, &habit_id, date, patch))?;
            println!("{}", serde_json::to_string_pretty(&ov)?);
        }
        OverrideAction::Clear { habit_id, date } => {
            let date = common::parse_date_arg(date.as_deref())?;
            rt.block_on(overrides::clear_override(&db, &habit_id, date))?;
            println!("cleared {habit_id}@{date}");
        }
    }
    Ok(())
}
