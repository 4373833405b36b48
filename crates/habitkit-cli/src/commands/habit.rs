use clap::Subcommand;
use habitkit_core::storage::HabitDb;
use habitkit_core::{CoreError, Frequency, Habit, ValidationError};

use crate::common;

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Habit name
        name: String,
        /// Category tag
        #[arg(long, default_value = "general")]
        category: String,
        /// daily | weekly | monthly | custom
        #[arg(long, default_value = "daily")]
        frequency: String,
        /// Daily target amount
        #[arg(long, default_value_t = 1)]
        target: u32,
        /// Unit label for the target
        #[arg(long, default_value = "")]
        unit: String,
        /// Days of month for monthly habits (1-31)
        #[arg(long, value_delimiter = ',')]
        monthly_days: Vec<u32>,
        /// Months for monthly habits (1-12)
        #[arg(long, value_delimiter = ',')]
        monthly_months: Vec<u32>,
        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        created: Option<String>,
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// List habits
    List {
        /// User id, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Edit a habit's fields
    Edit {
        /// Habit id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// daily | weekly | monthly | custom
        #[arg(long)]
        frequency: Option<String>,
        #[arg(long)]
        target: Option<u32>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Show one habit with its streak summary
    Show {
        /// Habit id
        id: String,
    },
    /// Delete a habit and its logs and overrides
    Rm {
        /// Habit id
        id: String,
    },
}

fn parse_frequency(s: &str) -> Result<Frequency, ValidationError> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|_| {
        ValidationError::InvalidValue {
            field: "frequency".to_string(),
            message: format!("expected daily, weekly, monthly or custom, got '{s}'"),
        }
    })
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;

    match action {
        HabitAction::Add {
            name,
            category,
            frequency,
            target,
            unit,
            monthly_days,
            monthly_months,
            created,
            user,
        } => {
            let user = common::resolve_user(user)?;
            let created = common::parse_date_arg(created.as_deref())?;
            let mut habit = Habit::new(
                user,
                name,
                category,
                parse_frequency(&frequency)?,
                target,
                unit,
                created,
            );
            habit.monthly_days = monthly_days;
            habit.monthly_months = monthly_months;
            habit.validate()?;
            db.create_habit(&habit)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List { user } => {
            let user = common::resolve_user(user)?;
            let habits = db.list_habits(&user)?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Edit {
            id,
            name,
            category,
            frequency,
            target,
            unit,
        } => {
            let mut habit = db
                .get_habit(&id)?
                .ok_or_else(|| CoreError::not_found("habit", id.clone()))?;
            if let Some(name) = name {
                habit.name = name;
            }
            if let Some(category) = category {
                habit.category = category;
            }
            if let Some(frequency) = frequency {
                habit.frequency = parse_frequency(&frequency)?;
            }
            if let Some(target) = target {
                habit.target = target;
            }
            if let Some(unit) = unit {
                habit.unit = unit;
            }
            habit.validate()?;
            if !db.update_habit(&habit)? {
                return Err(CoreError::not_found("habit", id).into());
            }
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Show { id } => {
            let habit = db
                .get_habit(&id)?
                .ok_or_else(|| CoreError::not_found("habit", id.clone()))?;
            let summary = habitkit_core::streak::streak_summary(&db, &id, common::today())?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        HabitAction::Rm { id } => {
            if !db.delete_habit(&id)? {
                return Err(CoreError::not_found("habit", id.clone()).into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
