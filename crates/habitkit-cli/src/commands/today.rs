use chrono::NaiveDate;
use habitkit_core::recurrence;
use habitkit_core::storage::HabitDb;
use habitkit_core::Habit;
use serde::Serialize;

use crate::common;

#[derive(Serialize)]
struct DayView {
    date: NaiveDate,
    user_id: String,
    habits: Vec<Habit>,
}

pub fn run(date: Option<String>, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;
    let user_id = common::resolve_user(user)?;
    let date = common::parse_date_arg(date.as_deref())?;

    let habits = db.list_habits(&user_id)?;
    let overrides = db.list_overrides_for_date(&user_id, date)?;
    let projected = recurrence::habits_for_date(&habits, &overrides, date);

    let view = DayView {
        date,
        user_id,
        habits: projected,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
