//! Read-only dashboard aggregation.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::HabitDb;

/// Summary counters for one user's dashboard.
///
/// Every field is a well-defined zero when the user has no habits;
/// percentage math belongs to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_habits: u32,
    pub completed_today: u32,
    pub max_streak: u32,
    pub week_completed: u32,
    pub achievements_count: u32,
    pub category_counts: BTreeMap<String, u32>,
}

/// Compose the summary for (user, date).
pub fn dashboard(db: &HabitDb, user_id: &str, today: NaiveDate) -> Result<DashboardSummary> {
    let habits = db.list_habits(user_id)?;

    let mut category_counts: BTreeMap<String, u32> = BTreeMap::new();
    for habit in &habits {
        *category_counts.entry(habit.category.clone()).or_insert(0) += 1;
    }

    Ok(DashboardSummary {
        total_habits: habits.len() as u32,
        completed_today: db.count_completed_on(user_id, today)?,
        max_streak: habits.iter().map(|h| h.streak).max().unwrap_or(0),
        week_completed: db.count_completed_between(user_id, most_recent_monday(today), today)?,
        achievements_count: db.count_unlocks(user_id)?,
        category_counts,
    })
}

/// Monday of the week containing `date` (the date itself on Mondays).
fn most_recent_monday(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}
