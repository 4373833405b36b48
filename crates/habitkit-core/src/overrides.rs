//! Per-date override operations: hide a habit for one date, or patch
//! its projected view.
//!
//! Overrides are keyed by (habit, date) and never touch the stored
//! habit. Hiding is an idempotent upsert; patching shallow-merges, with
//! later writes winning per field.

use chrono::NaiveDate;

use crate::error::{CoreError, Result};
use crate::habit::{DayOverride, HabitPatch};
use crate::storage::HabitDb;

/// Suppress the habit on `date` only.
pub async fn hide_on_date(db: &HabitDb, habit_id: &str, date: NaiveDate) -> Result<DayOverride> {
    let mut ov = load_or_new(db, habit_id, date)?;
    ov.hidden = true;
    db.upsert_override(&ov)?;
    Ok(ov)
}

/// Merge `patch` into the date's projection overlay.
pub async fn patch_on_date(
    db: &HabitDb,
    habit_id: &str,
    date: NaiveDate,
    patch: HabitPatch,
) -> Result<DayOverride> {
    let mut ov = load_or_new(db, habit_id, date)?;
    ov.patch.merge(&patch);
    db.upsert_override(&ov)?;
    Ok(ov)
}

/// Remove the override for (habit, date).
///
/// # Errors
/// Returns [`CoreError::NotFound`] when no override exists for the key.
pub async fn clear_override(db: &HabitDb, habit_id: &str, date: NaiveDate) -> Result<()> {
    if !db.delete_override(habit_id, date)? {
        return Err(CoreError::not_found("override", format!("{habit_id}@{date}")));
    }
    Ok(())
}

fn load_or_new(db: &HabitDb, habit_id: &str, date: NaiveDate) -> Result<DayOverride> {
    let habit = db
        .get_habit(habit_id)?
        .ok_or_else(|| CoreError::not_found("habit", habit_id))?;
    Ok(db.get_override(habit_id, date)?.unwrap_or(DayOverride {
        habit_id: habit.id,
        user_id: habit.user_id,
        date,
        hidden: false,
        patch: HabitPatch::default(),
    }))
}
