//! Completion log semantics: the clamped-counter model.
//!
//! Exactly one row exists per (habit, date); repeat writes overwrite the
//! value fields and never the key. Both increment-by-one and direct
//! completion route through the same clamp, so `completed` is always
//! derived from the clamped amount unless supplied explicitly.

use chrono::NaiveDate;

use crate::error::{CoreError, Result};
use crate::habit::CompletionEntry;
use crate::storage::HabitDb;
use crate::streak::{self, StreakUpdate};

/// Value fields of a completion write.
///
/// A `None` amount means "complete in full" (the habit's target).
#[derive(Debug, Clone, Default)]
pub struct CompletionInput {
    pub amount: Option<u32>,
    pub completed: Option<bool>,
    pub note: Option<String>,
}

/// Upsert the (habit, date) completion row.
///
/// The amount clamps to [0, target]; `completed` defaults to
/// amount >= target. Writing against a habit that does not exist is a
/// consistency violation, not a silent insert.
pub async fn upsert_log(
    db: &HabitDb,
    habit_id: &str,
    date: NaiveDate,
    input: CompletionInput,
) -> Result<CompletionEntry> {
    let habit = db.get_habit(habit_id)?.ok_or_else(|| {
        CoreError::Consistency(format!("completion log write against unknown habit {habit_id}"))
    })?;

    let amount = input.amount.unwrap_or(habit.target).min(habit.target);
    let completed = input.completed.unwrap_or(amount >= habit.target);

    let entry = CompletionEntry {
        habit_id: habit.id,
        user_id: habit.user_id,
        date,
        completed_amount: amount,
        completed,
        note: input.note,
    };
    db.upsert_log(&entry)?;
    Ok(entry)
}

/// Bump the day's counter by one, clamped to the target.
///
/// Preserves the existing note; re-derives `completed` from the new
/// amount.
pub async fn increment(db: &HabitDb, habit_id: &str, date: NaiveDate) -> Result<CompletionEntry> {
    let existing = db.get_log(habit_id, date)?;
    let amount = existing
        .as_ref()
        .map_or(0, |e| e.completed_amount)
        .saturating_add(1);
    let note = existing.and_then(|e| e.note);
    upsert_log(
        db,
        habit_id,
        date,
        CompletionInput {
            amount: Some(amount),
            completed: None,
            note,
        },
    )
    .await
}

/// The completeHabit operation: upsert the log, then refresh that
/// habit's streak so the cached value is current before anything reads
/// it.
///
/// A failed write advances no streak state.
pub async fn complete_habit(
    db: &HabitDb,
    habit_id: &str,
    date: NaiveDate,
    amount: Option<u32>,
    note: Option<String>,
    today: NaiveDate,
) -> Result<(CompletionEntry, StreakUpdate)> {
    let entry = upsert_log(
        db,
        habit_id,
        date,
        CompletionInput {
            amount,
            completed: None,
            note,
        },
    )
    .await?;
    let update = streak::refresh_streak(db, habit_id, today, streak::STREAK_HORIZON).await?;
    Ok((entry, update))
}
