//! Streak computation: consecutive completed occurrences per habit.
//!
//! A streak counts successfully completed *scheduled occurrences* ending
//! at or just before today, stepping by the habit's own cadence -- not
//! raw calendar days. Today's occurrence with no log yet is pending: it
//! neither counts nor breaks the walk.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::error::{CoreError, Result};
use crate::habit::Habit;
use crate::recurrence;
use crate::storage::HabitDb;

/// Backward-walk bound: beyond this many occurrences the streak
/// saturates instead of growing in a single pass.
pub const STREAK_HORIZON: u32 = 120;

/// Result of a streak refresh for one habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub habit_id: String,
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    /// Whether the persisted habit row changed.
    pub changed: bool,
}

/// Current streak for `habit` given its logs, as of `today`.
///
/// `logs` maps occurrence date to the completed flag of that date's log
/// entry. The walk:
/// 1. starts at the most recent scheduled occurrence at or before today,
/// 2. skips today as pending when it has no log yet (grace rule),
/// 3. counts while each occurrence's log is completed,
/// 4. stops at the first failed or missing occurrence, or at `horizon`.
pub fn current_streak(
    habit: &Habit,
    logs: &BTreeMap<NaiveDate, bool>,
    today: NaiveDate,
    horizon: u32,
) -> u32 {
    let Some(mut cursor) = recurrence::most_recent_occurrence(habit, today) else {
        return 0;
    };

    if cursor == today && !logs.contains_key(&today) {
        match recurrence::previous_occurrence(habit, cursor) {
            Some(prev) => cursor = prev,
            None => return 0,
        }
    }

    let mut streak = 0u32;
    loop {
        match logs.get(&cursor) {
            Some(true) => streak += 1,
            _ => break,
        }
        if streak >= horizon {
            break;
        }
        match recurrence::previous_occurrence(habit, cursor) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Longest unbroken run of consecutive completed occurrences over the
/// full log history, independent of the current streak.
///
/// Completed dates that fall outside the habit's occurrence set are
/// ignored.
pub fn longest_streak(habit: &Habit, completed_dates: &[NaiveDate]) -> u32 {
    let occurrences: HashSet<NaiveDate> = completed_dates
        .iter()
        .copied()
        .filter(|d| recurrence::is_scheduled(habit, *d))
        .collect();

    let mut sorted: Vec<NaiveDate> = occurrences.iter().copied().collect();
    sorted.sort_unstable();

    let mut runs: HashMap<NaiveDate, u32> = HashMap::new();
    let mut best = 0u32;
    for date in sorted {
        let run = recurrence::previous_occurrence(habit, date)
            .and_then(|prev| runs.get(&prev))
            .map_or(1, |r| r + 1);
        best = best.max(run);
        runs.insert(date, run);
    }
    best
}

/// Recompute and persist one habit's streak and last completed date.
///
/// Idempotent: identical logs produce identical results on every run.
/// The store's natural-key upsert collapses racing completion writes to
/// a single row before this reads them.
///
/// # Errors
/// Returns [`CoreError::NotFound`] when the habit does not exist.
pub async fn refresh_streak(
    db: &HabitDb,
    habit_id: &str,
    today: NaiveDate,
    horizon: u32,
) -> Result<StreakUpdate> {
    let habit = db
        .get_habit(habit_id)?
        .ok_or_else(|| CoreError::not_found("habit", habit_id))?;

    let entries = db.list_logs_for_habit(habit_id)?;
    let logs: BTreeMap<NaiveDate, bool> = entries.iter().map(|e| (e.date, e.completed)).collect();

    let streak = current_streak(&habit, &logs, today, horizon);
    let last_completed_date = entries
        .iter()
        .filter(|e| e.completed)
        .map(|e| e.date)
        .max();

    let changed = streak != habit.streak || last_completed_date != habit.last_completed_date;
    if changed {
        db.update_habit_streak(habit_id, streak, last_completed_date)?;
        tracing::debug!(habit_id, streak, "streak refreshed");
    }

    Ok(StreakUpdate {
        habit_id: habit_id.to_string(),
        streak,
        last_completed_date,
        changed,
    })
}

/// Current and longest streak side by side, for display surfaces.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StreakSummary {
    pub habit_id: String,
    pub current: u32,
    pub longest: u32,
    pub last_completed_date: Option<NaiveDate>,
}

/// Compute the display summary for one habit without persisting anything.
///
/// # Errors
/// Returns [`CoreError::NotFound`] when the habit does not exist.
pub fn streak_summary(db: &HabitDb, habit_id: &str, today: NaiveDate) -> Result<StreakSummary> {
    let habit = db
        .get_habit(habit_id)?
        .ok_or_else(|| CoreError::not_found("habit", habit_id))?;
    let entries = db.list_logs_for_habit(habit_id)?;
    let logs: BTreeMap<NaiveDate, bool> = entries.iter().map(|e| (e.date, e.completed)).collect();
    let completed_dates: Vec<NaiveDate> = entries
        .iter()
        .filter(|e| e.completed)
        .map(|e| e.date)
        .collect();

    Ok(StreakSummary {
        habit_id: habit_id.to_string(),
        current: current_streak(&habit, &logs, today, STREAK_HORIZON),
        longest: longest_streak(&habit, &completed_dates),
        last_completed_date: completed_dates.into_iter().max(),
    })
}
