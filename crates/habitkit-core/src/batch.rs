//! Periodic batch worker: streak refresh plus achievement evaluation
//! for every user.
//!
//! Users are processed independently: one user's failure is recorded in
//! the run report and the pass continues. Within one user, streaks are
//! recomputed before achievements read them. Re-running the whole batch
//! back-to-back yields identical end state because every write is an
//! upsert by natural key.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

use crate::achievement::AchievementEngine;
use crate::error::{CoreError, Result};
use crate::storage::HabitDb;
use crate::streak;

/// Outcome of one batch pass. The pass itself always completes; per-user
/// failures land in `errors`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub users_processed: u32,
    pub habits_updated: u32,
    pub achievements_unlocked: u32,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub user_id: String,
    pub message: String,
}

/// Run the full refresh pass over every user with habits.
///
/// `per_user_timeout` is advisory: a user exceeding it is recorded as
/// failed and the pass moves on.
pub async fn run_batch(
    db: &HabitDb,
    engine: &AchievementEngine,
    today: NaiveDate,
    horizon: u32,
    per_user_timeout: Option<Duration>,
) -> Result<BatchReport> {
    let users = db.list_user_ids()?;
    tracing::info!(date = %today, users = users.len(), "batch pass started");

    let mut report = BatchReport::default();
    for user_id in users {
        let work = process_user(db, engine, &user_id, today, horizon);
        let outcome = match per_user_timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => Err(CoreError::Consistency(format!(
                    "user pass exceeded {}s timeout",
                    limit.as_secs()
                ))),
            },
            None => work.await,
        };

        match outcome {
            Ok((updated, unlocked)) => {
                report.users_processed += 1;
                report.habits_updated += updated;
                report.achievements_unlocked += unlocked;
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "batch user failed");
                report.errors.push(BatchError {
                    user_id,
                    message: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        users = report.users_processed,
        habits = report.habits_updated,
        unlocked = report.achievements_unlocked,
        errors = report.errors.len(),
        "batch pass finished"
    );
    Ok(report)
}

/// One user's pass: every habit's streak first, then achievements.
async fn process_user(
    db: &HabitDb,
    engine: &AchievementEngine,
    user_id: &str,
    today: NaiveDate,
    horizon: u32,
) -> Result<(u32, u32)> {
    let habits = db.list_habits(user_id)?;
    let mut updated = 0;
    for habit in &habits {
        let update = streak::refresh_streak(db, &habit.id, today, horizon).await?;
        if update.changed {
            updated += 1;
        }
    }
    let unlocked = engine.evaluate(db, user_id, today).await?;
    Ok((updated, unlocked.len() as u32))
}
