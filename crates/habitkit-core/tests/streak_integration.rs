//! Integration tests for the completion -> streak pipeline.
//!
//! These tests drive the real store end to end: log writes go through
//! the clamped-counter upsert and streak refresh reads them back.

use chrono::NaiveDate;

use habitkit_core::completion::{self, CompletionInput};
use habitkit_core::habit::{Frequency, Habit};
use habitkit_core::storage::HabitDb;
use habitkit_core::streak::{self, STREAK_HORIZON};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_daily(db: &HabitDb, target: u32) -> Habit {
    let habit = Habit::new(
        "user-1",
        "Push-ups",
        "fitness",
        Frequency::Daily,
        target,
        "reps",
        date(2024, 1, 1),
    );
    db.create_habit(&habit).unwrap();
    habit
}

#[tokio::test]
async fn five_days_then_miss_then_one() {
    let db = HabitDb::open_memory().unwrap();
    let habit = seed_daily(&db, 8);
    let today = date(2024, 1, 7);

    // five full completions
    for d in 1..=5 {
        completion::complete_habit(&db, &habit.id, date(2024, 1, d), Some(8), None, today)
            .await
            .unwrap();
    }
    // day six falls short of the target
    completion::complete_habit(&db, &habit.id, date(2024, 1, 6), Some(3), None, today)
        .await
        .unwrap();
    // day seven completes again
    completion::complete_habit(&db, &habit.id, date(2024, 1, 7), Some(8), None, today)
        .await
        .unwrap();

    let stored = db.get_habit(&habit.id).unwrap().unwrap();
    assert_eq!(stored.streak, 1);
    assert_eq!(stored.last_completed_date, Some(date(2024, 1, 7)));

    let summary = streak::streak_summary(&db, &habit.id, today).unwrap();
    assert_eq!(summary.current, 1);
    assert_eq!(summary.longest, 5);
}

#[tokio::test]
async fn pending_today_holds_the_streak() {
    let db = HabitDb::open_memory().unwrap();
    let habit = seed_daily(&db, 1);
    let today = date(2024, 1, 6);

    for d in 3..=5 {
        completion::complete_habit(&db, &habit.id, date(2024, 1, d), None, None, today)
            .await
            .unwrap();
    }

    // nothing logged for today yet: the walk treats it as pending
    let update = streak::refresh_streak(&db, &habit.id, today, STREAK_HORIZON)
        .await
        .unwrap();
    assert_eq!(update.streak, 3);

    // completing today extends the same streak by exactly one
    completion::complete_habit(&db, &habit.id, today, None, None, today)
        .await
        .unwrap();
    assert_eq!(db.get_habit(&habit.id).unwrap().unwrap().streak, 4);
}

#[tokio::test]
async fn racing_writes_collapse_before_refresh() {
    let db = HabitDb::open_memory().unwrap();
    let habit = seed_daily(&db, 8);
    let today = date(2024, 1, 2);

    // two writers race on the same (habit, date); last write wins
    completion::upsert_log(
        &db,
        &habit.id,
        today,
        CompletionInput {
            amount: Some(8),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    completion::upsert_log(
        &db,
        &habit.id,
        today,
        CompletionInput {
            amount: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(db.list_logs_for_habit(&habit.id).unwrap().len(), 1);

    let update = streak::refresh_streak(&db, &habit.id, today, STREAK_HORIZON)
        .await
        .unwrap();
    assert_eq!(update.streak, 0);
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let db = HabitDb::open_memory().unwrap();
    let habit = seed_daily(&db, 1);
    let today = date(2024, 1, 4);

    for d in 1..=4 {
        completion::complete_habit(&db, &habit.id, date(2024, 1, d), None, None, today)
            .await
            .unwrap();
    }

    let first = streak::refresh_streak(&db, &habit.id, today, STREAK_HORIZON)
        .await
        .unwrap();
    let second = streak::refresh_streak(&db, &habit.id, today, STREAK_HORIZON)
        .await
        .unwrap();
    assert_eq!(first.streak, second.streak);
    assert_eq!(first.last_completed_date, second.last_completed_date);
    assert!(!second.changed);
}

#[tokio::test]
async fn weekly_streak_walks_by_week() {
    let db = HabitDb::open_memory().unwrap();
    let mut habit = Habit::new(
        "user-1",
        "Weekly review",
        "work",
        Frequency::Weekly,
        1,
        "",
        date(2024, 1, 1), // Monday
    );
    habit.validate().unwrap();
    db.create_habit(&habit).unwrap();

    let today = date(2024, 1, 17); // Wednesday
    for d in [date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)] {
        completion::complete_habit(&db, &habit.id, d, None, None, today)
            .await
            .unwrap();
    }

    let stored = db.get_habit(&habit.id).unwrap().unwrap();
    assert_eq!(stored.streak, 3);
}
