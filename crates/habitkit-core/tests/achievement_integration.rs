//! Integration tests for achievement evaluation and unlock bookkeeping.
//!
//! These tests verify the exactly-once unlock contract: re-evaluating
//! never duplicates rows or notifications, and users stay independent.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use habitkit_core::achievement::{AchievementCatalog, AchievementEngine};
use habitkit_core::batch;
use habitkit_core::completion;
use habitkit_core::habit::{Frequency, Habit};
use habitkit_core::notify::Notifier;
use habitkit_core::overrides;
use habitkit_core::storage::HabitDb;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Records every delivery for assertion.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        user_id: &str,
        achievement_key: &str,
        _title: &str,
        _message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), achievement_key.to_string()));
        Ok(())
    }
}

fn engine_with_recorder() -> (AchievementEngine, RecordingNotifier) {
    let recorder = RecordingNotifier::default();
    let engine = AchievementEngine::new(
        AchievementCatalog::baseline(),
        Box::new(recorder.clone()),
    );
    (engine, recorder)
}

fn seed_daily(db: &HabitDb, user_id: &str, name: &str) -> Habit {
    let habit = Habit::new(
        user_id,
        name,
        "general",
        Frequency::Daily,
        1,
        "",
        date(2024, 1, 1),
    );
    db.create_habit(&habit).unwrap();
    habit
}

#[tokio::test]
async fn full_day_unlocks_exactly_once() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();
    let today = date(2024, 1, 10);

    let habits: Vec<Habit> = (0..3)
        .map(|i| seed_daily(&db, "alice", &format!("habit {i}")))
        .collect();
    for habit in &habits {
        completion::complete_habit(&db, &habit.id, today, None, None, today)
            .await
            .unwrap();
    }

    let unlocked = engine.evaluate(&db, "alice", today).await.unwrap();
    assert!(unlocked.contains(&"first_step".to_string()));
    assert!(unlocked.contains(&"triple_play".to_string()));
    assert!(unlocked.contains(&"clean_sweep".to_string()));

    // idempotence: no new unlocks, no new notifications
    let again = engine.evaluate(&db, "alice", today).await.unwrap();
    assert!(again.is_empty());

    let sent = recorder.sent();
    assert_eq!(sent.len(), unlocked.len());
    assert_eq!(db.count_unlocks("alice").unwrap(), unlocked.len() as u32);
}

#[tokio::test]
async fn all_today_is_vacuously_false_without_habits() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();

    let unlocked = engine.evaluate(&db, "nobody", date(2024, 1, 10)).await.unwrap();
    assert!(unlocked.is_empty());
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn hidden_habit_does_not_block_clean_sweep() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, _recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();
    let today = date(2024, 1, 10);

    let done = seed_daily(&db, "alice", "done today");
    let skipped = seed_daily(&db, "alice", "skipped today");

    completion::complete_habit(&db, &done.id, today, None, None, today)
        .await
        .unwrap();
    overrides::hide_on_date(&db, &skipped.id, today).await.unwrap();

    let unlocked = engine.evaluate(&db, "alice", today).await.unwrap();
    assert!(unlocked.contains(&"clean_sweep".to_string()));
}

#[tokio::test]
async fn streak_criterion_reads_refreshed_streaks() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, _recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();
    let habit = seed_daily(&db, "alice", "morning pages");
    let today = date(2024, 1, 7);

    for d in 1..=7 {
        completion::complete_habit(&db, &habit.id, date(2024, 1, d), None, None, today)
            .await
            .unwrap();
    }

    let unlocked = engine.evaluate(&db, "alice", today).await.unwrap();
    assert!(unlocked.contains(&"week_strong".to_string()));
    assert!(!unlocked.contains(&"monthly_master".to_string()));
}

#[tokio::test]
async fn users_do_not_interfere() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();
    let today = date(2024, 1, 10);

    let a = seed_daily(&db, "alice", "alice habit");
    seed_daily(&db, "bob", "bob habit");
    completion::complete_habit(&db, &a.id, today, None, None, today)
        .await
        .unwrap();

    engine.evaluate(&db, "alice", today).await.unwrap();
    engine.evaluate(&db, "bob", today).await.unwrap();

    assert!(db.count_unlocks("alice").unwrap() > 0);
    assert_eq!(db.count_unlocks("bob").unwrap(), 0);
    assert!(recorder.sent().iter().all(|(user, _)| user == "alice"));
}

#[tokio::test]
async fn manual_unlock_respects_uniqueness() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();

    let meta = serde_json::json!({"reason": "support credit"});
    assert!(engine
        .unlock_manually(&db, "alice", "monthly_master", Some(meta))
        .await
        .unwrap());
    assert!(!engine
        .unlock_manually(&db, "alice", "monthly_master", None)
        .await
        .unwrap());

    assert_eq!(recorder.sent().len(), 1);
    assert_eq!(db.count_unlocks("alice").unwrap(), 1);

    let err = engine
        .unlock_manually(&db, "alice", "no_such_key", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        habitkit_core::CoreError::NotFound { kind: "achievement", .. }
    ));
}

#[tokio::test]
async fn batch_twice_produces_identical_state() {
    let db = HabitDb::open_memory().unwrap();
    let (engine, recorder) = engine_with_recorder();
    engine.seed_catalog(&db).await.unwrap();
    let today = date(2024, 1, 7);

    for user in ["alice", "bob"] {
        let habit = seed_daily(&db, user, "stretch");
        for d in 1..=7 {
            completion::complete_habit(&db, &habit.id, date(2024, 1, d), None, None, today)
                .await
                .unwrap();
        }
    }

    let first = batch::run_batch(&db, &engine, today, 120, None).await.unwrap();
    assert_eq!(first.users_processed, 2);
    assert!(first.errors.is_empty());
    let notifications_after_first = recorder.sent().len();

    let second = batch::run_batch(&db, &engine, today, 120, None).await.unwrap();
    assert_eq!(second.users_processed, 2);
    assert_eq!(second.achievements_unlocked, 0);
    assert_eq!(second.habits_updated, 0);
    assert_eq!(recorder.sent().len(), notifications_after_first);
}
