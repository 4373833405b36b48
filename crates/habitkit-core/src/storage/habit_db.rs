//! SQLite-based storage for habits, completion logs, overrides and
//! achievements.
//!
//! Dates are stored as `YYYY-MM-DD` TEXT, timestamps as RFC3339 TEXT.
//! Every write that carries a natural key goes through an atomic
//! `ON CONFLICT` upsert, so racing writers collapse to a single row.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::achievement::{AchievementDef, Criteria, Unlock};
use crate::error::StoreError;
use crate::habit::{CompletionEntry, DayOverride, Frequency, Habit, HabitPatch};

// === Helper Functions ===

/// Parse frequency from database string
fn parse_frequency(s: &str) -> Frequency {
    match s {
        "weekly" => Frequency::Weekly,
        "monthly" => Frequency::Monthly,
        "custom" => Frequency::Custom,
        _ => Frequency::Daily,
    }
}

/// Format frequency for database storage
fn format_frequency(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "daily",
        Frequency::Weekly => "weekly",
        Frequency::Monthly => "monthly",
        Frequency::Custom => "custom",
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored date with fallback to the epoch for corrupt rows
fn parse_date_fallback(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn parse_timestamp_fallback(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Build a Habit from a database row
fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let monthly_days_json: String = row.get(7)?;
    let monthly_days: Vec<u32> = serde_json::from_str(&monthly_days_json).unwrap_or_default();
    let monthly_months_json: String = row.get(8)?;
    let monthly_months: Vec<u32> = serde_json::from_str(&monthly_months_json).unwrap_or_default();

    let frequency_str: String = row.get(4)?;
    let created_at_str: String = row.get(9)?;
    let last_completed_str: Option<String> = row.get(11)?;

    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        frequency: parse_frequency(&frequency_str),
        target: row.get(5)?,
        unit: row.get(6)?,
        monthly_days,
        monthly_months,
        created_at: parse_date_fallback(&created_at_str),
        streak: row.get(10)?,
        last_completed_date: last_completed_str.as_deref().map(parse_date_fallback),
    })
}

/// Build a CompletionEntry from a database row
fn row_to_entry(row: &rusqlite::Row) -> Result<CompletionEntry, rusqlite::Error> {
    let date_str: String = row.get(2)?;
    Ok(CompletionEntry {
        habit_id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date_fallback(&date_str),
        completed_amount: row.get(3)?,
        completed: row.get(4)?,
        note: row.get(5)?,
    })
}

/// Build a DayOverride from a database row
fn row_to_override(row: &rusqlite::Row) -> Result<DayOverride, rusqlite::Error> {
    let date_str: String = row.get(2)?;
    let patch_json: String = row.get(4)?;
    let patch: HabitPatch = serde_json::from_str(&patch_json).unwrap_or_default();
    Ok(DayOverride {
        habit_id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date_fallback(&date_str),
        hidden: row.get(3)?,
        patch,
    })
}

/// Build an AchievementDef from a database row
fn row_to_achievement(row: &rusqlite::Row) -> Result<AchievementDef, rusqlite::Error> {
    let criteria_json: String = row.get(3)?;
    let criteria: Criteria = serde_json::from_str(&criteria_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AchievementDef {
        key: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        criteria,
    })
}

/// Build an Unlock from a database row
fn row_to_unlock(row: &rusqlite::Row) -> Result<Unlock, rusqlite::Error> {
    let earned_at_str: String = row.get(2)?;
    let meta_json: Option<String> = row.get(3)?;
    Ok(Unlock {
        user_id: row.get(0)?,
        achievement_id: row.get(1)?,
        earned_at: parse_timestamp_fallback(&earned_at_str),
        meta: meta_json.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

/// SQLite database for habit storage.
///
/// Stores habits, completion logs, per-date overrides, the achievement
/// catalog, and unlock rows.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Open the database at `~/.config/habitkit/habitkit.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("habitkit.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral tools).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS habits (
                    id                  TEXT PRIMARY KEY,
                    user_id             TEXT NOT NULL,
                    name                TEXT NOT NULL,
                    category            TEXT NOT NULL DEFAULT '',
                    frequency           TEXT NOT NULL,
                    target              INTEGER NOT NULL DEFAULT 1,
                    unit                TEXT NOT NULL DEFAULT '',
                    monthly_days        TEXT NOT NULL DEFAULT '[]',
                    monthly_months      TEXT NOT NULL DEFAULT '[]',
                    created_at          TEXT NOT NULL,
                    streak              INTEGER NOT NULL DEFAULT 0,
                    last_completed_date TEXT
                );

                CREATE TABLE IF NOT EXISTS completion_logs (
                    habit_id         TEXT NOT NULL,
                    user_id          TEXT NOT NULL,
                    date             TEXT NOT NULL,
                    completed_amount INTEGER NOT NULL DEFAULT 0,
                    completed        INTEGER NOT NULL DEFAULT 0,
                    note             TEXT,
                    PRIMARY KEY (habit_id, date)
                );

                CREATE TABLE IF NOT EXISTS day_overrides (
                    habit_id TEXT NOT NULL,
                    user_id  TEXT NOT NULL,
                    date     TEXT NOT NULL,
                    hidden   INTEGER NOT NULL DEFAULT 0,
                    patch    TEXT NOT NULL DEFAULT '{}',
                    PRIMARY KEY (habit_id, date)
                );

                CREATE TABLE IF NOT EXISTS achievements (
                    key         TEXT PRIMARY KEY,
                    title       TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    criteria    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS achievement_unlocks (
                    user_id        TEXT NOT NULL,
                    achievement_id TEXT NOT NULL,
                    earned_at      TEXT NOT NULL,
                    meta           TEXT,
                    PRIMARY KEY (user_id, achievement_id)
                );

                -- Create indexes for common query patterns
                CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id);
                CREATE INDEX IF NOT EXISTS idx_logs_user_date ON completion_logs(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_overrides_user_date ON day_overrides(user_id, date);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Habit CRUD ===

    /// Create a new habit.
    pub fn create_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let monthly_days_json = serde_json::to_string(&habit.monthly_days).unwrap();
        let monthly_months_json = serde_json::to_string(&habit.monthly_months).unwrap();

        self.conn.execute(
            "INSERT INTO habits (
                id, user_id, name, category, frequency, target, unit,
                monthly_days, monthly_months, created_at, streak, last_completed_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                habit.id,
                habit.user_id,
                habit.name,
                habit.category,
                format_frequency(habit.frequency),
                habit.target,
                habit.unit,
                monthly_days_json,
                monthly_months_json,
                format_date(habit.created_at),
                habit.streak,
                habit.last_completed_date.map(format_date),
            ],
        )?;
        Ok(())
    }

    /// Get a habit by ID.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, category, frequency, target, unit,
                    monthly_days, monthly_months, created_at, streak, last_completed_date
             FROM habits WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_habit).optional()?;
        Ok(result)
    }

    /// List a user's habits, oldest first.
    pub fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, category, frequency, target, unit,
                    monthly_days, monthly_months, created_at, streak, last_completed_date
             FROM habits WHERE user_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let habits = stmt.query_map(params![user_id], row_to_habit)?;
        Ok(habits.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every user id that owns at least one habit.
    pub fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user_id FROM habits ORDER BY user_id ASC")?;
        let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(ids.collect::<Result<Vec<_>, _>>()?)
    }

    /// Update an existing habit's editable fields.
    ///
    /// Returns false when no such habit exists.
    pub fn update_habit(&self, habit: &Habit) -> Result<bool, StoreError> {
        let monthly_days_json = serde_json::to_string(&habit.monthly_days).unwrap();
        let monthly_months_json = serde_json::to_string(&habit.monthly_months).unwrap();

        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?1, category = ?2, frequency = ?3, target = ?4, unit = ?5,
                 monthly_days = ?6, monthly_months = ?7, created_at = ?8,
                 streak = ?9, last_completed_date = ?10
             WHERE id = ?11",
            params![
                habit.name,
                habit.category,
                format_frequency(habit.frequency),
                habit.target,
                habit.unit,
                monthly_days_json,
                monthly_months_json,
                format_date(habit.created_at),
                habit.streak,
                habit.last_completed_date.map(format_date),
                habit.id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Write the cached streak fields maintained by the calculator.
    pub fn update_habit_streak(
        &self,
        habit_id: &str,
        streak: u32,
        last_completed_date: Option<NaiveDate>,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE habits SET streak = ?1, last_completed_date = ?2 WHERE id = ?3",
            params![streak, last_completed_date.map(format_date), habit_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a habit and cascade its logs and overrides in a single
    /// transaction.
    ///
    /// Returns false when no such habit exists (nothing is deleted).
    pub fn delete_habit(&self, id: &str) -> Result<bool, StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let result: Result<bool, rusqlite::Error> = (|| {
            self.conn
                .execute("DELETE FROM completion_logs WHERE habit_id = ?1", params![id])?;
            self.conn
                .execute("DELETE FROM day_overrides WHERE habit_id = ?1", params![id])?;
            let changed = self
                .conn
                .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })();
        match result {
            Ok(deleted) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(deleted)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err.into())
            }
        }
    }

    // === Completion logs ===

    /// Atomic upsert of the (habit_id, date) row; value fields are
    /// overwritten, the key never is. Last write wins.
    pub fn upsert_log(&self, entry: &CompletionEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO completion_logs (habit_id, user_id, date, completed_amount, completed, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(habit_id, date) DO UPDATE SET
                 user_id = excluded.user_id,
                 completed_amount = excluded.completed_amount,
                 completed = excluded.completed,
                 note = excluded.note",
            params![
                entry.habit_id,
                entry.user_id,
                format_date(entry.date),
                entry.completed_amount,
                entry.completed,
                entry.note,
            ],
        )?;
        Ok(())
    }

    /// Get the log row for (habit, date).
    pub fn get_log(&self, habit_id: &str, date: NaiveDate) -> Result<Option<CompletionEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, user_id, date, completed_amount, completed, note
             FROM completion_logs WHERE habit_id = ?1 AND date = ?2",
        )?;
        let result = stmt
            .query_row(params![habit_id, format_date(date)], row_to_entry)
            .optional()?;
        Ok(result)
    }

    /// Delete the log row for (habit, date). Returns false when absent.
    pub fn delete_log(&self, habit_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM completion_logs WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, format_date(date)],
        )?;
        Ok(changed > 0)
    }

    /// All log rows for one habit, oldest first.
    pub fn list_logs_for_habit(&self, habit_id: &str) -> Result<Vec<CompletionEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, user_id, date, completed_amount, completed, note
             FROM completion_logs WHERE habit_id = ?1 ORDER BY date ASC",
        )?;
        let entries = stmt.query_map(params![habit_id], row_to_entry)?;
        Ok(entries.collect::<Result<Vec<_>, _>>()?)
    }

    /// A user's log rows for one date.
    pub fn list_logs_for_user_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CompletionEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, user_id, date, completed_amount, completed, note
             FROM completion_logs WHERE user_id = ?1 AND date = ?2
             ORDER BY habit_id ASC",
        )?;
        let entries = stmt.query_map(params![user_id, format_date(date)], row_to_entry)?;
        Ok(entries.collect::<Result<Vec<_>, _>>()?)
    }

    /// Distinct habits with a completed log on `date`.
    pub fn count_completed_on(&self, user_id: &str, date: NaiveDate) -> Result<u32, StoreError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(DISTINCT habit_id) FROM completion_logs
             WHERE user_id = ?1 AND date = ?2 AND completed = 1",
            params![user_id, format_date(date)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Completed log rows in the inclusive [from, to] date window.
    pub fn count_completed_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<u32, StoreError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM completion_logs
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 AND completed = 1",
            params![user_id, format_date(from), format_date(to)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Overrides ===

    /// Atomic upsert of the (habit_id, date) override row.
    pub fn upsert_override(&self, ov: &DayOverride) -> Result<(), StoreError> {
        let patch_json = serde_json::to_string(&ov.patch).unwrap();
        self.conn.execute(
            "INSERT INTO day_overrides (habit_id, user_id, date, hidden, patch)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(habit_id, date) DO UPDATE SET
                 user_id = excluded.user_id,
                 hidden = excluded.hidden,
                 patch = excluded.patch",
            params![
                ov.habit_id,
                ov.user_id,
                format_date(ov.date),
                ov.hidden,
                patch_json,
            ],
        )?;
        Ok(())
    }

    /// Get the override for (habit, date).
    pub fn get_override(
        &self,
        habit_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DayOverride>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, user_id, date, hidden, patch
             FROM day_overrides WHERE habit_id = ?1 AND date = ?2",
        )?;
        let result = stmt
            .query_row(params![habit_id, format_date(date)], row_to_override)
            .optional()?;
        Ok(result)
    }

    /// A user's overrides for one date.
    pub fn list_overrides_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<DayOverride>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, user_id, date, hidden, patch
             FROM day_overrides WHERE user_id = ?1 AND date = ?2
             ORDER BY habit_id ASC",
        )?;
        let overrides = stmt.query_map(params![user_id, format_date(date)], row_to_override)?;
        Ok(overrides.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete the override for (habit, date). Returns false when absent.
    pub fn delete_override(&self, habit_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM day_overrides WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, format_date(date)],
        )?;
        Ok(changed > 0)
    }

    // === Achievements ===

    /// Seed one catalog definition.
    ///
    /// A new key inserts the full row; an existing key refreshes title
    /// and description only, leaving its criteria untouched. Returns
    /// whether the row was newly created.
    pub fn seed_achievement(&self, def: &AchievementDef) -> Result<bool, StoreError> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT key FROM achievements WHERE key = ?1",
                params![def.key],
                |row| row.get(0),
            )
            .optional()?;

        if exists.is_some() {
            self.conn.execute(
                "UPDATE achievements SET title = ?1, description = ?2 WHERE key = ?3",
                params![def.title, def.description, def.key],
            )?;
            Ok(false)
        } else {
            let criteria_json = serde_json::to_string(&def.criteria).unwrap();
            self.conn.execute(
                "INSERT INTO achievements (key, title, description, criteria)
                 VALUES (?1, ?2, ?3, ?4)",
                params![def.key, def.title, def.description, criteria_json],
            )?;
            Ok(true)
        }
    }

    /// Get one achievement definition by key.
    pub fn get_achievement(&self, key: &str) -> Result<Option<AchievementDef>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, title, description, criteria FROM achievements WHERE key = ?1",
        )?;
        let result = stmt.query_row(params![key], row_to_achievement).optional()?;
        Ok(result)
    }

    /// List stored achievement definitions in seed order.
    pub fn list_achievements(&self) -> Result<Vec<AchievementDef>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key, title, description, criteria FROM achievements ORDER BY rowid ASC",
        )?;
        let defs = stmt.query_map([], row_to_achievement)?;
        Ok(defs.collect::<Result<Vec<_>, _>>()?)
    }

    // === Unlocks ===

    /// Insert the unlock row if its (user, achievement) key is absent.
    ///
    /// Returns whether a row was created; an existing unlock is left
    /// exactly as earned.
    pub fn insert_unlock_if_absent(&self, unlock: &Unlock) -> Result<bool, StoreError> {
        let meta_json = unlock
            .meta
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap());
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO achievement_unlocks (user_id, achievement_id, earned_at, meta)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                unlock.user_id,
                unlock.achievement_id,
                unlock.earned_at.to_rfc3339(),
                meta_json,
            ],
        )?;
        Ok(changed > 0)
    }

    /// A user's unlocks, earliest first.
    pub fn list_unlocks(&self, user_id: &str) -> Result<Vec<Unlock>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, achievement_id, earned_at, meta
             FROM achievement_unlocks WHERE user_id = ?1
             ORDER BY earned_at ASC, achievement_id ASC",
        )?;
        let unlocks = stmt.query_map(params![user_id], row_to_unlock)?;
        Ok(unlocks.collect::<Result<Vec<_>, _>>()?)
    }

    /// How many achievements the user has unlocked.
    pub fn count_unlocks(&self, user_id: &str) -> Result<u32, StoreError> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM achievement_unlocks WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
