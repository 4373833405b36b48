//! Achievement catalog and unlock engine.
//!
//! Criteria are declarative tagged values evaluated against current
//! habit/log state. Unlocks are permanent: at most one row ever exists
//! per (user, achievement), enforced by the store's natural key, and the
//! notifier fires exactly once when that row is first created.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::notify::Notifier;
use crate::recurrence;
use crate::storage::HabitDb;

/// Unlock condition, tagged for storage and catalog files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criteria {
    /// Distinct habits completed today reaches `count`.
    CountPerDay { count: u32 },
    /// Every habit scheduled today is completed today.
    AllToday,
    /// Any one habit's current streak reaches `days`.
    Streak { days: u32 },
}

/// One catalog entry. `key` is the stable identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDef {
    pub key: String,
    pub title: String,
    pub description: String,
    pub criteria: Criteria,
}

/// A user's permanent unlock of one achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unlock {
    pub user_id: String,
    pub achievement_id: String,
    pub earned_at: DateTime<Utc>,
    pub meta: Option<serde_json::Value>,
}

/// The ordered achievement catalog.
///
/// Built once at process start and handed to the engine; nothing else
/// carries its own copy of the definitions.
#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    defs: Vec<AchievementDef>,
}

impl AchievementCatalog {
    pub fn new(defs: Vec<AchievementDef>) -> Self {
        Self { defs }
    }

    /// The built-in baseline catalog.
    pub fn baseline() -> Self {
        fn def(key: &str, title: &str, description: &str, criteria: Criteria) -> AchievementDef {
            AchievementDef {
                key: key.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                criteria,
            }
        }

        Self::new(vec![
            def(
                "first_step",
                "First Step",
                "Complete your first habit of the day",
                Criteria::CountPerDay { count: 1 },
            ),
            def(
                "triple_play",
                "Triple Play",
                "Complete three habits in a single day",
                Criteria::CountPerDay { count: 3 },
            ),
            def(
                "clean_sweep",
                "Clean Sweep",
                "Complete everything scheduled for the day",
                Criteria::AllToday,
            ),
            def(
                "week_strong",
                "Week Strong",
                "Keep a streak alive for seven occurrences",
                Criteria::Streak { days: 7 },
            ),
            def(
                "monthly_master",
                "Monthly Master",
                "Keep a streak alive for thirty occurrences",
                Criteria::Streak { days: 30 },
            ),
        ])
    }

    pub fn defs(&self) -> &[AchievementDef] {
        &self.defs
    }

    pub fn get(&self, key: &str) -> Option<&AchievementDef> {
        self.defs.iter().find(|d| d.key == key)
    }
}

/// Evaluates the catalog against user state and unlocks rewards.
pub struct AchievementEngine {
    catalog: AchievementCatalog,
    notifier: Box<dyn Notifier>,
}

impl AchievementEngine {
    pub fn new(catalog: AchievementCatalog, notifier: Box<dyn Notifier>) -> Self {
        Self { catalog, notifier }
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    /// Evaluate every definition for one user as of `today`.
    ///
    /// Safe to re-run: a predicate that holds again finds its unlock row
    /// already present and does nothing. Returns the keys newly unlocked
    /// by this call.
    pub async fn evaluate(&self, db: &HabitDb, user_id: &str, today: NaiveDate) -> Result<Vec<String>> {
        let habits = db.list_habits(user_id)?;
        let overrides = db.list_overrides_for_date(user_id, today)?;
        let scheduled = recurrence::habits_for_date(&habits, &overrides, today);
        let today_logs = db.list_logs_for_user_date(user_id, today)?;
        let completed_ids: HashSet<&str> = today_logs
            .iter()
            .filter(|l| l.completed)
            .map(|l| l.habit_id.as_str())
            .collect();

        let mut unlocked = Vec::new();
        for def in self.catalog.defs() {
            let met = match def.criteria {
                Criteria::CountPerDay { count } => completed_ids.len() as u32 >= count,
                Criteria::AllToday => {
                    !scheduled.is_empty()
                        && scheduled.iter().all(|h| completed_ids.contains(h.id.as_str()))
                }
                Criteria::Streak { days } => habits.iter().any(|h| h.streak >= days),
            };
            if !met {
                continue;
            }
            if self.record_unlock(db, user_id, def, None)? {
                unlocked.push(def.key.clone());
            }
        }
        Ok(unlocked)
    }

    /// Upsert the catalog into the store.
    ///
    /// Re-seeding an existing key refreshes title and description only;
    /// its criteria are left untouched. Returns how many keys were newly
    /// created.
    pub async fn seed_catalog(&self, db: &HabitDb) -> Result<usize> {
        let mut created = 0;
        for def in self.catalog.defs() {
            if db.seed_achievement(def)? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Administrative unlock that bypasses predicate evaluation.
    ///
    /// The one-unlock-per-(user, achievement) invariant still holds via
    /// the same uniqueness check. Returns whether a row was created.
    pub async fn unlock_manually(
        &self,
        db: &HabitDb,
        user_id: &str,
        key: &str,
        meta: Option<serde_json::Value>,
    ) -> Result<bool> {
        let def = self
            .catalog
            .get(key)
            .ok_or_else(|| CoreError::not_found("achievement", key))?;
        self.record_unlock(db, user_id, def, meta)
    }

    /// Insert the unlock row if absent; notify only on first creation.
    fn record_unlock(
        &self,
        db: &HabitDb,
        user_id: &str,
        def: &AchievementDef,
        meta: Option<serde_json::Value>,
    ) -> Result<bool> {
        let unlock = Unlock {
            user_id: user_id.to_string(),
            achievement_id: def.key.clone(),
            earned_at: Utc::now(),
            meta,
        };
        let inserted = db.insert_unlock_if_absent(&unlock)?;
        if inserted {
            if let Err(e) = self
                .notifier
                .notify(user_id, &def.key, &def.title, &def.description)
            {
                // the unlock is permanent either way
                tracing::warn!(user_id, key = %def.key, error = %e, "unlock notification failed");
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_round_trips_with_type_tags() {
        let json = serde_json::to_string(&Criteria::CountPerDay { count: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"count_per_day","count":3}"#);

        let parsed: Criteria = serde_json::from_str(r#"{"type":"streak","days":7}"#).unwrap();
        assert_eq!(parsed, Criteria::Streak { days: 7 });

        let parsed: Criteria = serde_json::from_str(r#"{"type":"all_today"}"#).unwrap();
        assert_eq!(parsed, Criteria::AllToday);
    }

    #[test]
    fn baseline_catalog_keys_are_unique() {
        let catalog = AchievementCatalog::baseline();
        let mut keys: Vec<&str> = catalog.defs().iter().map(|d| d.key.as_str()).collect();
        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count);
        assert!(catalog.get("clean_sweep").is_some());
        assert!(catalog.get("unknown").is_none());
    }
}
