//! Habit data model: habits, per-date overrides, and completion entries.
//!
//! Everything here is a plain serde value. Categories and units are
//! opaque string tags; any visual mapping belongs to the UI layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// How often a habit recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Accepted but never scheduled; reserved for an explicit date-set.
    Custom,
}

/// A recurring habit owned by a single user.
///
/// The occurrence set is fully determined by `frequency`, `created_at`
/// (the anchor date), `monthly_days` and `monthly_months`. `streak` is a
/// cached value maintained by the streak calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub frequency: Frequency,
    pub target: u32,
    pub unit: String,
    pub monthly_days: Vec<u32>,
    pub monthly_months: Vec<u32>,
    pub created_at: NaiveDate,
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl Habit {
    /// Create a new habit anchored at `created_at` with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        frequency: Frequency,
        target: u32,
        unit: impl Into<String>,
        created_at: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            category: category.into(),
            frequency,
            target,
            unit: unit.into(),
            monthly_days: Vec::new(),
            monthly_months: Vec::new(),
            created_at,
            streak: 0,
            last_completed_date: None,
        }
    }

    /// Check field-level invariants.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for a zero target or out-of-range
    /// monthly day/month entries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target == 0 {
            return Err(ValidationError::ZeroTarget);
        }
        for &day in &self.monthly_days {
            if !(1..=31).contains(&day) {
                return Err(ValidationError::MonthlyDayOutOfRange(day));
            }
        }
        for &month in &self.monthly_months {
            if !(1..=12).contains(&month) {
                return Err(ValidationError::MonthlyMonthOutOfRange(month));
            }
        }
        Ok(())
    }

    /// Return a projected copy with `patch` overlaid.
    ///
    /// The stored habit is never mutated; projection is display-only.
    pub fn apply_patch(&self, patch: &HabitPatch) -> Habit {
        let mut projected = self.clone();
        if let Some(name) = &patch.name {
            projected.name = name.clone();
        }
        if let Some(category) = &patch.category {
            projected.category = category.clone();
        }
        if let Some(target) = patch.target {
            projected.target = target;
        }
        if let Some(unit) = &patch.unit {
            projected.unit = unit.clone();
        }
        projected
    }
}

/// Shallow field overlay for a single date's projection of a habit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.target.is_none()
            && self.unit.is_none()
    }

    /// Shallow-merge `other` on top of `self`; later fields win.
    pub fn merge(&mut self, other: &HabitPatch) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.category.is_some() {
            self.category = other.category.clone();
        }
        if other.target.is_some() {
            self.target = other.target;
        }
        if other.unit.is_some() {
            self.unit = other.unit.clone();
        }
    }
}

/// A per-date exception layered atop a habit without mutating it.
///
/// Natural key (habit_id, date). `hidden` suppresses the habit for that
/// date only; `patch` adjusts the projected view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOverride {
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub hidden: bool,
    #[serde(default)]
    pub patch: HabitPatch,
}

/// One completion record per (habit, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub habit_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub completed_amount: u32,
    pub completed: bool,
    pub note: Option<String>,
}
