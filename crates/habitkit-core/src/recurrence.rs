//! Recurrence resolution: which habits occur on which calendar dates.
//!
//! Everything in this module is pure and synchronous. A habit's
//! occurrence set is fully determined by its frequency, anchor date and
//! monthly day/month lists; per-date overrides are projected on top
//! without touching the stored habit.

use chrono::{Datelike, Days, NaiveDate};

use crate::habit::{DayOverride, Frequency, Habit};

/// Years the monthly grid walk scans before giving up.
///
/// Bounds impossible grids like months=[2], days=[30], which have no
/// valid calendar date in any year.
const MONTHLY_SCAN_YEARS: i32 = 8;

/// Whether `habit` is scheduled on `date`.
///
/// Dates before the anchor are never scheduled. `custom` frequency is
/// reserved and resolves to false.
pub fn is_scheduled(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.created_at {
        return false;
    }
    match habit.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => date.weekday() == habit.created_at.weekday(),
        Frequency::Monthly => month_matches(habit, date.month()) && day_matches(habit, date.day()),
        Frequency::Custom => false,
    }
}

/// Empty month list anchors to the creation month.
fn month_matches(habit: &Habit, month: u32) -> bool {
    if habit.monthly_months.is_empty() {
        month == habit.created_at.month()
    } else {
        habit.monthly_months.contains(&month)
    }
}

/// Empty day list anchors to the creation day-of-month.
fn day_matches(habit: &Habit, day: u32) -> bool {
    if habit.monthly_days.is_empty() {
        day == habit.created_at.day()
    } else {
        habit.monthly_days.contains(&day)
    }
}

/// Project the habits scheduled on `date`, honoring overrides.
///
/// Habits with a hidden override for that date are dropped; patch
/// overrides are merged into the returned copies only. Input order is
/// preserved.
pub fn habits_for_date(
    habits: &[Habit],
    overrides: &[DayOverride],
    date: NaiveDate,
) -> Vec<Habit> {
    habits
        .iter()
        .filter(|habit| is_scheduled(habit, date))
        .filter_map(|habit| {
            let ov = overrides
                .iter()
                .find(|o| o.habit_id == habit.id && o.date == date);
            match ov {
                Some(o) if o.hidden => None,
                Some(o) => Some(habit.apply_patch(&o.patch)),
                None => Some(habit.clone()),
            }
        })
        .collect()
}

/// The latest scheduled occurrence at or before `date`, if any.
pub fn most_recent_occurrence(habit: &Habit, date: NaiveDate) -> Option<NaiveDate> {
    if is_scheduled(habit, date) {
        Some(date)
    } else {
        previous_occurrence(habit, date)
    }
}

/// The scheduled occurrence strictly before `date`, stepping by the
/// habit's cadence. None once the walk crosses the anchor date.
pub fn previous_occurrence(habit: &Habit, date: NaiveDate) -> Option<NaiveDate> {
    let prev = match habit.frequency {
        Frequency::Daily => date.pred_opt()?,
        Frequency::Weekly => {
            // step to the anchor weekday, a full week when already on it
            let anchor = habit.created_at.weekday().num_days_from_monday();
            let current = date.weekday().num_days_from_monday();
            let back = match (current + 7 - anchor) % 7 {
                0 => 7,
                n => n,
            };
            date.checked_sub_days(Days::new(u64::from(back)))?
        }
        Frequency::Monthly => previous_monthly(habit, date)?,
        Frequency::Custom => return None,
    };
    (prev >= habit.created_at).then_some(prev)
}

/// Walk the (month, day) candidate grid backward from `date`.
///
/// Candidates that do not exist on the calendar (e.g. April 31) are
/// skipped; the scan is bounded to [`MONTHLY_SCAN_YEARS`].
fn previous_monthly(habit: &Habit, date: NaiveDate) -> Option<NaiveDate> {
    let mut months: Vec<u32> = if habit.monthly_months.is_empty() {
        vec![habit.created_at.month()]
    } else {
        habit.monthly_months.clone()
    };
    let mut days: Vec<u32> = if habit.monthly_days.is_empty() {
        vec![habit.created_at.day()]
    } else {
        habit.monthly_days.clone()
    };
    months.sort_unstable();
    months.dedup();
    days.sort_unstable();
    days.dedup();

    for year in (date.year() - MONTHLY_SCAN_YEARS..=date.year()).rev() {
        for &month in months.iter().rev() {
            for &day in days.iter().rev() {
                if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
                    if candidate < date {
                        return Some(candidate);
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitPatch;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(frequency: Frequency, created: NaiveDate) -> Habit {
        Habit::new("user-1", "Test habit", "general", frequency, 1, "", created)
    }

    #[test]
    fn nothing_scheduled_before_creation() {
        let h = habit(Frequency::Daily, date(2024, 3, 10));
        assert!(!is_scheduled(&h, date(2024, 3, 9)));
        assert!(is_scheduled(&h, date(2024, 3, 10)));
    }

    #[test]
    fn weekly_matches_creation_weekday() {
        // 2024-01-01 is a Monday
        let h = habit(Frequency::Weekly, date(2024, 1, 1));
        assert!(is_scheduled(&h, date(2024, 1, 8)));
        assert!(!is_scheduled(&h, date(2024, 1, 9)));
    }

    #[test]
    fn monthly_defaults_anchor_to_creation() {
        let h = habit(Frequency::Monthly, date(2024, 3, 15));
        assert!(is_scheduled(&h, date(2025, 3, 15)));
        assert!(!is_scheduled(&h, date(2025, 3, 16)));
        assert!(!is_scheduled(&h, date(2025, 4, 15)));
    }

    #[test]
    fn monthly_explicit_lists() {
        let mut h = habit(Frequency::Monthly, date(2023, 12, 1));
        h.monthly_months = vec![1, 6];
        h.monthly_days = vec![15];
        assert!(is_scheduled(&h, date(2024, 6, 15)));
        assert!(!is_scheduled(&h, date(2024, 6, 16)));
        assert!(!is_scheduled(&h, date(2024, 7, 15)));
    }

    #[test]
    fn custom_never_schedules() {
        let h = habit(Frequency::Custom, date(2024, 1, 1));
        assert!(!is_scheduled(&h, date(2024, 1, 1)));
        assert!(previous_occurrence(&h, date(2024, 6, 1)).is_none());
    }

    #[test]
    fn previous_occurrence_daily_and_weekly() {
        let daily = habit(Frequency::Daily, date(2024, 1, 1));
        assert_eq!(
            previous_occurrence(&daily, date(2024, 1, 3)),
            Some(date(2024, 1, 2))
        );
        assert_eq!(previous_occurrence(&daily, date(2024, 1, 1)), None);

        let weekly = habit(Frequency::Weekly, date(2024, 1, 1));
        assert_eq!(
            previous_occurrence(&weekly, date(2024, 1, 15)),
            Some(date(2024, 1, 8))
        );
    }

    #[test]
    fn previous_occurrence_monthly_grid() {
        let mut h = habit(Frequency::Monthly, date(2023, 1, 1));
        h.monthly_months = vec![1, 6];
        h.monthly_days = vec![15];
        assert_eq!(
            previous_occurrence(&h, date(2024, 6, 15)),
            Some(date(2024, 1, 15))
        );
        assert_eq!(
            previous_occurrence(&h, date(2024, 8, 1)),
            Some(date(2024, 6, 15))
        );
        // crosses the year boundary
        assert_eq!(
            previous_occurrence(&h, date(2024, 1, 15)),
            Some(date(2023, 6, 15))
        );
    }

    #[test]
    fn previous_occurrence_skips_invalid_calendar_dates() {
        let mut h = habit(Frequency::Monthly, date(2023, 1, 1));
        h.monthly_days = vec![31];
        h.monthly_months = vec![2, 3];
        // February 31st never exists; the walk lands on March 31st of the prior year
        assert_eq!(
            previous_occurrence(&h, date(2024, 3, 31)),
            Some(date(2023, 3, 31))
        );
    }

    #[test]
    fn impossible_monthly_grid_terminates() {
        let mut h = habit(Frequency::Monthly, date(2000, 1, 1));
        h.monthly_months = vec![2];
        h.monthly_days = vec![30];
        assert_eq!(previous_occurrence(&h, date(2024, 5, 1)), None);
    }

    #[test]
    fn most_recent_occurrence_steps_back_off_schedule_dates() {
        let weekly = habit(Frequency::Weekly, date(2024, 1, 1));
        assert_eq!(
            most_recent_occurrence(&weekly, date(2024, 1, 10)),
            Some(date(2024, 1, 8))
        );
        assert_eq!(
            most_recent_occurrence(&weekly, date(2024, 1, 8)),
            Some(date(2024, 1, 8))
        );
    }

    #[test]
    fn habits_for_date_filters_and_projects() {
        let a = habit(Frequency::Daily, date(2024, 1, 1));
        let b = habit(Frequency::Daily, date(2024, 1, 1));
        let c = habit(Frequency::Weekly, date(2024, 1, 1));
        let target = date(2024, 1, 10); // Wednesday: weekly habit off-schedule

        let hide_b = DayOverride {
            habit_id: b.id.clone(),
            user_id: "user-1".into(),
            date: target,
            hidden: true,
            patch: HabitPatch::default(),
        };
        let rename_a = DayOverride {
            habit_id: a.id.clone(),
            user_id: "user-1".into(),
            date: target,
            hidden: false,
            patch: HabitPatch {
                name: Some("Projected".into()),
                ..Default::default()
            },
        };

        let habits = vec![a.clone(), b.clone(), c];
        let projected = habits_for_date(&habits, &[hide_b, rename_a], target);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].id, a.id);
        assert_eq!(projected[0].name, "Projected");
        // base habit list is untouched
        assert_eq!(habits[0].name, "Test habit");
    }

    #[test]
    fn override_isolation_other_dates_unaffected() {
        let h = habit(Frequency::Daily, date(2024, 1, 1));
        let hidden = DayOverride {
            habit_id: h.id.clone(),
            user_id: "user-1".into(),
            date: date(2024, 1, 10),
            hidden: true,
            patch: HabitPatch::default(),
        };
        let habits = vec![h];
        let overrides = vec![hidden];
        assert!(habits_for_date(&habits, &overrides, date(2024, 1, 10)).is_empty());
        assert_eq!(habits_for_date(&habits, &overrides, date(2024, 1, 11)).len(), 1);
        assert_eq!(habits_for_date(&habits, &overrides, date(2024, 1, 9)).len(), 1);
    }

    proptest! {
        #[test]
        fn daily_scheduled_on_every_date_after_creation(offset in 0u64..3650) {
            let h = habit(Frequency::Daily, date(2020, 6, 1));
            let d = date(2020, 6, 1).checked_add_days(Days::new(offset)).unwrap();
            prop_assert!(is_scheduled(&h, d));
        }

        #[test]
        fn weekly_scheduled_iff_weekday_matches(offset in 0u64..3650) {
            let created = date(2020, 6, 1);
            let h = habit(Frequency::Weekly, created);
            let d = created.checked_add_days(Days::new(offset)).unwrap();
            prop_assert_eq!(is_scheduled(&h, d), d.weekday() == created.weekday());
        }

        #[test]
        fn previous_occurrence_is_scheduled_and_earlier(offset in 1u64..3650) {
            let created = date(2020, 6, 1);
            let h = habit(Frequency::Weekly, created);
            let d = created.checked_add_days(Days::new(offset)).unwrap();
            if let Some(prev) = previous_occurrence(&h, d) {
                prop_assert!(prev < d);
                prop_assert!(is_scheduled(&h, prev));
            }
        }
    }
}
