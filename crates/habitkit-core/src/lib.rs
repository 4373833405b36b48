//! # Habitkit Core Library
//!
//! This library provides the core business logic for the Habitkit habit
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI or HTTP surface
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Recurrence**: Pure calendar resolution deciding which habits occur
//!   on which dates, with per-date hide/patch overrides
//! - **Completion**: One clamped-counter log row per (habit, date)
//! - **Streaks**: Cadence-aware consecutive-completion counting with a
//!   grace rule for today's pending occurrence
//! - **Achievements**: A declarative catalog evaluated idempotently, with
//!   permanent one-shot unlocks
//! - **Storage**: SQLite-based habit/log storage and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`recurrence::habits_for_date`]: Projected schedule for a date
//! - [`completion::complete_habit`]: Log completion plus streak refresh
//! - [`AchievementEngine`]: Catalog evaluation and unlock bookkeeping
//! - [`batch::run_batch`]: The periodic all-users worker pass
//! - [`HabitDb`]: Habit, log, override and unlock persistence
//! - [`Config`]: Application configuration management

pub mod achievement;
pub mod batch;
pub mod completion;
pub mod dashboard;
pub mod error;
pub mod habit;
pub mod notify;
pub mod overrides;
pub mod recurrence;
pub mod storage;
pub mod streak;

pub use achievement::{AchievementCatalog, AchievementDef, AchievementEngine, Criteria, Unlock};
pub use batch::{run_batch, BatchError, BatchReport};
pub use completion::{complete_habit, CompletionInput};
pub use dashboard::{dashboard, DashboardSummary};
pub use error::{CoreError, StoreError, ValidationError};
pub use habit::{CompletionEntry, DayOverride, Frequency, Habit, HabitPatch};
pub use notify::{LogNotifier, Notifier, NullNotifier};
pub use storage::{data_dir, Config, HabitDb};
pub use streak::{StreakSummary, StreakUpdate, STREAK_HORIZON};
