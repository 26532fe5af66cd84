//! # Screenquest Core Library
//!
//! Progression and credit-ledger engine behind Screenquest: logged work,
//! workouts, sleep and habits turn into XP, levels, streaks and a spendable
//! screentime balance. Front ends (the CLI, or any GUI) are thin layers over
//! the same [`Session`].
//!
//! ## Architecture
//!
//! - **Rewards**: static table from difficulty/activity kind to XP and credit
//! - **Ledger**: pure `apply_event(stats, event) -> (stats, outcomes)`
//! - **Habits**: creation, once-per-day completion, streaks, day rollover
//! - **Activity**: append-only log of entries with optional AI analysis
//! - **Assistant**: sleep advisor / workout verifier seams and an HTTP client
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: explicit owner of stats, habits and the activity log
//! - [`apply_event`]: the ledger engine
//! - [`RewardTable`]: reward configuration
//! - [`Config`]: application configuration management

pub mod activity;
pub mod assistant;
pub mod error;
pub mod habits;
pub mod ledger;
pub mod notifier;
pub mod rewards;
pub mod session;
pub mod stats;
pub mod storage;

pub use activity::{ActivityEntry, ActivityLog, ExternalAnalysis, SleepDetail};
pub use assistant::{
    resolve_sleep_advice, resolve_workout, GeminiClient, SleepAdvisor, WorkoutVerification,
    WorkoutVerifier,
};
pub use error::{ConfigError, CoreError, ExternalServiceError, LedgerError};
pub use habits::{DayRollover, Habit, HabitRegistry, HabitState, HabitToggle, MissedDayPolicy};
pub use ledger::{apply_event, apply_events, LedgerEvent, Outcome};
pub use notifier::{Notifier, ToastQueue, TracingNotifier};
pub use rewards::{ActivityKind, Difficulty, RewardTable};
pub use session::{Session, UserAction};
pub use stats::UserStats;
pub use storage::Config;
