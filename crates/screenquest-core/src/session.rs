//! Session: the explicit owner of one user's progression state.
//!
//! Every user action maps onto ledger events one to one. State is committed
//! only after the whole action succeeded, so a rejected action leaves the
//! session exactly as it was.

use serde::{Deserialize, Serialize};

use crate::activity::{validate_sleep, ActivityEntry, ActivityLog};
use crate::assistant::WorkoutVerification;
use crate::error::LedgerError;
use crate::habits::{DayRollover, Habit, HabitRegistry, MissedDayPolicy};
use crate::ledger::{apply_event, apply_events, LedgerEvent, Outcome};
use crate::rewards::{ActivityKind, Difficulty, RewardTable};
use crate::stats::UserStats;
use crate::storage::Config;

/// One call site of the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    CreateHabit {
        name: String,
        #[serde(default)]
        difficulty: Difficulty,
    },
    ToggleHabit {
        id: String,
    },
    UncompleteHabit {
        id: String,
    },
    LogActivity {
        kind: ActivityKind,
        minutes: i64,
        #[serde(default)]
        label: Option<String>,
    },
    /// Sleep log with the advisor's already-resolved text.
    LogSleep {
        hours: f64,
        quality: u8,
        #[serde(default)]
        advice: Option<String>,
    },
    /// Resolved workout verification.
    WorkoutVerified {
        verification: WorkoutVerification,
    },
    NewDay,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    stats: UserStats,
    habits: HabitRegistry,
    activity: ActivityLog,
    rewards: RewardTable,
    missed_day_policy: MissedDayPolicy,
}

impl Session {
    pub fn new(stats: UserStats, rewards: RewardTable) -> Self {
        Self {
            stats,
            rewards,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            missed_day_policy: config.streaks.missed_day,
            ..Self::new(config.progression.starting_stats(), config.rewards.clone())
        }
    }

    pub fn with_missed_day_policy(mut self, policy: MissedDayPolicy) -> Self {
        self.missed_day_policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn habits(&self) -> &HabitRegistry {
        &self.habits
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    /// Entries handed to the sleep advisor as history.
    pub fn sleep_history(&self) -> Vec<ActivityEntry> {
        self.activity.of_kind(ActivityKind::Sleep).cloned().collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn dispatch(&mut self, action: UserAction) -> Result<Vec<Outcome>, LedgerError> {
        match action {
            UserAction::CreateHabit { name, difficulty } => {
                self.create_habit(&name, difficulty)?;
                Ok(Vec::new())
            }
            UserAction::ToggleHabit { id } => self.toggle_habit(&id),
            UserAction::UncompleteHabit { id } => {
                self.uncomplete_habit(&id)?;
                Ok(Vec::new())
            }
            UserAction::LogActivity {
                kind,
                minutes,
                label,
            } => self.log_activity(kind, minutes, label.as_deref()),
            UserAction::LogSleep {
                hours,
                quality,
                advice,
            } => self.log_sleep(hours, quality, advice),
            UserAction::WorkoutVerified { verification } => self.apply_workout(verification),
            UserAction::NewDay => {
                self.start_new_day();
                Ok(Vec::new())
            }
        }
    }

    pub fn create_habit(&mut self, name: &str, difficulty: Difficulty) -> Result<Habit, LedgerError> {
        self.habits.create(name, difficulty, &self.rewards)
    }

    pub fn toggle_habit(&mut self, id: &str) -> Result<Vec<Outcome>, LedgerError> {
        let toggle = self.habits.toggle_complete(id, &self.stats, &self.rewards)?;
        self.stats = toggle.stats;
        Ok(toggle.outcomes)
    }

    pub fn uncomplete_habit(&mut self, id: &str) -> Result<Habit, LedgerError> {
        self.habits.uncomplete(id)
    }

    pub fn log_activity(
        &mut self,
        kind: ActivityKind,
        minutes: i64,
        label: Option<&str>,
    ) -> Result<Vec<Outcome>, LedgerError> {
        let (stats, outcomes) =
            apply_event(&self.stats, &LedgerEvent::LogActivity { kind, minutes }, &self.rewards)?;

        let earned = self.rewards.credit_for(kind, minutes as u64);
        let label = label.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(kind.label());
        self.activity
            .record(ActivityEntry::timed(kind, label, minutes, earned))?;
        self.stats = stats;
        Ok(outcomes)
    }

    /// Flat sleep XP plus credit for the minutes slept. The advice is stored
    /// on the entry and has no effect on rewards.
    pub fn log_sleep(
        &mut self,
        hours: f64,
        quality: u8,
        advice: Option<String>,
    ) -> Result<Vec<Outcome>, LedgerError> {
        validate_sleep(hours, quality)?;
        let minutes = (hours * 60.0).floor() as i64;

        let events = [
            LedgerEvent::award_xp(self.rewards.sleep_xp, "Sleep logged"),
            LedgerEvent::LogActivity {
                kind: ActivityKind::Sleep,
                minutes,
            },
        ];
        let (stats, outcomes) = apply_events(&self.stats, &events, &self.rewards)?;

        let earned = self.rewards.credit_for(ActivityKind::Sleep, minutes as u64);
        let mut entry = ActivityEntry::sleep(hours, quality, earned);
        if let Some(advice) = advice {
            entry = entry.with_advice(advice);
        }
        self.activity.record(entry)?;
        self.stats = stats;
        Ok(outcomes)
    }

    /// Apply a resolved verification. Unverified results change nothing.
    pub fn apply_workout(
        &mut self,
        verification: WorkoutVerification,
    ) -> Result<Vec<Outcome>, LedgerError> {
        if !verification.verified {
            tracing::debug!(comment = %verification.comment, "workout not verified; no reward");
            return Ok(Vec::new());
        }

        let minutes = self
            .rewards
            .clamp_workout_credit(verification.screentime_minutes_awarded);
        let events = [
            LedgerEvent::deposit(minutes),
            LedgerEvent::award_xp(
                self.rewards.workout_xp,
                format!("Workout verified: {}", verification.exercise_type),
            ),
        ];
        let (stats, outcomes) = apply_events(&self.stats, &events, &self.rewards)?;

        self.activity
            .record(ActivityEntry::workout(verification, minutes))?;
        self.stats = stats;
        Ok(outcomes)
    }

    /// Close the day for every habit and the global streak.
    pub fn start_new_day(&mut self) -> DayRollover {
        let rollover = self.habits.start_new_day(self.missed_day_policy);

        self.stats.streak_days = if rollover.completed > 0 {
            self.stats.streak_days.saturating_add(1)
        } else {
            self.missed_day_policy.apply(self.stats.streak_days)
        };
        self.stats.daily_goal_progress = 0;

        tracing::info!(
            completed = rollover.completed,
            missed = rollover.missed,
            streak_days = self.stats.streak_days,
            "new day started"
        );
        rollover
    }
}
