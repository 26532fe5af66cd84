//! Reward table: how much XP and screentime credit each kind of effort yields.
//!
//! Lookups are total over the closed [`Difficulty`] and [`ActivityKind`]
//! enums. The default values are the standard table; a custom table can be
//! loaded from the `[rewards]` section of the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Habit difficulty chosen at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Kind of logged effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Work,
    Workout,
    Sleep,
    Habit,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Work => "Work",
            ActivityKind::Workout => "Workout",
            ActivityKind::Sleep => "Sleep",
            ActivityKind::Habit => "Habit",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WORK" => Ok(ActivityKind::Work),
            "WORKOUT" => Ok(ActivityKind::Workout),
            "SLEEP" => Ok(ActivityKind::Sleep),
            "HABIT" => Ok(ActivityKind::Habit),
            other => Err(format!("unknown activity kind: {other}")),
        }
    }
}

/// XP granted on habit completion, per difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyXp {
    #[serde(default = "default_easy_xp")]
    pub easy: u64,
    #[serde(default = "default_medium_xp")]
    pub medium: u64,
    #[serde(default = "default_hard_xp")]
    pub hard: u64,
}

/// Minutes of credit earned per minute of activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditMultipliers {
    #[serde(default = "default_work_multiplier")]
    pub work: f64,
    #[serde(default = "default_workout_multiplier")]
    pub workout: f64,
    #[serde(default = "default_sleep_multiplier")]
    pub sleep: f64,
    #[serde(default = "default_habit_multiplier")]
    pub habit: f64,
}

/// Complete reward configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTable {
    #[serde(default)]
    pub habit_xp: DifficultyXp,
    #[serde(default)]
    pub credit_multiplier: CreditMultipliers,
    /// XP granted for a verified workout capture.
    #[serde(default = "default_workout_xp")]
    pub workout_xp: u64,
    /// Flat XP for submitting a sleep log.
    #[serde(default = "default_sleep_xp")]
    pub sleep_xp: u64,
    /// Credit minutes deposited on each habit completion.
    #[serde(default = "default_habit_credit_bonus")]
    pub habit_credit_bonus: u64,
    /// Upper bound on credit a single workout verification may award.
    #[serde(default = "default_workout_credit_cap")]
    pub workout_credit_cap: u64,
}

fn default_easy_xp() -> u64 {
    10
}
fn default_medium_xp() -> u64 {
    25
}
fn default_hard_xp() -> u64 {
    50
}
fn default_work_multiplier() -> f64 {
    0.25
}
fn default_workout_multiplier() -> f64 {
    0.5
}
fn default_sleep_multiplier() -> f64 {
    0.15
}
fn default_habit_multiplier() -> f64 {
    0.10
}
fn default_workout_xp() -> u64 {
    20
}
fn default_sleep_xp() -> u64 {
    15
}
fn default_habit_credit_bonus() -> u64 {
    10
}
fn default_workout_credit_cap() -> u64 {
    30
}

impl Default for DifficultyXp {
    fn default() -> Self {
        Self {
            easy: default_easy_xp(),
            medium: default_medium_xp(),
            hard: default_hard_xp(),
        }
    }
}

impl Default for CreditMultipliers {
    fn default() -> Self {
        Self {
            work: default_work_multiplier(),
            workout: default_workout_multiplier(),
            sleep: default_sleep_multiplier(),
            habit: default_habit_multiplier(),
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            habit_xp: DifficultyXp::default(),
            credit_multiplier: CreditMultipliers::default(),
            workout_xp: default_workout_xp(),
            sleep_xp: default_sleep_xp(),
            habit_credit_bonus: default_habit_credit_bonus(),
            workout_credit_cap: default_workout_credit_cap(),
        }
    }
}

impl RewardTable {
    /// XP reward for completing a habit of the given difficulty.
    pub fn xp_for(&self, difficulty: Difficulty) -> u64 {
        match difficulty {
            Difficulty::Easy => self.habit_xp.easy,
            Difficulty::Medium => self.habit_xp.medium,
            Difficulty::Hard => self.habit_xp.hard,
        }
    }

    pub fn multiplier(&self, kind: ActivityKind) -> f64 {
        match kind {
            ActivityKind::Work => self.credit_multiplier.work,
            ActivityKind::Workout => self.credit_multiplier.workout,
            ActivityKind::Sleep => self.credit_multiplier.sleep,
            ActivityKind::Habit => self.credit_multiplier.habit,
        }
    }

    /// Credit earned for `minutes` of activity: the floating-point product,
    /// floored.
    pub fn credit_for(&self, kind: ActivityKind, minutes: u64) -> u64 {
        (minutes as f64 * self.multiplier(kind)).floor() as u64
    }

    /// Clamp an externally proposed workout award into `0..=workout_credit_cap`.
    pub fn clamp_workout_credit(&self, proposed: i64) -> u64 {
        let cap = self.workout_credit_cap.min(i64::MAX as u64) as i64;
        proposed.clamp(0, cap) as u64
    }

    /// Check that every multiplier is finite and non-negative and every
    /// habit reward is positive.
    pub fn validate(&self) -> Result<(), String> {
        let m = &self.credit_multiplier;
        for (name, value) in [
            ("work", m.work),
            ("workout", m.workout),
            ("sleep", m.sleep),
            ("habit", m.habit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("credit_multiplier.{name} must be a non-negative number"));
            }
        }
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            if self.xp_for(difficulty) == 0 {
                return Err(format!("habit_xp.{difficulty} must be greater than zero"));
            }
        }
        Ok(())
    }
}
