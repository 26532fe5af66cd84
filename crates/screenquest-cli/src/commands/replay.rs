//! Replay a scripted sequence of user actions against a fresh session.
//!
//! Habits are referenced by name so scripts can be written by hand:
//!
//! ```json
//! [
//!   { "action": "create_habit", "name": "Cold Shower", "difficulty": "hard" },
//!   { "action": "toggle_habit", "habit": "Cold Shower" },
//!   { "action": "log_activity", "kind": "WORKOUT", "minutes": 40 },
//!   { "action": "new_day" }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use screenquest_core::{
    ActivityEntry, ActivityKind, Difficulty, Habit, LedgerError, Notifier, Session, ToastQueue,
    UserAction, UserStats, WorkoutVerification,
};

use super::load_config;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ScriptStep {
    CreateHabit {
        name: String,
        #[serde(default)]
        difficulty: Difficulty,
    },
    ToggleHabit {
        habit: String,
    },
    UncompleteHabit {
        habit: String,
    },
    LogActivity {
        kind: ActivityKind,
        minutes: i64,
        #[serde(default)]
        label: Option<String>,
    },
    LogSleep {
        hours: f64,
        quality: u8,
        #[serde(default)]
        advice: Option<String>,
    },
    WorkoutVerified {
        verification: WorkoutVerification,
    },
    NewDay,
}

#[derive(Debug, Serialize)]
struct Rejected {
    step: usize,
    error: String,
}

#[derive(Debug, Serialize)]
struct ReplayReport<'a> {
    stats: &'a UserStats,
    habits: Vec<&'a Habit>,
    history: Vec<&'a ActivityEntry>,
    messages: Vec<String>,
    rejected: Vec<Rejected>,
}

fn habit_id(session: &Session, name: &str) -> Result<String, LedgerError> {
    session
        .habits()
        .find_by_name(name)
        .map(|h| h.id.clone())
        .ok_or_else(|| LedgerError::HabitNotFound { id: name.to_string() })
}

fn to_action(session: &Session, step: ScriptStep) -> Result<UserAction, LedgerError> {
    let action = match step {
        ScriptStep::CreateHabit { name, difficulty } => UserAction::CreateHabit { name, difficulty },
        ScriptStep::ToggleHabit { habit } => UserAction::ToggleHabit {
            id: habit_id(session, &habit)?,
        },
        ScriptStep::UncompleteHabit { habit } => UserAction::UncompleteHabit {
            id: habit_id(session, &habit)?,
        },
        ScriptStep::LogActivity { kind, minutes, label } => UserAction::LogActivity { kind, minutes, label },
        ScriptStep::LogSleep { hours, quality, advice } => UserAction::LogSleep { hours, quality, advice },
        ScriptStep::WorkoutVerified { verification } => UserAction::WorkoutVerified { verification },
        ScriptStep::NewDay => UserAction::NewDay,
    };
    Ok(action)
}

pub fn run(script: &Path, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let content = std::fs::read_to_string(script)
        .map_err(|e| format!("cannot read script {}: {e}", script.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&content)?;

    let mut session = Session::from_config(&config);
    let toasts = ToastQueue::new();
    let mut rejected = Vec::new();

    for (index, step) in steps.into_iter().enumerate() {
        let result = to_action(&session, step).and_then(|action| session.dispatch(action));
        match result {
            Ok(outcomes) => toasts.notify_all(&outcomes),
            Err(e) => {
                tracing::warn!(step = index, error = %e, "script step rejected");
                rejected.push(Rejected {
                    step: index,
                    error: e.to_string(),
                });
            }
        }
    }

    let report = ReplayReport {
        stats: session.stats(),
        habits: session.habits().list().collect(),
        history: session.activity().history().collect(),
        messages: toasts.drain(),
        rejected,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
