//! Append-only log of work, workout and sleep entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assistant::WorkoutVerification;
use crate::error::LedgerError;
use crate::rewards::ActivityKind;

/// Result of an external analysis, attached once the call has resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalAnalysis {
    Advice { text: String },
    Verification(WorkoutVerification),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepDetail {
    pub hours: f64,
    /// 1..=10
    pub quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub label: String,
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepDetail>,
    pub earned_credit_minutes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_analysis: Option<ExternalAnalysis>,
}

impl ActivityEntry {
    pub fn timed(kind: ActivityKind, label: impl Into<String>, minutes: i64, earned: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            label: label.into(),
            duration_minutes: minutes,
            sleep: None,
            earned_credit_minutes: earned,
            external_analysis: None,
        }
    }

    pub fn sleep(hours: f64, quality: u8, earned: u64) -> Self {
        let minutes = if hours.is_finite() {
            (hours * 60.0).floor() as i64
        } else {
            0
        };
        Self {
            sleep: Some(SleepDetail { hours, quality }),
            ..Self::timed(ActivityKind::Sleep, "Sleep", minutes, earned)
        }
    }

    pub fn workout(verification: WorkoutVerification, earned: u64) -> Self {
        let label = if verification.exercise_type.is_empty() {
            "Workout".to_string()
        } else {
            verification.exercise_type.clone()
        };
        Self {
            external_analysis: Some(ExternalAnalysis::Verification(verification)),
            ..Self::timed(ActivityKind::Workout, label, 0, earned)
        }
    }

    pub fn with_advice(mut self, text: impl Into<String>) -> Self {
        self.external_analysis = Some(ExternalAnalysis::Advice { text: text.into() });
        self
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if self.duration_minutes < 0 {
            return Err(LedgerError::InvalidDuration {
                value: self.duration_minutes as f64,
            });
        }
        if let Some(sleep) = &self.sleep {
            validate_sleep(sleep.hours, sleep.quality)?;
        }
        Ok(())
    }
}

/// Hours must be finite and non-negative, quality within 1..=10.
pub fn validate_sleep(hours: f64, quality: u8) -> Result<(), LedgerError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(LedgerError::InvalidDuration { value: hours });
    }
    if !(1..=10).contains(&quality) {
        return Err(LedgerError::InvalidQuality { value: quality });
    }
    Ok(())
}

/// Entries in insertion order. Nothing is ever edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: ActivityEntry) -> Result<(), LedgerError> {
        entry.validate()?;
        tracing::debug!(kind = %entry.kind, earned = entry.earned_credit_minutes, "activity recorded");
        self.entries.push(entry);
        Ok(())
    }

    /// Replay of all entries, oldest first. Each call starts from the
    /// beginning and the iterator itself can be cloned.
    pub fn history(&self) -> impl Iterator<Item = &ActivityEntry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: ActivityKind) -> impl Iterator<Item = &ActivityEntry> + Clone + '_ {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn total_earned_minutes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.earned_credit_minutes)
            .fold(0, u64::saturating_add)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_insertion_ordered_and_restartable() {
        let mut log = ActivityLog::new();
        log.record(ActivityEntry::timed(ActivityKind::Work, "Report", 90, 22))
            .unwrap();
        log.record(ActivityEntry::sleep(7.5, 8, 67)).unwrap();

        let history = log.history();
        let kinds: Vec<_> = history.clone().map(|e| e.kind).collect();
        assert_eq!(kinds, [ActivityKind::Work, ActivityKind::Sleep]);
        assert_eq!(history.count(), 2);
        assert_eq!(log.history().count(), 2);
        assert_eq!(log.total_earned_minutes(), 89);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut log = ActivityLog::new();
        let err = log
            .record(ActivityEntry::timed(ActivityKind::Work, "Oops", -5, 0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDuration { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn sleep_entry_validation() {
        let mut log = ActivityLog::new();
        assert!(matches!(
            log.record(ActivityEntry::sleep(7.0, 0, 0)),
            Err(LedgerError::InvalidQuality { value: 0 })
        ));
        assert!(matches!(
            log.record(ActivityEntry::sleep(f64::NAN, 5, 0)),
            Err(LedgerError::InvalidDuration { .. })
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn sleep_entry_carries_minutes_and_advice() {
        let entry = ActivityEntry::sleep(7.5, 8, 67).with_advice("Go to bed earlier.");
        assert_eq!(entry.duration_minutes, 450);
        assert_eq!(
            entry.external_analysis,
            Some(ExternalAnalysis::Advice {
                text: "Go to bed earlier.".into()
            })
        );
    }
}
