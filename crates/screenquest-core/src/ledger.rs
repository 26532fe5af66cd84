//! Ledger engine: applies a ledger event to a stats snapshot.
//!
//! Application is pure. The input snapshot is never modified; callers get a
//! new snapshot plus the [`Outcome`] notices describing what happened, and
//! decide themselves what to notify or persist.
//!
//! ## Level rollover
//!
//! ```text
//! xp += amount
//! while xp >= xp_to_next_level:
//!     xp -= xp_to_next_level
//!     level += 1
//!     xp_to_next_level = floor(xp_to_next_level * 1.2)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;
use crate::rewards::{ActivityKind, RewardTable};
use crate::stats::{UserStats, DAILY_GOAL_MAX};

/// Input to the ledger engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// Minutes of effort, converted to credit through the reward table.
    LogActivity { kind: ActivityKind, minutes: i64 },
    AwardXp { amount: i64, reason: String },
    DepositCredit { minutes: i64 },
}

impl LedgerEvent {
    pub fn award_xp(amount: u64, reason: impl Into<String>) -> Self {
        LedgerEvent::AwardXp {
            amount: amount.min(i64::MAX as u64) as i64,
            reason: reason.into(),
        }
    }

    pub fn deposit(minutes: u64) -> Self {
        LedgerEvent::DepositCredit {
            minutes: minutes.min(i64::MAX as u64) as i64,
        }
    }
}

/// Notice describing a side effect of a ledger application.
///
/// Outcomes are for notification only; nothing downstream may feed them back
/// into the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outcome {
    XpGained { amount: u64, reason: String },
    LevelUp { new_level: u32 },
    CreditDeposited { minutes: u64 },
}

impl Outcome {
    /// Toast text for this outcome.
    pub fn message(&self) -> String {
        match self {
            Outcome::XpGained { amount, reason } if reason.is_empty() => format!("+{amount} XP"),
            Outcome::XpGained { amount, reason } => format!("+{amount} XP: {reason}"),
            Outcome::LevelUp { new_level } => format!("Level up! You reached level {new_level}"),
            Outcome::CreditDeposited { minutes } => format!("Deposited {minutes}m Leisure Credit"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Threshold for the level after one with threshold `current`.
///
/// `floor(current * 1.2)`, computed in integers. Thresholds below 5 would not
/// grow under that rule, so growth is at least one point.
pub fn next_threshold(current: u64) -> u64 {
    let scaled = (current as u128 * 6) / 5;
    let scaled = scaled.min(u64::MAX as u128) as u64;
    scaled.max(current.saturating_add(1))
}

/// Apply one event to `stats`.
///
/// On error the caller's snapshot is untouched and no outcome is produced.
pub fn apply_event(
    stats: &UserStats,
    event: &LedgerEvent,
    rewards: &RewardTable,
) -> Result<(UserStats, Vec<Outcome>), LedgerError> {
    stats.validate()?;
    let mut next = stats.clone();
    let mut outcomes = Vec::new();

    match event {
        LedgerEvent::AwardXp { amount, reason } => {
            let amount = non_negative(*amount, "xp")?;
            award_xp(&mut next, amount, reason, &mut outcomes)?;
        }
        LedgerEvent::DepositCredit { minutes } => {
            let minutes = non_negative(*minutes, "minutes")?;
            deposit(&mut next, minutes)?;
            outcomes.push(Outcome::CreditDeposited { minutes });
        }
        LedgerEvent::LogActivity { kind, minutes } => {
            if *minutes < 0 {
                return Err(LedgerError::InvalidDuration {
                    value: *minutes as f64,
                });
            }
            let minutes = *minutes as u64;
            let earned = rewards.credit_for(*kind, minutes);
            deposit(&mut next, earned)?;

            let goal_step = (earned / 2).min(DAILY_GOAL_MAX as u64) as u32;
            next.daily_goal_progress = (next.daily_goal_progress + goal_step).min(DAILY_GOAL_MAX);
            if *kind == ActivityKind::Work {
                next.total_work_minutes = next
                    .total_work_minutes
                    .checked_add(minutes)
                    .ok_or(LedgerError::Overflow {
                        field: "total_work_minutes",
                    })?;
            }
            outcomes.push(Outcome::CreditDeposited { minutes: earned });
        }
    }

    tracing::debug!(
        ?event,
        level = next.level,
        xp = next.xp,
        balance = next.screentime_balance_minutes,
        "ledger event applied"
    );
    Ok((next, outcomes))
}

/// Apply events in order, all or nothing.
pub fn apply_events(
    stats: &UserStats,
    events: &[LedgerEvent],
    rewards: &RewardTable,
) -> Result<(UserStats, Vec<Outcome>), LedgerError> {
    let mut current = stats.clone();
    let mut outcomes = Vec::new();
    for event in events {
        let (next, mut produced) = apply_event(&current, event, rewards)?;
        current = next;
        outcomes.append(&mut produced);
    }
    Ok((current, outcomes))
}

fn non_negative(value: i64, field: &'static str) -> Result<u64, LedgerError> {
    if value < 0 {
        return Err(LedgerError::InvalidAmount { field, value });
    }
    Ok(value as u64)
}

fn deposit(stats: &mut UserStats, minutes: u64) -> Result<(), LedgerError> {
    stats.screentime_balance_minutes = stats
        .screentime_balance_minutes
        .checked_add(minutes)
        .ok_or(LedgerError::Overflow {
            field: "screentime_balance_minutes",
        })?;
    Ok(())
}

/// Level-up messages take precedence: `XpGained` is only emitted when the
/// award crossed no threshold.
fn award_xp(
    stats: &mut UserStats,
    amount: u64,
    reason: &str,
    outcomes: &mut Vec<Outcome>,
) -> Result<(), LedgerError> {
    let mut xp = stats.xp.checked_add(amount).ok_or(LedgerError::Overflow { field: "xp" })?;
    let mut leveled = false;

    while xp >= stats.xp_to_next_level {
        xp -= stats.xp_to_next_level;
        stats.level = stats
            .level
            .checked_add(1)
            .ok_or(LedgerError::Overflow { field: "level" })?;
        stats.xp_to_next_level = next_threshold(stats.xp_to_next_level);
        leveled = true;
        tracing::info!(level = stats.level, next = stats.xp_to_next_level, "level up");
        outcomes.push(Outcome::LevelUp {
            new_level: stats.level,
        });
    }
    stats.xp = xp;

    if !leveled {
        outcomes.push(Outcome::XpGained {
            amount,
            reason: reason.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_450_of_1000() -> UserStats {
        UserStats {
            xp: 450,
            ..UserStats::at_level(5, 1000)
        }
    }

    #[test]
    fn award_crossing_one_threshold() {
        let table = RewardTable::default();
        let (next, outcomes) =
            apply_event(&stats_450_of_1000(), &LedgerEvent::award_xp(650, "bonus"), &table).unwrap();
        assert_eq!(next.level, 6);
        assert_eq!(next.xp, 100);
        assert_eq!(next.xp_to_next_level, 1200);
        assert_eq!(outcomes, vec![Outcome::LevelUp { new_level: 6 }]);
    }

    #[test]
    fn award_crossing_several_thresholds() {
        let table = RewardTable::default();
        // 1000 + 1200 + 1440 = 3640 needed to reach level 4 from level 1.
        let (next, outcomes) = apply_event(
            &UserStats::at_level(1, 1000),
            &LedgerEvent::award_xp(3700, "marathon"),
            &table,
        )
        .unwrap();
        assert_eq!(next.level, 4);
        assert_eq!(next.xp, 60);
        assert_eq!(next.xp_to_next_level, 1728);
        assert_eq!(
            outcomes,
            vec![
                Outcome::LevelUp { new_level: 2 },
                Outcome::LevelUp { new_level: 3 },
                Outcome::LevelUp { new_level: 4 },
            ]
        );
    }

    #[test]
    fn award_below_threshold_emits_xp_gained() {
        let table = RewardTable::default();
        let (next, outcomes) =
            apply_event(&stats_450_of_1000(), &LedgerEvent::award_xp(50, "Meditation"), &table)
                .unwrap();
        assert_eq!(next.xp, 500);
        assert_eq!(next.level, 5);
        assert_eq!(
            outcomes,
            vec![Outcome::XpGained {
                amount: 50,
                reason: "Meditation".into()
            }]
        );
    }

    #[test]
    fn exact_threshold_rolls_over_to_zero() {
        let table = RewardTable::default();
        let (next, _) =
            apply_event(&stats_450_of_1000(), &LedgerEvent::award_xp(550, ""), &table).unwrap();
        assert_eq!(next.xp, 0);
        assert_eq!(next.level, 6);
    }

    #[test]
    fn log_workout_deposits_floored_credit() {
        let table = RewardTable::default();
        let event = LedgerEvent::LogActivity {
            kind: ActivityKind::Workout,
            minutes: 40,
        };
        let (next, outcomes) = apply_event(&UserStats::default(), &event, &table).unwrap();
        assert_eq!(next.screentime_balance_minutes, 20);
        assert_eq!(next.daily_goal_progress, 10);
        assert_eq!(next.total_work_minutes, 0);
        assert_eq!(outcomes, vec![Outcome::CreditDeposited { minutes: 20 }]);
    }

    #[test]
    fn log_work_accumulates_minutes_and_clamps_goal() {
        let table = RewardTable::default();
        let stats = UserStats {
            daily_goal_progress: 95,
            ..UserStats::default()
        };
        let event = LedgerEvent::LogActivity {
            kind: ActivityKind::Work,
            minutes: 120,
        };
        let (next, _) = apply_event(&stats, &event, &table).unwrap();
        assert_eq!(next.screentime_balance_minutes, 30);
        assert_eq!(next.daily_goal_progress, 100);
        assert_eq!(next.total_work_minutes, 120);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let table = RewardTable::default();
        let stats = UserStats::default();
        assert_eq!(
            apply_event(&stats, &LedgerEvent::DepositCredit { minutes: -1 }, &table),
            Err(LedgerError::InvalidAmount {
                field: "minutes",
                value: -1
            })
        );
        assert!(matches!(
            apply_event(
                &stats,
                &LedgerEvent::LogActivity {
                    kind: ActivityKind::Work,
                    minutes: -30
                },
                &table
            ),
            Err(LedgerError::InvalidDuration { .. })
        ));
        assert!(matches!(
            apply_event(
                &stats,
                &LedgerEvent::AwardXp {
                    amount: -10,
                    reason: String::new()
                },
                &table
            ),
            Err(LedgerError::InvalidAmount { field: "xp", .. })
        ));
    }

    #[test]
    fn zero_threshold_snapshot_is_rejected() {
        let table = RewardTable::default();
        let result = apply_event(
            &UserStats::at_level(3, 0),
            &LedgerEvent::award_xp(10, ""),
            &table,
        );
        assert!(matches!(result, Err(LedgerError::InvalidStats { .. })));
    }

    #[test]
    fn snapshot_past_threshold_is_rejected_for_every_event() {
        let table = RewardTable::default();
        let stats = UserStats {
            xp: 5000,
            ..UserStats::default()
        };
        for event in [
            LedgerEvent::deposit(10),
            LedgerEvent::LogActivity {
                kind: ActivityKind::Work,
                minutes: 60,
            },
            LedgerEvent::award_xp(1, ""),
        ] {
            assert!(matches!(
                apply_event(&stats, &event, &table),
                Err(LedgerError::InvalidStats { .. })
            ));
        }
    }

    #[test]
    fn apply_events_is_all_or_nothing() {
        let table = RewardTable::default();
        let events = vec![
            LedgerEvent::deposit(10),
            LedgerEvent::DepositCredit { minutes: -3 },
        ];
        assert!(apply_events(&UserStats::default(), &events, &table).is_err());
    }

    #[test]
    fn threshold_growth() {
        assert_eq!(next_threshold(1000), 1200);
        assert_eq!(next_threshold(1001), 1201);
        assert_eq!(next_threshold(3), 4);
        assert_eq!(next_threshold(u64::MAX), u64::MAX);
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            Outcome::CreditDeposited { minutes: 20 }.message(),
            "Deposited 20m Leisure Credit"
        );
        assert_eq!(
            Outcome::LevelUp { new_level: 6 }.to_string(),
            "Level up! You reached level 6"
        );
    }
}
