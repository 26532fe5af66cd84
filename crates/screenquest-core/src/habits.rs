//! Habit registry: creation, daily completion and streak bookkeeping.
//!
//! ## State Transitions
//!
//! ```text
//! Pending --toggle_complete--> CompletedToday   (rewards fire once per day)
//! CompletedToday --uncomplete--> Pending        (no side effects)
//! CompletedToday --new day--> Pending           (streak kept)
//! Pending --new day--> Pending                  (streak reset/decremented)
//! ```
//!
//! A habit that was rewarded and then un-completed can be completed again the
//! same day, but the second completion pays nothing. At the day boundary it
//! still counts as completed.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::{apply_events, LedgerEvent, Outcome};
use crate::rewards::{Difficulty, RewardTable};
use crate::stats::UserStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitState {
    Pending,
    CompletedToday,
}

/// What happens to a streak when a day ends without a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissedDayPolicy {
    /// Streak drops to zero.
    #[default]
    Reset,
    /// Streak loses one day.
    Decrement,
}

impl MissedDayPolicy {
    pub fn apply(&self, streak: u32) -> u32 {
        match self {
            MissedDayPolicy::Reset => 0,
            MissedDayPolicy::Decrement => streak.saturating_sub(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub completed_today: bool,
    /// Set by the first completion of the day and cleared only by
    /// [`HabitRegistry::start_new_day`].
    #[serde(default)]
    pub rewarded_today: bool,
    pub streak: u32,
    /// Fixed at creation from the reward table.
    pub xp_reward: u64,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn state(&self) -> HabitState {
        if self.completed_today {
            HabitState::CompletedToday
        } else {
            HabitState::Pending
        }
    }
}

/// Result of a completion attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitToggle {
    pub habit: Habit,
    pub stats: UserStats,
    /// Empty when the habit was already completed today.
    pub outcomes: Vec<Outcome>,
}

impl HabitToggle {
    pub fn fired(&self) -> bool {
        !self.outcomes.is_empty()
    }
}

/// Streak change for one habit at a day boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakChange {
    pub habit_id: String,
    pub before: u32,
    pub after: u32,
}

/// Summary of a day rollover across the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRollover {
    pub completed: usize,
    pub missed: usize,
    /// Only habits whose streak actually changed.
    pub streak_changes: Vec<StreakChange>,
}

/// Habits in creation order, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitRegistry {
    habits: IndexMap<String, Habit>,
}

impl HabitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending habit with a fresh id and the table's XP reward.
    pub fn create(
        &mut self,
        name: &str,
        difficulty: Difficulty,
        rewards: &RewardTable,
    ) -> Result<Habit, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }

        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            difficulty,
            completed_today: false,
            rewarded_today: false,
            streak: 0,
            xp_reward: rewards.xp_for(difficulty),
            created_at: Utc::now(),
        };
        tracing::info!(id = %habit.id, name = %habit.name, %difficulty, "habit created");
        self.habits.insert(habit.id.clone(), habit.clone());
        Ok(habit)
    }

    /// Complete a habit for today.
    ///
    /// The first Pending -> CompletedToday transition of a day awards XP, the
    /// credit bonus and a streak day. Calling this on a completed habit
    /// returns it unchanged with no outcomes. Re-completing after an
    /// un-complete marks it completed again without paying out.
    pub fn toggle_complete(
        &mut self,
        id: &str,
        stats: &UserStats,
        rewards: &RewardTable,
    ) -> Result<HabitToggle, LedgerError> {
        let habit = self
            .habits
            .get_mut(id)
            .ok_or_else(|| LedgerError::HabitNotFound { id: id.to_string() })?;

        if habit.completed_today {
            tracing::debug!(id, "habit already completed today");
            return Ok(HabitToggle {
                habit: habit.clone(),
                stats: stats.clone(),
                outcomes: Vec::new(),
            });
        }

        if habit.rewarded_today {
            tracing::debug!(id, "habit already rewarded today, re-marking only");
            habit.completed_today = true;
            return Ok(HabitToggle {
                habit: habit.clone(),
                stats: stats.clone(),
                outcomes: Vec::new(),
            });
        }

        let events = [
            LedgerEvent::award_xp(habit.xp_reward, habit.name.clone()),
            LedgerEvent::deposit(rewards.habit_credit_bonus),
        ];
        let (stats, outcomes) = apply_events(stats, &events, rewards)?;

        habit.completed_today = true;
        habit.rewarded_today = true;
        habit.streak = habit.streak.saturating_add(1);

        Ok(HabitToggle {
            habit: habit.clone(),
            stats,
            outcomes,
        })
    }

    /// Move a completed habit back to pending. XP and credit already granted
    /// stay granted and the streak is left as is.
    pub fn uncomplete(&mut self, id: &str) -> Result<Habit, LedgerError> {
        let habit = self
            .habits
            .get_mut(id)
            .ok_or_else(|| LedgerError::HabitNotFound { id: id.to_string() })?;
        habit.completed_today = false;
        Ok(habit.clone())
    }

    /// Close the current day: habits rewarded today keep their streak, missed
    /// ones go through `policy`, and every habit returns to pending.
    pub fn start_new_day(&mut self, policy: MissedDayPolicy) -> DayRollover {
        let mut rollover = DayRollover::default();
        for habit in self.habits.values_mut() {
            let done = habit.completed_today || habit.rewarded_today;
            habit.completed_today = false;
            habit.rewarded_today = false;
            if done {
                rollover.completed += 1;
                continue;
            }

            rollover.missed += 1;
            let before = habit.streak;
            habit.streak = policy.apply(before);
            if habit.streak != before {
                rollover.streak_changes.push(StreakChange {
                    habit_id: habit.id.clone(),
                    before,
                    after: habit.streak,
                });
            }
        }
        rollover
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.habits.get(id)
    }

    /// First habit whose name matches, ignoring case and surrounding spaces.
    pub fn find_by_name(&self, name: &str) -> Option<&Habit> {
        let wanted = name.trim();
        self.habits
            .values()
            .find(|h| h.name.eq_ignore_ascii_case(wanted))
    }

    /// Habits in creation order.
    pub fn list(&self) -> impl Iterator<Item = &Habit> + '_ {
        self.habits.values()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.habits.values().filter(|h| h.completed_today).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str, difficulty: Difficulty) -> (HabitRegistry, String) {
        let mut registry = HabitRegistry::new();
        let habit = registry
            .create(name, difficulty, &RewardTable::default())
            .unwrap();
        (registry, habit.id)
    }

    #[test]
    fn create_sets_reward_and_pending_state() {
        let (registry, id) = registry_with("  Cold Shower ", Difficulty::Medium);
        let habit = registry.get(&id).unwrap();
        assert_eq!(habit.name, "Cold Shower");
        assert_eq!(habit.xp_reward, 25);
        assert_eq!(habit.streak, 0);
        assert_eq!(habit.state(), HabitState::Pending);
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut registry = HabitRegistry::new();
        let err = registry
            .create("   ", Difficulty::Easy, &RewardTable::default())
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidName);
        assert!(registry.is_empty());
    }

    #[test]
    fn completing_hard_habit_awards_xp_credit_and_streak() {
        let rewards = RewardTable::default();
        let (mut registry, id) = registry_with("Deep Work Block", Difficulty::Hard);
        registry.habits.get_mut(&id).unwrap().streak = 5;

        let stats = UserStats {
            xp: 100,
            ..UserStats::at_level(2, 1200)
        };
        let toggle = registry.toggle_complete(&id, &stats, &rewards).unwrap();

        assert_eq!(toggle.habit.streak, 6);
        assert!(toggle.habit.completed_today);
        assert_eq!(toggle.stats.xp, 150);
        assert_eq!(toggle.stats.screentime_balance_minutes, 10);
        assert_eq!(
            toggle.outcomes,
            vec![
                Outcome::XpGained {
                    amount: 50,
                    reason: "Deep Work Block".into()
                },
                Outcome::CreditDeposited { minutes: 10 },
            ]
        );
    }

    #[test]
    fn second_toggle_is_a_no_op() {
        let rewards = RewardTable::default();
        let (mut registry, id) = registry_with("Read 20 Pages", Difficulty::Easy);

        let first = registry
            .toggle_complete(&id, &UserStats::default(), &rewards)
            .unwrap();
        let second = registry.toggle_complete(&id, &first.stats, &rewards).unwrap();

        assert!(first.fired());
        assert!(!second.fired());
        assert_eq!(second.stats, first.stats);
        assert_eq!(second.habit.streak, 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut registry = HabitRegistry::new();
        let err = registry
            .toggle_complete("missing", &UserStats::default(), &RewardTable::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(registry.uncomplete("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn failed_ledger_application_leaves_habit_pending() {
        let (mut registry, id) = registry_with("No Sugar", Difficulty::Easy);
        let broken = UserStats::at_level(1, 0);
        assert!(registry
            .toggle_complete(&id, &broken, &RewardTable::default())
            .is_err());
        let habit = registry.get(&id).unwrap();
        assert!(!habit.completed_today);
        assert_eq!(habit.streak, 0);
    }

    #[test]
    fn uncomplete_keeps_streak_and_rewards() {
        let rewards = RewardTable::default();
        let (mut registry, id) = registry_with("Meditation", Difficulty::Easy);
        let toggle = registry
            .toggle_complete(&id, &UserStats::default(), &rewards)
            .unwrap();

        let habit = registry.uncomplete(&id).unwrap();
        assert_eq!(habit.state(), HabitState::Pending);
        assert_eq!(habit.streak, 1);
        assert!(habit.rewarded_today);

        let again = registry.toggle_complete(&id, &toggle.stats, &rewards).unwrap();
        assert!(!again.fired());
        assert_eq!(again.stats, toggle.stats);
        assert_eq!(again.habit.state(), HabitState::CompletedToday);
        assert_eq!(again.habit.streak, 1);
    }

    #[test]
    fn toggle_uncomplete_cycles_pay_once_per_day() {
        let rewards = RewardTable::default();
        let (mut registry, id) = registry_with("Cold Shower", Difficulty::Hard);
        let mut stats = UserStats::default();
        for _ in 0..5 {
            stats = registry.toggle_complete(&id, &stats, &rewards).unwrap().stats;
            registry.uncomplete(&id).unwrap();
        }
        assert_eq!(stats.xp, 50);
        assert_eq!(stats.screentime_balance_minutes, 10);
        assert_eq!(registry.get(&id).unwrap().streak, 1);

        let rollover = registry.start_new_day(MissedDayPolicy::Reset);
        assert_eq!((rollover.completed, rollover.missed), (1, 0));
        assert_eq!(registry.get(&id).unwrap().streak, 1);
        assert!(!registry.get(&id).unwrap().rewarded_today);

        let next_day = registry.toggle_complete(&id, &stats, &rewards).unwrap();
        assert!(next_day.fired());
        assert_eq!(next_day.habit.streak, 2);
    }

    #[test]
    fn new_day_resets_missed_streaks() {
        let rewards = RewardTable::default();
        let mut registry = HabitRegistry::new();
        let done = registry.create("Stretch", Difficulty::Easy, &rewards).unwrap();
        let missed = registry.create("Journal", Difficulty::Easy, &rewards).unwrap();
        registry.habits.get_mut(&missed.id).unwrap().streak = 4;
        registry
            .toggle_complete(&done.id, &UserStats::default(), &rewards)
            .unwrap();

        let rollover = registry.start_new_day(MissedDayPolicy::Reset);
        assert_eq!(rollover.completed, 1);
        assert_eq!(rollover.missed, 1);
        assert_eq!(
            rollover.streak_changes,
            vec![StreakChange {
                habit_id: missed.id.clone(),
                before: 4,
                after: 0
            }]
        );
        assert_eq!(registry.get(&done.id).unwrap().streak, 1);
        assert_eq!(registry.completed_count(), 0);
    }

    #[test]
    fn decrement_policy() {
        assert_eq!(MissedDayPolicy::Decrement.apply(4), 3);
        assert_eq!(MissedDayPolicy::Decrement.apply(0), 0);
        assert_eq!(MissedDayPolicy::Reset.apply(9), 0);
        assert_eq!(MissedDayPolicy::default(), MissedDayPolicy::Reset);
    }

    #[test]
    fn list_preserves_creation_order() {
        let rewards = RewardTable::default();
        let mut registry = HabitRegistry::new();
        for name in ["Cold Shower", "No Sugar", "Read 20 Pages", "Meditation"] {
            registry.create(name, Difficulty::Easy, &rewards).unwrap();
        }
        let names: Vec<_> = registry.list().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["Cold Shower", "No Sugar", "Read 20 Pages", "Meditation"]);
        assert_eq!(registry.find_by_name("no sugar").unwrap().name, "No Sugar");
    }
}
