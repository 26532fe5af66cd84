//! Progression snapshot owned by a session.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Upper bound of `daily_goal_progress`.
pub const DAILY_GOAL_MAX: u32 = 100;

/// Single source of truth for progression and credit.
///
/// After every ledger application `xp < xp_to_next_level` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    /// Spendable leisure credit, in minutes.
    pub screentime_balance_minutes: u64,
    /// Consecutive days with at least one completed habit.
    pub streak_days: u32,
    /// 0..=100
    #[serde(default)]
    pub daily_goal_progress: u32,
    #[serde(default)]
    pub total_work_minutes: u64,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: 1000,
            screentime_balance_minutes: 0,
            streak_days: 0,
            daily_goal_progress: 0,
            total_work_minutes: 0,
        }
    }
}

impl UserStats {
    /// Fresh stats at `level` with zero XP towards `xp_to_next_level`.
    pub fn at_level(level: u32, xp_to_next_level: u64) -> Self {
        Self {
            level,
            xp_to_next_level,
            ..Self::default()
        }
    }

    pub fn total_work_hours(&self) -> f64 {
        self.total_work_minutes as f64 / 60.0
    }

    /// 0.0 ..= 100.0 progress towards the next level.
    pub fn level_progress_pct(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        (self.xp as f64 / self.xp_to_next_level as f64 * 100.0).min(100.0)
    }

    /// Structural checks the engine relies on before applying an event.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.level == 0 {
            return Err(LedgerError::InvalidStats {
                message: "level must be at least 1".into(),
            });
        }
        if self.xp_to_next_level == 0 {
            return Err(LedgerError::InvalidStats {
                message: "xp_to_next_level must be greater than zero".into(),
            });
        }
        if self.xp >= self.xp_to_next_level {
            return Err(LedgerError::InvalidStats {
                message: format!(
                    "xp ({}) must be below xp_to_next_level ({})",
                    self.xp, self.xp_to_next_level
                ),
            });
        }
        if self.daily_goal_progress > DAILY_GOAL_MAX {
            return Err(LedgerError::InvalidStats {
                message: format!("daily_goal_progress must be at most {DAILY_GOAL_MAX}"),
            });
        }
        Ok(())
    }
}
