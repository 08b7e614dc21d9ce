//! Gamification Stats
//!
//! The per-user progression record: XP, derived level, lifetime earnings,
//! streak counters, and badge count. One record per user, created at
//! onboarding and mutated only through award/activity operations.
//!
//! The record's central invariant is `level == level_for(xp)` after every
//! mutation, and `longest_streak >= current_streak` at all times.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::leveling;

/// Per-user gamification state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationStats {
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    /// Lifetime earnings in paise (1/100 rupee)
    pub total_earnings: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Consecutive ISO weeks with at least one recorded activity
    pub weekly_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_badges: u32,
}

impl GamificationStats {
    /// Fresh record for a newly onboarded user: 0 XP, level 1.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            xp: 0,
            level: 1,
            total_earnings: 0,
            current_streak: 0,
            longest_streak: 0,
            weekly_streak: 0,
            last_active_date: None,
            total_badges: 0,
        }
    }

    /// Compute the outcome of an XP award without mutating the record.
    pub fn preview_award(&self, amount: u64) -> AwardOutcome {
        let new_xp = self.xp.saturating_add(amount);
        let new_level = leveling::level_for(new_xp);
        AwardOutcome {
            new_xp,
            new_level,
            leveled_up: new_level > self.level,
        }
    }

    /// Apply an XP award. Returns the outcome (including level-up detection).
    pub fn apply_award(&mut self, amount: u64) -> AwardOutcome {
        let outcome = self.preview_award(amount);
        self.xp = outcome.new_xp;
        self.level = outcome.new_level;
        outcome
    }

    /// Progress within the current level.
    pub fn level_progress(&self) -> leveling::LevelProgress {
        leveling::progress(self.xp)
    }
}

/// Result of applying an XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardOutcome {
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_level_one() {
        let stats = GamificationStats::new("user_1");
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.level, leveling::level_for(stats.xp));
    }

    #[test]
    fn test_zero_award_changes_nothing() {
        let mut stats = GamificationStats::new("user_1");
        stats.apply_award(250);
        let before = stats.clone();

        let outcome = stats.apply_award(0);
        assert_eq!(stats, before);
        assert!(!outcome.leveled_up);
        assert_eq!(outcome.new_xp, 250);
    }

    #[test]
    fn test_award_detects_level_up() {
        let mut stats = GamificationStats::new("user_1");
        let outcome = stats.apply_award(100);
        assert_eq!(outcome.new_xp, 100);
        assert_eq!(outcome.new_level, 2);
        assert!(outcome.leveled_up);
        assert_eq!(stats.level, 2);
    }

    #[test]
    fn test_award_below_threshold_keeps_level() {
        let mut stats = GamificationStats::new("user_1");
        let outcome = stats.apply_award(99);
        assert_eq!(outcome.new_level, 1);
        assert!(!outcome.leveled_up);
    }

    #[test]
    fn test_sequential_awards_are_additive() {
        let mut split = GamificationStats::new("a");
        split.apply_award(50);
        split.apply_award(50);

        let mut single = GamificationStats::new("a");
        single.apply_award(100);

        assert_eq!(split.xp, single.xp);
        assert_eq!(split.level, single.level);
    }

    #[test]
    fn test_level_invariant_after_many_awards() {
        let mut stats = GamificationStats::new("user_1");
        for amount in [10, 0, 95, 250, 1, 4000, 37] {
            stats.apply_award(amount);
            assert_eq!(stats.level, leveling::level_for(stats.xp));
        }
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let stats = GamificationStats::new("user_1");
        let outcome = stats.preview_award(500);
        assert_eq!(outcome.new_level, 3);
        assert_eq!(stats.xp, 0);
        assert_eq!(stats.level, 1);
    }
}
