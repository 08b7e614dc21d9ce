//! Streak Transitions
//!
//! Daily and weekly activity streaks. A day with any recorded activity
//! extends the daily streak if it immediately follows the last active day;
//! any gap resets it to 1. The weekly streak counts consecutive ISO weeks
//! with at least one active day.
//!
//! Invariant: `longest_streak >= current_streak` after every transition.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::stats::GamificationStats;

/// What happened to the daily streak when an activity was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakTransition {
    /// Already active today; counters untouched
    Unchanged,
    /// Consecutive day; streak grew by one
    Extended,
    /// First activity, or a gap broke the chain; streak restarted at 1
    Started,
}

/// Monday of the ISO week containing `date`. Used to compare week adjacency
/// across year boundaries without ISO week-number arithmetic.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Record an activity on `today`, updating all streak counters in place.
pub fn record_activity(stats: &mut GamificationStats, today: NaiveDate) -> StreakTransition {
    let transition = match stats.last_active_date {
        Some(last) if last == today => return StreakTransition::Unchanged,
        Some(last) if last.succ_opt() == Some(today) => {
            stats.current_streak += 1;
            StreakTransition::Extended
        }
        _ => {
            if stats.current_streak > 1 {
                tracing::debug!(
                    "Streak of {} broken for user {}",
                    stats.current_streak,
                    stats.user_id
                );
            }
            stats.current_streak = 1;
            StreakTransition::Started
        }
    };
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);

    match stats.last_active_date.map(week_start) {
        Some(week) if week == week_start(today) => {}
        Some(week) if week + Duration::days(7) == week_start(today) => {
            stats.weekly_streak += 1;
        }
        _ => stats.weekly_streak = 1,
    }

    stats.last_active_date = Some(today);
    transition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let mut stats = GamificationStats::new("u");
        let t = record_activity(&mut stats, day(2024, 3, 4));
        assert_eq!(t, StreakTransition::Started);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.weekly_streak, 1);
        assert_eq!(stats.last_active_date, Some(day(2024, 3, 4)));
    }

    #[test]
    fn test_same_day_is_unchanged() {
        let mut stats = GamificationStats::new("u");
        record_activity(&mut stats, day(2024, 3, 4));
        let t = record_activity(&mut stats, day(2024, 3, 4));
        assert_eq!(t, StreakTransition::Unchanged);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.weekly_streak, 1);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let mut stats = GamificationStats::new("u");
        record_activity(&mut stats, day(2024, 3, 4));
        record_activity(&mut stats, day(2024, 3, 5));
        let t = record_activity(&mut stats, day(2024, 3, 6));
        assert_eq!(t, StreakTransition::Extended);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn test_gap_resets_current_but_keeps_longest() {
        let mut stats = GamificationStats::new("u");
        for d in 4..=8 {
            record_activity(&mut stats, day(2024, 3, d));
        }
        assert_eq!(stats.current_streak, 5);

        let t = record_activity(&mut stats, day(2024, 3, 20));
        assert_eq!(t, StreakTransition::Started);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 5);
        assert!(stats.longest_streak >= stats.current_streak);
    }

    #[test]
    fn test_weekly_streak_consecutive_weeks() {
        let mut stats = GamificationStats::new("u");
        // Mon Mar 4 and Thu Mar 14 are in adjacent ISO weeks
        record_activity(&mut stats, day(2024, 3, 4));
        record_activity(&mut stats, day(2024, 3, 14));
        assert_eq!(stats.weekly_streak, 2);
        // Daily streak broke though
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_weekly_streak_same_week_unchanged() {
        let mut stats = GamificationStats::new("u");
        record_activity(&mut stats, day(2024, 3, 4));
        record_activity(&mut stats, day(2024, 3, 7));
        assert_eq!(stats.weekly_streak, 1);
    }

    #[test]
    fn test_weekly_streak_gap_resets() {
        let mut stats = GamificationStats::new("u");
        record_activity(&mut stats, day(2024, 3, 4));
        record_activity(&mut stats, day(2024, 3, 25));
        assert_eq!(stats.weekly_streak, 1);
    }

    #[test]
    fn test_weekly_streak_across_year_boundary() {
        let mut stats = GamificationStats::new("u");
        // Mon Dec 30 2024 and Mon Jan 6 2025 are adjacent ISO weeks
        record_activity(&mut stats, day(2024, 12, 30));
        record_activity(&mut stats, day(2025, 1, 6));
        assert_eq!(stats.weekly_streak, 2);
    }

    #[test]
    fn test_daily_streak_across_month_boundary() {
        let mut stats = GamificationStats::new("u");
        record_activity(&mut stats, day(2024, 2, 29));
        let t = record_activity(&mut stats, day(2024, 3, 1));
        assert_eq!(t, StreakTransition::Extended);
        assert_eq!(stats.current_streak, 2);
    }
}
