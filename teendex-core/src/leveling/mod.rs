//! Leveling Engine
//!
//! Maps accumulated XP to a level via triangular thresholds: the barrier to
//! leave level N is `100 * N * (N + 1) / 2` XP. A fresh account (0 XP) is
//! level 1, the first level-up lands at 100 XP, the next at 300, then 600,
//! and so on.
//!
//! Everything here is pure and safe to call from any thread.

use serde::{Deserialize, Serialize};

/// XP cost multiplier per level step
pub const XP_UNIT: u64 = 100;

/// Derive the level for a total XP value.
///
/// Starting at level 1, the level increments as long as `xp` meets the
/// barrier for the current level. The barrier is strictly increasing, so the
/// loop terminates for any finite input. Never returns 0.
pub fn level_for(xp: u64) -> u32 {
    let mut level: u64 = 1;
    while xp >= XP_UNIT * (level * (level + 1) / 2) {
        level += 1;
    }
    level as u32
}

/// Cumulative XP floor of a level (minimum total XP at which it holds).
pub fn xp_to_reach(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let l = (level - 1) as u64;
    XP_UNIT * (l * (l + 1) / 2)
}

/// XP barrier that must be met to leave the given level.
pub fn next_level_at(level: u32) -> u64 {
    let l = level.max(1) as u64;
    XP_UNIT * (l * (l + 1) / 2)
}

/// Progress within the current level, for progress bars and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    /// XP earned past the current level's floor
    pub xp_into_level: u64,
    /// XP still missing to reach the next level
    pub xp_to_next: u64,
    /// 0.0 - 1.0 fraction toward the next level
    pub fraction: f32,
}

/// Compute level progress for a total XP value.
pub fn progress(xp: u64) -> LevelProgress {
    let level = level_for(xp);
    let floor = xp_to_reach(level);
    let barrier = next_level_at(level);
    let span = barrier - floor;
    let into = xp - floor;
    LevelProgress {
        level,
        xp_into_level: into,
        xp_to_next: barrier - xp,
        fraction: (into as f32 / span as f32).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_thresholds() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(299), 2);
        assert_eq!(level_for(300), 3);
        assert_eq!(level_for(599), 3);
        assert_eq!(level_for(600), 4);
    }

    #[test]
    fn test_level_never_zero() {
        assert!(level_for(0) >= 1);
        assert!(level_for(1) >= 1);
        assert!(level_for(u32::MAX as u64) >= 1);
    }

    #[test]
    fn test_large_xp_no_overflow() {
        // 10 billion XP should resolve without panicking
        let level = level_for(10_000_000_000);
        assert!(level > 1000, "Expected a very high level, got {}", level);
    }

    #[test]
    fn test_xp_to_reach_matches_level_for() {
        for level in 1u32..=50 {
            let floor = xp_to_reach(level);
            assert_eq!(
                level_for(floor),
                level,
                "Floor of level {} should map back to it",
                level
            );
            if floor > 0 {
                assert_eq!(level_for(floor - 1), level - 1);
            }
        }
    }

    #[test]
    fn test_next_level_at_is_next_floor() {
        for level in 1u32..=50 {
            assert_eq!(next_level_at(level), xp_to_reach(level + 1));
        }
    }

    #[test]
    fn test_progress_fresh_account() {
        let p = progress(0);
        assert_eq!(p.level, 1);
        assert_eq!(p.xp_into_level, 0);
        assert_eq!(p.xp_to_next, 100);
        assert!((p.fraction - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_mid_level() {
        // Level 2 spans 100..300, so 200 XP is halfway
        let p = progress(200);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp_into_level, 100);
        assert_eq!(p.xp_to_next, 100);
        assert!((p.fraction - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_progress_at_boundary() {
        let p = progress(100);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp_into_level, 0);
        assert_eq!(p.xp_to_next, 200);
    }
}
