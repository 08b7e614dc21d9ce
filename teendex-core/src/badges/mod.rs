//! Badge System
//!
//! Badges reward progression milestones across the product: revenue earned,
//! activity streaks, community standing, and level milestones. Definitions
//! live here as a code-defined catalog; which badges a user has unlocked is
//! persisted by the server's storage layer.
//!
//! Unlock conditions are evaluated against the user's stats record only, so
//! a single snapshot is enough to decide every badge.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::stats::GamificationStats;

/// Badge grouping shown as tabs in the trophy case UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeCategory {
    Revenue,
    Activity,
    Social,
    Milestone,
}

/// Badge rarity (determines frame art and celebration size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Condition over the stats record that unlocks a badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockCondition {
    LevelReached(u32),
    XpReached(u64),
    /// Daily streak length
    StreakReached(u32),
    /// Consecutive active ISO weeks
    WeeklyStreakReached(u32),
    /// Lifetime earnings in paise
    EarningsReached(u64),
    /// Number of other badges already unlocked
    BadgesEarned(u32),
}

impl UnlockCondition {
    pub fn is_met(&self, stats: &GamificationStats) -> bool {
        match self {
            Self::LevelReached(n) => stats.level >= *n,
            Self::XpReached(n) => stats.xp >= *n,
            Self::StreakReached(n) => stats.longest_streak >= *n,
            Self::WeeklyStreakReached(n) => stats.weekly_streak >= *n,
            Self::EarningsReached(n) => stats.total_earnings >= *n,
            Self::BadgesEarned(n) => stats.total_badges >= *n,
        }
    }
}

/// A single badge definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub icon: String,
    /// XP granted when the badge unlocks
    pub xp_reward: u64,
    /// Hidden badges don't show in the catalog until earned
    pub hidden: bool,
    pub condition: UnlockCondition,
}

/// The full badge catalog
pub fn catalog() -> Vec<Badge> {
    vec![
        // === Milestone ===
        Badge {
            id: "level_5".into(),
            name: "Rising Star".into(),
            description: "Reach level 5.".into(),
            category: BadgeCategory::Milestone,
            rarity: BadgeRarity::Common,
            icon: "star".into(),
            xp_reward: 50,
            hidden: false,
            condition: UnlockCondition::LevelReached(5),
        },
        Badge {
            id: "level_10".into(),
            name: "Seasoned Hustler".into(),
            description: "Reach level 10.".into(),
            category: BadgeCategory::Milestone,
            rarity: BadgeRarity::Rare,
            icon: "star-double".into(),
            xp_reward: 150,
            hidden: false,
            condition: UnlockCondition::LevelReached(10),
        },
        Badge {
            id: "level_25".into(),
            name: "Freelance Legend".into(),
            description: "Reach level 25.".into(),
            category: BadgeCategory::Milestone,
            rarity: BadgeRarity::Legendary,
            icon: "crown".into(),
            xp_reward: 500,
            hidden: false,
            condition: UnlockCondition::LevelReached(25),
        },
        Badge {
            id: "xp_1000".into(),
            name: "Grinder".into(),
            description: "Accumulate 1,000 XP.".into(),
            category: BadgeCategory::Milestone,
            rarity: BadgeRarity::Common,
            icon: "bolt".into(),
            xp_reward: 25,
            hidden: false,
            condition: UnlockCondition::XpReached(1_000),
        },
        Badge {
            id: "xp_10000".into(),
            name: "Powerhouse".into(),
            description: "Accumulate 10,000 XP.".into(),
            category: BadgeCategory::Milestone,
            rarity: BadgeRarity::Epic,
            icon: "bolt-double".into(),
            xp_reward: 250,
            hidden: false,
            condition: UnlockCondition::XpReached(10_000),
        },
        // === Revenue ===
        Badge {
            id: "first_rupee".into(),
            name: "First Rupee".into(),
            description: "Record your first earnings.".into(),
            category: BadgeCategory::Revenue,
            rarity: BadgeRarity::Common,
            icon: "rupee".into(),
            xp_reward: 25,
            hidden: false,
            condition: UnlockCondition::EarningsReached(1),
        },
        Badge {
            id: "earnings_10k".into(),
            name: "Ten Thousand Club".into(),
            description: "Earn a lifetime total of \u{20b9}10,000.".into(),
            category: BadgeCategory::Revenue,
            rarity: BadgeRarity::Rare,
            icon: "banknote".into(),
            xp_reward: 100,
            hidden: false,
            condition: UnlockCondition::EarningsReached(1_000_000),
        },
        Badge {
            id: "earnings_1l".into(),
            name: "Lakhpati".into(),
            description: "Earn a lifetime total of \u{20b9}1,00,000.".into(),
            category: BadgeCategory::Revenue,
            rarity: BadgeRarity::Legendary,
            icon: "vault".into(),
            xp_reward: 1_000,
            hidden: false,
            condition: UnlockCondition::EarningsReached(10_000_000),
        },
        // === Activity ===
        Badge {
            id: "streak_3".into(),
            name: "Warming Up".into(),
            description: "Stay active 3 days in a row.".into(),
            category: BadgeCategory::Activity,
            rarity: BadgeRarity::Common,
            icon: "flame".into(),
            xp_reward: 25,
            hidden: false,
            condition: UnlockCondition::StreakReached(3),
        },
        Badge {
            id: "streak_7".into(),
            name: "On Fire".into(),
            description: "Stay active 7 days in a row.".into(),
            category: BadgeCategory::Activity,
            rarity: BadgeRarity::Rare,
            icon: "flame-big".into(),
            xp_reward: 75,
            hidden: false,
            condition: UnlockCondition::StreakReached(7),
        },
        Badge {
            id: "streak_30".into(),
            name: "Unstoppable".into(),
            description: "Stay active 30 days in a row.".into(),
            category: BadgeCategory::Activity,
            rarity: BadgeRarity::Epic,
            icon: "inferno".into(),
            xp_reward: 300,
            hidden: false,
            condition: UnlockCondition::StreakReached(30),
        },
        Badge {
            id: "weekly_12".into(),
            name: "Quarter Machine".into(),
            description: "Show up every week for 12 weeks straight.".into(),
            category: BadgeCategory::Activity,
            rarity: BadgeRarity::Epic,
            icon: "calendar".into(),
            xp_reward: 200,
            hidden: true,
            condition: UnlockCondition::WeeklyStreakReached(12),
        },
        // === Social ===
        Badge {
            id: "collector_5".into(),
            name: "Collector".into(),
            description: "Unlock 5 badges.".into(),
            category: BadgeCategory::Social,
            rarity: BadgeRarity::Rare,
            icon: "trophy-shelf".into(),
            xp_reward: 50,
            hidden: false,
            condition: UnlockCondition::BadgesEarned(5),
        },
        Badge {
            id: "collector_10".into(),
            name: "Completionist".into(),
            description: "Unlock 10 badges.".into(),
            category: BadgeCategory::Social,
            rarity: BadgeRarity::Legendary,
            icon: "trophy-wall".into(),
            xp_reward: 250,
            hidden: true,
            condition: UnlockCondition::BadgesEarned(10),
        },
    ]
}

/// Look up a badge definition by id.
pub fn find(id: &str) -> Option<Badge> {
    catalog().into_iter().find(|b| b.id == id)
}

/// Badges whose condition is now met but which the user hasn't unlocked yet.
pub fn newly_unlocked(stats: &GamificationStats, unlocked: &HashSet<String>) -> Vec<Badge> {
    catalog()
        .into_iter()
        .filter(|b| !unlocked.contains(&b.id) && b.condition.is_met(stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let cat = catalog();
        let ids: HashSet<_> = cat.iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids.len(), cat.len(), "Duplicate badge id in catalog");
    }

    #[test]
    fn test_fresh_account_unlocks_nothing() {
        let stats = GamificationStats::new("u");
        let newly = newly_unlocked(&stats, &HashSet::new());
        assert!(newly.is_empty(), "Fresh account unlocked: {:?}", newly);
    }

    #[test]
    fn test_level_badge_unlocks() {
        let mut stats = GamificationStats::new("u");
        stats.apply_award(1_500); // level 5 starts at 1000 XP
        assert!(stats.level >= 5);

        let newly = newly_unlocked(&stats, &HashSet::new());
        assert!(newly.iter().any(|b| b.id == "level_5"));
        assert!(newly.iter().any(|b| b.id == "xp_1000"));
        assert!(newly.iter().all(|b| b.id != "level_10"));
    }

    #[test]
    fn test_already_unlocked_excluded() {
        let mut stats = GamificationStats::new("u");
        stats.apply_award(1_500);

        let mut unlocked = HashSet::new();
        unlocked.insert("level_5".to_string());
        let newly = newly_unlocked(&stats, &unlocked);
        assert!(newly.iter().all(|b| b.id != "level_5"));
    }

    #[test]
    fn test_streak_badge_uses_longest() {
        let mut stats = GamificationStats::new("u");
        stats.longest_streak = 7;
        stats.current_streak = 1;
        let newly = newly_unlocked(&stats, &HashSet::new());
        assert!(newly.iter().any(|b| b.id == "streak_7"));
    }

    #[test]
    fn test_earnings_badges() {
        let mut stats = GamificationStats::new("u");
        stats.total_earnings = 1_000_000;
        let newly = newly_unlocked(&stats, &HashSet::new());
        assert!(newly.iter().any(|b| b.id == "first_rupee"));
        assert!(newly.iter().any(|b| b.id == "earnings_10k"));
        assert!(newly.iter().all(|b| b.id != "earnings_1l"));
    }

    #[test]
    fn test_collector_badge_counts_badges() {
        let mut stats = GamificationStats::new("u");
        stats.total_badges = 5;
        let newly = newly_unlocked(&stats, &HashSet::new());
        assert!(newly.iter().any(|b| b.id == "collector_5"));
    }

    #[test]
    fn test_find_known_and_unknown() {
        assert!(find("level_5").is_some());
        assert!(find("no_such_badge").is_none());
    }

    #[test]
    fn test_hidden_badges_exist() {
        assert!(catalog().iter().any(|b| b.hidden));
    }

    #[test]
    fn test_all_rarities_represented() {
        let rarities: HashSet<_> = catalog().iter().map(|b| b.rarity).collect();
        assert!(rarities.contains(&BadgeRarity::Common));
        assert!(rarities.contains(&BadgeRarity::Rare));
        assert!(rarities.contains(&BadgeRarity::Epic));
        assert!(rarities.contains(&BadgeRarity::Legendary));
    }
}
