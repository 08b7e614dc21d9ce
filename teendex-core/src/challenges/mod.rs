//! Challenge System
//!
//! Time-boxed goals users opt into for bonus XP: daily warm-ups, weekly
//! pushes, monthly marathons, and special events. Each challenge tracks a
//! single numeric metric toward a target; crossing the target completes the
//! challenge and pays out its XP reward.
//!
//! Definitions are a code-defined catalog; per-user participation records
//! live in the server's storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Challenge cadence; determines the completion window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    Daily,
    Weekly,
    Monthly,
    Special,
}

impl ChallengeKind {
    /// Days from acceptance until the challenge expires.
    pub fn window_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Special => 90,
        }
    }
}

/// Per-user participation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeStatus {
    Active,
    Completed,
    Failed,
    Expired,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing a stored status string
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown challenge status '{0}'")]
pub struct ParseStatusError(String);

impl FromStr for ChallengeStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "expired" => Ok(Self::Expired),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A single challenge definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    /// Product metric the progress counter tracks (e.g. "invoices_sent")
    pub metric: String,
    pub target: u64,
    pub xp_reward: u64,
}

/// The full challenge catalog
pub fn catalog() -> Vec<Challenge> {
    vec![
        Challenge {
            id: "daily_check_in".into(),
            title: "Show Up".into(),
            description: "Log any activity today.".into(),
            kind: ChallengeKind::Daily,
            metric: "activities".into(),
            target: 1,
            xp_reward: 10,
        },
        Challenge {
            id: "daily_follow_ups".into(),
            title: "Inbox Zero-ish".into(),
            description: "Follow up with 3 clients today.".into(),
            kind: ChallengeKind::Daily,
            metric: "client_follow_ups".into(),
            target: 3,
            xp_reward: 30,
        },
        Challenge {
            id: "weekly_invoices".into(),
            title: "Paper Trail".into(),
            description: "Send 5 invoices this week.".into(),
            kind: ChallengeKind::Weekly,
            metric: "invoices_sent".into(),
            target: 5,
            xp_reward: 100,
        },
        Challenge {
            id: "weekly_expenses".into(),
            title: "Count Every Paisa".into(),
            description: "Log 10 expenses this week.".into(),
            kind: ChallengeKind::Weekly,
            metric: "expenses_logged".into(),
            target: 10,
            xp_reward: 75,
        },
        Challenge {
            id: "monthly_projects".into(),
            title: "Shipper".into(),
            description: "Complete 3 projects this month.".into(),
            kind: ChallengeKind::Monthly,
            metric: "projects_completed".into(),
            target: 3,
            xp_reward: 400,
        },
        Challenge {
            id: "monthly_revenue".into(),
            title: "Big Month".into(),
            description: "Collect \u{20b9}25,000 in payments this month.".into(),
            kind: ChallengeKind::Monthly,
            metric: "paise_collected".into(),
            target: 2_500_000,
            xp_reward: 600,
        },
        Challenge {
            id: "special_first_client".into(),
            title: "Open For Business".into(),
            description: "Land and invoice your very first client.".into(),
            kind: ChallengeKind::Special,
            metric: "clients_invoiced".into(),
            target: 1,
            xp_reward: 150,
        },
    ]
}

/// Look up a challenge definition by id.
pub fn find(id: &str) -> Option<Challenge> {
    catalog().into_iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_are_unique() {
        let cat = catalog();
        let ids: HashSet<_> = cat.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), cat.len(), "Duplicate challenge id in catalog");
    }

    #[test]
    fn test_catalog_targets_positive() {
        for c in catalog() {
            assert!(c.target > 0, "Challenge {} has zero target", c.id);
            assert!(c.xp_reward > 0, "Challenge {} pays no XP", c.id);
        }
    }

    #[test]
    fn test_window_days() {
        assert_eq!(ChallengeKind::Daily.window_days(), 1);
        assert_eq!(ChallengeKind::Weekly.window_days(), 7);
        assert_eq!(ChallengeKind::Monthly.window_days(), 30);
        assert_eq!(ChallengeKind::Special.window_days(), 90);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ChallengeStatus::Active,
            ChallengeStatus::Completed,
            ChallengeStatus::Failed,
            ChallengeStatus::Expired,
        ] {
            let parsed: ChallengeStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("waiting".parse::<ChallengeStatus>().is_err());
    }

    #[test]
    fn test_find_known_and_unknown() {
        let c = find("weekly_invoices").unwrap();
        assert_eq!(c.kind, ChallengeKind::Weekly);
        assert_eq!(c.target, 5);
        assert!(find("no_such_challenge").is_none());
    }

    #[test]
    fn test_all_kinds_represented() {
        let kinds: HashSet<_> = catalog().iter().map(|c| c.kind).collect();
        assert_eq!(kinds.len(), 4);
    }
}
