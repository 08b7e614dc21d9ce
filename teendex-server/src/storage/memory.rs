//! In-Memory Storage - test and local-dev backend
//!
//! Implements the repository traits over plain maps behind a single
//! `parking_lot` mutex. The one-lock design gives the same observable
//! atomicity as the PostgreSQL transactions: an award's read-modify-write
//! happens entirely inside the critical section, so concurrent awards
//! cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use teendex_core::challenges::ChallengeStatus;
use teendex_core::stats::{AwardOutcome, GamificationStats};
use teendex_core::streaks;

use super::repository::{
    BadgeRepo, ChallengeProgress, ChallengeRecord, ChallengeRepo, LeaderboardEntry, RepoResult,
    StatsRepo, StorageError, UnlockedBadge,
};

/// One audit-log entry, mirroring the xp_events table
#[derive(Debug, Clone)]
pub struct XpEvent {
    pub user_id: String,
    pub amount: i64,
    pub reason: String,
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryInner {
    stats: HashMap<String, GamificationStats>,
    badges: HashMap<String, Vec<UnlockedBadge>>,
    challenges: HashMap<(String, String), ChallengeRecord>,
    xp_events: Vec<XpEvent>,
}

/// In-memory store holding all progression data
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the XP audit log (test helper)
    pub fn xp_events(&self) -> Vec<XpEvent> {
        self.inner.lock().xp_events.clone()
    }
}

#[async_trait]
impl StatsRepo for MemoryStore {
    async fn init(&self, user_id: &str) -> RepoResult<GamificationStats> {
        let mut inner = self.inner.lock();
        if inner.stats.contains_key(user_id) {
            return Err(StorageError::Conflict(format!(
                "Stats already initialized for user {}",
                user_id
            )));
        }
        let stats = GamificationStats::new(user_id);
        inner.stats.insert(user_id.to_string(), stats.clone());
        Ok(stats)
    }

    async fn get(&self, user_id: &str) -> RepoResult<Option<GamificationStats>> {
        Ok(self.inner.lock().stats.get(user_id).cloned())
    }

    async fn award_xp(&self, user_id: &str, amount: i64, reason: &str) -> RepoResult<AwardOutcome> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let mut inner = self.inner.lock();
        let stats = inner
            .stats
            .get_mut(user_id)
            .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        let outcome = stats.apply_award(amount as u64);
        inner.xp_events.push(XpEvent {
            user_id: user_id.to_string(),
            amount,
            reason: reason.to_string(),
            new_xp: outcome.new_xp,
            new_level: outcome.new_level,
            leveled_up: outcome.leveled_up,
            created_at: Utc::now(),
        });

        Ok(outcome)
    }

    async fn record_activity(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> RepoResult<GamificationStats> {
        let mut inner = self.inner.lock();
        let stats = inner
            .stats
            .get_mut(user_id)
            .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        streaks::record_activity(stats, date);
        Ok(stats.clone())
    }

    async fn record_earnings(&self, user_id: &str, amount: i64) -> RepoResult<GamificationStats> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let mut inner = self.inner.lock();
        let stats = inner
            .stats
            .get_mut(user_id)
            .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        stats.total_earnings += amount as u64;
        Ok(stats.clone())
    }

    async fn leaderboard(&self, limit: i64) -> RepoResult<Vec<LeaderboardEntry>> {
        let inner = self.inner.lock();
        let mut entries: Vec<LeaderboardEntry> = inner
            .stats
            .values()
            .map(|s| LeaderboardEntry {
                user_id: s.user_id.clone(),
                xp: s.xp,
                level: s.level,
                current_streak: s.current_streak,
            })
            .collect();

        entries.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.user_id.cmp(&b.user_id)));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}

#[async_trait]
impl BadgeRepo for MemoryStore {
    async fn unlocked(&self, user_id: &str) -> RepoResult<Vec<UnlockedBadge>> {
        Ok(self
            .inner
            .lock()
            .badges
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn unlock(&self, user_id: &str, badge_id: &str) -> RepoResult<bool> {
        let mut inner = self.inner.lock();
        if !inner.stats.contains_key(user_id) {
            return Err(StorageError::NotFound(format!("Stats for user {}", user_id)));
        }

        let unlocked = inner.badges.entry(user_id.to_string()).or_default();
        if unlocked.iter().any(|b| b.badge_id == badge_id) {
            return Ok(false);
        }
        unlocked.push(UnlockedBadge {
            badge_id: badge_id.to_string(),
            unlocked_at: Utc::now(),
            showcased: false,
        });

        // Keep total_badges in sync, same as the SQL transaction does
        if let Some(stats) = inner.stats.get_mut(user_id) {
            stats.total_badges += 1;
        }
        Ok(true)
    }

    async fn showcase(&self, user_id: &str, badge_id: &str, showcased: bool) -> RepoResult<()> {
        let mut inner = self.inner.lock();
        let badge = inner
            .badges
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().find(|b| b.badge_id == badge_id))
            .ok_or_else(|| {
                StorageError::NotFound(format!("Badge {} for user {}", badge_id, user_id))
            })?;
        badge.showcased = showcased;
        Ok(())
    }
}

#[async_trait]
impl ChallengeRepo for MemoryStore {
    async fn accept(&self, user_id: &str, challenge_id: &str) -> RepoResult<ChallengeRecord> {
        let mut inner = self.inner.lock();
        if !inner.stats.contains_key(user_id) {
            return Err(StorageError::NotFound(format!("Stats for user {}", user_id)));
        }

        let key = (user_id.to_string(), challenge_id.to_string());
        if inner.challenges.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "User {} already accepted challenge {}",
                user_id, challenge_id
            )));
        }

        let record = ChallengeRecord {
            challenge_id: challenge_id.to_string(),
            status: ChallengeStatus::Active,
            progress: 0,
            accepted_at: Utc::now(),
            completed_at: None,
        };
        inner.challenges.insert(key, record.clone());
        Ok(record)
    }

    async fn for_user(&self, user_id: &str) -> RepoResult<Vec<ChallengeRecord>> {
        let inner = self.inner.lock();
        let mut records: Vec<ChallengeRecord> = inner
            .challenges
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by(|a, b| a.accepted_at.cmp(&b.accepted_at));
        Ok(records)
    }

    async fn track_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        amount: i64,
        target: u64,
        window_days: i64,
    ) -> RepoResult<ChallengeProgress> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let mut inner = self.inner.lock();
        let key = (user_id.to_string(), challenge_id.to_string());
        let record = inner.challenges.get_mut(&key).ok_or_else(|| {
            StorageError::NotFound(format!(
                "Challenge {} not accepted by user {}",
                challenge_id, user_id
            ))
        })?;

        if record.status != ChallengeStatus::Active {
            return Err(StorageError::Conflict(format!(
                "Challenge {} is {}",
                challenge_id, record.status
            )));
        }

        if Utc::now() > record.accepted_at + Duration::days(window_days) {
            record.status = ChallengeStatus::Expired;
            return Err(StorageError::Conflict(format!(
                "Challenge {} window has closed",
                challenge_id
            )));
        }

        record.progress += amount as u64;
        let completed_now = record.progress >= target;
        if completed_now {
            record.status = ChallengeStatus::Completed;
            record.completed_at = Some(Utc::now());
        }

        Ok(ChallengeProgress {
            record: record.clone(),
            completed_now,
        })
    }
}
