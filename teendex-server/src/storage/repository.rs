//! Repository traits - abstraction layer for data access
//!
//! All API handlers interact with progression data through these traits,
//! making it easy to swap storage backends (PostgreSQL in production, the
//! in-memory store for tests and local development).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use teendex_core::challenges::ChallengeStatus;
use teendex_core::stats::{AwardOutcome, GamificationStats};

/// Error type shared by all storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid amount: {0} (must be non-negative)")]
    InvalidAmount(i64),
}

/// Generic result type for repository operations
pub type RepoResult<T> = Result<T, StorageError>;

/// A badge a user has unlocked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub badge_id: String,
    pub unlocked_at: DateTime<Utc>,
    pub showcased: bool,
}

/// Per-user challenge participation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub challenge_id: String,
    pub status: ChallengeStatus,
    pub progress: u64,
    pub accepted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Outcome of a challenge progress update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub record: ChallengeRecord,
    /// True only on the update that crossed the target
    pub completed_now: bool,
}

/// One row of the XP leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    pub current_streak: u32,
}

// ============================================================================
// Repositories
// ============================================================================

/// Repository for the per-user gamification stats record.
///
/// Mutating operations are atomic per record: concurrent awards against the
/// same user must serialize so no update is lost, and `xp`/`level` are never
/// observable out of sync.
#[async_trait]
pub trait StatsRepo: Send + Sync {
    /// Explicit one-time initialization (xp = 0, level = 1).
    /// Fails with `Conflict` if the record already exists.
    async fn init(&self, user_id: &str) -> RepoResult<GamificationStats>;

    async fn get(&self, user_id: &str) -> RepoResult<Option<GamificationStats>>;

    /// Award XP and recompute the level in one transaction. Appends an audit
    /// event carrying `reason`. `InvalidAmount` if `amount < 0`, `NotFound`
    /// if the user has no stats record; neither writes anything.
    async fn award_xp(&self, user_id: &str, amount: i64, reason: &str) -> RepoResult<AwardOutcome>;

    /// Record a day of activity, updating streak counters.
    async fn record_activity(&self, user_id: &str, date: NaiveDate)
        -> RepoResult<GamificationStats>;

    /// Add to lifetime earnings (paise).
    async fn record_earnings(&self, user_id: &str, amount: i64) -> RepoResult<GamificationStats>;

    /// Top users by XP (descending, ties broken by user id).
    async fn leaderboard(&self, limit: i64) -> RepoResult<Vec<LeaderboardEntry>>;
}

/// Repository for per-user badge unlocks
#[async_trait]
pub trait BadgeRepo: Send + Sync {
    async fn unlocked(&self, user_id: &str) -> RepoResult<Vec<UnlockedBadge>>;

    /// Unlock a badge; returns false if it was already unlocked. A fresh
    /// unlock increments the user's `total_badges` counter atomically.
    async fn unlock(&self, user_id: &str, badge_id: &str) -> RepoResult<bool>;

    /// Toggle showcasing of an unlocked badge.
    async fn showcase(&self, user_id: &str, badge_id: &str, showcased: bool) -> RepoResult<()>;
}

/// Repository for per-user challenge participation
#[async_trait]
pub trait ChallengeRepo: Send + Sync {
    /// Join a challenge. `Conflict` if already accepted.
    async fn accept(&self, user_id: &str, challenge_id: &str) -> RepoResult<ChallengeRecord>;

    async fn for_user(&self, user_id: &str) -> RepoResult<Vec<ChallengeRecord>>;

    /// Add progress toward the target. Completion triggers exactly once; an
    /// update after the window closed marks the record expired and fails
    /// with `Conflict`.
    async fn track_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        amount: i64,
        target: u64,
        window_days: i64,
    ) -> RepoResult<ChallengeProgress>;
}

// ============================================================================
// Unified Storage Manager
// ============================================================================

/// Central storage manager that holds all repositories
#[derive(Clone)]
pub struct StorageManager {
    pub stats: Arc<dyn StatsRepo>,
    pub badges: Arc<dyn BadgeRepo>,
    pub challenges: Arc<dyn ChallengeRepo>,
}
