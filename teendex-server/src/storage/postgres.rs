//! PostgreSQL Storage - Progression data persistence
//!
//! All per-user gamification data lives in PostgreSQL. Uses `sqlx` for async
//! queries; the XP award path runs as a `SELECT ... FOR UPDATE` transaction
//! so concurrent awards against one user serialize instead of losing
//! updates.
//!
//! ## Tables
//! - gamification_stats, xp_events, user_badges, user_challenges

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use teendex_core::challenges::ChallengeStatus;
use teendex_core::stats::{AwardOutcome, GamificationStats};
use teendex_core::{leveling, streaks};

use super::migrations;
use super::repository::{
    BadgeRepo, ChallengeProgress, ChallengeRecord, ChallengeRepo, LeaderboardEntry, RepoResult,
    StatsRepo, StorageError, UnlockedBadge,
};

/// PostgreSQL connection pool wrapper
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connected (max_connections={})", max_connections);

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Connect with an existing pool (for testing / shared pools)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        // Create migrations tracking table
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name VARCHAR(100) PRIMARY KEY,
                applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;

        for (name, sql) in migrations::get_migrations() {
            let applied: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = $1)")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;

            if !applied {
                info!("Running migration: {}", name);
                sqlx::raw_sql(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StorageError::Migration(format!("{}: {}", name, e)))?;

                sqlx::query("INSERT INTO _migrations (name) VALUES ($1)")
                    .bind(name)
                    .execute(&self.pool)
                    .await?;

                info!("Migration applied: {}", name);
            } else {
                debug!("Migration already applied: {}", name);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Stats Operations
    // ========================================================================

    /// Create the stats record for a new user (xp = 0, level = 1)
    pub async fn init_stats(&self, user_id: &str) -> Result<StatsRow, StorageError> {
        let row = sqlx::query_as::<_, StatsRow>(
            "INSERT INTO gamification_stats (user_id)
             VALUES ($1)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING user_id, xp, level, total_earnings, current_streak, longest_streak,
                       weekly_streak, last_active_date, total_badges",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            StorageError::Conflict(format!("Stats already initialized for user {}", user_id))
        })?;

        info!("Initialized gamification stats for user {}", user_id);
        Ok(row)
    }

    /// Get stats for a user
    pub async fn get_stats(&self, user_id: &str) -> Result<Option<StatsRow>, StorageError> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT user_id, xp, level, total_earnings, current_streak, longest_streak,
                    weekly_streak, last_active_date, total_badges
             FROM gamification_stats WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Award XP and recompute the level atomically.
    ///
    /// The row lock from `FOR UPDATE` serializes concurrent awards for the
    /// same user; xp and level are written in the same statement so no
    /// reader ever sees them out of sync.
    pub async fn award_xp(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
    ) -> Result<AwardOutcome, StorageError> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;

        let (xp, level): (i64, i32) = sqlx::query_as(
            "SELECT xp, level FROM gamification_stats WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        let new_xp = xp + amount;
        let new_level = leveling::level_for(new_xp as u64) as i32;
        let leveled_up = new_level > level;

        sqlx::query(
            "UPDATE gamification_stats SET xp = $2, level = $3, updated_at = NOW()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(new_xp)
        .bind(new_level)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO xp_events (user_id, amount, reason, new_xp, new_level, leveled_up)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user_id)
        .bind(amount)
        .bind(reason)
        .bind(new_xp)
        .bind(new_level)
        .bind(leveled_up)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if leveled_up {
            info!("User {} leveled up to {} ({})", user_id, new_level, reason);
        }

        Ok(AwardOutcome {
            new_xp: new_xp as u64,
            new_level: new_level as u32,
            leveled_up,
        })
    }

    /// Record a day of activity and update streak counters atomically
    pub async fn record_activity(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<StatsRow, StorageError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT user_id, xp, level, total_earnings, current_streak, longest_streak,
                    weekly_streak, last_active_date, total_badges
             FROM gamification_stats WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        let mut stats = row.to_stats();
        streaks::record_activity(&mut stats, date);

        let row = sqlx::query_as::<_, StatsRow>(
            "UPDATE gamification_stats
             SET current_streak = $2, longest_streak = $3, weekly_streak = $4,
                 last_active_date = $5, updated_at = NOW()
             WHERE user_id = $1
             RETURNING user_id, xp, level, total_earnings, current_streak, longest_streak,
                       weekly_streak, last_active_date, total_badges",
        )
        .bind(user_id)
        .bind(stats.current_streak as i32)
        .bind(stats.longest_streak as i32)
        .bind(stats.weekly_streak as i32)
        .bind(stats.last_active_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Add to lifetime earnings (single-statement atomic increment)
    pub async fn record_earnings(
        &self,
        user_id: &str,
        amount: i64,
    ) -> Result<StatsRow, StorageError> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let row = sqlx::query_as::<_, StatsRow>(
            "UPDATE gamification_stats
             SET total_earnings = total_earnings + $2, updated_at = NOW()
             WHERE user_id = $1
             RETURNING user_id, xp, level, total_earnings, current_streak, longest_streak,
                       weekly_streak, last_active_date, total_badges",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

        Ok(row)
    }

    /// Top N users by XP
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>, StorageError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            "SELECT user_id, xp, level, current_streak
             FROM gamification_stats
             ORDER BY xp DESC, user_id ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ========================================================================
    // Badge Operations
    // ========================================================================

    /// Get badges unlocked by a user
    pub async fn get_badges(&self, user_id: &str) -> Result<Vec<BadgeRow>, StorageError> {
        let rows = sqlx::query_as::<_, BadgeRow>(
            "SELECT user_id, badge_id, unlocked_at, showcased
             FROM user_badges WHERE user_id = $1
             ORDER BY unlocked_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Unlock a badge; returns false if it was already unlocked.
    /// A fresh unlock bumps `total_badges` in the same transaction.
    pub async fn unlock_badge(&self, user_id: &str, badge_id: &str) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM gamification_stats WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(StorageError::NotFound(format!("Stats for user {}", user_id)));
        }

        let result = sqlx::query(
            "INSERT INTO user_badges (user_id, badge_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, badge_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(badge_id)
        .execute(&mut *tx)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            sqlx::query(
                "UPDATE gamification_stats
                 SET total_badges = total_badges + 1, updated_at = NOW()
                 WHERE user_id = $1",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            info!("User {} unlocked badge {}", user_id, badge_id);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Toggle showcasing of an unlocked badge
    pub async fn showcase_badge(
        &self,
        user_id: &str,
        badge_id: &str,
        showcased: bool,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE user_badges SET showcased = $3
             WHERE user_id = $1 AND badge_id = $2",
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(showcased)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Badge {} for user {}",
                badge_id, user_id
            )));
        }

        Ok(())
    }

    // ========================================================================
    // Challenge Operations
    // ========================================================================

    /// Accept a challenge
    pub async fn accept_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<ChallengeRow, StorageError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM gamification_stats WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(StorageError::NotFound(format!("Stats for user {}", user_id)));
        }

        let row = sqlx::query_as::<_, ChallengeRow>(
            "INSERT INTO user_challenges (user_id, challenge_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, challenge_id) DO NOTHING
             RETURNING user_id, challenge_id, status, progress, accepted_at, completed_at",
        )
        .bind(user_id)
        .bind(challenge_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            StorageError::Conflict(format!(
                "User {} already accepted challenge {}",
                user_id, challenge_id
            ))
        })?;

        Ok(row)
    }

    /// Get all challenge records for a user
    pub async fn get_challenges(&self, user_id: &str) -> Result<Vec<ChallengeRow>, StorageError> {
        let rows = sqlx::query_as::<_, ChallengeRow>(
            "SELECT user_id, challenge_id, status, progress, accepted_at, completed_at
             FROM user_challenges WHERE user_id = $1
             ORDER BY accepted_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Add progress toward a challenge target.
    ///
    /// Expiry is checked against the acceptance time inside the transaction;
    /// an update that arrives after the window marks the record expired and
    /// fails. Crossing the target flips the record to completed exactly once.
    pub async fn track_challenge_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        amount: i64,
        target: i64,
        window_days: i64,
    ) -> Result<(ChallengeRow, bool), StorageError> {
        if amount < 0 {
            return Err(StorageError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ChallengeRow>(
            "SELECT user_id, challenge_id, status, progress, accepted_at, completed_at
             FROM user_challenges
             WHERE user_id = $1 AND challenge_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(challenge_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            StorageError::NotFound(format!(
                "Challenge {} not accepted by user {}",
                challenge_id, user_id
            ))
        })?;

        if row.status != "active" {
            return Err(StorageError::Conflict(format!(
                "Challenge {} is {}",
                challenge_id, row.status
            )));
        }

        if Utc::now() > row.accepted_at + Duration::days(window_days) {
            sqlx::query(
                "UPDATE user_challenges SET status = 'expired'
                 WHERE user_id = $1 AND challenge_id = $2",
            )
            .bind(user_id)
            .bind(challenge_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            return Err(StorageError::Conflict(format!(
                "Challenge {} window has closed",
                challenge_id
            )));
        }

        let new_progress = row.progress + amount;
        let completed_now = new_progress >= target;

        let row = sqlx::query_as::<_, ChallengeRow>(
            "UPDATE user_challenges
             SET progress = $3,
                 status = CASE WHEN $4 THEN 'completed' ELSE status END,
                 completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END
             WHERE user_id = $1 AND challenge_id = $2
             RETURNING user_id, challenge_id, status, progress, accepted_at, completed_at",
        )
        .bind(user_id)
        .bind(challenge_id)
        .bind(new_progress)
        .bind(completed_now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if completed_now {
            info!("User {} completed challenge {}", user_id, challenge_id);
        }

        Ok((row, completed_now))
    }
}

// ============================================================================
// Row types (for sqlx query_as mapping)
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct StatsRow {
    pub user_id: String,
    pub xp: i64,
    pub level: i32,
    pub total_earnings: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub weekly_streak: i32,
    pub last_active_date: Option<NaiveDate>,
    pub total_badges: i32,
}

impl StatsRow {
    pub fn to_stats(&self) -> GamificationStats {
        GamificationStats {
            user_id: self.user_id.clone(),
            xp: self.xp as u64,
            level: self.level as u32,
            total_earnings: self.total_earnings as u64,
            current_streak: self.current_streak as u32,
            longest_streak: self.longest_streak as u32,
            weekly_streak: self.weekly_streak as u32,
            last_active_date: self.last_active_date,
            total_badges: self.total_badges as u32,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct BadgeRow {
    pub user_id: String,
    pub badge_id: String,
    pub unlocked_at: chrono::DateTime<Utc>,
    pub showcased: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChallengeRow {
    pub user_id: String,
    pub challenge_id: String,
    pub status: String,
    pub progress: i64,
    pub accepted_at: chrono::DateTime<Utc>,
    pub completed_at: Option<chrono::DateTime<Utc>>,
}

impl ChallengeRow {
    fn to_record(&self) -> ChallengeRecord {
        ChallengeRecord {
            challenge_id: self.challenge_id.clone(),
            status: self
                .status
                .parse::<ChallengeStatus>()
                .unwrap_or(ChallengeStatus::Active),
            progress: self.progress as u64,
            accepted_at: self.accepted_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub xp: i64,
    pub level: i32,
    pub current_streak: i32,
}

// ============================================================================
// Repository trait implementations
// ============================================================================

#[async_trait]
impl StatsRepo for PostgresStore {
    async fn init(&self, user_id: &str) -> RepoResult<GamificationStats> {
        Ok(self.init_stats(user_id).await?.to_stats())
    }

    async fn get(&self, user_id: &str) -> RepoResult<Option<GamificationStats>> {
        Ok(self.get_stats(user_id).await?.map(|r| r.to_stats()))
    }

    async fn award_xp(&self, user_id: &str, amount: i64, reason: &str) -> RepoResult<AwardOutcome> {
        PostgresStore::award_xp(self, user_id, amount, reason).await
    }

    async fn record_activity(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> RepoResult<GamificationStats> {
        Ok(PostgresStore::record_activity(self, user_id, date)
            .await?
            .to_stats())
    }

    async fn record_earnings(&self, user_id: &str, amount: i64) -> RepoResult<GamificationStats> {
        Ok(PostgresStore::record_earnings(self, user_id, amount)
            .await?
            .to_stats())
    }

    async fn leaderboard(&self, limit: i64) -> RepoResult<Vec<LeaderboardEntry>> {
        let rows = PostgresStore::leaderboard(self, limit).await?;
        Ok(rows
            .iter()
            .map(|r| LeaderboardEntry {
                user_id: r.user_id.clone(),
                xp: r.xp as u64,
                level: r.level as u32,
                current_streak: r.current_streak as u32,
            })
            .collect())
    }
}

#[async_trait]
impl BadgeRepo for PostgresStore {
    async fn unlocked(&self, user_id: &str) -> RepoResult<Vec<UnlockedBadge>> {
        let rows = self.get_badges(user_id).await?;
        Ok(rows
            .iter()
            .map(|r| UnlockedBadge {
                badge_id: r.badge_id.clone(),
                unlocked_at: r.unlocked_at,
                showcased: r.showcased,
            })
            .collect())
    }

    async fn unlock(&self, user_id: &str, badge_id: &str) -> RepoResult<bool> {
        self.unlock_badge(user_id, badge_id).await
    }

    async fn showcase(&self, user_id: &str, badge_id: &str, showcased: bool) -> RepoResult<()> {
        self.showcase_badge(user_id, badge_id, showcased).await
    }
}

#[async_trait]
impl ChallengeRepo for PostgresStore {
    async fn accept(&self, user_id: &str, challenge_id: &str) -> RepoResult<ChallengeRecord> {
        Ok(self.accept_challenge(user_id, challenge_id).await?.to_record())
    }

    async fn for_user(&self, user_id: &str) -> RepoResult<Vec<ChallengeRecord>> {
        let rows = self.get_challenges(user_id).await?;
        Ok(rows.iter().map(|r| r.to_record()).collect())
    }

    async fn track_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        amount: i64,
        target: u64,
        window_days: i64,
    ) -> RepoResult<ChallengeProgress> {
        let (row, completed_now) = self
            .track_challenge_progress(user_id, challenge_id, amount, target as i64, window_days)
            .await?;
        Ok(ChallengeProgress {
            record: row.to_record(),
            completed_now,
        })
    }
}
