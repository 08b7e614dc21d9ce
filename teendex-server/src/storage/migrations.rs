//! Database Migrations - PostgreSQL schema for the progression service
//!
//! Only gamification data lives here; CRM entities (clients, invoices,
//! projects) belong to the host product's own database.

/// SQL migration for creating all tables
pub const MIGRATION_V1: &str = r#"
-- ============================================================================
-- Teendex Progression Schema v1
-- ============================================================================

-- ============================================================================
-- 1. Gamification Stats (one row per user)
-- ============================================================================

CREATE TABLE IF NOT EXISTS gamification_stats (
    user_id          VARCHAR(64) PRIMARY KEY,
    xp               BIGINT NOT NULL DEFAULT 0 CHECK (xp >= 0),
    level            INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
    total_earnings   BIGINT NOT NULL DEFAULT 0 CHECK (total_earnings >= 0),
    current_streak   INTEGER NOT NULL DEFAULT 0 CHECK (current_streak >= 0),
    longest_streak   INTEGER NOT NULL DEFAULT 0 CHECK (longest_streak >= current_streak),
    weekly_streak    INTEGER NOT NULL DEFAULT 0 CHECK (weekly_streak >= 0),
    last_active_date DATE,
    total_badges     INTEGER NOT NULL DEFAULT 0 CHECK (total_badges >= 0),
    created_at       TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
    updated_at       TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

CREATE INDEX idx_stats_xp ON gamification_stats(xp DESC);
CREATE INDEX idx_stats_level ON gamification_stats(level);

-- ============================================================================
-- 2. XP Event Log (append-only audit of awards)
-- ============================================================================

CREATE TABLE IF NOT EXISTS xp_events (
    id          BIGSERIAL PRIMARY KEY,
    user_id     VARCHAR(64) NOT NULL REFERENCES gamification_stats(user_id) ON DELETE CASCADE,
    amount      BIGINT NOT NULL CHECK (amount >= 0),
    reason      VARCHAR(200) NOT NULL,
    new_xp      BIGINT NOT NULL,
    new_level   INTEGER NOT NULL,
    leveled_up  BOOLEAN NOT NULL,
    created_at  TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

CREATE INDEX idx_xp_events_user ON xp_events(user_id, created_at);

-- ============================================================================
-- 3. Badges (unlocks only; definitions are code-defined)
-- ============================================================================

CREATE TABLE IF NOT EXISTS user_badges (
    user_id     VARCHAR(64) NOT NULL REFERENCES gamification_stats(user_id) ON DELETE CASCADE,
    badge_id    VARCHAR(100) NOT NULL,
    unlocked_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    showcased   BOOLEAN NOT NULL DEFAULT FALSE,

    PRIMARY KEY (user_id, badge_id)
);

CREATE INDEX idx_user_badges_user ON user_badges(user_id);

-- ============================================================================
-- 4. Challenge Participation
-- ============================================================================

CREATE TABLE IF NOT EXISTS user_challenges (
    user_id      VARCHAR(64) NOT NULL REFERENCES gamification_stats(user_id) ON DELETE CASCADE,
    challenge_id VARCHAR(100) NOT NULL,
    status       VARCHAR(20) NOT NULL DEFAULT 'active',
    progress     BIGINT NOT NULL DEFAULT 0 CHECK (progress >= 0),
    accepted_at  TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    completed_at TIMESTAMP WITH TIME ZONE,

    PRIMARY KEY (user_id, challenge_id)
);

CREATE INDEX idx_user_challenges_user ON user_challenges(user_id);
CREATE INDEX idx_user_challenges_status ON user_challenges(status);
"#;

/// All migrations in application order
pub fn get_migrations() -> Vec<(&'static str, &'static str)> {
    vec![("v1_progression_schema", MIGRATION_V1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_named() {
        let migrations = get_migrations();
        assert!(!migrations.is_empty());
        for (name, sql) in &migrations {
            assert!(!name.is_empty());
            assert!(sql.contains("CREATE TABLE"), "Migration {} creates nothing", name);
        }
    }

    #[test]
    fn test_v1_covers_all_tables() {
        assert!(MIGRATION_V1.contains("gamification_stats"));
        assert!(MIGRATION_V1.contains("xp_events"));
        assert!(MIGRATION_V1.contains("user_badges"));
        assert!(MIGRATION_V1.contains("user_challenges"));
    }
}
