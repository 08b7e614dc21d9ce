//! ProgressionService — Stats, XP awards, activity, earnings endpoints
//!
//! Endpoints:
//! - POST /teendex.ProgressionService/InitStats
//! - POST /teendex.ProgressionService/GetStats
//! - POST /teendex.ProgressionService/AwardXp
//! - POST /teendex.ProgressionService/RecordActivity
//! - POST /teendex.ProgressionService/RecordEarnings

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{error_response, sync_badges, ApiState};
use teendex_core::stats::GamificationStats;

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/teendex.ProgressionService/InitStats", post(init_stats))
        .route("/teendex.ProgressionService/GetStats", post(get_stats))
        .route("/teendex.ProgressionService/AwardXp", post(award_xp))
        .route(
            "/teendex.ProgressionService/RecordActivity",
            post(record_activity),
        )
        .route(
            "/teendex.ProgressionService/RecordEarnings",
            post(record_earnings),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct UserRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    pub total_earnings: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_badges: u32,
    pub xp_into_level: u64,
    pub xp_to_next: u64,
    pub level_fraction: f32,
}

impl StatsResponse {
    fn from_stats(stats: GamificationStats) -> Self {
        let progress = stats.level_progress();
        Self {
            user_id: stats.user_id,
            xp: stats.xp,
            level: stats.level,
            total_earnings: stats.total_earnings,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            weekly_streak: stats.weekly_streak,
            last_active_date: stats.last_active_date,
            total_badges: stats.total_badges,
            xp_into_level: progress.xp_into_level,
            xp_to_next: progress.xp_to_next,
            level_fraction: progress.fraction,
        }
    }
}

#[derive(Deserialize)]
pub struct AwardXpRequest {
    pub user_id: String,
    /// Signed on the wire so a negative amount is rejected, not wrapped
    pub amount: i64,
    pub reason: String,
}

#[derive(Serialize)]
pub struct AwardXpResponse {
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    /// Badges this award pushed over the line
    pub unlocked_badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct RecordActivityRequest {
    pub user_id: String,
    /// Defaults to today (UTC) when omitted
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct RecordActivityResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_streak: u32,
    pub unlocked_badges: Vec<String>,
}

#[derive(Deserialize)]
pub struct RecordEarningsRequest {
    pub user_id: String,
    /// Paise; signed on the wire so a negative amount is rejected
    pub amount: i64,
    pub reason: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn init_stats(
    State(state): State<ApiState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = state
        .storage
        .stats
        .init(&req.user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(StatsResponse::from_stats(stats)))
}

async fn get_stats(
    State(state): State<ApiState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = state
        .storage
        .stats
        .get(&req.user_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Not found: Stats for user {}", req.user_id),
            )
        })?;

    Ok(Json(StatsResponse::from_stats(stats)))
}

async fn award_xp(
    State(state): State<ApiState>,
    Json(req): Json<AwardXpRequest>,
) -> Result<Json<AwardXpResponse>, (StatusCode, String)> {
    let outcome = state
        .storage
        .stats
        .award_xp(&req.user_id, req.amount, &req.reason)
        .await
        .map_err(error_response)?;

    state.metrics.record_award(req.amount as u64, outcome.leveled_up);

    let unlocked_badges = sync_badges(&state.storage, &req.user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(AwardXpResponse {
        new_xp: outcome.new_xp,
        new_level: outcome.new_level,
        leveled_up: outcome.leveled_up,
        unlocked_badges,
    }))
}

async fn record_activity(
    State(state): State<ApiState>,
    Json(req): Json<RecordActivityRequest>,
) -> Result<Json<RecordActivityResponse>, (StatusCode, String)> {
    let date = req.date.unwrap_or_else(|| Utc::now().date_naive());

    let stats = state
        .storage
        .stats
        .record_activity(&req.user_id, date)
        .await
        .map_err(error_response)?;

    let unlocked_badges = sync_badges(&state.storage, &req.user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(RecordActivityResponse {
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak,
        weekly_streak: stats.weekly_streak,
        unlocked_badges,
    }))
}

async fn record_earnings(
    State(state): State<ApiState>,
    Json(req): Json<RecordEarningsRequest>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    state
        .storage
        .stats
        .record_earnings(&req.user_id, req.amount)
        .await
        .map_err(error_response)?;

    // Earnings milestones can unlock revenue badges (which may pay XP)
    sync_badges(&state.storage, &req.user_id)
        .await
        .map_err(error_response)?;

    let stats = state
        .storage
        .stats
        .get(&req.user_id)
        .await
        .map_err(error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Not found: Stats for user {}", req.user_id),
            )
        })?;

    tracing::debug!(
        "Recorded earnings for {} ({}): total now {}",
        req.user_id,
        req.reason,
        stats.total_earnings
    );

    Ok(Json(StatsResponse::from_stats(stats)))
}
