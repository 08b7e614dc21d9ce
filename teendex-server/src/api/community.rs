//! CommunityService — Leaderboard endpoints
//!
//! Endpoints:
//! - POST /teendex.CommunityService/GetLeaderboard

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::{error_response, ApiState};

pub fn routes() -> Router<ApiState> {
    Router::new().route(
        "/teendex.CommunityService/GetLeaderboard",
        post(get_leaderboard),
    )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LeaderboardRequest {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub xp: u64,
    pub level: u32,
    pub current_streak: u32,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_leaderboard(
    State(state): State<ApiState>,
    Json(req): Json<LeaderboardRequest>,
) -> Result<Json<LeaderboardResponse>, (StatusCode, String)> {
    let limit = req.limit.unwrap_or(10).clamp(1, 100) as i64;

    let rows = state
        .storage
        .stats
        .leaderboard(limit)
        .await
        .map_err(error_response)?;

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: r.user_id,
            xp: r.xp,
            level: r.level,
            current_streak: r.current_streak,
        })
        .collect();

    Ok(Json(LeaderboardResponse { entries }))
}
