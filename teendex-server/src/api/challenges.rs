//! ChallengeService — Opt-in challenge endpoints
//!
//! Endpoints:
//! - POST /teendex.ChallengeService/ListChallenges
//! - POST /teendex.ChallengeService/AcceptChallenge
//! - POST /teendex.ChallengeService/TrackProgress

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{error_response, sync_badges, ApiState};
use teendex_core::challenges::{self, ChallengeKind};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(
            "/teendex.ChallengeService/ListChallenges",
            post(list_challenges),
        )
        .route(
            "/teendex.ChallengeService/AcceptChallenge",
            post(accept_challenge),
        )
        .route(
            "/teendex.ChallengeService/TrackProgress",
            post(track_progress),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct ListRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub challenges: Vec<ChallengeEntry>,
}

#[derive(Serialize)]
pub struct ChallengeEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: ChallengeKind,
    pub metric: String,
    pub target: u64,
    pub xp_reward: u64,
    /// Participation state, when the user has accepted this challenge
    pub status: Option<String>,
    pub progress: u64,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct AcceptRequest {
    pub user_id: String,
    pub challenge_id: String,
}

#[derive(Serialize)]
pub struct AcceptResponse {
    pub challenge_id: String,
    pub status: String,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct TrackProgressRequest {
    pub user_id: String,
    pub challenge_id: String,
    /// Signed on the wire so a negative amount is rejected
    pub amount: i64,
}

#[derive(Serialize)]
pub struct TrackProgressResponse {
    pub challenge_id: String,
    pub status: String,
    pub progress: u64,
    pub target: u64,
    pub completed: bool,
    pub xp_awarded: u64,
    pub unlocked_badges: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_challenges(
    State(state): State<ApiState>,
    Json(req): Json<ListRequest>,
) -> Result<Json<ListResponse>, (StatusCode, String)> {
    let records = state
        .storage
        .challenges
        .for_user(&req.user_id)
        .await
        .map_err(error_response)?;

    let by_id: HashMap<String, _> = records
        .into_iter()
        .map(|r| (r.challenge_id.clone(), r))
        .collect();

    let entries: Vec<ChallengeEntry> = challenges::catalog()
        .into_iter()
        .map(|c| {
            let record = by_id.get(&c.id);
            ChallengeEntry {
                id: c.id,
                title: c.title,
                description: c.description,
                kind: c.kind,
                metric: c.metric,
                target: c.target,
                xp_reward: c.xp_reward,
                status: record.map(|r| r.status.to_string()),
                progress: record.map(|r| r.progress).unwrap_or(0),
                accepted_at: record.map(|r| r.accepted_at),
                completed_at: record.and_then(|r| r.completed_at),
            }
        })
        .collect();

    Ok(Json(ListResponse { challenges: entries }))
}

async fn accept_challenge(
    State(state): State<ApiState>,
    Json(req): Json<AcceptRequest>,
) -> Result<Json<AcceptResponse>, (StatusCode, String)> {
    // Unknown ids fail before touching storage
    if challenges::find(&req.challenge_id).is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Not found: challenge {}", req.challenge_id),
        ));
    }

    let record = state
        .storage
        .challenges
        .accept(&req.user_id, &req.challenge_id)
        .await
        .map_err(error_response)?;

    Ok(Json(AcceptResponse {
        challenge_id: record.challenge_id,
        status: record.status.to_string(),
        accepted_at: record.accepted_at,
    }))
}

async fn track_progress(
    State(state): State<ApiState>,
    Json(req): Json<TrackProgressRequest>,
) -> Result<Json<TrackProgressResponse>, (StatusCode, String)> {
    let challenge = challenges::find(&req.challenge_id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Not found: challenge {}", req.challenge_id),
        )
    })?;

    let result = state
        .storage
        .challenges
        .track_progress(
            &req.user_id,
            &req.challenge_id,
            req.amount,
            challenge.target,
            challenge.kind.window_days(),
        )
        .await
        .map_err(error_response)?;

    // Completion pays the challenge reward through the normal award path
    let mut xp_awarded = 0;
    let mut unlocked_badges = Vec::new();
    if result.completed_now {
        let reason = format!("challenge:{}", challenge.id);
        let outcome = state
            .storage
            .stats
            .award_xp(&req.user_id, challenge.xp_reward as i64, &reason)
            .await
            .map_err(error_response)?;
        state
            .metrics
            .record_award(challenge.xp_reward, outcome.leveled_up);
        xp_awarded = challenge.xp_reward;

        unlocked_badges = sync_badges(&state.storage, &req.user_id)
            .await
            .map_err(error_response)?;
    }

    Ok(Json(TrackProgressResponse {
        challenge_id: result.record.challenge_id,
        status: result.record.status.to_string(),
        progress: result.record.progress,
        target: challenge.target,
        completed: result.completed_now,
        xp_awarded,
        unlocked_badges,
    }))
}
