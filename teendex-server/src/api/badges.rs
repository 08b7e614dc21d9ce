//! BadgeService — Trophy case endpoints
//!
//! Endpoints:
//! - POST /teendex.BadgeService/GetBadgeBook
//! - POST /teendex.BadgeService/ShowcaseBadge

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{error_response, ApiState};
use teendex_core::badges::{self, BadgeCategory, BadgeRarity};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/teendex.BadgeService/GetBadgeBook", post(get_badge_book))
        .route("/teendex.BadgeService/ShowcaseBadge", post(showcase_badge))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct BadgeBookRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct BadgeBookResponse {
    pub badges: Vec<BadgeEntry>,
    pub unlocked_count: u32,
    /// Visible catalog size (hidden badges appear only once earned)
    pub total_count: u32,
}

#[derive(Serialize)]
pub struct BadgeEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub icon: String,
    pub xp_reward: u64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub showcased: bool,
}

#[derive(Deserialize)]
pub struct ShowcaseRequest {
    pub user_id: String,
    pub badge_id: String,
    pub showcased: bool,
}

#[derive(Serialize)]
pub struct ShowcaseResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_badge_book(
    State(state): State<ApiState>,
    Json(req): Json<BadgeBookRequest>,
) -> Result<Json<BadgeBookResponse>, (StatusCode, String)> {
    let unlocked = state
        .storage
        .badges
        .unlocked(&req.user_id)
        .await
        .map_err(error_response)?;

    let by_id: HashMap<String, _> = unlocked
        .into_iter()
        .map(|b| (b.badge_id.clone(), b))
        .collect();

    let entries: Vec<BadgeEntry> = badges::catalog()
        .into_iter()
        .filter(|b| !b.hidden || by_id.contains_key(&b.id))
        .map(|b| {
            let unlock = by_id.get(&b.id);
            BadgeEntry {
                id: b.id,
                name: b.name,
                description: b.description,
                category: b.category,
                rarity: b.rarity,
                icon: b.icon,
                xp_reward: b.xp_reward,
                unlocked: unlock.is_some(),
                unlocked_at: unlock.map(|u| u.unlocked_at),
                showcased: unlock.map(|u| u.showcased).unwrap_or(false),
            }
        })
        .collect();

    let unlocked_count = entries.iter().filter(|e| e.unlocked).count() as u32;
    let total_count = entries.len() as u32;

    Ok(Json(BadgeBookResponse {
        badges: entries,
        unlocked_count,
        total_count,
    }))
}

async fn showcase_badge(
    State(state): State<ApiState>,
    Json(req): Json<ShowcaseRequest>,
) -> Result<Json<ShowcaseResponse>, (StatusCode, String)> {
    state
        .storage
        .badges
        .showcase(&req.user_id, &req.badge_id, req.showcased)
        .await
        .map_err(error_response)?;

    Ok(Json(ShowcaseResponse { success: true }))
}
