//! HTTP/JSON API Layer
//!
//! Provides REST-like endpoints following gRPC path conventions.
//! The web client calls these endpoints via JSON-over-HTTP transport.
//!
//! ## Architecture
//! ```text
//! Web Client (dashboard, community views)
//!       ↓ HTTP POST, JSON body
//! Axum Router
//!       ↓
//! Service Handlers (progression, badges, challenges, community)
//!       ↓
//! StorageManager (PostgreSQL or in-memory)
//! ```
//!
//! ## Endpoint Convention
//! All endpoints follow the gRPC path pattern: `POST /teendex.<Service>/<Method>`
//! Example: `POST /teendex.ProgressionService/AwardXp`

pub mod badges;
pub mod challenges;
pub mod community;
pub mod progression;

use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::metrics::ServerMetrics;
use crate::storage::repository::{StorageError, StorageManager};

/// Shared state available to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub storage: Arc<StorageManager>,
    /// Server-wide metrics (lock-free atomics)
    pub metrics: Arc<ServerMetrics>,
}

/// Map storage errors onto HTTP status codes.
///
/// `NotFound` and `InvalidAmount` are caller errors the client must see as
/// such; everything else is an internal failure.
pub(crate) fn error_response(err: StorageError) -> (StatusCode, String) {
    let status = match &err {
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        StorageError::Conflict(_) => StatusCode::CONFLICT,
        StorageError::Sqlx(_) | StorageError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Storage failure: {}", err);
    }
    (status, err.to_string())
}

/// Unlock every badge whose condition the user's current stats satisfy.
///
/// Each fresh unlock pays its XP reward through the normal award path so the
/// audit log records it. A single pass per request: cascaded unlocks from
/// badge XP land on the next mutation.
pub(crate) async fn sync_badges(
    storage: &StorageManager,
    user_id: &str,
) -> Result<Vec<String>, StorageError> {
    let stats = storage
        .stats
        .get(user_id)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Stats for user {}", user_id)))?;

    let unlocked: HashSet<String> = storage
        .badges
        .unlocked(user_id)
        .await?
        .into_iter()
        .map(|b| b.badge_id)
        .collect();

    let mut newly = Vec::new();
    for badge in teendex_core::badges::newly_unlocked(&stats, &unlocked) {
        if storage.badges.unlock(user_id, &badge.id).await? {
            if badge.xp_reward > 0 {
                let reason = format!("badge:{}", badge.id);
                storage
                    .stats
                    .award_xp(user_id, badge.xp_reward as i64, &reason)
                    .await?;
            }
            newly.push(badge.id);
        }
    }
    Ok(newly)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full API router with all service endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(crate::metrics::prometheus_handler))
        .route("/metrics/json", get(crate::metrics::json_metrics_handler))
        .merge(progression::routes())
        .merge(badges::routes())
        .merge(challenges::routes())
        .merge(community::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP API server on the given port
pub async fn start_api_server(
    storage: Arc<StorageManager>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let metrics = ServerMetrics::new();
    let state = ApiState { storage, metrics };
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
