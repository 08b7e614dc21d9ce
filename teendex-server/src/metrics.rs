//! Server Metrics — Lightweight request metrics with Prometheus + JSON export
//!
//! Uses lock-free atomics for all counters. No external metrics crate needed.
//!
//! ## Endpoints
//! - `GET /metrics` — Prometheus text format (for Grafana/Prometheus scraping)
//! - `GET /metrics/json` — JSON format (for dashboards and load-test clients)

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::api::ApiState;

/// Shared metrics state (all lock-free atomics)
#[derive(Debug)]
pub struct ServerMetrics {
    /// Total HTTP requests served
    pub total_requests: AtomicU64,
    /// Total request errors (4xx + 5xx)
    pub total_errors: AtomicU64,
    /// Cumulative request duration in microseconds (for computing average)
    pub total_duration_us: AtomicU64,
    /// Total XP awarded through the API
    pub total_xp_awarded: AtomicU64,
    /// Total level-ups observed
    pub total_level_ups: AtomicU64,
    /// Server start time (for uptime calculation)
    pub start_time: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            total_duration_us: AtomicU64::new(0),
            total_xp_awarded: AtomicU64::new(0),
            total_level_ups: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl ServerMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, duration_us: u64, is_error: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_duration_us.fetch_add(duration_us, Ordering::Relaxed);
        if is_error {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_award(&self, amount: u64, leveled_up: bool) {
        self.total_xp_awarded.fetch_add(amount, Ordering::Relaxed);
        if leveled_up {
            self.total_level_ups.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn requests_per_second(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed) as f64;
        let uptime = self.uptime_secs();
        if uptime > 0.0 {
            total / uptime
        } else {
            0.0
        }
    }

    pub fn avg_duration_ms(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        let dur_us = self.total_duration_us.load(Ordering::Relaxed);
        if total > 0 {
            (dur_us as f64 / total as f64) / 1000.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Axum Middleware — Automatic request tracking
// ============================================================================

/// Middleware that records request count and duration for every HTTP request.
pub async fn metrics_middleware(
    State(state): State<ApiState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let resp = next.run(req).await;
    let duration_us = start.elapsed().as_micros() as u64;
    let is_error = resp.status().is_client_error() || resp.status().is_server_error();

    state.metrics.record_request(duration_us, is_error);
    resp
}

// ============================================================================
// GET /metrics — Prometheus text exposition format
// ============================================================================

pub async fn prometheus_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let m = &state.metrics;
    let total_requests = m.total_requests.load(Ordering::Relaxed);
    let total_errors = m.total_errors.load(Ordering::Relaxed);
    let total_dur_us = m.total_duration_us.load(Ordering::Relaxed);
    let total_xp = m.total_xp_awarded.load(Ordering::Relaxed);
    let level_ups = m.total_level_ups.load(Ordering::Relaxed);
    let uptime = m.uptime_secs();
    let rps = m.requests_per_second();

    let avg_req_duration_s = if total_requests > 0 {
        (total_dur_us as f64 / total_requests as f64) / 1_000_000.0
    } else {
        0.0
    };

    let body = format!(
        "# HELP teendex_requests_total Total HTTP requests served\n\
         # TYPE teendex_requests_total counter\n\
         teendex_requests_total {total_requests}\n\
         \n\
         # HELP teendex_request_errors_total Total HTTP request errors (4xx/5xx)\n\
         # TYPE teendex_request_errors_total counter\n\
         teendex_request_errors_total {total_errors}\n\
         \n\
         # HELP teendex_request_duration_seconds Average request duration\n\
         # TYPE teendex_request_duration_seconds gauge\n\
         teendex_request_duration_seconds {avg_req_duration_s:.6}\n\
         \n\
         # HELP teendex_requests_per_second Current request throughput\n\
         # TYPE teendex_requests_per_second gauge\n\
         teendex_requests_per_second {rps:.2}\n\
         \n\
         # HELP teendex_xp_awarded_total Total XP awarded through the API\n\
         # TYPE teendex_xp_awarded_total counter\n\
         teendex_xp_awarded_total {total_xp}\n\
         \n\
         # HELP teendex_level_ups_total Total level-ups observed\n\
         # TYPE teendex_level_ups_total counter\n\
         teendex_level_ups_total {level_ups}\n\
         \n\
         # HELP teendex_uptime_seconds Server uptime\n\
         # TYPE teendex_uptime_seconds gauge\n\
         teendex_uptime_seconds {uptime:.2}\n",
    );

    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

// ============================================================================
// GET /metrics/json — JSON format
// ============================================================================

#[derive(Serialize)]
pub struct JsonMetrics {
    pub uptime_secs: f64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub rps: f64,
    pub avg_request_duration_ms: f64,
    pub total_xp_awarded: u64,
    pub total_level_ups: u64,
}

pub async fn json_metrics_handler(State(state): State<ApiState>) -> Json<JsonMetrics> {
    let m = &state.metrics;

    Json(JsonMetrics {
        uptime_secs: m.uptime_secs(),
        total_requests: m.total_requests.load(Ordering::Relaxed),
        total_errors: m.total_errors.load(Ordering::Relaxed),
        rps: m.requests_per_second(),
        avg_request_duration_ms: m.avg_duration_ms(),
        total_xp_awarded: m.total_xp_awarded.load(Ordering::Relaxed),
        total_level_ups: m.total_level_ups.load(Ordering::Relaxed),
    })
}

// ============================================================================
// Tests
// ============================================================================
