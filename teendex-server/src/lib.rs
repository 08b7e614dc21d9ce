//! Teendex Progression Server
//!
//! HTTP service wrapping the progression core:
//! - `api` — axum routes following the `/teendex.<Service>/<Method>` convention
//! - `storage` — repository traits with PostgreSQL and in-memory backends
//! - `metrics` — lock-free server metrics with Prometheus + JSON export

pub mod api;
pub mod metrics;
pub mod storage;
