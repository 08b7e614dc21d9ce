//! Structured Logging & Tracing
//!
//! Thin wrapper over the `tracing` stack with an idempotent initializer, so
//! the server binary, tests, and embedding hosts can all call it without
//! worrying about double-registration.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with the default filter (`info`), honoring `RUST_LOG`
/// when set. Idempotent — safe to call multiple times.
pub fn init_tracing_default() {
    init_tracing("info");
}

/// Initialize tracing with a custom fallback filter (idempotent — first call
/// wins; `RUST_LOG` overrides the fallback).
pub fn init_tracing(fallback_filter: &str) {
    let fallback = fallback_filter.to_string();
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact();

        // Ignore error if a global subscriber is already set (e.g., by a test harness)
        let _ = subscriber.try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_idempotent() {
        // Should not panic when called multiple times
        init_tracing_default();
        init_tracing_default();
        init_tracing("debug");
    }
}
