//! Storage Layer - Unified data access for the progression service
//!
//! Implements the Repository pattern over two backends:
//! - **PostgreSQL**: production store; awards run as row-locked transactions
//! - **In-memory**: tests and local development, identical semantics
//!
//! ## Architecture
//! ```text
//! [API Handlers]
//!       ↓
//! [Repository Traits]  (StatsRepo / BadgeRepo / ChallengeRepo)
//!       ↓
//! ┌──────────────────┬──────────────┐
//! │ PostgresStore    │ MemoryStore  │
//! │ (production)     │ (tests/dev)  │
//! └──────────────────┴──────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let storage = storage::init_storage("postgres://...", 10).await?;
//! let outcome = storage.stats.award_xp("user_1", 50, "invoice_paid").await?;
//! ```

pub mod memory;
pub mod migrations;
pub mod postgres;
pub mod repository;

use std::sync::Arc;
use tracing::info;

use self::memory::MemoryStore;
use self::postgres::PostgresStore;
use self::repository::{StorageManager, StorageError};

impl StorageManager {
    /// Wire all repositories to a PostgreSQL store
    pub fn postgres(store: Arc<PostgresStore>) -> Self {
        Self {
            stats: store.clone(),
            badges: store.clone(),
            challenges: store,
        }
    }

    /// Wire all repositories to a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            stats: store.clone(),
            badges: store.clone(),
            challenges: store,
        }
    }
}

/// Initialize the production storage layer: connect to PostgreSQL, run
/// migrations, and return a unified StorageManager.
pub async fn init_storage(
    database_url: &str,
    max_connections: u32,
) -> Result<StorageManager, StorageError> {
    let pg = Arc::new(PostgresStore::new(database_url, max_connections).await?);
    info!("PostgreSQL progression store initialized");
    Ok(StorageManager::postgres(pg))
}
