//! Database operations for the app's `PostgreSQL` collaborator tables.
//!
//! ## Tables
//!
//! - `sessions` - Shopify session rows written by the platform auth library;
//!   read for data exports, deleted for redaction/uninstall
//! - `connector_configs` - Per-shop connector configuration
//!
//! Both tables are reached through store traits (`SessionStore`,
//! `ConnectorStore`) so the compliance manager and routes can run against
//! in-memory implementations in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p adstem-cli -- migrate
//! ```

pub mod connectors;
pub mod sessions;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use connectors::{ConnectorConfig, ConnectorStore, MemoryConnectorStore, PgConnectorStore};
pub use sessions::{
    MemorySessionStore, PgSessionStore, SessionExport, SessionRecord, SessionStore,
};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
