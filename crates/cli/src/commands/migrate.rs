//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! adstem migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADSTEM_DATABASE_URL` - `PostgreSQL` connection string
//! - `DATABASE_URL` - fallback when `ADSTEM_DATABASE_URL` is unset
//!
//! # Migration Files
//!
//! App migrations: `crates/app/migrations/`

use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run app database migrations.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADSTEM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("ADSTEM_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../app/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
