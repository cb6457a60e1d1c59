//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! souq-cli migrate
//! ```
//!
//! Applies the migrations embedded from `crates/api/migrations/` to the
//! database named by `SOUQ_DATABASE_URL` (or `DATABASE_URL`). The API binary
//! never migrates on startup; this command is the only migration path.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// No database URL in the environment.
    #[error(transparent)]
    MissingEnvVar(#[from] super::MissingDatabaseUrl),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = super::database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
