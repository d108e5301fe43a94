//! Database migration runner and status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;

use creativehub_core::error::{AppError, ErrorKind};
use creativehub_core::result::AppResult;

/// One row of the sqlx migration ledger.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AppliedMigration {
    /// Migration version (timestamp prefix of the file name).
    pub version: i64,
    /// Description derived from the file name.
    pub description: String,
    /// When the migration was applied.
    pub installed_on: DateTime<Utc>,
    /// Whether it completed.
    pub success: bool,
}

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// List migrations recorded as applied, oldest first.
pub async fn applied_migrations(pool: &PgPool) -> AppResult<Vec<AppliedMigration>> {
    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, description, installed_on, success FROM _sqlx_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read migration status", e))
}
