// ABOUTME: Database connection management and schema initialization
// ABOUTME: Builds the shared SQLite pool and applies versioned migrations

use std::path::Path;
use std::time::Duration;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, info};

use crate::error::StorageResult;

/// Connect to the SQLite database at the given path and prepare it for use.
///
/// Creates the parent directory if needed, configures the connection pool,
/// and applies any pending schema migrations. Migrations are versioned and
/// recorded in the database, so this is safe to call on every startup.
pub async fn connect(database_path: &Path) -> StorageResult<SqlitePool> {
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database_url = format!("sqlite://{}?mode=rwc", database_path.display());

    debug!("Connecting to database: {}", database_url);

    // Configure connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await?;

    // Configure SQLite settings
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;

    info!("Database connection established");

    // Run migrations
    sqlx::migrate!().run(&pool).await?;

    debug!("Database migrations completed");

    Ok(pool)
}
