pub mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_roles;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("nesthome.db");

    info!("Initializing database at {}", db_path.display());

    // foreign_keys is per-connection, so it has to be set through the
    // connect options rather than a one-off PRAGMA; cascade deletes for
    // user removal depend on it holding everywhere.
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Initial schema
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Seed the fixed role vocabulary (idempotent, runs on every startup)
    seeders::seed_roles(pool).await?;

    info!("Migrations completed");
    Ok(())
}

/// In-memory pool with the full schema applied, for tests.
///
/// Capped at one connection: every connection to `sqlite::memory:` gets
/// its own database, so a larger pool would scatter state.
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn role_count(pool: &DbPool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_creates_file_database_with_seeded_roles() {
        let dir = tempfile::tempdir().unwrap();

        let pool = init(dir.path()).await.unwrap();
        assert!(dir.path().join("nesthome.db").exists());
        assert_eq!(role_count(&pool).await, 3);
        pool.close().await;

        // A restart against the same directory reapplies migrations and
        // seeders without duplicating anything.
        let pool = init(dir.path()).await.unwrap();
        assert_eq!(role_count(&pool).await, 3);
    }
}
