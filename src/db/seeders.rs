//! Database seeders for reference data.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Seed the fixed role vocabulary (runs on every startup, idempotent).
///
/// Role ids are stable so existing user_roles rows keep their meaning
/// across restarts.
pub async fn seed_roles(pool: &SqlitePool) -> Result<()> {
    let roles: [(i64, &str); 3] = [(1, "USER"), (2, "PROFESSIONAL"), (3, "ADMIN")];

    for (id, name) in roles {
        sqlx::query("INSERT OR IGNORE INTO roles (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }

    info!("Seeded {} roles", roles.len());
    Ok(())
}
