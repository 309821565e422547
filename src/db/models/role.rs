//! Role reference data.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A grantable role. The vocabulary is fixed (USER, PROFESSIONAL, ADMIN)
/// and seeded at startup; rows are reference data, never user-created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Role {
    /// Look up a role by its exact name (names are stored uppercase).
    pub async fn find_by_name(db: &SqlitePool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, name FROM roles WHERE name = ?
            "#,
        )
        .bind(name.to_uppercase())
        .fetch_optional(db)
        .await
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, name FROM roles ORDER BY id ASC
            "#,
        )
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_roles_are_seeded() {
        let db = test_pool().await;

        let roles = Role::list_all(&db).await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["USER", "PROFESSIONAL", "ADMIN"]);
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive() {
        let db = test_pool().await;

        let role = Role::find_by_name(&db, "professional").await.unwrap();
        assert_eq!(role.unwrap().name, "PROFESSIONAL");

        let missing = Role::find_by_name(&db, "SUPERVISOR").await.unwrap();
        assert!(missing.is_none());
    }
}
