//! Service catalogue models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A service offered on the platform (e.g. "Plumbing" at 450.0).
/// Names are unique; the UNIQUE constraint is the final arbiter when
/// two admins race to create the same one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub created_at: String,
}

impl Service {
    pub async fn insert(db: &SqlitePool, name: &str, price: f64) -> Result<Service, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO services (name, price, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(&now)
        .execute(db)
        .await?;

        Self::find_by_id(db, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, name, price, created_at FROM services WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_name(db: &SqlitePool, name: &str) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, name, price, created_at FROM services WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(db)
        .await
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, name, price, created_at FROM services ORDER BY name ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Services offered by one professional, for profile hydration.
    pub async fn list_for_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT s.id, s.name, s.price, s.created_at
            FROM services s
            JOIN user_services us ON us.service_id = s.id
            WHERE us.user_id = ?
            ORDER BY s.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_pool().await;

        let created = Service::insert(&db, "Plumbing", 450.0).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.price, 450.0);

        let by_name = Service::find_by_name(&db, "Plumbing").await.unwrap();
        assert_eq!(by_name.unwrap().id, created.id);

        assert!(Service::find_by_name(&db, "Roofing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_violates_unique_constraint() {
        let db = test_pool().await;

        Service::insert(&db, "Cleaning", 200.0).await.unwrap();
        let err = Service::insert(&db, "Cleaning", 250.0).await.unwrap_err();
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn test_list_all_is_name_ordered() {
        let db = test_pool().await;

        Service::insert(&db, "Painting", 300.0).await.unwrap();
        Service::insert(&db, "Carpentry", 500.0).await.unwrap();

        let services = Service::list_all(&db).await.unwrap();
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Carpentry", "Painting"]);
    }
}
