//! User account models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::Service;

/// A user account row. Carries the password hash, so it is never
/// serialized; API responses go through [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub address: String,
    pub pincode: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// New-account parameters for [`User::register`].
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub pincode: i64,
    pub role_id: i64,
    pub service_ids: &'a [i64],
}

/// API projection of a user: the public fields plus explicitly hydrated
/// roles and offered services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub address: String,
    pub pincode: i64,
    pub roles: Vec<String>,
    #[serde(rename = "servicesProvided")]
    pub services_provided: Vec<Service>,
}

impl UserResponse {
    /// Hydrate the projection with two targeted queries (roles, offered
    /// services). Callers pick when to pay for the joins; nothing is
    /// loaded lazily.
    pub async fn load(db: &SqlitePool, user: &User) -> Result<UserResponse, sqlx::Error> {
        let roles = User::load_role_names(db, user.id).await?;
        let services_provided = Service::list_for_user(db, user.id).await?;

        Ok(UserResponse {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            pincode: user.pincode,
            roles,
            services_provided,
        })
    }
}

impl User {
    /// Create an account with its initial role and (for professionals)
    /// offered services, all inside one transaction. A duplicate
    /// username surfaces as the UNIQUE constraint error and nothing is
    /// written.
    pub async fn register(db: &SqlitePool, new: NewUser<'_>) -> Result<User, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email, address, pincode, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.username)
        .bind(new.password_hash)
        .bind(new.email)
        .bind(new.address)
        .bind(new.pincode)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let user_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(new.role_id)
            .execute(&mut *tx)
            .await?;

        for service_id in new.service_ids {
            sqlx::query("INSERT OR IGNORE INTO user_services (user_id, service_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(service_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Self::find_by_id(db, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, address, pincode, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, address, pincode, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn exists_by_username(db: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(db)
            .await?;

        Ok(count > 0)
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, username, password_hash, email, address, pincode, created_at, updated_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Role names held by a user, in seed order.
    pub async fn load_role_names(
        db: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Grant a role. Granting one the user already holds is a no-op, so
    /// concurrent assignments of the same role cannot fail each other.
    pub async fn assign_role(
        db: &SqlitePool,
        user_id: i64,
        role_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role_id)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Count of users holding the given role.
    pub async fn count_with_role(db: &SqlitePool, role_name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT u.id)
            FROM users u
            JOIN user_roles ur ON ur.user_id = u.id
            JOIN roles r ON r.id = ur.role_id
            WHERE r.name = ?
            "#,
        )
        .bind(role_name)
        .fetch_one(db)
        .await
    }

    /// Delete an account by username; role grants, offered services and
    /// service requests cascade with it. Returns false when no such
    /// user existed.
    pub async fn delete_by_username(db: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Partial profile update; absent fields keep their current value.
    /// The username is immutable.
    pub async fn update_profile(
        db: &SqlitePool,
        id: i64,
        email: Option<&str>,
        address: Option<&str>,
        pincode: Option<i64>,
    ) -> Result<User, sqlx::Error> {
        let existing = Self::find_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let new_email = email.unwrap_or(&existing.email);
        let new_address = address.unwrap_or(&existing.address);
        let new_pincode = pincode.unwrap_or(existing.pincode);
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, address = ?, pincode = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(new_email)
        .bind(new_address)
        .bind(new_pincode)
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?;

        Self::find_by_id(db, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
