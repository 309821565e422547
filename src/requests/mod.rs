//! Service request recording.
//!
//! The write path re-validates both sides inside the transaction that
//! inserts the row, so a request can never reference a user or service
//! that vanished mid-flight.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::db::models::{RequestStatus, ServiceRequest};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("User not found")]
    UserNotFound,
    #[error("Service not found")]
    ServiceNotFound,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Record a request by `user_id` for `service_id` with status
/// REQUESTED. The user id comes from the caller's session, never from
/// the request body. Repeated requests for the same service are
/// deliberately allowed; each call records its own row.
pub async fn request_service(
    db: &SqlitePool,
    user_id: i64,
    service_id: i64,
) -> Result<ServiceRequest, RequestError> {
    let mut tx = db.begin().await?;

    let user_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
    if user_exists == 0 {
        return Err(RequestError::UserNotFound);
    }

    let service_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services WHERE id = ?")
        .bind(service_id)
        .fetch_one(&mut *tx)
        .await?;
    if service_exists == 0 {
        return Err(RequestError::ServiceNotFound);
    }

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO service_requests (user_id, service_id, status, requested_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(service_id)
    .bind(RequestStatus::Requested.as_str())
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    let request_id = result.last_insert_rowid();
    tx.commit().await?;

    info!(
        "Recorded service request {} (user {}, service {})",
        request_id, user_id, service_id
    );

    ServiceRequest::find_by_id(db, request_id)
        .await?
        .ok_or(RequestError::Db(sqlx::Error::RowNotFound))
}
