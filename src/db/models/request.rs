//! Service request models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Lifecycle states of a service request. The in-scope flow only ever
/// writes `Requested`; the later transitions are carried in the
/// vocabulary for the accept/complete flows layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Requested,
    Accepted,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Requested => "REQUESTED",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Completed => "COMPLETED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "REQUESTED" => Ok(RequestStatus::Requested),
            "ACCEPTED" => Ok(RequestStatus::Accepted),
            "COMPLETED" => Ok(RequestStatus::Completed),
            "CANCELLED" => Ok(RequestStatus::Cancelled),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

/// A recorded request by a user for a service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRequest {
    pub id: i64,
    pub user_id: i64,
    pub service_id: i64,
    pub status: String,
    pub requested_at: String,
}

/// A user's request joined with the service it targets, for list views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRequestView {
    pub id: i64,
    pub service_id: i64,
    pub service_name: String,
    pub price: f64,
    pub status: String,
    pub requested_at: String,
}

impl ServiceRequest {
    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<ServiceRequest>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT id, user_id, service_id, status, requested_at
            FROM service_requests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn count_all(db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM service_requests")
            .fetch_one(db)
            .await
    }

    /// One user's requests with service details, newest first.
    pub async fn list_for_user(
        db: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<ServiceRequestView>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT sr.id, sr.service_id, s.name AS service_name, s.price, sr.status, sr.requested_at
            FROM service_requests sr
            JOIN services s ON s.id = sr.service_id
            WHERE sr.user_id = ?
            ORDER BY sr.id DESC
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
    use std::str::FromStr;

    #[test]
    fn test_request_status_roundtrip() {
        assert_eq!(RequestStatus::Requested.as_str(), "REQUESTED");
        assert_eq!(RequestStatus::from_str("requested"), Ok(RequestStatus::Requested));
        assert_eq!(RequestStatus::from_str("ACCEPTED"), Ok(RequestStatus::Accepted));
        assert_eq!(RequestStatus::from_str("COMPLETED"), Ok(RequestStatus::Completed));
        assert_eq!(RequestStatus::from_str("CANCELLED"), Ok(RequestStatus::Cancelled));
        assert!(RequestStatus::from_str("PENDING").is_err());
    }
}
