//! Service directory: professional matching over the service catalogue.
//!
//! Matching is exact and unranked: role PROFESSIONAL, same pincode as
//! the caller, offers the requested service. Catalogue writes go
//! through here so name uniqueness is enforced in one place.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use crate::db::models::{Service, User};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("service already exists")]
    Conflict,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Professionals available for a service at a pincode. One indexed
/// join; unknown service ids simply match nothing. Result order is
/// ascending user id (registration order), stable but not a ranking.
pub async fn professionals_for(
    db: &SqlitePool,
    service_id: i64,
    pincode: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT DISTINCT u.id, u.username, u.password_hash, u.email, u.address, u.pincode, u.created_at, u.updated_at
        FROM users u
        JOIN user_roles ur ON ur.user_id = u.id
        JOIN roles r ON r.id = ur.role_id
        JOIN user_services us ON us.user_id = u.id
        WHERE r.name = 'PROFESSIONAL'
          AND u.pincode = ?
          AND us.service_id = ?
        ORDER BY u.id ASC
        "#,
    )
    .bind(pincode)
    .bind(service_id)
    .fetch_all(db)
    .await
}

/// Create a catalogue entry. The existence check is an advisory fast
/// path; the UNIQUE constraint on the name is the final arbiter, so a
/// creator that loses the race still gets a conflict back.
pub async fn create_service(
    db: &SqlitePool,
    name: &str,
    price: f64,
) -> Result<Service, DirectoryError> {
    if Service::find_by_name(db, name).await?.is_some() {
        return Err(DirectoryError::Conflict);
    }

    match Service::insert(db, name, price).await {
        Ok(service) => {
            debug!("Created service {} (id {})", service.name, service.id);
            Ok(service)
        }
        Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
            Err(DirectoryError::Conflict)
        }
        Err(e) => Err(DirectoryError::Db(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewUser, Role};
    use crate::db::test_pool;

    async fn seed_account(
        db: &SqlitePool,
        username: &str,
        role: &str,
        pincode: i64,
        service_ids: &[i64],
    ) -> User {
        let role_id = Role::find_by_name(db, role).await.unwrap().unwrap().id;
        User::register(
            db,
            NewUser {
                username,
                password_hash: "hash",
                email: "pro@example.com",
                address: "7 Workshop Road",
                pincode,
                role_id,
                service_ids,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_matching_requires_role_pincode_and_service() {
        let db = test_pool().await;

        let plumbing = Service::insert(&db, "Plumbing", 450.0).await.unwrap();
        let cleaning = Service::insert(&db, "Cleaning", 200.0).await.unwrap();

        // Matches: right role, right pincode, offers plumbing
        let p1 = seed_account(&db, "p1", "PROFESSIONAL", 560001, &[plumbing.id]).await;
        // Wrong pincode
        seed_account(&db, "p2", "PROFESSIONAL", 560002, &[plumbing.id]).await;
        // Wrong service
        seed_account(&db, "p3", "PROFESSIONAL", 560001, &[cleaning.id]).await;
        // Right pincode and service row but not a professional
        seed_account(&db, "u1", "USER", 560001, &[plumbing.id]).await;
        // Matches: offers several services including plumbing
        let p4 = seed_account(&db, "p4", "PROFESSIONAL", 560001, &[plumbing.id, cleaning.id]).await;

        let matches = professionals_for(&db, plumbing.id, 560001).await.unwrap();
        let ids: Vec<i64> = matches.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![p1.id, p4.id]);
    }

    #[tokio::test]
    async fn test_no_match_and_unknown_service_return_empty() {
        let db = test_pool().await;

        let plumbing = Service::insert(&db, "Plumbing", 450.0).await.unwrap();
        seed_account(&db, "p1", "PROFESSIONAL", 560001, &[plumbing.id]).await;

        // Nobody at this pincode
        assert!(professionals_for(&db, plumbing.id, 110011).await.unwrap().is_empty());
        // Service id that does not exist
        assert!(professionals_for(&db, 9999, 560001).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_service_rejects_duplicate_names() {
        let db = test_pool().await;

        let created = create_service(&db, "Electrician", 500.0).await.unwrap();
        assert_eq!(created.name, "Electrician");
        assert_eq!(created.price, 500.0);

        let second = create_service(&db, "Electrician", 650.0).await;
        assert!(matches!(second, Err(DirectoryError::Conflict)));

        // The original entry is untouched
        let stored = Service::find_by_name(&db, "Electrician").await.unwrap().unwrap();
        assert_eq!(stored.price, 500.0);
    }

    #[tokio::test]
    async fn test_racing_creators_of_one_name_get_one_winner() {
        // File-backed pool so the racing creators hold separate
        // connections; the shared in-memory fixture serializes them.
        let dir = tempfile::tempdir().unwrap();
        let db = crate::db::init(dir.path()).await.unwrap();

        let (a, b) = tokio::join!(
            create_service(&db, "Plumbing", 450.0),
            create_service(&db, "Plumbing", 500.0),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(DirectoryError::Conflict)))
                .count(),
            1
        );

        // Whichever creator lost, exactly one catalogue row exists
        let stored = Service::find_by_name(&db, "Plumbing").await.unwrap().unwrap();
        assert!(stored.price == 450.0 || stored.price == 500.0);
        assert_eq!(Service::list_all(&db).await.unwrap().len(), 1);
    }
}
