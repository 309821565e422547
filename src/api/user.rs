//! Endpoints for the customer role.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::{require_authority, AuthSession};
use crate::api::error::{ApiError, ErrorDetails, ValidationErrorBuilder};
use crate::api::validation::{validate_address, validate_email, validate_pincode, NumericField};
use crate::auth::Authority;
use crate::db::models::{Service, ServiceRequest, ServiceRequestView, User, UserResponse};
use crate::directory;
use crate::requests::RequestError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub pincode: Option<NumericField>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRequestBody {
    #[serde(rename = "serviceId")]
    pub service_id: NumericField,
}

/// GET /api/user/showservices
pub async fn showservices(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<Service>>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let services = Service::list_all(&state.db).await?;
    Ok(Json(services))
}

/// GET /api/user/profile
///
/// The session holds only the principal; the profile itself is
/// re-fetched so a deleted account surfaces as NotFound even while its
/// session lives on.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let user = User::find_by_id(&state.db, session.principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::load(&state.db, &user).await?))
}

/// PUT /api/user/update
///
/// Partial update; absent fields keep their stored value. The username
/// is immutable.
pub async fn update(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let mut errors = ValidationErrorBuilder::new();
    if let Some(email) = &req.email {
        if let Err(e) = validate_email(email) {
            errors.add("email", e);
        }
    }
    if let Some(address) = &req.address {
        if let Err(e) = validate_address(address) {
            errors.add("address", e);
        }
    }
    let pincode = match &req.pincode {
        Some(field) => match field.as_i64() {
            Some(p) => {
                if let Err(e) = validate_pincode(p) {
                    errors.add("pincode", e);
                }
                Some(p)
            }
            None => {
                errors.add("pincode", "Pincode must be a number");
                None
            }
        },
        None => None,
    };
    errors.finish()?;

    User::update_profile(
        &state.db,
        session.principal.user_id,
        req.email.as_deref(),
        req.address.as_deref(),
        pincode,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => ApiError::not_found("User not found"),
        other => ApiError::from(other),
    })?;

    tracing::info!("User {} updated their profile", session.principal.username);

    Ok(Json(json!({ "message": "Profile updated successfully" })))
}

/// POST /api/user/request-service
///
/// The acting user always comes from the session, never the body.
pub async fn request_service(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(req): Json<ServiceRequestBody>,
) -> Result<Json<Value>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let service_id = req
        .service_id
        .as_i64()
        .ok_or_else(|| ApiError::validation_field("serviceId", "Service id must be a number"))?;

    crate::requests::request_service(&state.db, session.principal.user_id, service_id)
        .await
        .map_err(|e| match e {
            RequestError::Db(db) => ApiError::from(db),
            missing => ApiError::not_found("Failed to record request")
                .with_status(StatusCode::BAD_REQUEST)
                .with_details(ErrorDetails::Message(missing.to_string())),
        })?;

    Ok(Json(json!({
        "message": "Service request recorded successfully"
    })))
}

/// GET /api/user/service-requests
///
/// The caller's own requests, newest first.
pub async fn service_requests(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<ServiceRequestView>>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let requests = ServiceRequest::list_for_user(&state.db, session.principal.user_id).await?;
    Ok(Json(requests))
}

/// GET /api/user/get-professionals/:service_id
///
/// Professionals offering the service in the caller's own pincode. The
/// pincode is read from the stored profile, not the request.
pub async fn get_professionals(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Path(service_id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_authority(&session.principal, Authority::User)?;

    let user = User::find_by_id(&state.db, session.principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let professionals = directory::professionals_for(&state.db, service_id, user.pincode).await?;

    let mut out = Vec::with_capacity(professionals.len());
    for professional in &professionals {
        out.push(UserResponse::load(&state.db, professional).await?);
    }

    Ok(Json(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, SessionStore};
    use crate::config::Config;
    use crate::db::models::{NewUser, Role};
    use axum::response::IntoResponse;
    use std::time::Duration;

    async fn test_state() -> Arc<AppState> {
        let db = crate::db::test_pool().await;
        Arc::new(AppState {
            config: Config::default(),
            db,
            sessions: Arc::new(SessionStore::new(Duration::from_secs(60))),
        })
    }

    async fn seed_user(
        state: &Arc<AppState>,
        username: &str,
        role: &str,
        pincode: i64,
        service_ids: &[i64],
    ) -> User {
        let role_id = Role::find_by_name(&state.db, role)
            .await
            .unwrap()
            .unwrap()
            .id;
        User::register(
            &state.db,
            NewUser {
                username,
                password_hash: "hash",
                email: &format!("{}@example.com", username),
                address: "1 Main St",
                pincode,
                role_id,
                service_ids,
            },
        )
        .await
        .unwrap()
    }

    fn auth_session(user: &User, authority: Authority) -> AuthSession {
        AuthSession {
            session_id: "test-session".to_string(),
            principal: Principal {
                user_id: user.id,
                username: user.username.clone(),
                authorities: vec![authority],
            },
        }
    }

    #[tokio::test]
    async fn test_profile_requires_user_role() {
        let state = test_state().await;
        let pro = seed_user(&state, "pat", "PROFESSIONAL", 560001, &[]).await;

        let err = profile(State(state), auth_session(&pro, Authority::Professional))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile_of_deleted_user_is_not_found() {
        let state = test_state().await;
        let user = seed_user(&state, "gone", "USER", 560001, &[]).await;
        let session = auth_session(&user, Authority::User);

        User::delete_by_username(&state.db, "gone").await.unwrap();

        let err = profile(State(state), session).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let state = test_state().await;
        let user = seed_user(&state, "alice", "USER", 560001, &[]).await;

        let Json(body) = update(
            State(state.clone()),
            auth_session(&user, Authority::User),
            Json(UpdateProfileRequest {
                email: None,
                address: None,
                pincode: Some(NumericField::Int(560002)),
            }),
        )
        .await
        .unwrap();
        assert_eq!(body["message"], "Profile updated successfully");

        let updated = User::find_by_id(&state.db, user.id).await.unwrap().unwrap();
        assert_eq!(updated.pincode, 560002);
        assert_eq!(updated.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_update_rejects_non_numeric_pincode() {
        let state = test_state().await;
        let user = seed_user(&state, "bob", "USER", 560001, &[]).await;

        let err = update(
            State(state),
            auth_session(&user, Authority::User),
            Json(UpdateProfileRequest {
                email: None,
                address: None,
                pincode: Some(NumericField::Text("not a pincode".to_string())),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_request_service_records_request() {
        let state = test_state().await;
        let user = seed_user(&state, "carol", "USER", 560001, &[]).await;
        let service = Service::insert(&state.db, "Plumbing", 300.0).await.unwrap();

        let Json(body) = request_service(
            State(state.clone()),
            auth_session(&user, Authority::User),
            Json(ServiceRequestBody {
                service_id: NumericField::Int(service.id),
            }),
        )
        .await
        .unwrap();
        assert_eq!(body["message"], "Service request recorded successfully");

        assert_eq!(ServiceRequest::count_all(&state.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_request_service_unknown_service_is_bad_request() {
        let state = test_state().await;
        let user = seed_user(&state, "dave", "USER", 560001, &[]).await;

        let err = request_service(
            State(state.clone()),
            auth_session(&user, Authority::User),
            Json(ServiceRequestBody {
                service_id: NumericField::Int(999),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        assert_eq!(ServiceRequest::count_all(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_service_requests_lists_own_newest_first() {
        let state = test_state().await;
        let user = seed_user(&state, "erin", "USER", 560001, &[]).await;
        let plumbing = Service::insert(&state.db, "Plumbing", 300.0).await.unwrap();
        let wiring = Service::insert(&state.db, "Wiring", 450.0).await.unwrap();

        crate::requests::request_service(&state.db, user.id, plumbing.id)
            .await
            .unwrap();
        crate::requests::request_service(&state.db, user.id, wiring.id)
            .await
            .unwrap();

        let Json(views) = service_requests(State(state), auth_session(&user, Authority::User))
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].service_name, "Wiring");
        assert_eq!(views[1].service_name, "Plumbing");
    }

    #[tokio::test]
    async fn test_get_professionals_matches_service_and_own_pincode() {
        let state = test_state().await;
        let service = Service::insert(&state.db, "Electrician", 500.0)
            .await
            .unwrap();
        let other = Service::insert(&state.db, "Gardening", 200.0).await.unwrap();

        let matching =
            seed_user(&state, "sparky", "PROFESSIONAL", 560001, &[service.id]).await;
        seed_user(&state, "faraway", "PROFESSIONAL", 110001, &[service.id]).await;
        seed_user(&state, "gardener", "PROFESSIONAL", 560001, &[other.id]).await;
        let user = seed_user(&state, "frank", "USER", 560001, &[]).await;

        let Json(found) = get_professionals(
            State(state),
            auth_session(&user, Authority::User),
            Path(service.id),
        )
        .await
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, matching.username);
        assert!(found[0].roles.contains(&"PROFESSIONAL".to_string()));
    }
}
