//! Endpoints for the professional role.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::auth::{require_authority, AuthSession};
use crate::api::error::ApiError;
use crate::auth::Authority;
use crate::db::models::{User, UserResponse};
use crate::AppState;

/// GET /api/professional/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    require_authority(&session.principal, Authority::Professional)?;

    let user = User::find_by_id(&state.db, session.principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::load(&state.db, &user).await?))
}

/// GET /api/professional/dashboard
pub async fn dashboard(session: AuthSession) -> Result<Json<Value>, ApiError> {
    require_authority(&session.principal, Authority::Professional)?;

    Ok(Json(json!({ "message": "Welcome, Professional!" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Principal, SessionStore};
    use crate::config::Config;
    use crate::db::models::{NewUser, Role, Service};
    use axum::http::StatusCode;
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
    async fn test_profile_includes_offered_services() {
        let state = test_state().await;
        let service = Service::insert(&state.db, "Plumbing", 300.0).await.unwrap();
        let role_id = Role::find_by_name(&state.db, "PROFESSIONAL")
            .await
            .unwrap()
            .unwrap()
            .id;
        let pro = User::register(
            &state.db,
            NewUser {
                username: "pat",
                password_hash: "hash",
                email: "pat@example.com",
                address: "2 Side St",
                pincode: 560001,
                role_id,
                service_ids: &[service.id],
            },
        )
        .await
        .unwrap();

        let Json(response) = profile(
            State(state),
            auth_session(&pro, Authority::Professional),
        )
        .await
        .unwrap();

        assert_eq!(response.username, "pat");
        assert_eq!(response.services_provided.len(), 1);
        assert_eq!(response.services_provided[0].name, "Plumbing");
    }

    #[tokio::test]
    async fn test_profile_rejects_customer_role() {
        let state = test_state().await;
        let role_id = Role::find_by_name(&state.db, "USER").await.unwrap().unwrap().id;
        let user = User::register(
            &state.db,
            NewUser {
                username: "uma",
                password_hash: "hash",
                email: "uma@example.com",
                address: "3 Back St",
                pincode: 560001,
                role_id,
                service_ids: &[],
            },
        )
        .await
        .unwrap();

        let err = profile(State(state), auth_session(&user, Authority::User))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dashboard_greets_professional() {
        let state = test_state().await;
        let role_id = Role::find_by_name(&state.db, "PROFESSIONAL")
            .await
            .unwrap()
            .unwrap()
            .id;
        let pro = User::register(
            &state.db,
            NewUser {
                username: "pro",
                password_hash: "hash",
                email: "pro@example.com",
                address: "4 High St",
                pincode: 560001,
                role_id,
                service_ids: &[],
            },
        )
        .await
        .unwrap();

        let Json(body) = dashboard(auth_session(&pro, Authority::Professional))
            .await
            .unwrap();
        assert_eq!(body["message"], "Welcome, Professional!");
    }
}
