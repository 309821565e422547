//! Endpoints shared by every authenticated role.

use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::api::auth::{AuthSession, SESSION_COOKIE};
use crate::api::error::ApiError;
use crate::db::models::Service;
use crate::AppState;

/// GET /api/home
///
/// Echoes the session's principal; answered straight from the session
/// store without touching the database.
pub async fn home(session: AuthSession) -> Json<Value> {
    Json(json!({
        "username": session.principal.username,
        "roles": session.principal.authority_strings(),
    }))
}

/// GET /api/home/show_services
///
/// The service catalogue, for any authenticated role.
pub async fn show_services(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
) -> Result<Json<Vec<Service>>, ApiError> {
    let services = Service::list_all(&state.db).await?;
    Ok(Json(services))
}

/// GET /api/home/session-check
///
/// Non-rejecting session probe for clients deciding what to render.
/// Always 200; the body says whether the cookie still resolves.
pub async fn session_check(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<Value> {
    let session = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.resolve(cookie.value()).ok());

    match session {
        Some(session) => Json(json!({
            "authenticated": true,
            "sessionId": session.id,
            "username": session.principal.username,
            "authorities": session.principal.authority_strings(),
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
