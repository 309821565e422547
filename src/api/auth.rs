//! Authentication endpoints and the session extractor.
//!
//! Login exchanges credentials for an opaque session id delivered as an
//! HttpOnly cookie. Authenticated handlers receive the resolved
//! [`Principal`] through the [`AuthSession`] extractor and gate
//! themselves with [`require_authority`]; there is no ambient security
//! context.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{
    validate_address, validate_email, validate_password, validate_pincode, validate_username,
    NumericField,
};
use crate::auth::{authenticate, password::hash_password, Authority, Principal};
use crate::db::models::{NewUser, Role, Service, User, UserResponse};
use crate::AppState;

/// Name of the session cookie issued at login
pub const SESSION_COOKIE: &str = "nesthome_session";

/// A resolved session, extracted from the request's cookie.
///
/// Rejects with 401 when the cookie is missing or the id no longer
/// resolves; authority checks are left to the handler.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: String,
    pub principal: Principal,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(SESSION_COOKIE)
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        let session = state.sessions.resolve(cookie.value())?;

        Ok(AuthSession {
            session_id: session.id,
            principal: session.principal,
        })
    }
}

/// Check that the principal holds the given authority. Membership is
/// exact; no authority implies another.
pub fn require_authority(principal: &Principal, authority: Authority) -> Result<(), ApiError> {
    if principal.has_authority(authority) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Requires {}",
            authority.as_str()
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Role reference as clients send it: `{"role": {"name": "USER"}}`
#[derive(Debug, Deserialize)]
pub struct RoleRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub address: String,
    pub pincode: NumericField,
    #[serde(default)]
    pub role: Option<RoleRef>,
    /// Service ids offered; only meaningful for PROFESSIONAL registrations
    #[serde(default)]
    pub services: Option<Vec<NumericField>>,
}

/// POST /api/auth/login
///
/// Unknown usernames and wrong passwords answer with the same generic
/// 401; logs carry the real reason.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let principal = authenticate(&state.db, &req.username, &req.password).await?;

    let user = User::find_by_id(&state.db, principal.user_id)
        .await?
        .ok_or_else(ApiError::auth_failed)?;
    let user = UserResponse::load(&state.db, &user).await?;

    let session_id = state.sessions.create(principal.clone());
    tracing::info!("User {} logged in", principal.username);

    let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(json!({
            "message": "Login successful",
            "user": user,
            "authorities": principal.authority_strings(),
            "sessionId": session_id,
        })),
    ))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_username(&req.username) {
        errors.add("username", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_address(&req.address) {
        errors.add("address", e);
    }

    let pincode = match req.pincode.as_i64() {
        Some(p) => {
            if let Err(e) = validate_pincode(p) {
                errors.add("pincode", e);
            }
            p
        }
        None => {
            errors.add("pincode", "Pincode must be a number");
            0
        }
    };

    if req.role.is_none() {
        errors.add("role", "Role is required");
    }

    errors.finish()?;

    // finish() already rejected the request if the role was absent
    let role_ref = req
        .role
        .as_ref()
        .ok_or_else(|| ApiError::validation_field("role", "Role is required"))?;

    if User::exists_by_username(&state.db, &req.username).await? {
        return Err(
            ApiError::conflict("Username is already taken").with_status(StatusCode::BAD_REQUEST)
        );
    }

    let role = Role::find_by_name(&state.db, &role_ref.name)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Unknown role: {}", role_ref.name)))?;

    let mut service_ids = Vec::new();
    if role.name == "PROFESSIONAL" {
        if let Some(services) = &req.services {
            for field in services {
                let id = field.as_i64().ok_or_else(|| {
                    ApiError::validation_field("services", "Service ids must be numbers")
                })?;
                if Service::find_by_id(&state.db, id).await?.is_none() {
                    return Err(ApiError::bad_request(format!("Unknown service id: {}", id)));
                }
                service_ids.push(id);
            }
        }
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal("Failed to process registration")
    })?;

    // The UNIQUE constraint is the arbiter when two registrations race
    // past the existence check
    let user = User::register(
        &state.db,
        NewUser {
            username: &req.username,
            password_hash: &password_hash,
            email: &req.email,
            address: &req.address,
            pincode,
            role_id: role.id,
            service_ids: &service_ids,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("Username is already taken").with_status(StatusCode::BAD_REQUEST)
        }
        _ => ApiError::from(e),
    })?;

    tracing::info!("Registered user {} with role {}", user.username, role.name);

    Ok(Json(json!({
        "message": "User registered successfully",
        "username": user.username,
        "role": role.name,
    })))
}

/// POST /api/auth/logout
///
/// Destroys the server-side session and expires the cookie. Succeeds
/// whether or not a live session was presented.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value());
    }

    let removal = Cookie::build(SESSION_COOKIE).path("/").build();

    (
        jar.remove(removal),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// GET /api/auth/session-invalid
///
/// Fixed landing endpoint clients are pointed at when their session no
/// longer resolves.
pub async fn session_invalid() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Session invalid or expired" })),
    )
}
