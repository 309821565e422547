//! Endpoints for the administrator role.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::auth::{require_authority, AuthSession};
use crate::api::error::{ApiError, ValidationErrorBuilder};
use crate::api::validation::{validate_price, validate_service_name, NumericField};
use crate::auth::Authority;
use crate::db::models::{Role, User, UserResponse};
use crate::directory::{self, DirectoryError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(rename = "servicename")]
    pub service_name: String,
    pub price: NumericField,
}

/// GET /api/admin/users
pub async fn users(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_authority(&session.principal, Authority::Admin)?;

    let users = User::list_all(&state.db).await?;

    let mut out = Vec::with_capacity(users.len());
    for user in &users {
        out.push(UserResponse::load(&state.db, user).await?);
    }

    Ok(Json(out))
}

/// POST /api/admin/assign-role
///
/// Grants an additional role; granting one the user already holds is a
/// no-op success.
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<Value>, ApiError> {
    require_authority(&session.principal, Authority::Admin)?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // Accept the wire form too ("ROLE_PROFESSIONAL")
    let role_name = req.role.trim().to_uppercase();
    let role_name = role_name.strip_prefix("ROLE_").unwrap_or(&role_name);
    let role = Role::find_by_name(&state.db, role_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))?;

    User::assign_role(&state.db, user.id, role.id).await?;
    tracing::info!("Assigned role {} to user {}", role.name, user.username);

    Ok(Json(json!({ "message": "Role assigned successfully" })))
}

/// DELETE /api/admin/delete
///
/// Removes the account along with its role and service associations and
/// its service requests (cascade). Live sessions are untouched; they
/// turn up NotFound on their next profile access.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(req): Json<DeleteUserRequest>,
) -> Result<String, ApiError> {
    require_authority(&session.principal, Authority::Admin)?;

    let deleted = User::delete_by_username(&state.db, &req.username).await?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!("Deleted user {}", req.username);
    Ok("user deleted successfully".to_string())
}

/// POST /api/admin/createservice
///
/// Plain-text responses; duplicates come back as 400 with the exact
/// body existing clients match on.
pub async fn createservice(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(req): Json<CreateServiceRequest>,
) -> Result<Response, ApiError> {
    require_authority(&session.principal, Authority::Admin)?;

    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_service_name(&req.service_name) {
        errors.add("servicename", e);
    }
    let price = match req.price.as_f64() {
        Some(p) => {
            if let Err(e) = validate_price(p) {
                errors.add("price", e);
            }
            p
        }
        None => {
            errors.add("price", "Price must be a number");
            0.0
        }
    };
    errors.finish()?;

    match directory::create_service(&state.db, req.service_name.trim(), price).await {
        Ok(service) => {
            tracing::info!("Created service {} at price {}", service.name, service.price);
            Ok("Service Created Successfully".into_response())
        }
        Err(DirectoryError::Conflict) => {
            Ok((StatusCode::BAD_REQUEST, "Service already exists").into_response())
        }
        Err(DirectoryError::Db(e)) => Err(ApiError::from(e)),
    }
}

/// GET /api/admin/dashboard-stats
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
) -> Result<Json<Value>, ApiError> {
    require_authority(&session.principal, Authority::Admin)?;

    let total_users = User::count_with_role(&state.db, "USER").await?;
    let professionals = User::count_with_role(&state.db, "PROFESSIONAL").await?;

    Ok(Json(json!({
        "totalUsers": total_users,
        "professionals": professionals,
    })))
}
