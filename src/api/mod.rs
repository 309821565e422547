mod admin;
pub mod auth;
mod error;
mod home;
mod professional;
mod user;
mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/session-invalid", get(auth::session_invalid));

    // Session-gated routes; each handler checks its own authority
    let api_routes = Router::new()
        // Shared
        .route("/home", get(home::home))
        .route("/home/show_services", get(home::show_services))
        .route("/home/session-check", get(home::session_check))
        // Professional area
        .route("/professional/profile", get(professional::profile))
        .route("/professional/dashboard", get(professional::dashboard))
        // Customer area
        .route("/user/showservices", get(user::showservices))
        .route("/user/profile", get(user::profile))
        .route("/user/update", put(user::update))
        .route("/user/request-service", post(user::request_service))
        .route("/user/service-requests", get(user::service_requests))
        .route(
            "/user/get-professionals/:service_id",
            get(user::get_professionals),
        )
        // Admin area
        .route("/admin/users", get(admin::users))
        .route("/admin/assign-role", post(admin::assign_role))
        .route("/admin/delete", delete(admin::delete))
        .route("/admin/createservice", post(admin::createservice))
        .route("/admin/dashboard-stats", get(admin::dashboard_stats));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes);

    // Browser clients sit on a separate origin and send the session
    // cookie, so CORS needs explicit origins with credentials
    if !state.config.server.cors_origins.is_empty() {
        let origins: Vec<HeaderValue> = state
            .config
            .server
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        router = router.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
