//! API routes

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use gatehouse_shared::Role;
use tower_http::trace::TraceLayer;

use crate::{
    auth::{require_auth, require_role},
    security::security_headers_middleware,
    state::AppState,
};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    // Public API routes (no auth required) - under /api/v1
    let public_api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    // Admin routes: role gate runs inside the auth gate
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/:user_id",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role));

    // Protected API routes (auth required) - under /api/v1
    let protected_api_routes = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        .route(
            "/users/profile",
            get(users::get_profile)
                .put(users::update_profile)
                .delete(users::delete_profile),
        )
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth));

    let api_v1_routes = Router::new()
        .merge(public_api_routes)
        .merge(protected_api_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", api_v1_routes)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
