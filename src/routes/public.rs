use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints the guard passes through unconditionally. The login and unauthorized
/// endpoints are the redirect targets of the guard itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // GET /login?redirect=...
        // Target of every fail-closed guard branch.
        .route("/login", get(handlers::login_page))
        // GET /unauthorized
        // Target when the caller's role does not fit the requested section.
        .route("/unauthorized", get(handlers::unauthorized_page))
        // POST /register
        // Volunteer self-registration; creates a pending volunteer record.
        .route("/register", post(handlers::register_volunteer))
}
