use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Social Worker Router Module
///
/// Finding approved volunteers and sending them contact requests. Handlers that act on
/// the caller's own requests take the verified `AuthUser`.
pub fn social_worker_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/social-worker/dashboard",
            get(handlers::get_social_worker_dashboard),
        )
        // GET /social-worker/volunteers?municipality=...
        .route("/social-worker/volunteers", get(handlers::search_volunteers))
        .route(
            "/social-worker/requests",
            get(handlers::list_my_requests).post(handlers::create_contact_request),
        )
}
