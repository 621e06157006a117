use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Oversight of accounts, volunteers and matching activity. Only callers the guard
/// resolved to the `admin` role get here.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Dashboard counters (volunteers by status, social workers, open requests).
        .route("/admin", get(handlers::get_admin_dashboard))
        // GET/POST /admin/users
        // List all accounts, or create one with an explicit role.
        .route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        // PUT /admin/users/{id}/role
        .route("/admin/users/{id}/role", put(handlers::update_user_role))
        // GET /admin/volunteers?municipality=...&status=...
        .route("/admin/volunteers", get(handlers::list_volunteers_admin))
        // PUT /admin/volunteers/{id}/status
        // Approval queue: pending -> approved | rejected, approved -> inactive.
        .route(
            "/admin/volunteers/{id}/status",
            put(handlers::update_volunteer_status),
        )
        // GET /admin/requests
        .route("/admin/requests", get(handlers::list_all_requests))
        // GET /admin/map
        // Volunteer density per municipality, coloured for the map view.
        .route("/admin/map", get(handlers::get_volunteer_map))
}
