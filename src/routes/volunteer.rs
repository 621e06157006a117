use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Volunteer Router Module
///
/// A volunteer's own record and the requests addressed to them.
pub fn volunteer_routes() -> Router<AppState> {
    Router::new()
        .route("/volunteer/dashboard", get(handlers::get_volunteer_dashboard))
        .route(
            "/volunteer/profile",
            get(handlers::get_volunteer_profile).put(handlers::update_volunteer_profile),
        )
        // PUT /volunteer/requests/{id}
        // Accept or decline; only pending requests addressed to the caller.
        .route("/volunteer/requests/{id}", put(handlers::respond_to_request))
}
