use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;

// One router per portal section (public, admin, social worker, volunteer).
pub mod routes;
use routes::{admin, public, social_worker, volunteer};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::RouteGuard;
pub use identity::{IdentityProvider, IdentityState, SupabaseIdentity};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login_page, handlers::unauthorized_page, handlers::register_volunteer,
        handlers::get_admin_dashboard, handlers::list_users, handlers::create_user,
        handlers::update_user_role, handlers::list_volunteers_admin,
        handlers::update_volunteer_status, handlers::list_all_requests,
        handlers::get_volunteer_map, handlers::get_social_worker_dashboard,
        handlers::search_volunteers, handlers::create_contact_request,
        handlers::list_my_requests, handlers::get_volunteer_dashboard,
        handlers::get_volunteer_profile, handlers::update_volunteer_profile,
        handlers::respond_to_request
    ),
    components(
        schemas(
            models::Role, models::Profile, models::Volunteer, models::VolunteerStatus,
            models::ContactRequest, models::RequestStatus, models::RegisterVolunteerRequest,
            models::CreateUserRequest, models::UpdateRoleRequest,
            models::UpdateVolunteerStatusRequest, models::UpdateVolunteerRequest,
            models::CreateContactRequest, models::RespondToRequest,
            models::AdminDashboardStats, models::RequestSummary,
            models::SocialWorkerDashboard, models::VolunteerDashboard,
            models::DensityLevel, models::MunicipalityDensity, handlers::LoginPrompt,
        )
    ),
    tags(
        (name = "kontaktperson", description = "Kontaktperson Platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer over the hosted Postgres database.
    pub repo: RepositoryState,
    /// Token verification and role lookup used by the route guard.
    pub identity: IdentityState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Outbound client for Supabase auth calls (signup).
    pub http: reqwest::Client,
}

impl AppState {
    /// Assembles the state, building the outbound HTTP client with the configured
    /// identity timeout.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(repo: RepositoryState, identity: IdentityState, config: AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.identity_timeout)
            .build()
            .expect("FATAL: Failed to build the outbound HTTP client.");

        Self {
            repo,
            identity,
            config,
            http,
        }
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(
            self.identity.clone(),
            self.config.identity_timeout,
            self.config.demo_enabled(),
        )
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles every section router, wraps the whole app in the route guard, then adds the
/// request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let access_guard = state.route_guard();

    if access_guard.demo_enabled() {
        tracing::warn!("demo mode enabled: the demo_role cookie is trusted without verification");
    }

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(admin::admin_routes())
        .merge(social_worker::social_worker_routes())
        .merge(volunteer::volunteer_routes())
        .with_state(state)
        // Applied with `layer` rather than `route_layer` so unknown paths under a
        // protected prefix are still guarded.
        .layer(middleware::from_fn_with_state(access_guard, guard::route_guard));

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
