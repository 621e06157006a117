use crate::{
    AppState,
    auth::AuthUser,
    dashboard,
    models::{
        AdminDashboardStats, ContactRequest, CreateContactRequest, CreateUserRequest,
        MunicipalityDensity, Profile, RegisterVolunteerRequest, RequestStatus, RespondToRequest,
        Role, SocialWorkerDashboard, UpdateRoleRequest, UpdateVolunteerRequest,
        UpdateVolunteerStatusRequest, Volunteer, VolunteerDashboard, VolunteerStatus,
    },
    repository::VolunteerFilter,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Query Structs ---

/// VolunteerQuery
///
/// Query parameters accepted by volunteer listings.
#[derive(Deserialize, utoipa::IntoParams, Default)]
pub struct VolunteerQuery {
    /// Case-insensitive municipality name.
    pub municipality: Option<String>,
    /// Admin listing only; social workers always see approved volunteers.
    pub status: Option<VolunteerStatus>,
}

/// LoginQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LoginQuery {
    /// Path the guard was protecting when it sent the caller here.
    pub redirect: Option<String>,
}

/// LoginPrompt
///
/// Body of the login landing endpoint; the frontend renders the actual form.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct LoginPrompt {
    pub message: String,
    pub redirect: Option<String>,
}

/// SignupResponse
///
/// Supabase `/auth/v1/signup` answers with the user object, or with a session wrapping
/// it when email confirmation is disabled. Either way we only need the user id.
#[derive(Deserialize)]
struct SignupResponse {
    id: Option<Uuid>,
    user: Option<SignupUser>,
}

#[derive(Deserialize)]
struct SignupUser {
    id: Uuid,
}

/// signup_identity
///
/// Creates the auth identity in Supabase and returns its id, which becomes the profile
/// primary key.
async fn signup_identity(state: &AppState, email: &str, password: &str) -> Result<Uuid, StatusCode> {
    let auth_url = format!("{}/auth/v1/signup", state.config.supabase_url);

    let response = state
        .http
        .post(auth_url)
        .header("apikey", &state.config.supabase_anon_key)
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("supabase signup request failed: {:?}", e);
            StatusCode::BAD_GATEWAY
        })?;

    if !response.status().is_success() {
        // Duplicate email, weak password and similar rejections.
        tracing::info!(status = %response.status(), "supabase rejected signup");
        return Err(StatusCode::BAD_REQUEST);
    }

    let body = response.json::<SignupResponse>().await.map_err(|e| {
        tracing::error!("supabase signup response unreadable: {:?}", e);
        StatusCode::BAD_GATEWAY
    })?;

    body.user
        .map(|u| u.id)
        .or(body.id)
        .ok_or(StatusCode::BAD_GATEWAY)
}

// --- Public Handlers ---

/// login_page
///
/// [Public Route] Where the guard sends callers without a valid session.
#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses((status = 200, description = "Sign-in required", body = LoginPrompt))
)]
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPrompt> {
    Json(LoginPrompt {
        message: "Sign in to continue".to_string(),
        redirect: query.redirect,
    })
}

/// unauthorized_page
///
/// [Public Route] Where the guard sends callers whose role does not fit the section.
#[utoipa::path(
    get,
    path = "/unauthorized",
    responses((status = 403, description = "Role not permitted"))
)]
pub async fn unauthorized_page() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "error": "You do not have access to this page" })),
    )
}

/// register_volunteer
///
/// [Public Route] Volunteer self-registration.
///
/// *Flow*: creates the Supabase auth identity, mirrors it into `profiles` with the
/// `volunteer` role, then files a `pending` volunteer record for admin review.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterVolunteerRequest,
    responses(
        (status = 201, description = "Registered", body = Volunteer),
        (status = 400, description = "Rejected by the auth service")
    )
)]
pub async fn register_volunteer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterVolunteerRequest>,
) -> Result<(StatusCode, Json<Volunteer>), StatusCode> {
    if payload.municipality.trim().is_empty() || payload.full_name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user_id = signup_identity(&state, &payload.email, &payload.password).await?;

    let profile = Profile {
        id: user_id,
        email: payload.email.clone(),
        full_name: payload.full_name.clone(),
        role: Role::Volunteer.to_string(),
        municipality: Some(payload.municipality.clone()),
        ..Profile::default()
    };
    state
        .repo
        .create_profile(profile)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let volunteer = state
        .repo
        .create_volunteer(user_id, payload)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(user = %user_id, "volunteer registered");
    Ok((StatusCode::CREATED, Json(volunteer)))
}

// --- Admin Handlers ---

/// get_admin_dashboard
///
/// [Admin Route] Headline counters for the admin dashboard.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_dashboard(State(state): State<AppState>) -> Json<AdminDashboardStats> {
    Json(state.repo.get_stats().await)
}

/// list_users
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All accounts", body = [Profile]))
)]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<Profile>> {
    Json(state.repo.list_profiles().await)
}

/// create_user
///
/// [Admin Route] Creates an account with any role, e.g. a new social worker.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = Profile),
        (status = 400, description = "Rejected by the auth service")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Profile>), StatusCode> {
    let user_id = signup_identity(&state, &payload.email, &payload.password).await?;

    let profile = Profile {
        id: user_id,
        email: payload.email,
        full_name: payload.full_name,
        role: payload.role.to_string(),
        municipality: payload.municipality,
        ..Profile::default()
    };

    let created = state
        .repo
        .create_profile(profile)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(user = %created.id, role = %payload.role, "account created by admin");
    Ok((StatusCode::CREATED, Json(created)))
}

/// update_user_role
///
/// [Admin Route] The only way an account's role changes after creation.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = Profile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<Profile>, StatusCode> {
    match state.repo.set_role(id, payload.role).await {
        Some(profile) => {
            tracing::info!(user = %id, role = %payload.role, "role changed");
            Ok(Json(profile))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// list_volunteers_admin
///
/// [Admin Route] Every volunteer record, optionally filtered by municipality and status.
#[utoipa::path(
    get,
    path = "/admin/volunteers",
    params(VolunteerQuery),
    responses((status = 200, description = "Volunteers", body = [Volunteer]))
)]
pub async fn list_volunteers_admin(
    State(state): State<AppState>,
    Query(query): Query<VolunteerQuery>,
) -> Json<Vec<Volunteer>> {
    let filter = VolunteerFilter {
        municipality: query.municipality,
        status: query.status,
    };
    Json(state.repo.list_volunteers(filter).await)
}

/// update_volunteer_status
///
/// [Admin Route] Approve, reject or deactivate a volunteer.
#[utoipa::path(
    put,
    path = "/admin/volunteers/{id}/status",
    params(("id" = Uuid, Path, description = "Volunteer ID")),
    request_body = UpdateVolunteerStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Volunteer),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_volunteer_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVolunteerStatusRequest>,
) -> Result<Json<Volunteer>, StatusCode> {
    state
        .repo
        .set_volunteer_status(id, payload.status)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// list_all_requests
#[utoipa::path(
    get,
    path = "/admin/requests",
    responses((status = 200, description = "All contact requests", body = [ContactRequest]))
)]
pub async fn list_all_requests(State(state): State<AppState>) -> Json<Vec<ContactRequest>> {
    Json(state.repo.list_requests().await)
}

/// get_volunteer_map
///
/// [Admin Route] Approved-volunteer density per municipality, with the fill colour
/// the map uses for each one.
#[utoipa::path(
    get,
    path = "/admin/map",
    responses((status = 200, description = "Density per municipality", body = [MunicipalityDensity]))
)]
pub async fn get_volunteer_map(State(state): State<AppState>) -> Json<Vec<MunicipalityDensity>> {
    let counts = state.repo.volunteer_counts_by_municipality().await;
    Json(dashboard::density_map(counts))
}

// --- Social Worker Handlers ---

/// get_social_worker_dashboard
#[utoipa::path(
    get,
    path = "/social-worker/dashboard",
    responses((status = 200, description = "Dashboard", body = SocialWorkerDashboard))
)]
pub async fn get_social_worker_dashboard(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<SocialWorkerDashboard> {
    let requests = state.repo.list_requests_by_social_worker(id).await;
    Json(SocialWorkerDashboard {
        requests: dashboard::summarize_requests(&requests),
        recent_requests: dashboard::recent(requests, dashboard::RECENT_REQUESTS),
    })
}

/// search_volunteers
///
/// [Social Worker Route] Approved volunteers, optionally in one municipality.
/// Pending or rejected applications are never exposed here.
#[utoipa::path(
    get,
    path = "/social-worker/volunteers",
    params(VolunteerQuery),
    responses((status = 200, description = "Approved volunteers", body = [Volunteer]))
)]
pub async fn search_volunteers(
    State(state): State<AppState>,
    Query(query): Query<VolunteerQuery>,
) -> Json<Vec<Volunteer>> {
    let filter = VolunteerFilter {
        municipality: query.municipality,
        status: Some(VolunteerStatus::Approved),
    };
    Json(state.repo.list_volunteers(filter).await)
}

/// create_contact_request
///
/// [Social Worker Route] Asks an approved volunteer to become a contact person.
/// The request inherits the volunteer's municipality.
#[utoipa::path(
    post,
    path = "/social-worker/requests",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Created", body = ContactRequest),
        (status = 404, description = "Volunteer not found"),
        (status = 409, description = "Volunteer not approved")
    )
)]
pub async fn create_contact_request(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactRequest>), StatusCode> {
    if payload.description.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let volunteer = state
        .repo
        .get_volunteer(payload.volunteer_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    if volunteer.status != VolunteerStatus::Approved.as_str() {
        return Err(StatusCode::CONFLICT);
    }

    let request = state
        .repo
        .create_request(id, volunteer.municipality, payload)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// list_my_requests
#[utoipa::path(
    get,
    path = "/social-worker/requests",
    responses((status = 200, description = "Own requests", body = [ContactRequest]))
)]
pub async fn list_my_requests(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<ContactRequest>> {
    Json(state.repo.list_requests_by_social_worker(id).await)
}

// --- Volunteer Handlers ---

/// get_volunteer_dashboard
#[utoipa::path(
    get,
    path = "/volunteer/dashboard",
    responses((status = 200, description = "Dashboard", body = VolunteerDashboard))
)]
pub async fn get_volunteer_dashboard(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<VolunteerDashboard> {
    let Some(volunteer) = state.repo.get_volunteer_by_user(id).await else {
        // Account exists but no volunteer record yet.
        return Json(VolunteerDashboard::default());
    };

    let requests = state.repo.list_requests_for_volunteer(volunteer.id).await;
    Json(VolunteerDashboard {
        requests: dashboard::summarize_requests(&requests),
        pending_requests: dashboard::pending_only(requests),
        volunteer: Some(volunteer),
    })
}

/// get_volunteer_profile
#[utoipa::path(
    get,
    path = "/volunteer/profile",
    responses(
        (status = 200, description = "Own volunteer record", body = Volunteer),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_volunteer_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Volunteer>, StatusCode> {
    state
        .repo
        .get_volunteer_by_user(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_volunteer_profile
///
/// [Volunteer Route] Partial update of the caller's own record. The record is matched
/// on the verified subject id, so nobody can edit someone else's profile.
#[utoipa::path(
    put,
    path = "/volunteer/profile",
    request_body = UpdateVolunteerRequest,
    responses(
        (status = 200, description = "Updated", body = Volunteer),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_volunteer_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateVolunteerRequest>,
) -> Result<Json<Volunteer>, StatusCode> {
    if payload
        .municipality
        .as_deref()
        .is_some_and(|m| m.trim().is_empty())
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .repo
        .update_volunteer(id, payload)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// respond_to_request
///
/// [Volunteer Route] Accept or decline a pending request addressed to the caller.
#[utoipa::path(
    put,
    path = "/volunteer/requests/{id}",
    params(("id" = Uuid, Path, description = "Contact request ID")),
    request_body = RespondToRequest,
    responses(
        (status = 200, description = "Answered", body = ContactRequest),
        (status = 400, description = "Status must be accepted or declined"),
        (status = 404, description = "Not Found, not yours, or already answered")
    )
)]
pub async fn respond_to_request(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RespondToRequest>,
) -> Result<Json<ContactRequest>, StatusCode> {
    if payload.status == RequestStatus::Pending {
        return Err(StatusCode::BAD_REQUEST);
    }

    let volunteer = state
        .repo
        .get_volunteer_by_user(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    state
        .repo
        .respond_to_request(request_id, volunteer.id, payload.status)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
