use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role
///
/// The three account families of the platform. Assigned once at account creation and
/// changed only through the admin role endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    SocialWorker,
    Volunteer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::SocialWorker, Role::Volunteer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SocialWorker => "social_worker",
            Role::Volunteer => "volunteer",
        }
    }

    /// Where a signed-in user of this role is sent by default.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::SocialWorker => "/social-worker/dashboard",
            Role::Volunteer => "/volunteer/dashboard",
        }
    }
}

/// Landing path for a role that may not have been recognised.
pub fn landing_path_for(role: Option<Role>) -> &'static str {
    role.map(|r| r.landing_path()).unwrap_or("/")
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "social_worker" => Ok(Role::SocialWorker),
            "volunteer" => Ok(Role::Volunteer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// Profile
///
/// An account record in the `public.profiles` table. `id` mirrors the Supabase
/// `auth.users.id`, so the verified JWT subject keys straight into this table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    // Stored as text; see `Profile::role()` for the parsed value.
    pub role: String,
    pub municipality: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// VolunteerStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VolunteerStatus {
    Pending,
    Approved,
    Rejected,
    Inactive,
}

impl VolunteerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolunteerStatus::Pending => "pending",
            VolunteerStatus::Approved => "approved",
            VolunteerStatus::Rejected => "rejected",
            VolunteerStatus::Inactive => "inactive",
        }
    }
}

/// Volunteer
///
/// A volunteer application and public-facing profile from the `public.volunteers` table.
/// Only `approved` volunteers are visible to social workers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Volunteer {
    pub id: Uuid,
    // FK to public.profiles.id (the volunteer's own account).
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub municipality: String,
    pub interests: Vec<String>,
    pub availability: Option<String>,
    // 'pending' | 'approved' | 'rejected' | 'inactive'
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// RequestStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

/// ContactRequest
///
/// A social worker asking a volunteer to act as contact person for a client,
/// stored in `public.contact_requests`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContactRequest {
    pub id: Uuid,
    pub social_worker_id: Uuid,
    pub volunteer_id: Uuid,
    pub municipality: String,
    pub description: String,
    // 'pending' | 'accepted' | 'declined'
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterVolunteerRequest
///
/// Public volunteer sign-up (POST /register). The password is forwarded to Supabase Auth
/// and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterVolunteerRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub municipality: String,
    #[serde(default)]
    pub interests: Vec<String>,
    pub availability: Option<String>,
}

/// CreateUserRequest
///
/// Admin-created account (POST /admin/users); the only way to obtain a non-volunteer role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub municipality: Option<String>,
}

/// UpdateRoleRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// UpdateVolunteerStatusRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateVolunteerStatusRequest {
    pub status: VolunteerStatus,
}

/// UpdateVolunteerRequest
///
/// Partial update of the caller's own volunteer record (PUT /volunteer/profile).
/// Omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateVolunteerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

/// CreateContactRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateContactRequest {
    pub volunteer_id: Uuid,
    pub description: String,
}

/// RespondToRequest
///
/// A volunteer's answer to a pending contact request. Only `accepted` or `declined`
/// are meaningful; `pending` is rejected by the handler.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RespondToRequest {
    pub status: RequestStatus,
}

// --- Dashboard Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the admin dashboard (GET /admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_volunteers: i64,
    pub approved_volunteers: i64,
    pub pending_volunteers: i64,
    pub total_social_workers: i64,
    pub open_requests: i64,
    pub accepted_requests: i64,
    /// Municipalities with at least one approved volunteer.
    pub municipalities_covered: i64,
}

/// RequestSummary
///
/// Per-status counts over a set of contact requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct RequestSummary {
    pub total: i64,
    pub pending: i64,
    pub accepted: i64,
    pub declined: i64,
}

/// SocialWorkerDashboard
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SocialWorkerDashboard {
    pub requests: RequestSummary,
    pub recent_requests: Vec<ContactRequest>,
}

/// VolunteerDashboard
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct VolunteerDashboard {
    pub volunteer: Option<Volunteer>,
    pub requests: RequestSummary,
    pub pending_requests: Vec<ContactRequest>,
}

/// MunicipalityCount
///
/// Raw aggregate row: approved volunteers grouped by municipality.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct MunicipalityCount {
    pub municipality: String,
    pub volunteer_count: i64,
}

/// DensityLevel
///
/// Colour bucket used to shade a municipality on the admin map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DensityLevel {
    None,
    Low,
    Medium,
    High,
}

/// MunicipalityDensity
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MunicipalityDensity {
    pub municipality: String,
    pub volunteer_count: i64,
    pub level: DensityLevel,
    /// Hex fill colour, e.g. `#fde68a`.
    pub color: String,
}
