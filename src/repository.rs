use crate::models::{
    AdminDashboardStats, ContactRequest, CreateContactRequest, MunicipalityCount, Profile,
    RegisterVolunteerRequest, RequestStatus, Role, UpdateVolunteerRequest, Volunteer,
    VolunteerStatus,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// VolunteerFilter
///
/// Optional narrowing applied to volunteer listings.
#[derive(Debug, Clone, Default)]
pub struct VolunteerFilter {
    pub municipality: Option<String>,
    pub status: Option<VolunteerStatus>,
}

/// Repository Trait
///
/// Abstract contract for every persistence operation. Handlers and the identity
/// provider only see this trait, so tests swap in an in-memory implementation.
///
/// Reads return `Option`/`Vec`; database errors are logged and collapse to the
/// empty value.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, id: Uuid) -> Option<Profile>;
    async fn list_profiles(&self) -> Vec<Profile>;
    async fn create_profile(&self, profile: Profile) -> Option<Profile>;
    // Admin action: the only way a role changes after creation.
    async fn set_role(&self, id: Uuid, role: Role) -> Option<Profile>;

    // --- Volunteers ---
    async fn list_volunteers(&self, filter: VolunteerFilter) -> Vec<Volunteer>;
    async fn get_volunteer(&self, id: Uuid) -> Option<Volunteer>;
    async fn get_volunteer_by_user(&self, user_id: Uuid) -> Option<Volunteer>;
    async fn create_volunteer(&self, user_id: Uuid, req: RegisterVolunteerRequest)
    -> Option<Volunteer>;
    // Owner-only: matched on `user_id`. Uses COALESCE for partial updates.
    async fn update_volunteer(&self, user_id: Uuid, req: UpdateVolunteerRequest)
    -> Option<Volunteer>;
    async fn set_volunteer_status(&self, id: Uuid, status: VolunteerStatus) -> Option<Volunteer>;

    // --- Contact Requests ---
    async fn create_request(
        &self,
        social_worker_id: Uuid,
        municipality: String,
        req: CreateContactRequest,
    ) -> Option<ContactRequest>;
    async fn list_requests(&self) -> Vec<ContactRequest>;
    async fn list_requests_by_social_worker(&self, social_worker_id: Uuid) -> Vec<ContactRequest>;
    async fn list_requests_for_volunteer(&self, volunteer_id: Uuid) -> Vec<ContactRequest>;
    // Only transitions a request that is still pending and addressed to `volunteer_id`.
    async fn respond_to_request(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
        status: RequestStatus,
    ) -> Option<ContactRequest>;

    // --- Aggregates ---
    async fn get_stats(&self) -> AdminDashboardStats;
    // Every municipality with a volunteer record; the count covers approved volunteers only.
    async fn volunteer_counts_by_municipality(&self) -> Vec<MunicipalityCount>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by the hosted Supabase Postgres database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROFILE_COLUMNS: &str = "id, email, full_name, role, municipality, created_at";
const VOLUNTEER_COLUMNS: &str = "id, user_id, full_name, email, phone, municipality, interests, availability, status, created_at, updated_at";
const REQUEST_COLUMNS: &str =
    "id, social_worker_id, volunteer_id, municipality, description, status, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_profile(&self, id: Uuid) -> Option<Profile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
        match sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_profile error: {:?}", e);
                None
            }
        }
    }

    async fn list_profiles(&self) -> Vec<Profile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC");
        match sqlx::query_as::<_, Profile>(&sql).fetch_all(&self.pool).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("list_profiles error: {:?}", e);
                vec![]
            }
        }
    }

    async fn create_profile(&self, profile: Profile) -> Option<Profile> {
        let sql = format!(
            "INSERT INTO profiles (id, email, full_name, role, municipality) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PROFILE_COLUMNS}"
        );
        match sqlx::query_as::<_, Profile>(&sql)
            .bind(profile.id)
            .bind(profile.email)
            .bind(profile.full_name)
            .bind(profile.role)
            .bind(profile.municipality)
            .fetch_one(&self.pool)
            .await
        {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("create_profile error: {:?}", e);
                None
            }
        }
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Option<Profile> {
        let sql = format!("UPDATE profiles SET role = $1 WHERE id = $2 RETURNING {PROFILE_COLUMNS}");
        match sqlx::query_as::<_, Profile>(&sql)
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("set_role error: {:?}", e);
                None
            }
        }
    }

    /// Builds the listing with QueryBuilder so every filter value is bound, never interpolated.
    async fn list_volunteers(&self, filter: VolunteerFilter) -> Vec<Volunteer> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE true"));

        if let Some(m) = filter.municipality {
            builder.push(" AND lower(municipality) = lower(");
            builder.push_bind(m);
            builder.push(")");
        }
        if let Some(s) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(s.as_str());
        }
        builder.push(" ORDER BY municipality ASC, full_name ASC");

        match builder.build_query_as::<Volunteer>().fetch_all(&self.pool).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("list_volunteers error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_volunteer(&self, id: Uuid) -> Option<Volunteer> {
        let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE id = $1");
        match sqlx::query_as::<_, Volunteer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("get_volunteer error: {:?}", e);
                None
            }
        }
    }

    async fn get_volunteer_by_user(&self, user_id: Uuid) -> Option<Volunteer> {
        let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE user_id = $1");
        match sqlx::query_as::<_, Volunteer>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("get_volunteer_by_user error: {:?}", e);
                None
            }
        }
    }

    async fn create_volunteer(
        &self,
        user_id: Uuid,
        req: RegisterVolunteerRequest,
    ) -> Option<Volunteer> {
        let sql = format!(
            "INSERT INTO volunteers (user_id, full_name, email, phone, municipality, interests, availability, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending') RETURNING {VOLUNTEER_COLUMNS}"
        );
        match sqlx::query_as::<_, Volunteer>(&sql)
            .bind(user_id)
            .bind(req.full_name)
            .bind(req.email)
            .bind(req.phone)
            .bind(req.municipality)
            .bind(req.interests)
            .bind(req.availability)
            .fetch_one(&self.pool)
            .await
        {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("create_volunteer error: {:?}", e);
                None
            }
        }
    }

    async fn update_volunteer(
        &self,
        user_id: Uuid,
        req: UpdateVolunteerRequest,
    ) -> Option<Volunteer> {
        let sql = format!(
            "UPDATE volunteers SET \
                full_name = COALESCE($1, full_name), \
                phone = COALESCE($2, phone), \
                municipality = COALESCE($3, municipality), \
                interests = COALESCE($4, interests), \
                availability = COALESCE($5, availability), \
                updated_at = now() \
             WHERE user_id = $6 RETURNING {VOLUNTEER_COLUMNS}"
        );
        match sqlx::query_as::<_, Volunteer>(&sql)
            .bind(req.full_name)
            .bind(req.phone)
            .bind(req.municipality)
            .bind(req.interests)
            .bind(req.availability)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("update_volunteer error: {:?}", e);
                None
            }
        }
    }

    async fn set_volunteer_status(&self, id: Uuid, status: VolunteerStatus) -> Option<Volunteer> {
        let sql = format!(
            "UPDATE volunteers SET status = $1, updated_at = now() WHERE id = $2 RETURNING {VOLUNTEER_COLUMNS}"
        );
        match sqlx::query_as::<_, Volunteer>(&sql)
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("set_volunteer_status error: {:?}", e);
                None
            }
        }
    }

    async fn create_request(
        &self,
        social_worker_id: Uuid,
        municipality: String,
        req: CreateContactRequest,
    ) -> Option<ContactRequest> {
        let sql = format!(
            "INSERT INTO contact_requests (social_worker_id, volunteer_id, municipality, description, status) \
             VALUES ($1, $2, $3, $4, 'pending') RETURNING {REQUEST_COLUMNS}"
        );
        match sqlx::query_as::<_, ContactRequest>(&sql)
            .bind(social_worker_id)
            .bind(req.volunteer_id)
            .bind(municipality)
            .bind(req.description)
            .fetch_one(&self.pool)
            .await
        {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::error!("create_request error: {:?}", e);
                None
            }
        }
    }

    async fn list_requests(&self) -> Vec<ContactRequest> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM contact_requests ORDER BY created_at DESC");
        match sqlx::query_as::<_, ContactRequest>(&sql)
            .fetch_all(&self.pool)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("list_requests error: {:?}", e);
                vec![]
            }
        }
    }

    async fn list_requests_by_social_worker(&self, social_worker_id: Uuid) -> Vec<ContactRequest> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE social_worker_id = $1 ORDER BY created_at DESC"
        );
        match sqlx::query_as::<_, ContactRequest>(&sql)
            .bind(social_worker_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("list_requests_by_social_worker error: {:?}", e);
                vec![]
            }
        }
    }

    async fn list_requests_for_volunteer(&self, volunteer_id: Uuid) -> Vec<ContactRequest> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE volunteer_id = $1 ORDER BY created_at DESC"
        );
        match sqlx::query_as::<_, ContactRequest>(&sql)
            .bind(volunteer_id)
            .fetch_all(&self.pool)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("list_requests_for_volunteer error: {:?}", e);
                vec![]
            }
        }
    }

    async fn respond_to_request(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
        status: RequestStatus,
    ) -> Option<ContactRequest> {
        let sql = format!(
            "UPDATE contact_requests SET status = $1, updated_at = now() \
             WHERE id = $2 AND volunteer_id = $3 AND status = 'pending' RETURNING {REQUEST_COLUMNS}"
        );
        match sqlx::query_as::<_, ContactRequest>(&sql)
            .bind(status.as_str())
            .bind(request_id)
            .bind(volunteer_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("respond_to_request error: {:?}", e);
                None
            }
        }
    }

    /// Single round trip: every dashboard counter is a scalar subquery.
    async fn get_stats(&self) -> AdminDashboardStats {
        let sql = r#"
            SELECT
                (SELECT COUNT(*) FROM volunteers) AS total_volunteers,
                (SELECT COUNT(*) FROM volunteers WHERE status = 'approved') AS approved_volunteers,
                (SELECT COUNT(*) FROM volunteers WHERE status = 'pending') AS pending_volunteers,
                (SELECT COUNT(*) FROM profiles WHERE role = 'social_worker') AS total_social_workers,
                (SELECT COUNT(*) FROM contact_requests WHERE status = 'pending') AS open_requests,
                (SELECT COUNT(*) FROM contact_requests WHERE status = 'accepted') AS accepted_requests,
                (SELECT COUNT(DISTINCT municipality) FROM volunteers WHERE status = 'approved') AS municipalities_covered
        "#;
        match sqlx::query_as::<_, AdminDashboardStats>(sql)
            .fetch_one(&self.pool)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("get_stats error: {:?}", e);
                AdminDashboardStats::default()
            }
        }
    }

    async fn volunteer_counts_by_municipality(&self) -> Vec<MunicipalityCount> {
        let sql = r#"
            SELECT municipality, COUNT(*) FILTER (WHERE status = 'approved') AS volunteer_count
            FROM volunteers
            GROUP BY municipality
        "#;
        match sqlx::query_as::<_, MunicipalityCount>(sql)
            .fetch_all(&self.pool)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("volunteer_counts_by_municipality error: {:?}", e);
                vec![]
            }
        }
    }
}
