#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use kontaktperson_portal::{
    AppState,
    config::AppConfig,
    identity::{IdentityError, IdentityProvider, Subject},
    models::{
        AdminDashboardStats, ContactRequest, CreateContactRequest, MunicipalityCount, Profile,
        RegisterVolunteerRequest, RequestStatus, Role, UpdateVolunteerRequest, Volunteer,
        VolunteerStatus,
    },
    repository::{Repository, VolunteerFilter},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use uuid::Uuid;

// --- In-memory Repository ---

#[derive(Default)]
pub struct Tables {
    pub profiles: Vec<Profile>,
    pub volunteers: Vec<Volunteer>,
    pub requests: Vec<ContactRequest>,
}

/// MockRepository
///
/// Behaves like the Postgres repository over plain vectors, so handler tests can assert
/// on what was written.
#[derive(Default)]
pub struct MockRepository {
    pub tables: Mutex<Tables>,
}

impl MockRepository {
    pub fn with_profile(self, id: Uuid, role: &str) -> Self {
        self.tables.lock().unwrap().profiles.push(Profile {
            id,
            email: format!("{}@kontaktperson.test", &id.simple().to_string()[..8]),
            full_name: "Test Person".to_string(),
            role: role.to_string(),
            municipality: None,
            created_at: Utc::now(),
        });
        self
    }

    pub fn with_volunteer(self, volunteer: Volunteer) -> Self {
        self.tables.lock().unwrap().volunteers.push(volunteer);
        self
    }

    pub fn with_request(self, request: ContactRequest) -> Self {
        self.tables.lock().unwrap().requests.push(request);
        self
    }
}

pub fn volunteer(user_id: Uuid, municipality: &str, status: VolunteerStatus) -> Volunteer {
    Volunteer {
        id: Uuid::new_v4(),
        user_id,
        full_name: "Vera Volunteer".to_string(),
        email: "vera@kontaktperson.test".to_string(),
        phone: None,
        municipality: municipality.to_string(),
        interests: vec!["hiking".to_string()],
        availability: Some("weekends".to_string()),
        status: status.as_str().to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn contact_request(
    social_worker_id: Uuid,
    volunteer_id: Uuid,
    status: RequestStatus,
) -> ContactRequest {
    ContactRequest {
        id: Uuid::new_v4(),
        social_worker_id,
        volunteer_id,
        municipality: "Oslo".to_string(),
        description: "Weekly walks".to_string(),
        status: status.as_str().to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn get_profile(&self, id: Uuid) -> Option<Profile> {
        let t = self.tables.lock().unwrap();
        t.profiles.iter().find(|p| p.id == id).cloned()
    }

    async fn list_profiles(&self) -> Vec<Profile> {
        self.tables.lock().unwrap().profiles.clone()
    }

    async fn create_profile(&self, profile: Profile) -> Option<Profile> {
        let mut t = self.tables.lock().unwrap();
        if t.profiles.iter().any(|p| p.id == profile.id) {
            return None;
        }
        t.profiles.push(profile.clone());
        Some(profile)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Option<Profile> {
        let mut t = self.tables.lock().unwrap();
        let profile = t.profiles.iter_mut().find(|p| p.id == id)?;
        profile.role = role.to_string();
        Some(profile.clone())
    }

    async fn list_volunteers(&self, filter: VolunteerFilter) -> Vec<Volunteer> {
        let t = self.tables.lock().unwrap();
        t.volunteers
            .iter()
            .filter(|v| {
                filter
                    .municipality
                    .as_deref()
                    .is_none_or(|m| v.municipality.to_lowercase() == m.to_lowercase())
            })
            .filter(|v| filter.status.is_none_or(|s| v.status == s.as_str()))
            .cloned()
            .collect()
    }

    async fn get_volunteer(&self, id: Uuid) -> Option<Volunteer> {
        let t = self.tables.lock().unwrap();
        t.volunteers.iter().find(|v| v.id == id).cloned()
    }

    async fn get_volunteer_by_user(&self, user_id: Uuid) -> Option<Volunteer> {
        let t = self.tables.lock().unwrap();
        t.volunteers.iter().find(|v| v.user_id == user_id).cloned()
    }

    async fn create_volunteer(
        &self,
        user_id: Uuid,
        req: RegisterVolunteerRequest,
    ) -> Option<Volunteer> {
        let mut created = volunteer(user_id, &req.municipality, VolunteerStatus::Pending);
        created.full_name = req.full_name;
        created.email = req.email;
        created.phone = req.phone;
        created.interests = req.interests;
        created.availability = req.availability;
        self.tables.lock().unwrap().volunteers.push(created.clone());
        Some(created)
    }

    async fn update_volunteer(
        &self,
        user_id: Uuid,
        req: UpdateVolunteerRequest,
    ) -> Option<Volunteer> {
        let mut t = self.tables.lock().unwrap();
        let v = t.volunteers.iter_mut().find(|v| v.user_id == user_id)?;
        if let Some(name) = req.full_name {
            v.full_name = name;
        }
        if let Some(phone) = req.phone {
            v.phone = Some(phone);
        }
        if let Some(m) = req.municipality {
            v.municipality = m;
        }
        if let Some(i) = req.interests {
            v.interests = i;
        }
        if let Some(a) = req.availability {
            v.availability = Some(a);
        }
        Some(v.clone())
    }

    async fn set_volunteer_status(&self, id: Uuid, status: VolunteerStatus) -> Option<Volunteer> {
        let mut t = self.tables.lock().unwrap();
        let v = t.volunteers.iter_mut().find(|v| v.id == id)?;
        v.status = status.as_str().to_string();
        Some(v.clone())
    }

    async fn create_request(
        &self,
        social_worker_id: Uuid,
        municipality: String,
        req: CreateContactRequest,
    ) -> Option<ContactRequest> {
        let mut created = contact_request(social_worker_id, req.volunteer_id, RequestStatus::Pending);
        created.municipality = municipality;
        created.description = req.description;
        self.tables.lock().unwrap().requests.push(created.clone());
        Some(created)
    }

    async fn list_requests(&self) -> Vec<ContactRequest> {
        self.tables.lock().unwrap().requests.clone()
    }

    async fn list_requests_by_social_worker(&self, social_worker_id: Uuid) -> Vec<ContactRequest> {
        let t = self.tables.lock().unwrap();
        t.requests
            .iter()
            .filter(|r| r.social_worker_id == social_worker_id)
            .cloned()
            .collect()
    }

    async fn list_requests_for_volunteer(&self, volunteer_id: Uuid) -> Vec<ContactRequest> {
        let t = self.tables.lock().unwrap();
        t.requests
            .iter()
            .filter(|r| r.volunteer_id == volunteer_id)
            .cloned()
            .collect()
    }

    async fn respond_to_request(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
        status: RequestStatus,
    ) -> Option<ContactRequest> {
        let mut t = self.tables.lock().unwrap();
        let r = t.requests.iter_mut().find(|r| {
            r.id == request_id && r.volunteer_id == volunteer_id && r.status == "pending"
        })?;
        r.status = status.as_str().to_string();
        Some(r.clone())
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let t = self.tables.lock().unwrap();
        let count_v = |s: &str| t.volunteers.iter().filter(|v| v.status == s).count() as i64;
        let count_r = |s: &str| t.requests.iter().filter(|r| r.status == s).count() as i64;
        let mut covered: Vec<&str> = t
            .volunteers
            .iter()
            .filter(|v| v.status == "approved")
            .map(|v| v.municipality.as_str())
            .collect();
        covered.sort();
        covered.dedup();

        AdminDashboardStats {
            total_volunteers: t.volunteers.len() as i64,
            approved_volunteers: count_v("approved"),
            pending_volunteers: count_v("pending"),
            total_social_workers: t
                .profiles
                .iter()
                .filter(|p| p.role == "social_worker")
                .count() as i64,
            open_requests: count_r("pending"),
            accepted_requests: count_r("accepted"),
            municipalities_covered: covered.len() as i64,
        }
    }

    async fn volunteer_counts_by_municipality(&self) -> Vec<MunicipalityCount> {
        let t = self.tables.lock().unwrap();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for v in &t.volunteers {
            let count = counts.entry(v.municipality.clone()).or_default();
            if v.status == "approved" {
                *count += 1;
            }
        }
        counts
            .into_iter()
            .map(|(municipality, volunteer_count)| MunicipalityCount {
                municipality,
                volunteer_count,
            })
            .collect()
    }
}

// --- Identity Provider Double ---

/// MockIdentity
///
/// Token table plus role table. Counts calls so tests can assert that the demo cookie
/// short-circuits verification.
#[derive(Default)]
pub struct MockIdentity {
    pub tokens: HashMap<String, Uuid>,
    pub roles: HashMap<Uuid, Result<Role, IdentityError>>,
    pub delay: Option<Duration>,
    pub verify_calls: AtomicUsize,
}

impl MockIdentity {
    /// Registers `token` for a fresh subject holding `role`; returns the subject id.
    pub fn with_user(&mut self, token: &str, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        self.tokens.insert(token.to_string(), id);
        self.roles.insert(id, Ok(role));
        id
    }

    pub fn with_role_result(&mut self, token: &str, result: Result<Role, IdentityError>) -> Uuid {
        let id = Uuid::new_v4();
        self.tokens.insert(token.to_string(), id);
        self.roles.insert(id, result);
        id
    }

    pub fn calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_token(&self, token: &str) -> Result<Subject, IdentityError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.tokens
            .get(token)
            .map(|id| Subject { id: *id, email: None })
            .ok_or(IdentityError::InvalidToken)
    }

    async fn get_role(&self, subject_id: Uuid) -> Result<Role, IdentityError> {
        self.roles
            .get(&subject_id)
            .cloned()
            .unwrap_or(Err(IdentityError::ProfileNotFound))
    }
}

// --- State Builders ---

pub fn test_config(demo_mode: bool) -> AppConfig {
    AppConfig {
        demo_mode,
        identity_timeout: Duration::from_millis(200),
        ..AppConfig::default()
    }
}

pub fn app_state(repo: MockRepository, identity: MockIdentity, demo_mode: bool) -> AppState {
    AppState::new(Arc::new(repo), Arc::new(identity), test_config(demo_mode))
}
