use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use std::sync::Arc;
use uuid::Uuid;

use crate::{auth::Claims, models::Role, repository::RepositoryState};

/// Subject
///
/// A verified identity, as returned by the Identity Provider after token validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: Uuid,
    pub email: Option<String>,
}

/// IdentityError
///
/// Everything that can go wrong while resolving a caller. The route guard maps every
/// variant except `UnrecognizedRole` to the same login redirect, so the variants exist
/// for logs only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error("token is invalid")]
    InvalidToken,
    #[error("token has expired")]
    Expired,
    #[error("no profile for subject")]
    ProfileNotFound,
    #[error("profile carries unrecognized role `{0}`")]
    UnrecognizedRole(String),
    #[error("identity provider did not answer in time")]
    Timeout,
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// IdentityProvider
///
/// Capability interface over the external identity service: token verification plus a
/// role lookup keyed by subject id. Any backend implementing both can sit behind the guard.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<Subject, IdentityError>;
    async fn get_role(&self, subject_id: Uuid) -> Result<Role, IdentityError>;
}

/// IdentityState
///
/// Shared handle to the configured provider.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// SupabaseIdentity
///
/// Verifies Supabase-issued session JWTs with the project secret and resolves roles from
/// the `profiles` table.
pub struct SupabaseIdentity {
    decoding_key: DecodingKey,
    validation: Validation,
    repo: RepositoryState,
}

impl SupabaseIdentity {
    pub fn new(jwt_secret: &str, audience: &str, repo: RepositoryState) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
            repo,
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify_token(&self, token: &str) -> Result<Subject, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::InvalidToken,
            }
        })?;

        Ok(Subject {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }

    async fn get_role(&self, subject_id: Uuid) -> Result<Role, IdentityError> {
        // A deleted profile revokes access even while the token is still valid.
        let profile = self
            .repo
            .get_profile(subject_id)
            .await
            .ok_or(IdentityError::ProfileNotFound)?;

        profile
            .role
            .parse()
            .map_err(|_| IdentityError::UnrecognizedRole(profile.role.clone()))
    }
}
