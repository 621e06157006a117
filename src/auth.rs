use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

/// Claims
///
/// The payload of a Supabase session JWT. Only the fields the service reads are modelled;
/// unknown claims are ignored on decode.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the `auth.users.id`, which is also the `profiles.id` primary key.
    pub sub: Uuid,
    /// Audience, `authenticated` for signed-in Supabase sessions.
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// AuthUser
///
/// A caller whose token was verified by the Identity Provider and whose role was
/// loaded from the profile store.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// Caller
///
/// Attached to the request extensions by the route guard when it allows a request to a
/// protected prefix. A demo caller only asserts a role and has no subject behind it.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    Verified(AuthUser),
    Demo(Role),
}

impl Caller {
    pub fn role(&self) -> Role {
        match self {
            Caller::Verified(user) => user.role,
            Caller::Demo(role) => *role,
        }
    }
}

/// AuthUser Extractor
///
/// Reads the verified identity the route guard stored on the request. The guard has
/// already done token and role checks, so this only fails (401) when the handler is
/// reached without a verified session: a public route, or a demo-mode caller.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Caller>() {
            Some(Caller::Verified(user)) => Ok(user.clone()),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
