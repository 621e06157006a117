mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, request::Parts},
};
use common::MockRepository;
use jsonwebtoken::{EncodingKey, Header, encode};
use kontaktperson_portal::{
    auth::{AuthUser, Caller, Claims},
    identity::{IdentityError, IdentityProvider, SupabaseIdentity},
    models::Role,
};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const AUDIENCE: &str = "authenticated";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(user_id: Uuid, exp: u64, aud: &str, secret: &str) -> String {
    let claims = Claims {
        sub: user_id,
        aud: aud.to_string(),
        iat: now() as usize,
        exp: exp as usize,
        email: Some("someone@kontaktperson.test".to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn valid_token(user_id: Uuid) -> String {
    create_token(user_id, now() + 3600, AUDIENCE, TEST_JWT_SECRET)
}

fn identity(repo: MockRepository) -> SupabaseIdentity {
    SupabaseIdentity::new(TEST_JWT_SECRET, AUDIENCE, Arc::new(repo))
}

fn request_parts() -> Parts {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/volunteer/profile")
        .body(axum::body::Body::empty())
        .unwrap();
    request.into_parts().0
}

// --- Token Verification ---

#[tokio::test]
async fn test_valid_token_yields_subject() {
    let id = Uuid::new_v4();
    let subject = identity(MockRepository::default())
        .verify_token(&valid_token(id))
        .await
        .unwrap();

    assert_eq!(subject.id, id);
    assert_eq!(subject.email.as_deref(), Some("someone@kontaktperson.test"));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    // Well past the default 60s leeway.
    let token = create_token(Uuid::new_v4(), now() - 600, AUDIENCE, TEST_JWT_SECRET);

    let result = identity(MockRepository::default()).verify_token(&token).await;
    assert_eq!(result.unwrap_err(), IdentityError::Expired);
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let token = create_token(Uuid::new_v4(), now() + 3600, AUDIENCE, "some-other-secret");

    let result = identity(MockRepository::default()).verify_token(&token).await;
    assert_eq!(result.unwrap_err(), IdentityError::InvalidToken);
}

#[tokio::test]
async fn test_wrong_audience_is_rejected() {
    let token = create_token(Uuid::new_v4(), now() + 3600, "anon", TEST_JWT_SECRET);

    let result = identity(MockRepository::default()).verify_token(&token).await;
    assert_eq!(result.unwrap_err(), IdentityError::InvalidToken);
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let result = identity(MockRepository::default())
        .verify_token("not.a.jwt")
        .await;
    assert_eq!(result.unwrap_err(), IdentityError::InvalidToken);
}

// --- Role Lookup ---

#[tokio::test]
async fn test_role_is_read_from_profile() {
    let id = Uuid::new_v4();
    let provider = identity(MockRepository::default().with_profile(id, "social_worker"));

    assert_eq!(provider.get_role(id).await.unwrap(), Role::SocialWorker);
}

#[tokio::test]
async fn test_missing_profile_fails() {
    let provider = identity(MockRepository::default());

    assert_eq!(
        provider.get_role(Uuid::new_v4()).await.unwrap_err(),
        IdentityError::ProfileNotFound
    );
}

#[tokio::test]
async fn test_unrecognized_profile_role_fails() {
    let id = Uuid::new_v4();
    let provider = identity(MockRepository::default().with_profile(id, "student"));

    assert_eq!(
        provider.get_role(id).await.unwrap_err(),
        IdentityError::UnrecognizedRole("student".to_string())
    );
}

// --- AuthUser Extractor ---

#[tokio::test]
async fn test_auth_user_from_verified_caller() {
    let id = Uuid::new_v4();
    let mut parts = request_parts();
    parts.extensions.insert(Caller::Verified(AuthUser {
        id,
        role: Role::Volunteer,
    }));

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.role, Role::Volunteer);
}

#[tokio::test]
async fn test_auth_user_rejects_demo_caller() {
    let mut parts = request_parts();
    parts.extensions.insert(Caller::Demo(Role::Volunteer));

    let result = AuthUser::from_request_parts(&mut parts, &()).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_user_rejects_missing_caller() {
    let mut parts = request_parts();

    let result = AuthUser::from_request_parts(&mut parts, &()).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_caller_role_for_both_kinds() {
    let verified = Caller::Verified(AuthUser {
        id: Uuid::new_v4(),
        role: Role::SocialWorker,
    });

    assert_eq!(verified.role(), Role::SocialWorker);
    assert_eq!(Caller::Demo(Role::Admin).role(), Role::Admin);
}
