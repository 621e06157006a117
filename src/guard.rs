//! Route Access Guard.
//!
//! Every inbound request passes through [`route_guard`]. Requests to a protected prefix
//! are allowed only for callers whose role is permitted on that prefix; everything else
//! ends in a redirect. Failures never surface as errors: missing, invalid or unverifiable
//! credentials all redirect to the login page.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::{future::Future, time::Duration};

use crate::{
    auth::{AuthUser, Caller},
    identity::{IdentityError, IdentityState},
    models::{Role, landing_path_for},
};

pub const DEMO_ROLE_COOKIE: &str = "demo_role";
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// RouteRule
///
/// A protected path prefix and the roles allowed behind it.
#[derive(Debug)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub roles: &'static [Role],
}

impl RouteRule {
    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Segment-aware: `/volunteer` covers `/volunteer` and `/volunteer/...`, not `/volunteers`.
    fn covers(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

pub static ROUTE_RULES: &[RouteRule] = &[
    RouteRule {
        prefix: "/admin",
        roles: &[Role::Admin],
    },
    RouteRule {
        prefix: "/social-worker",
        roles: &[Role::SocialWorker],
    },
    RouteRule {
        prefix: "/volunteer",
        roles: &[Role::Volunteer],
    },
];

/// Longest-prefix lookup in [`ROUTE_RULES`]. `None` means the path is public.
pub fn match_rule(path: &str) -> Option<&'static RouteRule> {
    match_rule_in(ROUTE_RULES, path)
}

pub fn match_rule_in(rules: &'static [RouteRule], path: &str) -> Option<&'static RouteRule> {
    rules
        .iter()
        .filter(|rule| rule.covers(path))
        .max_by_key(|rule| rule.prefix.len())
}

/// Assertion
///
/// The one credential that governs a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Unverified role claim from the demo cookie. Only built when demo mode is on.
    Demo(String),
    /// Opaque session token to be verified by the Identity Provider.
    Bearer(String),
    Anonymous,
}

impl Assertion {
    /// Picks the assertion for a request. The demo cookie wins when demo mode is enabled
    /// and is ignored otherwise. The token cookie is preferred over an Authorization header.
    pub fn from_headers(headers: &HeaderMap, demo_enabled: bool) -> Self {
        if demo_enabled {
            if let Some(role) = cookie_value(headers, DEMO_ROLE_COOKIE) {
                return Assertion::Demo(role);
            }
        }

        if let Some(token) = cookie_value(headers, ACCESS_TOKEN_COOKIE) {
            return Assertion::Bearer(token);
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Assertion::Bearer(token.to_string()))
            .unwrap_or(Assertion::Anonymous)
    }
}

/// First non-empty value of the named cookie across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

/// Decision
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Let the request through. `caller` is `None` on public routes.
    Allow { caller: Option<Caller> },
    Redirect(String),
}

impl Decision {
    fn login(path: &str) -> Self {
        Decision::Redirect(login_redirect(path))
    }

    fn unauthorized() -> Self {
        Decision::Redirect(UNAUTHORIZED_PATH.to_string())
    }
}

/// `/login?redirect=<path>`, with the path form-encoded.
pub fn login_redirect(path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect={encoded}")
}

fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or("")
}

/// Whether `path` already sits in the same top-level section as `landing`.
///
/// Compares first path segments only, so `/volunteer/anything` counts as under
/// `/volunteer/dashboard`. A landing of `/` has an empty first segment and matches
/// only the root.
pub fn is_under_landing(path: &str, landing: &str) -> bool {
    first_segment(path) == first_segment(landing)
}

/// RouteGuard
///
/// Decides allow or redirect for each request. Holds no per-request state; identity is
/// never cached between requests.
#[derive(Clone)]
pub struct RouteGuard {
    identity: IdentityState,
    timeout: Duration,
    demo_enabled: bool,
    rules: &'static [RouteRule],
}

impl RouteGuard {
    pub fn new(identity: IdentityState, timeout: Duration, demo_enabled: bool) -> Self {
        Self {
            identity,
            timeout,
            demo_enabled,
            rules: ROUTE_RULES,
        }
    }

    /// Replaces the rule table. With [`ROUTE_RULES`] every section is reserved for the role
    /// that lands there, so the redirect-to-landing branch of [`RouteGuard::decide`] only
    /// fires under a table that protects part of a role's own section from it.
    pub fn with_rules(mut self, rules: &'static [RouteRule]) -> Self {
        self.rules = rules;
        self
    }

    pub fn demo_enabled(&self) -> bool {
        self.demo_enabled
    }

    pub async fn decide(&self, path: &str, assertion: Assertion) -> Decision {
        let Some(rule) = match_rule_in(self.rules, path) else {
            return Decision::Allow { caller: None };
        };

        let token = match assertion {
            Assertion::Demo(raw) => return decide_demo(rule, &raw),
            Assertion::Bearer(token) => token,
            Assertion::Anonymous => {
                tracing::debug!(path, "no credential on protected route");
                return Decision::login(path);
            }
        };

        let subject = match self.bounded(self.identity.verify_token(&token)).await {
            Ok(subject) => subject,
            Err(e) => {
                tracing::debug!(path, error = %e, "token rejected");
                return Decision::login(path);
            }
        };

        // An unrecognized profile role falls through to the mismatch branch with no landing
        // section of its own, which always ends on the unauthorized page.
        let role = match self.bounded(self.identity.get_role(subject.id)).await {
            Ok(role) => Some(role),
            Err(IdentityError::UnrecognizedRole(raw)) => {
                tracing::warn!(subject = %subject.id, role = %raw, "profile has unrecognized role");
                None
            }
            Err(e) => {
                tracing::warn!(subject = %subject.id, error = %e, "role lookup failed");
                return Decision::login(path);
            }
        };

        if let Some(role) = role.filter(|r| rule.permits(*r)) {
            return Decision::Allow {
                caller: Some(Caller::Verified(AuthUser {
                    id: subject.id,
                    role,
                })),
            };
        }

        let landing = landing_path_for(role);
        tracing::info!(subject = %subject.id, ?role, path, "role not permitted on route");
        if is_under_landing(path, landing) {
            Decision::Redirect(landing.to_string())
        } else {
            Decision::unauthorized()
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, IdentityError>>,
    ) -> Result<T, IdentityError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(IdentityError::Timeout))
    }
}

fn decide_demo(rule: &RouteRule, raw: &str) -> Decision {
    match raw.parse::<Role>() {
        Ok(role) if rule.permits(role) => Decision::Allow {
            caller: Some(Caller::Demo(role)),
        },
        _ => {
            tracing::debug!(role = raw, prefix = rule.prefix, "demo role not permitted");
            Decision::unauthorized()
        }
    }
}

/// route_guard
///
/// Axum middleware wrapping the whole router. Allowed requests continue with the caller
/// attached to their extensions; everything else gets a 307 redirect.
pub async fn route_guard(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let assertion = Assertion::from_headers(request.headers(), guard.demo_enabled());

    match guard.decide(&path, assertion).await {
        Decision::Allow { caller } => {
            if let Some(caller) = caller {
                tracing::debug!(role = %caller.role(), path = %path, "access granted");
                request.extensions_mut().insert(caller);
            }
            next.run(request).await
        }
        Decision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
