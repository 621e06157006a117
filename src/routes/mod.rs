/// Router Module Index
///
/// One router per section of the portal. The public router carries no protection;
/// the three role routers sit behind the route guard layered over the whole app,
/// which matches each request against the `/admin`, `/social-worker` and
/// `/volunteer` prefixes before any handler runs.

/// Routes reachable without a session (health, login, registration).
pub mod public;

/// `/admin` section: administrators only.
pub mod admin;

/// `/social-worker` section: social workers only.
pub mod social_worker;

/// `/volunteer` section: volunteers only.
pub mod volunteer;
