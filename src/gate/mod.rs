//! Access gate decision table.
//!
//! Flow Overview: canonicalize and classify the path, let public assets
//! through without touching the auth service, resolve the session (if a token
//! is present), and only for sessions on auth pages consult the user profile
//! to enforce the first-login password change. Session lookup failures fall
//! back to `/login`. A failed or empty profile lookup counts as "no profile
//! data", which only lets the request reach `/login`.

mod error;
pub mod routes;
pub mod session;
pub mod users;

pub use self::error::GateError;
pub use self::routes::{AuthPage, RouteClass, RouteTable};
pub use self::session::{
    extract_session_token, RemoteSessionProvider, Session, SessionProvider,
    DEFAULT_SESSION_COOKIE,
};
pub use self::users::{PgUserRepository, UserProfile, UserRepository};

use axum::http::HeaderMap;
use std::{fmt, sync::Arc};
use tracing::{debug, error, warn};

use self::routes::{
    canonical_path, is_failure_exempt, CHANGE_PASSWORD_PATH, DASHBOARD_PATH, LOGIN_PATH, ROOT_PATH,
};

pub const DEFAULT_ALLOWED_ROLES: [&str; 3] = ["admin", "station_officer", "data_entry"];

/// Where a redirected request is sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirectTarget {
    Login,
    ChangePassword,
    Dashboard,
}

impl RedirectTarget {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::ChangePassword => CHANGE_PASSWORD_PATH,
            Self::Dashboard => DASHBOARD_PATH,
        }
    }
}

/// Outcome of evaluating a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Redirect(RedirectTarget),
}

/// Onboarding rule for a signed-in user on an auth page.
#[must_use]
pub const fn onboarding_decision(page: AuthPage, first_login: bool) -> Decision {
    match (page, first_login) {
        (AuthPage::Login, true) => Decision::Redirect(RedirectTarget::ChangePassword),
        (AuthPage::ChangePassword, false) => Decision::Redirect(RedirectTarget::Dashboard),
        _ => Decision::Allow,
    }
}

pub struct AccessGate {
    sessions: Arc<dyn SessionProvider>,
    users: Arc<dyn UserRepository>,
    routes: RouteTable,
    cookie_name: String,
    allowed_roles: Vec<String>,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("routes", &self.routes)
            .field("cookie_name", &self.cookie_name)
            .field("allowed_roles", &self.allowed_roles)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            sessions,
            users,
            routes: RouteTable::default(),
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            allowed_roles: DEFAULT_ALLOWED_ROLES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    #[must_use]
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn with_cookie_name(mut self, cookie_name: String) -> Self {
        self.cookie_name = cookie_name;
        self
    }

    /// An empty list accepts every role.
    #[must_use]
    pub fn with_allowed_roles(mut self, roles: Vec<String>) -> Self {
        self.allowed_roles = roles;
        self
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Evaluate a request from its path and headers.
    pub async fn evaluate(&self, path: &str, headers: &HeaderMap) -> Decision {
        let token = extract_session_token(headers, &self.cookie_name);
        self.evaluate_token(path, token.as_deref()).await
    }

    /// Evaluate a request from its path and an already extracted token.
    pub async fn evaluate_token(&self, path: &str, token: Option<&str>) -> Decision {
        let path = canonical_path(path);
        match self.try_evaluate(&path, token).await {
            Ok(decision) => decision,
            Err(err) => {
                error!(path, "access gate evaluation failed: {err}");
                if is_failure_exempt(&path) {
                    Decision::Allow
                } else {
                    Decision::Redirect(RedirectTarget::Login)
                }
            }
        }
    }

    async fn try_evaluate(&self, path: &str, token: Option<&str>) -> Result<Decision, GateError> {
        let class = self.routes.classify(path);

        // A session never changes the outcome for assets, so the auth service
        // is not consulted for them.
        if class == RouteClass::Public && path != ROOT_PATH {
            return Ok(Decision::Allow);
        }

        let session = match token {
            Some(token) => self.sessions.resolve(token).await?,
            None => None,
        };

        let Some(session) = session else {
            return Ok(match class {
                RouteClass::Public | RouteClass::Auth(_) => Decision::Allow,
                RouteClass::Protected => {
                    debug!(path, "no session, redirecting to login");
                    Decision::Redirect(RedirectTarget::Login)
                }
            });
        };

        let RouteClass::Auth(page) = class else {
            return Ok(Decision::Allow);
        };

        let profile = match self.users.find_by_auth_id(session.user_id).await {
            Ok(profile) => profile,
            Err(err) => {
                error!(user_id = %session.user_id, "failed to load user profile: {err}");
                return Ok(match page {
                    AuthPage::Login => Decision::Allow,
                    AuthPage::ChangePassword => onboarding_decision(page, false),
                });
            }
        };

        // No profile data reads as "not a first login".
        let Some(profile) = profile else {
            warn!(user_id = %session.user_id, "session has no user profile");
            return Ok(onboarding_decision(page, false));
        };

        if !self.role_allowed(&profile.role) {
            // The destination page rejects the role; the gate only records it.
            warn!(user_id = %session.user_id, role = %profile.role, "role not permitted on portal");
        }
        if !profile.is_active {
            warn!(user_id = %session.user_id, "inactive user holds a session");
        }

        Ok(onboarding_decision(page, profile.first_login))
    }

    fn role_allowed(&self, role: &str) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.iter().any(|r| r == role)
    }
}
