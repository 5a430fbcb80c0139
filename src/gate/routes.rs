//! Route classification for the access gate.
//!
//! Prefixes match on segment boundaries: `/login` covers `/login` and
//! `/login/reset`, never `/loginx`. The root path only matches exactly.
//!
//! Paths are classified after [`canonical_path`] has resolved dot segments,
//! and the proxy forwards that same canonical path, so `/_next/../dashboard`
//! is gated as `/dashboard`.

pub const LOGIN_PATH: &str = "/login";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ROOT_PATH: &str = "/";

const DEFAULT_PUBLIC_PREFIXES: [&str; 7] = [
    "/health",
    "/openapi.json",
    "/favicon.ico",
    "/_next",
    "/static",
    "/assets",
    "/images",
];

/// How the gate treats a request path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteClass {
    /// Reachable without a session.
    Public,
    /// Login or password-change page.
    Auth(AuthPage),
    /// Everything else; needs a session.
    Protected,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthPage {
    Login,
    ChangePassword,
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    public_prefixes: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public_prefixes: DEFAULT_PUBLIC_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl RouteTable {
    /// Add extra public prefixes on top of the defaults.
    #[must_use]
    pub fn with_public_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for prefix in prefixes {
            let prefix = normalize(prefix.as_ref()).to_string();
            if prefix != ROOT_PATH && !self.public_prefixes.contains(&prefix) {
                self.public_prefixes.push(prefix);
            }
        }
        self
    }

    #[must_use]
    pub fn public_prefixes(&self) -> &[String] {
        &self.public_prefixes
    }

    /// Classify a request path. Auth pages win over public prefixes.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);

        if matches_prefix(path, LOGIN_PATH) {
            return RouteClass::Auth(AuthPage::Login);
        }
        if matches_prefix(path, CHANGE_PASSWORD_PATH) {
            return RouteClass::Auth(AuthPage::ChangePassword);
        }
        if path == ROOT_PATH
            || self
                .public_prefixes
                .iter()
                .any(|prefix| matches_prefix(path, prefix))
        {
            return RouteClass::Public;
        }

        RouteClass::Protected
    }
}

/// Paths where a failed gate evaluation must not redirect, to avoid loops.
#[must_use]
pub fn is_failure_exempt(path: &str) -> bool {
    let path = normalize(path);
    path == ROOT_PATH || path == LOGIN_PATH
}

/// Resolve `.` and `..` segments (plain or percent-encoded) and collapse
/// empty segments. `\` also separates segments, as it does for `url::Url`.
#[must_use]
pub fn canonical_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = false;

    for segment in path.split(['/', '\\']) {
        trailing_slash = true;
        match dot_segment(segment) {
            Some(DotSegment::Current) => {}
            Some(DotSegment::Parent) => {
                segments.pop();
            }
            None if segment.is_empty() => {}
            None => {
                segments.push(segment);
                trailing_slash = false;
            }
        }
    }

    let mut canonical = String::with_capacity(path.len());
    for segment in &segments {
        canonical.push('/');
        canonical.push_str(segment);
    }
    if canonical.is_empty() || trailing_slash {
        canonical.push('/');
    }
    canonical
}

enum DotSegment {
    Current,
    Parent,
}

fn dot_segment(segment: &str) -> Option<DotSegment> {
    if segment.len() > 6 || !segment.starts_with(['.', '%']) {
        return None;
    }
    match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
        "." => Some(DotSegment::Current),
        ".." => Some(DotSegment::Parent),
        _ => None,
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        ROOT_PATH
    } else {
        trimmed
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_pages_are_classified() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/login"), RouteClass::Auth(AuthPage::Login));
        assert_eq!(table.classify("/login/"), RouteClass::Auth(AuthPage::Login));
        assert_eq!(
            table.classify("/change-password"),
            RouteClass::Auth(AuthPage::ChangePassword)
        );
        assert_eq!(
            table.classify("/change-password/confirm"),
            RouteClass::Auth(AuthPage::ChangePassword)
        );
    }

    #[test]
    fn root_matches_only_itself() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/"), RouteClass::Public);
        assert_eq!(table.classify(""), RouteClass::Public);
        assert_eq!(table.classify("/fir"), RouteClass::Protected);
    }

    #[test]
    fn prefixes_match_on_segment_boundary() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/loginx"), RouteClass::Protected);
        assert_eq!(table.classify("/healthz"), RouteClass::Protected);
        assert_eq!(table.classify("/_next/static/chunk.js"), RouteClass::Public);
        assert_eq!(table.classify("/health"), RouteClass::Public);
    }

    #[test]
    fn portal_pages_are_protected() {
        let table = RouteTable::default();
        for path in ["/dashboard", "/fir/new", "/accused/12", "/bail", "/users"] {
            assert_eq!(table.classify(path), RouteClass::Protected, "{path}");
        }
    }

    #[test]
    fn extra_public_prefixes_are_added() {
        let table = RouteTable::default().with_public_prefixes(["/docs/", "/", "/health"]);
        assert_eq!(table.classify("/docs/manual"), RouteClass::Public);
        assert_eq!(table.classify("/fir"), RouteClass::Protected);
        assert_eq!(
            table
                .public_prefixes()
                .iter()
                .filter(|p| p.as_str() == "/health")
                .count(),
            1
        );
    }

    #[test]
    fn canonical_path_resolves_dot_segments() {
        assert_eq!(canonical_path("/dashboard"), "/dashboard");
        assert_eq!(canonical_path("/login/"), "/login/");
        assert_eq!(canonical_path(""), "/");
        assert_eq!(canonical_path("/_next/../dashboard"), "/dashboard");
        assert_eq!(canonical_path("/static/%2e%2e/fir/new"), "/fir/new");
        assert_eq!(canonical_path("/static/.%2E/fir"), "/fir");
        assert_eq!(canonical_path("/assets/./%2e/logo.png"), "/assets/logo.png");
        assert_eq!(canonical_path("/images\\..\\accused"), "/accused");
        assert_eq!(canonical_path("/../../etc"), "/etc");
        assert_eq!(canonical_path("/fir/.."), "/");
        assert_eq!(canonical_path("/fir//new"), "/fir/new");
        assert_eq!(canonical_path("/fir/...hidden"), "/fir/...hidden");
    }

    #[test]
    fn dot_segments_cannot_borrow_a_public_prefix() {
        let table = RouteTable::default();
        for path in ["/_next/../dashboard", "/static/%2e%2e/fir/new", "/health/%2E./users"] {
            assert_eq!(
                table.classify(&canonical_path(path)),
                RouteClass::Protected,
                "{path}"
            );
        }
    }

    #[test]
    fn failure_exempt_paths() {
        assert!(is_failure_exempt("/"));
        assert!(is_failure_exempt("/login"));
        assert!(is_failure_exempt("/login/"));
        assert!(!is_failure_exempt("/change-password"));
        assert!(!is_failure_exempt("/login/reset"));
    }
}
