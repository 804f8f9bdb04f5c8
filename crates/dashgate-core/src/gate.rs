//! Access gate: who may reach which route.
//!
//! A pure decision over the request path and the caller's session. The HTTP
//! layer turns the decision into a response; nothing here touches I/O.

use crate::session::Session;

/// Prefix of the JSON API namespace.
pub const API_PREFIX: &str = "/api/";

/// Entry point of the login flow.
pub const LOGIN_PATH: &str = "/login";

/// Paths that skip the gate entirely.
pub const BYPASS_PATHS: &[&str] = &["/health", LOGIN_PATH, "/logout"];

/// Extensions of data files that stay gated even on the static route.
const DATA_EXTENSIONS: &[&str] = &[".json"];

/// Data files that are always public.
const PUBLIC_DATA_FILES: &[&str] = &["package.json"];

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Serve the request.
    Allow,
    /// Send the caller to the login page.
    DenyRedirect,
    /// Reply with a bare 401 error.
    DenyUnauthorized,
}

/// True for paths that are reachable without a session.
#[must_use]
pub fn is_bypass(path: &str) -> bool {
    BYPASS_PATHS.contains(&path)
}

/// Decide access to a gated route.
///
/// Authenticated sessions are always allowed. Otherwise API paths get a 401
/// and page paths get a redirect to [`LOGIN_PATH`].
#[must_use]
pub fn authorize(path: &str, session: &Session) -> AccessDecision {
    if is_bypass(path) || session.authenticated {
        AccessDecision::Allow
    } else if path.starts_with(API_PREFIX) {
        AccessDecision::DenyUnauthorized
    } else {
        AccessDecision::DenyRedirect
    }
}

/// Decide access to a file on the generic static route.
///
/// Assets are public. Data files are gated with a 401, except for the
/// allowlisted manifest names. `path` must already be percent-decoded, the
/// same form the file service resolves.
#[must_use]
pub fn authorize_static(path: &str, session: &Session) -> AccessDecision {
    if session.authenticated || !is_gated_data_file(path) {
        AccessDecision::Allow
    } else {
        AccessDecision::DenyUnauthorized
    }
}

fn is_gated_data_file(path: &str) -> bool {
    let path = path.trim_matches('/');
    if PUBLIC_DATA_FILES.contains(&path) {
        return false;
    }
    let lower = path.to_ascii_lowercase();
    DATA_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
