//! Credential checks for the decoy login form.
//!
//! One shared secret, a short list of usernames, and a per-session strike
//! counter. After [`MAX_LOGIN_ATTEMPTS`] consecutive failures the caller is
//! sent away from the site instead of seeing the form again. Failures never
//! reveal which field was wrong.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::session::Session;

/// Consecutive failures that trip the external redirect.
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session is now authenticated.
    Success,
    /// The attempt failed. When `redirect_elsewhere` is set the caller must
    /// leave the site rather than re-render the form.
    Failure { redirect_elsewhere: bool },
}

/// The allowed usernames and the shared secret.
#[derive(Clone)]
pub struct Credentials {
    usernames: BTreeSet<String>,
    secret: String,
}

impl Credentials {
    /// Build a credential record. Usernames are normalized on the way in;
    /// blank entries are dropped.
    #[must_use]
    pub fn new<I, S>(usernames: I, secret: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let usernames = usernames
            .into_iter()
            .map(|name| normalize_username(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            usernames,
            secret: secret.into(),
        }
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        let known_user = self.usernames.contains(username);
        let secret_ok: bool = self.secret.as_bytes().ct_eq(password.as_bytes()).into();
        known_user & secret_ok
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("usernames", &self.usernames)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Lowercase and trim a submitted username.
#[must_use]
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validates login attempts and updates the session accordingly.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    credentials: Credentials,
    session_lifetime: Duration,
}

impl CredentialValidator {
    #[must_use]
    pub fn new(credentials: Credentials, session_lifetime: Duration) -> Self {
        Self {
            credentials,
            session_lifetime,
        }
    }

    /// Check a submitted username/password pair against the credential
    /// record, mutating `session` to reflect the outcome.
    ///
    /// On success the strike counter is cleared and the session becomes
    /// permanent. On failure the counter grows; reaching
    /// [`MAX_LOGIN_ATTEMPTS`] resets it and asks for the external redirect.
    pub fn attempt(
        &self,
        username: &str,
        password: &str,
        session: &mut Session,
        now: DateTime<Utc>,
    ) -> LoginOutcome {
        let username = normalize_username(username);

        if self.credentials.matches(&username, password) {
            session.login_attempts = 0;
            session.authenticated = true;
            session.make_permanent(now, self.session_lifetime);
            info!(username = %username, "login succeeded");
            session.username = Some(username);
            return LoginOutcome::Success;
        }

        let attempts = session.login_attempts.saturating_add(1);
        if attempts >= MAX_LOGIN_ATTEMPTS {
            session.login_attempts = 0;
            warn!(attempts, "login failure threshold reached, redirecting away");
            LoginOutcome::Failure {
                redirect_elsewhere: true,
            }
        } else {
            session.login_attempts = attempts;
            warn!(attempts, "login failed");
            LoginOutcome::Failure {
                redirect_elsewhere: false,
            }
        }
    }
}
