//! Cookie-backed session middleware.
//!
//! Reads the signed session cookie on the way in and exposes it to handlers
//! as a [`SessionHandle`] in the request extensions. On the way out the
//! session is written back as a `Set-Cookie` header when it changed, when
//! an authenticated session's expiry slides forward, or when a cookie must
//! be cleared.
//!
//! Each request owns its handle exclusively; there is no cross-request
//! locking.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use dashgate_core::session::Session;

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "dashgate_session";

#[derive(Debug)]
struct Tracked {
    session: Session,
    modified: bool,
    /// The request carried a cookie that did not verify.
    stale: bool,
}

/// The current request's session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Tracked>>,
}

impl SessionHandle {
    fn new(session: Session, stale: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Tracked {
                session,
                modified: false,
                stale,
            })),
        }
    }

    /// Snapshot of the session.
    pub async fn get(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    /// Mutate the session. It is written back only if `f` changed it.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.lock().await;
        let before = guard.session.clone();
        let result = f(&mut guard.session);
        if guard.session != before {
            guard.modified = true;
        }
        result
    }

    /// Compute the `Set-Cookie` value for the response, if any.
    async fn set_cookie(&self, state: &AppState, now: DateTime<Utc>) -> Option<String> {
        let mut guard = self.inner.lock().await;

        if guard.session.is_empty() {
            return (guard.modified || guard.stale).then(|| removal_cookie(state));
        }

        // Sliding expiry for logged-in sessions.
        if guard.session.authenticated && guard.session.is_permanent() {
            guard
                .session
                .make_permanent(now, state.config.session_lifetime);
            guard.modified = true;
        }

        if !guard.modified {
            return None;
        }

        match state.signer.encode(&guard.session) {
            Ok(value) => Some(session_cookie(state, &value, &guard.session, now)),
            Err(e) => {
                warn!(error = %e, "failed to sign session");
                None
            }
        }
    }
}

/// Load the session from the request cookie and persist it on the response.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let now = Utc::now();

    let handle = match cookie_value(req.headers(), SESSION_COOKIE) {
        Some(raw) => match state.signer.decode(&raw, now) {
            Ok(session) => SessionHandle::new(session, false),
            Err(e) => {
                debug!(error = %e, "discarding session cookie");
                SessionHandle::new(Session::default(), true)
            }
        },
        None => SessionHandle::new(Session::default(), false),
    };

    req.extensions_mut().insert(handle.clone());
    let mut response = next.run(req).await;

    if let Some(cookie) = handle.set_cookie(&state, now).await {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "session cookie is not a valid header value"),
        }
    }

    response
}

/// Find a cookie by name across all `Cookie` headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

fn session_cookie(state: &AppState, value: &str, session: &Session, now: DateTime<Utc>) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(expires_at) = session.expires_at {
        let max_age = (expires_at - now).num_seconds().max(0);
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if state.config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn removal_cookie(state: &AppState) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if state.config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; dashgate_session=abc.def"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert_eq!(cookie_value(&headers, "other").as_deref(), Some("1"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn update_tracks_changes_only() {
        let handle = SessionHandle::new(Session::default(), false);

        handle.update(Session::clear).await;
        assert!(!handle.inner.lock().await.modified);

        handle.update(|s| s.login_attempts = 1).await;
        assert!(handle.inner.lock().await.modified);
        assert_eq!(handle.get().await.login_attempts, 1);
    }
}
