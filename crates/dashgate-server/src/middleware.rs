//! Access-gate middleware for `dashgate`.
//!
//! Applied with `route_layer` to every gated route so the same decision
//! runs in front of each handler. Unauthenticated API calls get a 401 JSON
//! error; unauthenticated page requests are redirected to the login form.

use axum::extract::Request;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use dashgate_core::gate::{self, AccessDecision, LOGIN_PATH};

use crate::error::AppError;
use crate::session::SessionHandle;

/// Middleware that requires an authenticated session.
pub async fn require_session(
    Extension(session): Extension<SessionHandle>,
    req: Request,
    next: Next,
) -> Response {
    let decision = gate::authorize(req.uri().path(), &session.get().await);
    deny_or(decision, next.run(req)).await
}

/// Turn a gate decision into a response, running `allowed` only on
/// [`AccessDecision::Allow`].
pub async fn deny_or(
    decision: AccessDecision,
    allowed: impl Future<Output = Response>,
) -> Response {
    match decision {
        AccessDecision::Allow => allowed.await,
        AccessDecision::DenyUnauthorized => AppError::Unauthorized.into_response(),
        AccessDecision::DenyRedirect => found(LOGIN_PATH),
    }
}

/// A `302 Found` redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_owned())]).into_response()
}
