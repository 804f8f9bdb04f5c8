//! Login and logout routes: `/login`, `/logout`.
//!
//! The login page is a deliberately bare decoy form. A failed attempt shows
//! a single generic marker; the third consecutive failure leaves the site.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Form, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use dashgate_core::credentials::LoginOutcome;
use dashgate_core::session::Session;

use crate::middleware::found;
use crate::session::SessionHandle;
use crate::state::AppState;

/// Build the login/logout router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Submitted login form. Missing fields are empty strings.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

async fn login_page() -> Html<String> {
    render_login(false)
}

/// Validate the submitted credentials.
///
/// An unreadable form body counts as a failed attempt.
async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let form = form.map_or_else(
        |e| {
            debug!(error = %e, "unreadable login form");
            LoginForm::default()
        },
        |Form(form)| form,
    );

    let now = Utc::now();
    let outcome = session
        .update(|s| state.validator.attempt(&form.username, &form.password, s, now))
        .await;

    match outcome {
        LoginOutcome::Success => found("/"),
        LoginOutcome::Failure {
            redirect_elsewhere: true,
        } => found(&state.config.decoy_url),
        LoginOutcome::Failure {
            redirect_elsewhere: false,
        } => render_login(true).into_response(),
    }
}

/// Clear the session. Safe to call any number of times.
async fn logout(Extension(session): Extension<SessionHandle>) -> Response {
    session.update(Session::clear).await;
    found("/")
}

fn render_login(error: bool) -> Html<String> {
    let marker = if error { LOGIN_ERROR } else { "" };
    Html(LOGIN_PAGE.replace("{{ERROR}}", marker))
}

const LOGIN_ERROR: &str = r#"<p class="error">&times;</p>"#;

/// Minimal login form: id and password stacked, no branding.
const LOGIN_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en"><head><meta charset="utf-8"/><meta name="viewport" content="width=device-width,initial-scale=1"/>
<meta name="robots" content="noindex, nofollow"/>
<title>Login</title>
<style>
body{font-family:-apple-system,sans-serif;display:flex;justify-content:center;align-items:center;height:100vh;margin:0;background:#f0f0f0}
form{display:flex;flex-direction:column;gap:8px;width:160px}
input{padding:8px 12px;border:1px solid #ccc;border-radius:4px;font-size:14px;width:100%;box-sizing:border-box}
button{padding:8px 16px;background:#666;color:#fff;border:none;border-radius:4px;cursor:pointer;font-size:14px}
button:hover{background:#444}
.error{color:#c00;font-size:12px;text-align:center}
</style></head>
<body>
<div>
  <form method="POST" action="/login">
    <input type="text" name="username" placeholder="id" autofocus/>
    <input type="password" name="password" placeholder="pw"/>
    <button type="submit">&rarr;</button>
  </form>
  {{ERROR}}
</div>
</body></html>
"##;
