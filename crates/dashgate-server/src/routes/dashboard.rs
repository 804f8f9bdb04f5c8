//! Dashboard page, data file and static assets.
//!
//! `/` and `/dashboard-data.json` sit behind the access gate. Everything
//! else under the dashboard directory goes through [`static_file`], which
//! applies the data-file rule instead: assets are public, `.json` files
//! need a session.

use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use dashgate_core::gate::{self, API_PREFIX};
use dashgate_core::resolver::TRAVERSAL_TOKEN;

use crate::error::AppError;
use crate::middleware::deny_or;
use crate::session::SessionHandle;
use crate::state::AppState;

/// Name of the gated data file.
pub const DATA_FILE: &str = "dashboard-data.json";

/// Build the gated dashboard router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/dashboard-data.json", get(dashboard_data))
}

async fn index(State(state): State<Arc<AppState>>, req: Request) -> Response {
    serve_file(&state, "index.html", req).await
}

async fn dashboard_data(State(state): State<Arc<AppState>>, req: Request) -> Response {
    serve_file(&state, DATA_FILE, req).await
}

async fn serve_file(state: &AppState, name: &str, req: Request) -> Response {
    let service = ServeFile::new(state.config.dashboard_dir.join(name));
    into_response(service.oneshot(req).await)
}

/// Fallback for every unmatched path.
///
/// Unmatched API paths keep the API gate (401 without a session) and end in
/// a JSON error. Everything else is a static file under the data-file rule.
/// Dot-files are never served. Every check runs on the percent-decoded path,
/// the same one the file service opens.
pub async fn static_file(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    req: Request,
) -> Response {
    let Ok(path) = urlencoding::decode(req.uri().path()).map(Cow::into_owned) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let session = session.get().await;

    if path.starts_with(API_PREFIX) {
        return deny_or(gate::authorize(&path, &session), async {
            if path.contains(TRAVERSAL_TOKEN) {
                AppError::BadRequest("Invalid path".to_owned()).into_response()
            } else {
                AppError::NotFound("Not found".to_owned()).into_response()
            }
        })
        .await;
    }

    deny_or(gate::authorize_static(&path, &session), async {
        if has_hidden_segment(&path) {
            return StatusCode::NOT_FOUND.into_response();
        }
        into_response(state.static_files.clone().oneshot(req).await)
    })
    .await
}

fn has_hidden_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

fn into_response<R: IntoResponse>(result: Result<R, Infallible>) -> Response {
    match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
