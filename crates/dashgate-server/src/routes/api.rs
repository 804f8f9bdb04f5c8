//! Content API: `/api/task/*` and `/api/doc/*`.
//!
//! Both endpoints resolve through [`PathResolver`] first, so every
//! allowlist and traversal check has passed before a file is opened.
//!
//! [`PathResolver`]: dashgate_core::resolver::PathResolver

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use dashgate_core::resolver::TaskFolder;

use crate::error::AppError;
use crate::state::AppState;

/// Build the content API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/task/{folder}/{filename}", get(task_content))
        .route("/api/doc/{*doc_path}", get(doc_content))
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TaskContentResponse {
    pub content: String,
    pub filename: String,
    pub folder: TaskFolder,
}

#[derive(Debug, Serialize)]
pub struct DocContentResponse {
    pub content: String,
    /// The logical document key as requested.
    pub path: String,
    pub filename: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Return the markdown of one task card.
async fn task_content(
    State(state): State<Arc<AppState>>,
    Path((folder, filename)): Path<(String, String)>,
) -> Result<Json<TaskContentResponse>, AppError> {
    let task = state.resolver.resolve_task(&folder, &filename)?;
    let content = tokio::fs::read_to_string(&task.path).await?;

    Ok(Json(TaskContentResponse {
        content,
        filename: task.filename,
        folder: task.folder,
    }))
}

/// Return the markdown of one allowlisted document.
async fn doc_content(
    State(state): State<Arc<AppState>>,
    Path(doc_path): Path<String>,
) -> Result<Json<DocContentResponse>, AppError> {
    let doc = state.resolver.resolve_doc(&doc_path)?;
    let content = tokio::fs::read_to_string(&doc.path).await?;

    Ok(Json(DocContentResponse {
        content,
        path: doc.key,
        filename: doc.filename,
    }))
}
