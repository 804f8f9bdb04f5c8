//! Shared application state for `dashgate` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Everything in it is immutable after startup:
//! the configuration, the cookie signer, the credential validator and the
//! path resolver.

use std::sync::Arc;

use tower_http::services::ServeDir;
use tracing::warn;

use dashgate_core::credentials::{CredentialValidator, Credentials};
use dashgate_core::resolver::{DocumentAllowlist, PathResolver};
use dashgate_core::session::SessionSigner;

use crate::config::ServerConfig;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Startup configuration.
    pub config: ServerConfig,
    /// Signs and verifies session cookies.
    pub signer: SessionSigner,
    /// Checks login attempts.
    pub validator: CredentialValidator,
    /// Allowlists task-card and document paths.
    pub resolver: PathResolver,
    /// Static file service rooted at the dashboard directory.
    pub static_files: ServeDir,
}

impl AppState {
    /// Build the state from a loaded configuration.
    ///
    /// Without a configured signing key a random one is generated, so
    /// existing sessions end whenever the process restarts.
    #[must_use]
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let signer = if let Some(key) = &config.secret_key {
            SessionSigner::new(key.as_bytes())
        } else {
            warn!("DASHGATE_SECRET_KEY not set, using a random signing key; sessions will not survive a restart");
            SessionSigner::generate()
        };

        let validator = CredentialValidator::new(
            Credentials::new(&config.usernames, config.password.clone()),
            config.session_lifetime,
        );

        let resolver = PathResolver::new(
            config.tasks_dir.clone(),
            DocumentAllowlist::with_defaults(&config.docs_root),
        );

        let static_files =
            ServeDir::new(&config.dashboard_dir).append_index_html_on_directories(false);

        Arc::new(Self {
            config,
            signer,
            validator,
            resolver,
            static_files,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
