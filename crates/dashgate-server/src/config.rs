//! Server configuration for `dashgate`.
//!
//! Loaded once at startup from environment variables and passed explicitly
//! to the components that need it. Optional settings fall back to defaults;
//! the shared password is required.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use dashgate_core::session::DEFAULT_SESSION_LIFETIME_DAYS;

/// Usernames accepted when `DASHGATE_USERS` is not set.
const DEFAULT_USERS: &[&str] = &["rafy", "ryan"];

/// Where visitors go after too many failed logins.
const DEFAULT_DECOY_URL: &str = "https://raom.kr";

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No shared password was configured.
    #[error("DASHGATE_PASSWORD must be set to a non-empty value")]
    MissingPassword,

    /// A signing key is required but none was configured.
    #[error("DASHGATE_SECRET_KEY must be set when DASHGATE_REQUIRE_SECRET_KEY is enabled")]
    MissingSecretKey,
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Directory holding `index.html`, `dashboard-data.json` and assets.
    pub dashboard_dir: PathBuf,
    /// Root of the task-card folders.
    pub tasks_dir: PathBuf,
    /// Root the document allowlist is resolved against.
    pub docs_root: PathBuf,
    /// Accepted usernames (normalized later by the validator).
    pub usernames: Vec<String>,
    /// The shared secret.
    pub password: String,
    /// Cookie signing key. `None` means a random per-process key.
    pub secret_key: Option<String>,
    /// Whether to mark the session cookie `Secure`.
    pub cookie_secure: bool,
    /// Lifetime of an authenticated session.
    pub session_lifetime: Duration,
    /// External destination after the failed-login threshold.
    pub decoy_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `DASHGATE_BIND_ADDR`: full bind address (overrides `PORT`, default: `0.0.0.0:8080`)
    /// - `DASHGATE_LOG_LEVEL`: log filter (default: `info`)
    /// - `DASHGATE_DASHBOARD_DIR`: dashboard directory (default: `.`)
    /// - `DASHGATE_TASKS_DIR`: task-card root (default: `<dashboard>/../tasks`)
    /// - `DASHGATE_DOCS_ROOT`: document root (default: `<dashboard>/..`)
    /// - `DASHGATE_USERS`: comma-separated usernames (default: `rafy,ryan`)
    /// - `DASHGATE_PASSWORD`: shared secret (required)
    /// - `DASHGATE_SECRET_KEY`: cookie signing key (default: random per process)
    /// - `DASHGATE_REQUIRE_SECRET_KEY`: refuse to start without a signing key (default: `false`)
    /// - `DASHGATE_COOKIE_SECURE`: set `Secure` on the cookie (default: `false`)
    /// - `DASHGATE_SESSION_DAYS`: authenticated session lifetime (default: `30`)
    /// - `DASHGATE_DECOY_URL`: redirect target after 3 failed logins
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required setting is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required setting is missing.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| var(key).is_some_and(|v| v == "true" || v == "1");

        // Priority: DASHGATE_BIND_ADDR > PORT > default 0.0.0.0:8080
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 8080));
        let bind_addr = if let Some(addr) = var("DASHGATE_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8080);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let log_level = var("DASHGATE_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let dashboard_dir = non_empty("DASHGATE_DASHBOARD_DIR")
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let tasks_dir = non_empty("DASHGATE_TASKS_DIR")
            .map_or_else(|| dashboard_dir.join("..").join("tasks"), PathBuf::from);
        let docs_root = non_empty("DASHGATE_DOCS_ROOT")
            .map_or_else(|| dashboard_dir.join(".."), PathBuf::from);

        let usernames = non_empty("DASHGATE_USERS").map_or_else(
            || DEFAULT_USERS.iter().map(|u| (*u).to_owned()).collect(),
            |list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_owned)
                    .collect()
            },
        );

        let password = non_empty("DASHGATE_PASSWORD").ok_or(ConfigError::MissingPassword)?;

        let secret_key = non_empty("DASHGATE_SECRET_KEY");
        if secret_key.is_none() && flag("DASHGATE_REQUIRE_SECRET_KEY") {
            return Err(ConfigError::MissingSecretKey);
        }

        let session_days = var("DASHGATE_SESSION_DAYS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_SESSION_LIFETIME_DAYS);

        let decoy_url =
            non_empty("DASHGATE_DECOY_URL").unwrap_or_else(|| DEFAULT_DECOY_URL.to_owned());

        Ok(Self {
            bind_addr,
            log_level,
            dashboard_dir,
            tasks_dir,
            docs_root,
            usernames,
            password,
            secret_key,
            cookie_secure: flag("DASHGATE_COOKIE_SECURE"),
            session_lifetime: Duration::days(session_days),
            decoy_url,
        })
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("dashboard_dir", &self.dashboard_dir)
            .field("tasks_dir", &self.tasks_dir)
            .field("docs_root", &self.docs_root)
            .field("usernames", &self.usernames)
            .field("password", &"[REDACTED]")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("cookie_secure", &self.cookie_secure)
            .field("session_lifetime", &self.session_lifetime)
            .field("decoy_url", &self.decoy_url)
            .finish()
    }
}
