//! `dashgate` HTTP server.
//!
//! Wires the core session, gate, credential and resolver types into an
//! Axum router: a decoy login form, the gated dashboard and its data file,
//! the task-card and document API, and public static assets.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
