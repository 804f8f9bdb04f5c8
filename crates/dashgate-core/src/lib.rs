//! Core library for `dashgate`.
//!
//! Contains the signed session model, the access gate, the credential
//! validator, and the path resolver that allowlists task cards and
//! documents. Everything here is synchronous and free of HTTP types; the
//! server crate wires it into Axum.

pub mod credentials;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod session;
