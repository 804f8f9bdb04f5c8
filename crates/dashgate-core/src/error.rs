//! Error types for `dashgate-core`.
//!
//! Each variant carries enough context to diagnose the problem in logs. The
//! HTTP layer decides how much of that context reaches the client; resolver
//! errors are deliberately coarse so probes learn nothing about the
//! filesystem layout.

/// Errors from mapping a logical resource to a file on disk.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The request contained a traversal token or a segment that could
    /// escape the resource root.
    #[error("invalid path: {reason}")]
    InvalidPath { reason: String },

    /// The task folder is not one of the allowlisted folders.
    #[error("invalid folder '{folder}'")]
    InvalidFolder { folder: String },

    /// The document key is not in the document allowlist.
    #[error("document '{key}' is not allowed")]
    NotAllowed { key: String },

    /// The resource is allowlisted but does not exist on disk.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// An unexpected I/O failure while checking the resource.
    #[error("failed to inspect '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Errors from decoding a signed session cookie.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The cookie value is not of the form `<payload>.<signature>`.
    #[error("malformed session cookie")]
    Malformed,

    /// The signature does not match the payload.
    #[error("session signature mismatch")]
    BadSignature,

    /// The payload could not be decoded.
    #[error("session payload decode failed: {reason}")]
    Decode { reason: String },

    /// The session expired before this request.
    #[error("session expired")]
    Expired,
}
