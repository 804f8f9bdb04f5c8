//! Signed, cookie-backed sessions.
//!
//! The whole session lives on the client. The server only holds the signing
//! key: a cookie value is `base64url(json) "." hex(hmac_sha256(key, base64url(json)))`.
//! Anything that fails verification is discarded and the caller starts from
//! an empty session, so a tampered or expired cookie can never grant access.
//!
//! # Security model
//!
//! - Signatures are HMAC-SHA256 and compared with `subtle::ConstantTimeEq`.
//! - The payload is signed, not encrypted. It holds no secrets.
//! - Permanent sessions carry their own `expires_at`; the cookie `Max-Age`
//!   is only a hint to the browser.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of an authenticated session.
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 30;

/// Per-client session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Whether the client has logged in.
    #[serde(default)]
    pub authenticated: bool,
    /// Normalized username of the logged-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Consecutive failed login attempts in this session.
    #[serde(default)]
    pub login_attempts: u32,
    /// Expiry of a permanent session (None = browser session).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// True when the session carries no state at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when the session has an explicit expiry.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_some()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Make the session permanent, expiring `lifetime` from `now`.
    ///
    /// Calling this again on later requests slides the expiry forward.
    pub fn make_permanent(&mut self, now: DateTime<Utc>, lifetime: Duration) {
        self.expires_at = Some(now + lifetime);
    }

    /// Drop every key, as on logout.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Signs and verifies session cookie values.
pub struct SessionSigner {
    key: Vec<u8>,
}

impl SessionSigner {
    /// Create a signer from configured key material.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Create a signer with a random per-process key.
    ///
    /// Sessions signed with it do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        // Two UUID v4s = 32 bytes of OS CSPRNG randomness.
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        let mut key = Vec::with_capacity(32);
        key.extend_from_slice(a.as_bytes());
        key.extend_from_slice(b.as_bytes());
        Self { key }
    }

    /// Serialize and sign a session into a cookie value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Decode`] if the session cannot be serialized
    /// or the key is rejected by the MAC.
    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let json = serde_json::to_vec(session).map_err(|e| SessionError::Decode {
            reason: format!("serialization failed: {e}"),
        })?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.sign(payload.as_bytes())?);
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and deserialize a cookie value.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Malformed`] if the value is not `payload.signature`.
    /// - [`SessionError::BadSignature`] if the signature does not verify.
    /// - [`SessionError::Decode`] if the payload is not a session.
    /// - [`SessionError::Expired`] if the session expired before `now`.
    pub fn decode(&self, value: &str, now: DateTime<Utc>) -> Result<Session, SessionError> {
        let (payload, signature) = value.rsplit_once('.').ok_or(SessionError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| SessionError::Malformed)?;

        let expected = self.sign(payload.as_bytes())?;
        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(SessionError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| SessionError::Decode {
                reason: e.to_string(),
            })?;
        let session: Session = serde_json::from_slice(&json).map_err(|e| SessionError::Decode {
            reason: e.to_string(),
        })?;

        if session.is_expired(now) {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, SessionError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|e| SessionError::Decode {
                reason: format!("invalid signing key: {e}"),
            })?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn logged_in(now: DateTime<Utc>) -> Session {
        let mut session = Session {
            authenticated: true,
            username: Some("rafy".to_owned()),
            ..Session::default()
        };
        session.make_permanent(now, Duration::days(DEFAULT_SESSION_LIFETIME_DAYS));
        session
    }

    #[test]
    fn signed_session_verifies() {
        let signer = SessionSigner::new(b"test-key".to_vec());
        let now = Utc::now();
        let session = logged_in(now);

        let cookie = signer.encode(&session).unwrap();
        assert_eq!(signer.decode(&cookie, now).unwrap(), session);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signer = SessionSigner::new(b"test-key".to_vec());
        let now = Utc::now();
        let cookie = signer.encode(&Session::default()).unwrap();
        let (_, sig) = cookie.rsplit_once('.').unwrap();

        let forged_json = serde_json::to_vec(&logged_in(now)).unwrap();
        let forged = format!("{}.{sig}", URL_SAFE_NO_PAD.encode(forged_json));

        assert!(matches!(
            signer.decode(&forged, now),
            Err(SessionError::BadSignature)
        ));
    }

    #[test]
    fn other_key_cannot_verify() {
        let now = Utc::now();
        let cookie = SessionSigner::generate().encode(&logged_in(now)).unwrap();
        let result = SessionSigner::generate().decode(&cookie, now);
        assert!(matches!(result, Err(SessionError::BadSignature)));
    }

    #[test]
    fn expired_session_is_rejected() {
        let signer = SessionSigner::new(b"test-key".to_vec());
        let now = Utc::now();
        let cookie = signer.encode(&logged_in(now)).unwrap();

        let later = now + Duration::days(DEFAULT_SESSION_LIFETIME_DAYS + 1);
        assert!(matches!(
            signer.decode(&cookie, later),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let signer = SessionSigner::new(b"test-key".to_vec());
        let now = Utc::now();
        assert!(matches!(
            signer.decode("no-dot-here", now),
            Err(SessionError::Malformed)
        ));
        assert!(matches!(
            signer.decode("payload.not-hex", now),
            Err(SessionError::Malformed)
        ));
    }

    #[test]
    fn clear_empties_session() {
        let mut session = logged_in(Utc::now());
        session.login_attempts = 2;
        assert!(!session.is_empty());

        session.clear();
        assert!(session.is_empty());
        assert!(!session.authenticated);
    }

    #[test]
    fn make_permanent_slides_expiry() {
        let now = Utc::now();
        let mut session = logged_in(now);
        let first = session.expires_at.unwrap();

        session.make_permanent(now + Duration::days(1), Duration::days(30));
        assert!(session.expires_at.unwrap() > first);
        assert!(session.is_permanent());
    }

    #[test]
    fn debug_redacts_key() {
        let signer = SessionSigner::new(b"super-secret".to_vec());
        let rendered = format!("{signer:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
