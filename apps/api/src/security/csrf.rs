//! CSRF token issuance and verification.
//!
//! Tokens are bound to a session identified by a signed `sid` cookie. One
//! token is active per session; issuing a new one replaces the old, and a
//! verification racing a reissue may reject but can never accept a stale
//! token (replacement happens atomically under the store lock).

use std::collections::HashMap;
use std::sync::Mutex;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "sid";

/// Header the front end sends the token back in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// In-memory per-session token store with cookie signing.
///
/// The session cookie value is `<id>.<sig>` where `sig` is a keyed SHA-256
/// over the id; a tampered cookie fails signature verification and is treated
/// as no session at all.
pub struct CsrfStore {
    tokens: Mutex<HashMap<String, String>>,
    secret: String,
}

impl CsrfStore {
    pub fn new(session_secret: String) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            secret: session_secret,
        }
    }

    /// Issues a fresh token for `session_id`, replacing any previous one.
    /// 32 bytes of OS randomness, hex-encoded (URL-safe).
    pub fn issue(&self, session_id: &str) -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.tokens
            .lock()
            .expect("csrf store mutex poisoned")
            .insert(session_id.to_string(), token.clone());
        token
    }

    /// Fails closed: no session, no stored token, or mismatch all reject.
    pub fn verify(&self, session_id: &str, presented: &str) -> bool {
        self.tokens
            .lock()
            .expect("csrf store mutex poisoned")
            .get(session_id)
            .is_some_and(|current| current.as_str() == presented)
    }

    /// Mints a new session, returning `(session_id, signed_cookie_value)`.
    pub fn mint_session(&self) -> (String, String) {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let id = hex::encode(bytes);
        let sig = self.sign(&id);
        let cookie = format!("{id}.{sig}");
        (id, cookie)
    }

    /// Extracts the session id from a cookie value, rejecting bad signatures.
    pub fn session_from_cookie(&self, cookie_value: &str) -> Option<String> {
        let (id, sig) = cookie_value.split_once('.')?;
        if self.sign(id) == sig {
            Some(id.to_string())
        } else {
            None
        }
    }

    fn sign(&self, id: &str) -> String {
        // Components separated with ASCII Unit Separator to avoid ambiguity.
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update([0x1f]);
        hasher.update(id.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Pulls a named cookie out of a raw `Cookie` header value.
pub fn cookie_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
