// crates/taskhive-server/src/identity.rs
// ============================================================================
// Module: Identity Assertion
// Description: Password hashing and opaque session tokens.
// Purpose: Turn credentials into verified caller contexts and back out of
//          the trust boundary as fast as possible.
// Dependencies: base64, rand, sha2, taskhive-core
// ============================================================================

//! ## Overview
//! Passwords are stored as salted SHA-256 digests and session tokens are
//! random opaque strings. The session table keys on a digest of the token,
//! so a leaked table never yields usable bearer tokens.
//!
//! ## Invariants
//! - A resolved session always carries the caller triple captured at login.
//! - Expired sessions are purged on the lookup path; they never resolve.
//! - Poisoned lock state fails closed: no session resolves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Digest;
use sha2::Sha256;
use taskhive_core::CallerContext;
use taskhive_core::EngineError;
use taskhive_core::User;
use taskhive_core::now_ms;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Random salt length in bytes for password hashes.
const SALT_BYTES: usize = 16;

/// Random session token length in bytes.
const TOKEN_BYTES: usize = 32;

// ============================================================================
// SECTION: Password Hashing
// ============================================================================

/// Hashes a password with a fresh random salt.
///
/// The stored form is `base64(salt)$base64(sha256(salt || password))`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    let digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Verifies a password against a stored hash.
///
/// Malformed stored values verify as false rather than erroring; the
/// comparison consumes both digests in full before deciding.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_part, digest_part)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_part) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(digest_part) else {
        return false;
    };
    let digest = Sha256::new()
        .chain_update(&salt)
        .chain_update(password.as_bytes())
        .finalize();
    if digest.len() != expected.len() {
        return false;
    }
    digest
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// One live session entry.
#[derive(Debug, Clone)]
struct Session {
    /// Caller triple captured at login.
    context: CallerContext,
    /// Expiry instant (unix millis).
    expires_at: i64,
}

/// In-process session table keyed by token digest.
///
/// # Invariants
/// - The raw token is returned to the client once and never stored.
#[derive(Debug)]
pub struct SessionManager {
    /// Session lifetime in milliseconds.
    ttl_ms: i64,
    /// Live sessions keyed by token digest.
    sessions: Mutex<BTreeMap<String, Session>>,
}

impl SessionManager {
    /// Creates a session manager with the given token lifetime.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_ms: i64::try_from(ttl_secs.saturating_mul(1_000)).unwrap_or(i64::MAX),
            sessions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Issues a fresh token for a verified user.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] when the session table lock is
    /// poisoned.
    pub fn issue(&self, user: &User) -> Result<String, EngineError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let session = Session {
            context: CallerContext::new(user.id.clone(), user.tenant_id.clone(), user.role),
            expires_at: now_ms().saturating_add(self.ttl_ms),
        };
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| EngineError::Internal("session table lock poisoned".to_string()))?;
        sessions.insert(token_digest(&token), session);
        Ok(token)
    }

    /// Resolves a bearer token into the caller context captured at login.
    ///
    /// Expired entries are removed here; a poisoned lock resolves nothing.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<CallerContext> {
        let key = token_digest(token);
        let mut sessions = self.sessions.lock().ok()?;
        let now = now_ms();
        match sessions.get(&key) {
            Some(session) if session.expires_at > now => Some(session.context.clone()),
            Some(_) => {
                sessions.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Revokes a token; unknown tokens are a no-op.
    pub fn revoke(&self, token: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&token_digest(token));
        }
    }
}

/// Digests a raw token for use as a session table key.
fn token_digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
