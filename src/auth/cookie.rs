//! Signed session cookies.
//!
//! The browser holds only a random session id, signed so a client cannot
//! forge or swap ids:
//!
//! ```text
//! cookie value = "{session_id}.{hex(HMAC-SHA256(secret, session_id))}"
//! ```
//!
//! Verification recomputes the MAC and compares in constant time. The
//! session id itself carries no data; everything lives in the store.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Cookie name carrying the signed session id.
pub const SESSION_COOKIE_NAME: &str = "gridx_sid";

/// Cookie lifetime: 24 hours.
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies signed session id cookies.
#[derive(Clone)]
pub struct SessionCookie {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// Whether to mark cookies `Secure` (HTTPS-only)
    secure: bool,
}

impl SessionCookie {
    /// Create a signer with the given secret key.
    ///
    /// The key should be at least 32 bytes; `Config::validate` enforces
    /// a minimum length before the server starts.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            secure: false,
        }
    }

    /// Mark issued cookies `Secure`. Enabled in production configs.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Generate a fresh random session id (hex of 32 random bytes).
    pub fn new_session_id(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Sign a session id into a cookie value.
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, self.compute_mac(session_id))
    }

    /// Verify a cookie value and return the session id if the signature
    /// holds. Malformed or tampered values yield `None`.
    pub fn verify(&self, cookie_value: &str) -> Option<String> {
        let (session_id, provided_mac) = cookie_value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }

        let provided = hex::decode(provided_mac).ok()?;
        let expected = hex::decode(self.compute_mac(session_id)).ok()?;

        if provided.ct_eq(&expected).into() {
            Some(session_id.to_string())
        } else {
            None
        }
    }

    /// Build the `Set-Cookie` header value for a signed session id.
    pub fn build_set_cookie(&self, cookie_value: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME, cookie_value, SESSION_COOKIE_MAX_AGE_SECS
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Build a `Set-Cookie` header value that expires the cookie.
    pub fn build_expired_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE_NAME
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Compute the hex-encoded HMAC-SHA256 of a session id.
    fn compute_mac(&self, session_id: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Extract the signed session id from a `Cookie` header value.
///
/// Returns the verified session id, or `None` when the cookie is absent
/// or fails verification.
pub fn session_id_from_cookie_header(cookies: &str, signer: &SessionCookie) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE_NAME)?.strip_prefix('='))
        .and_then(|value| signer.verify(value))
}

// =============================================================================
// Tests
// =============================================================================
