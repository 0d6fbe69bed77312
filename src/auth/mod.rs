//! OAuth2 PKCE handshake and session state.
//!
//! The service never sees the user's provider password; it brokers the
//! Authorization Code + PKCE flow and keeps the resulting token in the
//! caller's session:
//!
//! ```text
//! /auth/login ──► PkcePair::generate ──► provider authorize URL
//!                      │ (verifier kept in session)
//! /auth/callback ◄─────┘
//!      │
//!      ▼
//! OAuthClient::exchange_code ──► access/refresh token ──► session
//!      │
//!      ▼
//! OAuthClient::fetch_user ──► profile ──► session
//! ```
//!
//! Sessions live behind the narrow [`SessionStore`] key-value trait;
//! the browser carries only an HMAC-signed random session id (see
//! [`SessionCookie`]).

mod cookie;
mod oauth;
mod pkce;
mod session;

pub use cookie::{
    session_id_from_cookie_header, SessionCookie, SESSION_COOKIE_MAX_AGE_SECS, SESSION_COOKIE_NAME,
};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse, UserProfile, OAUTH_SCOPES};
pub use pkce::{challenge_for, random_state, PkcePair};
pub use session::{MemorySessionStore, SessionData, SessionStore, DEFAULT_SESSION_CAPACITY};
