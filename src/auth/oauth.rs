//! OAuth2 client for the provider's authorize/token/user endpoints.
//!
//! Implements the service side of the Authorization Code + PKCE recipe:
//! build the authorize URL, exchange the returned code (authenticating
//! with HTTP Basic `client_id:client_secret`), and fetch the user's
//! profile with the fresh access token. Endpoint URLs are configurable
//! so tests can point the client at a stub server.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::AuthError;
use crate::publish::DEFAULT_PROVIDER_TIMEOUT_SECS;

/// Scopes requested from the provider.
///
/// `offline.access` yields a refresh token alongside the access token.
pub const OAUTH_SCOPES: &[&str] = &[
    "tweet.read",
    "tweet.write",
    "users.read",
    "offline.access",
];

/// Default authorize endpoint (browser redirect target).
const DEFAULT_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// Default token-exchange endpoint.
const DEFAULT_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// Default authenticated-user endpoint.
const DEFAULT_USER_URL: &str = "https://api.twitter.com/2/users/me";

// =============================================================================
// Configuration
// =============================================================================

/// Static configuration for the OAuth client.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth application client id
    pub client_id: String,

    /// OAuth application client secret
    pub client_secret: String,

    /// Redirect URI registered with the provider
    pub callback_url: String,

    /// Authorize endpoint
    pub authorize_url: String,

    /// Token-exchange endpoint
    pub token_url: String,

    /// Authenticated-user endpoint
    pub user_url: String,
}

impl OAuthConfig {
    /// Configuration against the real provider endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            user_url: DEFAULT_USER_URL.to_string(),
        }
    }

    /// Override the provider endpoints. Used by tests.
    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        user_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self.user_url = user_url.into();
        self
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Short-lived bearer token
    pub access_token: String,

    /// Refresh token, present when `offline.access` was granted
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Authenticated user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider user id
    pub id: String,

    /// Display name
    pub name: String,

    /// Handle without the leading `@`
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// =============================================================================
// OAuth Client
// =============================================================================

/// Client for the provider's OAuth and user endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    /// Create a client with the default request timeout.
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_timeout(config, Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(config: OAuthConfig, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction only fails on invalid TLS config");
        Self { http, config }
    }

    /// Build the provider authorize URL for a PKCE challenge and state.
    ///
    /// The caller redirects the browser here; the provider sends the user
    /// back to the configured callback URL with a `code` (or `error`).
    pub fn authorize_url(&self, code_challenge: &str, state: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("scope", &OAUTH_SCOPES.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .finish();

        format!("{}?{}", self.config.authorize_url, query)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ExchangeFailed`] when the provider rejects the
    ///   exchange or the request cannot be sent.
    /// - [`AuthError::InvalidResponse`] when the success body is
    ///   malformed.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<TokenErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error_description.or(b.error))
                .unwrap_or_else(|| format!("provider returned status {}", status));
            return Err(AuthError::ExchangeFailed(detail));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// [`AuthError::ExchangeFailed`] when the call fails,
    /// [`AuthError::InvalidResponse`] when the body is unusable.
    pub async fn fetch_user(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .http
            .get(&self.config.user_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ExchangeFailed(format!(
                "user endpoint returned status {}",
                response.status()
            )));
        }

        let body: UserResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        body.data
            .ok_or_else(|| AuthError::InvalidResponse("missing user data".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
