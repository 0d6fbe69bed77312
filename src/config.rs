//! Configuration management.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `GRIDX_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `GRIDX_HOST` - Server bind address (default: 0.0.0.0)
//! - `GRIDX_PORT` - Server port (default: 5000)
//! - `GRIDX_CLIENT_ID` - OAuth application client id
//! - `GRIDX_CLIENT_SECRET` - OAuth application client secret
//! - `GRIDX_CALLBACK_URL` - OAuth redirect URI registered with the provider
//! - `GRIDX_FRONTEND_URL` - Frontend origin for post-auth redirects
//! - `GRIDX_SESSION_SECRET` - Secret for signing session cookies (required)
//! - `GRIDX_SESSION_CAPACITY` - Max in-memory sessions (default: 10000)
//! - `GRIDX_JPEG_QUALITY` - JPEG quality for uploaded tiles (default: 90)
//! - `GRIDX_MAX_UPLOAD` - Upload size limit in bytes (default: 10485760)
//! - `GRIDX_PROVIDER_TIMEOUT` - Outbound call timeout in seconds (default: 30)
//! - `GRIDX_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `GRIDX_PRODUCTION` - Production mode: Secure cookies, no error details

use clap::Parser;

use crate::auth::{OAuthConfig, DEFAULT_SESSION_CAPACITY};
use crate::publish::DEFAULT_PROVIDER_TIMEOUT_SECS;
use crate::tile::DEFAULT_JPEG_QUALITY;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default OAuth callback URL.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:5000/auth/callback";

/// Default frontend origin.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Default upload size limit: 10MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Minimum accepted session secret length in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 16;

// =============================================================================
// CLI Arguments
// =============================================================================

/// gridx - Split an image into grid tiles, download them as a ZIP archive
/// or post them to X.
#[derive(Parser, Debug, Clone)]
#[command(name = "gridx")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GRIDX_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GRIDX_PORT")]
    pub port: u16,

    // =========================================================================
    // OAuth Configuration
    // =========================================================================
    /// OAuth application client id.
    ///
    /// Posting is disabled (requests fail at the provider) until both
    /// client id and secret are configured; the ZIP workflow still works.
    #[arg(long, env = "GRIDX_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth application client secret.
    #[arg(long, env = "GRIDX_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// OAuth redirect URI registered with the provider.
    #[arg(long, default_value = DEFAULT_CALLBACK_URL, env = "GRIDX_CALLBACK_URL")]
    pub callback_url: String,

    /// Frontend origin the auth flow redirects back to.
    #[arg(long, default_value = DEFAULT_FRONTEND_URL, env = "GRIDX_FRONTEND_URL")]
    pub frontend_url: String,

    // =========================================================================
    // Session Configuration
    // =========================================================================
    /// Secret key for signing session cookies.
    #[arg(long, env = "GRIDX_SESSION_SECRET")]
    pub session_secret: Option<String>,

    /// Maximum number of sessions kept in memory.
    #[arg(long, default_value_t = DEFAULT_SESSION_CAPACITY, env = "GRIDX_SESSION_CAPACITY")]
    pub session_capacity: usize,

    // =========================================================================
    // Processing Configuration
    // =========================================================================
    /// JPEG quality for tiles uploaded to the provider (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "GRIDX_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Maximum upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "GRIDX_MAX_UPLOAD")]
    pub max_upload_bytes: usize,

    /// Timeout in seconds for outbound provider calls.
    #[arg(long, default_value_t = DEFAULT_PROVIDER_TIMEOUT_SECS, env = "GRIDX_PROVIDER_TIMEOUT")]
    pub provider_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// Credentialed requests (session cookies) require explicit origins;
    /// if not specified, any origin is allowed without credentials.
    #[arg(long, env = "GRIDX_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Environment / Logging Configuration
    // =========================================================================
    /// Production mode: Secure cookies, error details omitted from responses.
    #[arg(long, default_value_t = false, env = "GRIDX_PRODUCTION")]
    pub production: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match &self.session_secret {
            None => {
                return Err(
                    "Session secret is required. Set --session-secret or GRIDX_SESSION_SECRET"
                        .to_string(),
                )
            }
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(format!(
                    "Session secret too short: need at least {} bytes",
                    MIN_SESSION_SECRET_LEN
                ))
            }
            Some(_) => {}
        }

        // Credentials are optional as a pair; half a pair is a mistake
        if self.client_id.is_some() != self.client_secret.is_some() {
            return Err(
                "Set both --client-id and --client-secret, or neither to disable posting"
                    .to_string(),
            );
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.session_capacity == 0 {
            return Err("session_capacity must be greater than 0".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if self.provider_timeout == 0 {
            return Err("provider_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether OAuth credentials are configured.
    pub fn has_provider_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Build the OAuth client configuration.
    ///
    /// With missing credentials this produces a config with empty id and
    /// secret; the token exchange then fails at the provider, matching
    /// the degraded no-credentials mode.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::new(
            self.client_id.clone().unwrap_or_default(),
            self.client_secret.clone().unwrap_or_default(),
            self.callback_url.clone(),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
