//! Router configuration.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! body-size limits, and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! POST /split         - Slice upload, return ZIP (public)
//! POST /post          - Slice upload, publish post (session required)
//! GET  /auth/login    - Start OAuth PKCE flow
//! GET  /auth/callback - Complete OAuth flow
//! GET  /auth/user     - Current user profile
//! POST /auth/logout   - Destroy session
//! GET  /health        - Health check (public)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gridx::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(sessions, oauth, publisher, cookie, limit, frontend);
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["http://localhost:3000".to_string()]);
//!
//! let router = create_router(state, config);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    callback_handler, health_handler, login_handler, logout_handler, post_handler, split_handler,
    user_handler, AppState,
};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::publish::PostClient;

/// Headroom added to the upload limit for multipart boundaries and the
/// other form fields.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin, without credentials)
    pub cors_origins: Option<Vec<String>>,

    /// Upload size limit in bytes
    pub max_upload_bytes: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - CORS allows any origin without credentials
    /// - Uploads are limited to 10MB
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Explicit origins also enable credentialed requests, which the
    /// session cookie needs for cross-origin frontends.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the upload size limit in bytes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - The two export routes and the auth flow
/// - Body-size limiting sized to the upload limit
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<C>(state: AppState<C>, config: RouterConfig) -> Router
where
    C: PostClient + 'static,
{
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/split", post(split_handler::<C>))
        .route("/post", post(post_handler::<C>))
        .route("/auth/login", get(login_handler::<C>))
        .route("/auth/callback", get(callback_handler::<C>))
        .route("/auth/user", get(user_handler::<C>))
        .route("/auth/logout", post(logout_handler::<C>))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes + BODY_LIMIT_OVERHEAD,
        ))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// Explicit origins get credential support (the browser sends the
/// session cookie cross-origin); the any-origin default cannot carry
/// credentials, which `tower-http` enforces.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins).allow_credentials(true)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
