//! gridx - image grid splitter and poster.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gridx::auth::{MemorySessionStore, OAuthClient, SessionCookie};
use gridx::config::Config;
use gridx::publish::{GridPublisher, XApiClient};
use gridx::server::{create_router, AppState, RouterConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("gridx v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Callback URL: {}", config.callback_url);
    info!("  Frontend URL: {}", config.frontend_url);
    info!("  Upload limit: {} bytes", config.max_upload_bytes);
    info!("  JPEG quality: {}", config.jpeg_quality);
    info!(
        "  Sessions: in-memory, capacity {}",
        config.session_capacity
    );

    if config.has_provider_credentials() {
        info!("  Provider credentials: configured");
    } else {
        warn!("  Provider credentials: NOT configured - posting will fail");
        warn!("    Set GRIDX_CLIENT_ID and GRIDX_CLIENT_SECRET to enable posting");
    }

    if config.production {
        info!("  Mode: production (Secure cookies, error details hidden)");
    } else {
        info!("  Mode: development");
    }

    // Build components
    let timeout = Duration::from_secs(config.provider_timeout);
    let sessions = Arc::new(MemorySessionStore::with_capacity(config.session_capacity));
    let oauth = OAuthClient::with_timeout(config.oauth_config(), timeout);
    let poster = Arc::new(XApiClient::with_timeout(timeout));
    let publisher = GridPublisher::with_quality(poster, config.jpeg_quality);

    // validate() guarantees the secret is present
    let secret = config.session_secret.as_deref().unwrap_or_default();
    let cookie = SessionCookie::new(secret).with_secure(config.production);

    let mut state = AppState::new(
        sessions,
        oauth,
        publisher,
        cookie,
        config.max_upload_bytes,
        config.frontend_url.clone(),
    );
    if config.production {
        state = state.with_details_hidden();
    }

    // Build router configuration
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing);
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    let router = create_router(state, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -F image=@photo.jpg -F rows=3 -F cols=3 http://{}/split -o pieces.zip",
        addr
    );
    info!("");
    info!("  Login with X:");
    info!("    open http://{}/auth/login", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gridx=debug,tower_http=debug"
    } else {
        "gridx=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
