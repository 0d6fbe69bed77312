//! # gridx
//!
//! Split an uploaded image into an R×C grid of tiles, then either
//! download the pieces as a ZIP archive or post up to 4 of them to X
//! via OAuth2 PKCE-authenticated API calls.
//!
//! ## Features
//!
//! - **Grid slicing**: pure, deterministic tiling with floor division
//!   and documented remainder truncation
//! - **Archive export**: per-tile lossless PNGs in one deflate-compressed
//!   ZIP, built entirely in memory
//! - **Social publishing**: sequential tile upload plus one post-creation
//!   call behind a mockable provider trait
//! - **OAuth2 PKCE**: authorization-code flow with HMAC-signed session
//!   cookies and a bounded in-memory session store
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`grid`] - Tile rectangle computation
//! - [`tile`] - Crop and PNG/JPEG encoding
//! - [`export`] - ZIP archive assembly
//! - [`publish`] - Provider client and publish pipeline
//! - [`auth`] - PKCE, OAuth client, sessions, signed cookies
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use gridx::grid::{compute_tiles, GridSpec};
//!
//! let spec = GridSpec::new(2, 2).unwrap();
//! let tiles = compute_tiles(640, 480, &spec).unwrap();
//! assert_eq!(tiles.len(), 4);
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod publish;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use auth::{
    MemorySessionStore, OAuthClient, OAuthConfig, PkcePair, SessionCookie, SessionData,
    SessionStore, UserProfile,
};
pub use config::Config;
pub use error::{
    AuthError, ExportError, GridError, InputError, ProviderError, PublishError, SessionError,
    TileError,
};
pub use export::export_archive;
pub use grid::{compute_tiles, GridSpec, TileRect};
pub use publish::{GridPublisher, MediaId, PostClient, PostId, XApiClient};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use tile::{crop_tile, JpegTileEncoder, PngTileEncoder};
