//! HTTP server layer.
//!
//! This module provides the HTTP API binding multipart uploads to the
//! two export workflows and brokering the OAuth session flow.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   POST /split      POST /post        GET/POST /auth/*           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │  handlers   │  │  error maps  │  │        routes          │  │
//! │  │ (requests)  │  │ (taxonomy →  │  │  (router + layers)     │  │
//! │  │             │  │  HTTP codes) │  │                        │  │
//! │  └─────────────┘  └──────────────┘  └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    callback_handler, health_handler, login_handler, logout_handler, post_handler, split_handler,
    user_handler, ApiError, AppState, CallbackQueryParams, ErrorResponse, HandlerError,
    HealthResponse, MessageResponse, PostCreatedResponse, UserResponse,
};
pub use routes::{create_router, RouterConfig};
