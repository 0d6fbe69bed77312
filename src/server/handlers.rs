//! HTTP request handlers.
//!
//! This module contains the Axum handlers binding multipart form input
//! to the two export workflows and the OAuth session flow.
//!
//! # Endpoints
//!
//! - `POST /split` - Slice an upload and return the tiles as a ZIP
//! - `POST /post` - Slice an upload and publish the tiles as a post
//! - `GET /auth/login` - Start the OAuth PKCE flow
//! - `GET /auth/callback` - Complete the flow, store the token
//! - `GET /auth/user` - Current user profile
//! - `POST /auth/logout` - Destroy the session
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::auth::{
    random_state, session_id_from_cookie_header, OAuthClient, PkcePair, SessionCookie,
    SessionData, SessionStore, UserProfile,
};
use crate::error::{
    AuthError, ExportError, GridError, InputError, PublishError, SessionError,
};
use crate::export::{export_archive, ARCHIVE_FILENAME};
use crate::grid::{compute_tiles, GridSpec};
use crate::publish::{GridPublisher, PostClient};

/// Grid dimension used when the form omits rows or cols.
const DEFAULT_GRID_DIM: i64 = 3;

/// Caption used when the form omits one.
const DEFAULT_CAPTION: &str = "Check out this cool image grid!";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers.
pub struct AppState<C: PostClient> {
    /// Session backend (narrow get/set/destroy interface)
    pub sessions: Arc<dyn SessionStore>,

    /// OAuth client for the provider handshake
    pub oauth: Arc<OAuthClient>,

    /// Publisher driving the provider media/post calls
    pub publisher: Arc<GridPublisher<C>>,

    /// Session cookie signer
    pub cookie: SessionCookie,

    /// Upload size limit in bytes
    pub max_upload_bytes: usize,

    /// Frontend origin for auth redirects
    pub frontend_url: String,

    /// Whether error responses include internal details
    pub expose_details: bool,
}

impl<C: PostClient> AppState<C> {
    /// Create application state.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        oauth: OAuthClient,
        publisher: GridPublisher<C>,
        cookie: SessionCookie,
        max_upload_bytes: usize,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            oauth: Arc::new(oauth),
            publisher: Arc::new(publisher),
            cookie,
            max_upload_bytes,
            frontend_url: frontend_url.into(),
            expose_details: true,
        }
    }

    /// Suppress internal details in error responses (production mode).
    pub fn with_details_hidden(mut self) -> Self {
        self.expose_details = false;
        self
    }

    /// Wrap an error for this request, carrying the details policy.
    fn fail(&self, kind: impl Into<ApiError>) -> HandlerError {
        HandlerError {
            kind: kind.into(),
            expose_details: self.expose_details,
        }
    }

    /// Resolve the session behind the request's cookie, if any.
    async fn session(&self, headers: &HeaderMap) -> Option<(String, SessionData)> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let session_id = session_id_from_cookie_header(cookies, &self.cookie)?;
        let data = self.sessions.get(&session_id).await.ok()??;
        Some((session_id, data))
    }
}

impl<C: PostClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            oauth: Arc::clone(&self.oauth),
            publisher: Arc::clone(&self.publisher),
            cookie: self.cookie.clone(),
            max_upload_bytes: self.max_upload_bytes,
            frontend_url: self.frontend_url.clone(),
            expose_details: self.expose_details,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_grid", "rate_limited")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Internal detail, only present outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attach internal detail.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Successful publish response.
#[derive(Debug, Serialize)]
pub struct PostCreatedResponse {
    /// Confirmation message
    pub message: String,

    /// Provider id of the created post
    pub post_id: String,
}

/// Current-user response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Authenticated user profile
    pub user: UserProfile,
}

/// Simple confirmation response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Confirmation message
    pub message: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Everything a handler can fail with, unified for response mapping.
#[derive(Debug)]
pub enum ApiError {
    /// Client-fixable input problem (400)
    Input(InputError),

    /// Archive pipeline failure (500)
    Export(ExportError),

    /// Publish pipeline failure (status depends on the cause)
    Publish(PublishError),

    /// OAuth handshake failure outside the redirect flow
    Auth(AuthError),

    /// Session store failure (500)
    Session(SessionError),

    /// No session token for a protected route (401)
    Unauthorized,
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        ApiError::Input(e)
    }
}

impl From<GridError> for ApiError {
    fn from(e: GridError) -> Self {
        ApiError::Input(InputError::Grid(e))
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Export(e)
    }
}

impl From<PublishError> for ApiError {
    fn from(e: PublishError) -> Self {
        ApiError::Publish(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::Session(e)
    }
}

impl ApiError {
    /// Map to (status, error kind, client-facing message).
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Input(e) => {
                let kind = match e {
                    InputError::MissingImage => "missing_file",
                    InputError::NotAnImage { .. } => "unsupported_media",
                    InputError::FileTooLarge { .. } => "file_too_large",
                    InputError::InvalidField { .. } => "invalid_field",
                    InputError::InvalidImage { .. } => "invalid_image",
                    InputError::Grid(GridError::InvalidGrid { .. }) => "invalid_grid",
                    InputError::Grid(GridError::ImageTooSmall { .. }) => "image_too_small",
                };
                (StatusCode::BAD_REQUEST, kind, e.to_string())
            }

            ApiError::Export(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "processing_error",
                e.to_string(),
            ),

            ApiError::Publish(e) => match e {
                PublishError::TooManyTiles { .. } => (
                    StatusCode::BAD_REQUEST,
                    "too_many_tiles",
                    "The platform allows up to 4 images per post. Use a 2x2 grid or smaller."
                        .to_string(),
                ),
                PublishError::CaptionTooLong { .. } => {
                    (StatusCode::BAD_REQUEST, "caption_too_long", e.to_string())
                }
                PublishError::Tile { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "processing_error",
                    e.to_string(),
                ),
                PublishError::MediaUpload { source, .. } => {
                    Self::classify_provider_status(source.provider_status(), e.to_string())
                }
                PublishError::PostCreation { status, .. } => {
                    Self::classify_provider_status(*status, e.to_string())
                }
            },

            ApiError::Auth(e) => (StatusCode::BAD_GATEWAY, "auth_failed", e.to_string()),

            ApiError::Session(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_error",
                e.to_string(),
            ),

            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "User not authenticated. Please login with X.".to_string(),
            ),
        }
    }

    /// Map a provider status to the surfaced status/kind/message.
    fn classify_provider_status(status: u16, detail: String) -> (StatusCode, &'static str, String) {
        match status {
            401 => (
                StatusCode::UNAUTHORIZED,
                "upstream_auth",
                "The provider rejected the access token. Please login again.".to_string(),
            ),
            403 => (
                StatusCode::FORBIDDEN,
                "upstream_forbidden",
                "Permission denied. Ensure the app has write permissions.".to_string(),
            ),
            429 => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded. Please try again later.".to_string(),
            ),
            _ => (StatusCode::BAD_GATEWAY, "upstream_unavailable", detail),
        }
    }
}

/// Wrapper converting an [`ApiError`] into an HTTP response, honoring
/// the configured details policy.
pub struct HandlerError {
    kind: ApiError,
    expose_details: bool,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.kind.classify();

        // Log based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        ) {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Request rejected: {}",
                message
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let mut body = ErrorResponse::new(error_type, message);
        if self.expose_details {
            body = body.with_details(format!("{:?}", self.kind));
        }

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Multipart Form Parsing
// =============================================================================

/// Parsed upload form shared by `/split` and `/post`.
struct UploadForm {
    image: Bytes,
    rows: i64,
    cols: i64,
    caption: Option<String>,
}

/// Read the multipart form, enforcing the image MIME check and size limit.
async fn read_upload_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<UploadForm, InputError> {
    let mut image: Option<Bytes> = None;
    let mut rows = DEFAULT_GRID_DIM;
    let mut cols = DEFAULT_GRID_DIM;
    let mut caption: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| InputError::InvalidField {
            name: "form",
            message: e.to_string(),
        })?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !content_type.starts_with("image/") {
                    return Err(InputError::NotAnImage { content_type });
                }

                let data = field.bytes().await.map_err(|e| InputError::InvalidField {
                    name: "image",
                    message: e.to_string(),
                })?;

                if data.len() > max_upload_bytes {
                    return Err(InputError::FileTooLarge {
                        size: data.len(),
                        max: max_upload_bytes,
                    });
                }
                image = Some(data);
            }
            Some("rows") => rows = parse_grid_field(field, "rows").await?,
            Some("cols") => cols = parse_grid_field(field, "cols").await?,
            Some("caption") => {
                let text = field.text().await.map_err(|e| InputError::InvalidField {
                    name: "caption",
                    message: e.to_string(),
                })?;
                if !text.is_empty() {
                    caption = Some(text);
                }
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let image = image.ok_or(InputError::MissingImage)?;
    Ok(UploadForm {
        image,
        rows,
        cols,
        caption,
    })
}

/// Parse a rows/cols field; empty values fall back to the default.
async fn parse_grid_field(
    field: axum::extract::multipart::Field<'_>,
    name: &'static str,
) -> Result<i64, InputError> {
    let text = field.text().await.map_err(|e| InputError::InvalidField {
        name,
        message: e.to_string(),
    })?;

    if text.is_empty() {
        return Ok(DEFAULT_GRID_DIM);
    }

    text.trim()
        .parse::<i64>()
        .map_err(|e| InputError::InvalidField {
            name,
            message: e.to_string(),
        })
}

/// Decode the uploaded bytes into an image.
fn decode_upload(data: &[u8]) -> Result<image::DynamicImage, InputError> {
    image::load_from_memory(data).map_err(|e| InputError::InvalidImage {
        message: e.to_string(),
    })
}

// =============================================================================
// Core Handlers
// =============================================================================

/// Handle archive export requests.
///
/// # Endpoint
///
/// `POST /split`
///
/// # Form Fields
///
/// - `image`: the source image file (`image/*`, within the size limit)
/// - `rows`, `cols`: grid dimensions 1-10 (default 3)
///
/// # Response
///
/// - `200 OK`: ZIP archive with `Content-Disposition: attachment`
/// - `400 Bad Request`: bad upload, invalid grid, or image too small
/// - `500 Internal Server Error`: tile processing failure
pub async fn split_handler<C: PostClient>(
    State(state): State<AppState<C>>,
    multipart: Multipart,
) -> Result<Response, HandlerError> {
    let form = read_upload_form(multipart, state.max_upload_bytes)
        .await
        .map_err(|e| state.fail(e))?;

    let spec = GridSpec::new(form.rows, form.cols).map_err(|e| state.fail(e))?;
    let image = decode_upload(&form.image).map_err(|e| state.fail(e))?;

    info!(
        rows = spec.rows(),
        cols = spec.cols(),
        width = image.width(),
        height = image.height(),
        "Processing image split"
    );

    let tiles =
        compute_tiles(image.width(), image.height(), &spec).map_err(|e| state.fail(e))?;
    let archive = export_archive(&image, &tiles).map_err(|e| state.fail(e))?;

    info!(tiles = tiles.len(), bytes = archive.len(), "Created archive");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ARCHIVE_FILENAME),
        )
        .header(header::CONTENT_LENGTH, archive.len())
        .header(header::CACHE_CONTROL, "no-cache")
        .body(axum::body::Body::from(archive))
        .unwrap();

    Ok(response)
}

/// Handle publish requests.
///
/// # Endpoint
///
/// `POST /post`
///
/// # Form Fields
///
/// - `image`: the source image file
/// - `rows`, `cols`: grid dimensions; `rows * cols` must be at most 4
/// - `caption`: post text, at most 280 characters (default provided)
///
/// # Response
///
/// - `200 OK`: JSON with the created post id
/// - `400 Bad Request`: invalid grid, too many tiles, caption too long
/// - `401 Unauthorized`: no session access token
/// - `403`/`429`/`502`: provider errors, surfaced with mapped messages
pub async fn post_handler<C: PostClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<PostCreatedResponse>, HandlerError> {
    // Session token first: reject before reading the upload
    let access_token = state
        .session(&headers)
        .await
        .and_then(|(_, data)| data.access_token)
        .ok_or_else(|| state.fail(ApiError::Unauthorized))?;

    let form = read_upload_form(multipart, state.max_upload_bytes)
        .await
        .map_err(|e| state.fail(e))?;

    let spec = GridSpec::new(form.rows, form.cols).map_err(|e| state.fail(e))?;
    let image = decode_upload(&form.image).map_err(|e| state.fail(e))?;
    let caption = form.caption.as_deref().unwrap_or(DEFAULT_CAPTION);

    info!(rows = spec.rows(), cols = spec.cols(), "Posting grid");

    let tiles =
        compute_tiles(image.width(), image.height(), &spec).map_err(|e| state.fail(e))?;

    let post_id = state
        .publisher
        .publish(&image, &tiles, &access_token, caption)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(PostCreatedResponse {
        message: "Post created successfully".to_string(),
        post_id: post_id.as_str().to_string(),
    }))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Auth Handlers
// =============================================================================

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQueryParams {
    /// Authorization code on success
    #[serde(default)]
    pub code: Option<String>,

    /// CSRF state echoed by the provider
    #[serde(default)]
    pub state: Option<String>,

    /// Provider error code when the user denied authorization
    #[serde(default)]
    pub error: Option<String>,
}

/// Start the OAuth PKCE flow.
///
/// # Endpoint
///
/// `GET /auth/login`
///
/// Creates a session holding the PKCE verifier and CSRF state, sets the
/// signed session cookie, and redirects to the provider authorize URL.
pub async fn login_handler<C: PostClient>(
    State(state): State<AppState<C>>,
) -> Result<Response, HandlerError> {
    let pkce = PkcePair::generate();
    let oauth_state = random_state();

    let session_id = state.cookie.new_session_id();
    let data = SessionData {
        code_verifier: Some(pkce.verifier),
        oauth_state: Some(oauth_state.clone()),
        ..Default::default()
    };
    state
        .sessions
        .set(&session_id, data)
        .await
        .map_err(|e| state.fail(e))?;

    let authorize_url = state.oauth.authorize_url(&pkce.challenge, &oauth_state);
    let cookie = state.cookie.build_set_cookie(&state.cookie.sign(&session_id));

    debug!("Redirecting to provider authorize URL");

    let response = Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, authorize_url)
        .header(header::SET_COOKIE, cookie)
        .body(axum::body::Body::empty())
        .unwrap();

    Ok(response)
}

/// Complete the OAuth flow.
///
/// # Endpoint
///
/// `GET /auth/callback`
///
/// Exchanges the authorization code for tokens, fetches the user's
/// profile, stores both in the session, and redirects to the frontend.
/// Every failure redirects to the frontend with an `error` query param
/// instead of rendering a JSON error.
pub async fn callback_handler<C: PostClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQueryParams>,
) -> Response {
    if let Some(provider_error) = query.error {
        warn!(error = %provider_error, "Provider denied authorization");
        return redirect_with_error(&state.frontend_url, &provider_error);
    }

    let Some((session_id, session)) = state.session(&headers).await else {
        warn!("Callback without a pending session");
        return redirect_with_error(&state.frontend_url, "no_pending_authorization");
    };

    let (Some(verifier), Some(expected_state)) =
        (session.code_verifier.clone(), session.oauth_state.clone())
    else {
        warn!("Callback session has no pending authorization");
        return redirect_with_error(&state.frontend_url, "no_pending_authorization");
    };

    if query.state.as_deref() != Some(expected_state.as_str()) {
        warn!("Callback state mismatch");
        return redirect_with_error(&state.frontend_url, "state_mismatch");
    }

    let Some(code) = query.code else {
        warn!("Callback missing authorization code");
        return redirect_with_error(&state.frontend_url, "missing_code");
    };

    let tokens = match state.oauth.exchange_code(&code, &verifier).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Token exchange failed: {}", e);
            return redirect_with_error(&state.frontend_url, "auth_failed");
        }
    };

    let user = match state.oauth.fetch_user(&tokens.access_token).await {
        Ok(user) => user,
        Err(e) => {
            error!("User profile fetch failed: {}", e);
            return redirect_with_error(&state.frontend_url, "auth_failed");
        }
    };

    info!(username = %user.username, "User authenticated");

    let data = SessionData {
        code_verifier: None,
        oauth_state: None,
        access_token: Some(tokens.access_token),
        refresh_token: tokens.refresh_token,
        user: Some(user),
    };
    if let Err(e) = state.sessions.set(&session_id, data).await {
        error!("Failed to store session: {}", e);
        return redirect_with_error(&state.frontend_url, "session_error");
    }

    redirect_to(&state.frontend_url)
}

/// Return the authenticated user's profile.
///
/// # Endpoint
///
/// `GET /auth/user`
///
/// # Response
///
/// - `200 OK`: profile JSON
/// - `401 Unauthorized`: no authenticated session
pub async fn user_handler<C: PostClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, HandlerError> {
    let user = state
        .session(&headers)
        .await
        .and_then(|(_, data)| data.user)
        .ok_or_else(|| state.fail(ApiError::Unauthorized))?;

    Ok(Json(UserResponse { user }))
}

/// Destroy the session.
///
/// # Endpoint
///
/// `POST /auth/logout`
///
/// # Response
///
/// - `200 OK`: confirmation, with a `Set-Cookie` expiring the session id
/// - `500 Internal Server Error`: store failure
pub async fn logout_handler<C: PostClient>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    if let Some((session_id, _)) = state.session(&headers).await {
        state
            .sessions
            .destroy(&session_id)
            .await
            .map_err(|e| state.fail(e))?;
    }

    let body = serde_json::to_string(&MessageResponse {
        message: "Logged out successfully".to_string(),
    })
    .unwrap();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::SET_COOKIE, state.cookie.build_expired_cookie())
        .body(axum::body::Body::from(body))
        .unwrap();

    Ok(response)
}

// =============================================================================
// Redirect Helpers
// =============================================================================

/// 303 redirect to a URL.
fn redirect_to(url: &str) -> Response {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, url)
        .body(axum::body::Body::empty())
        .unwrap()
}

/// 303 redirect to the frontend with an `error` query parameter.
fn redirect_with_error(frontend_url: &str, error: &str) -> Response {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", error)
        .finish();
    redirect_to(&format!("{}?{}", frontend_url, query))
}

// =============================================================================
// Tests
// =============================================================================
