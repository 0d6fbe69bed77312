//! Provider API client.
//!
//! [`PostClient`] is the seam between the publish pipeline and the
//! provider's HTTP API. [`XApiClient`] talks to X: media uploads go to
//! the v1.1 upload host as `multipart/form-data`, post creation goes to
//! the v2 API as JSON. Base URLs are configurable so tests can point the
//! client at a stub server.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ProviderError;

/// Default timeout applied to every outbound provider call.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default host for media uploads (X API v1.1).
const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

/// Default host for post creation (X API v2).
const DEFAULT_API_BASE: &str = "https://api.twitter.com";

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque provider identifier for an uploaded media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaId(String);

impl MediaId {
    /// Wrap a provider-issued media identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider identifier of a created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(String);

impl PostId {
    /// Wrap a provider-issued post identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Post Client Trait
// =============================================================================

/// Provider operations needed to publish a grid.
///
/// Implementations must be cheap to share across requests (the server
/// holds one behind an `Arc`).
#[async_trait]
pub trait PostClient: Send + Sync {
    /// Upload one encoded tile; returns the provider's media id.
    async fn upload_media(
        &self,
        access_token: &str,
        data: Bytes,
        filename: &str,
    ) -> Result<MediaId, ProviderError>;

    /// Create a post with a caption and previously uploaded media.
    async fn create_post(
        &self,
        access_token: &str,
        text: &str,
        media_ids: &[MediaId],
    ) -> Result<PostId, ProviderError>;
}

// =============================================================================
// X API Client
// =============================================================================

/// [`PostClient`] implementation for the X API.
#[derive(Debug, Clone)]
pub struct XApiClient {
    http: reqwest::Client,
    upload_base: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: Option<CreatePostData>,
}

#[derive(Debug, Deserialize)]
struct CreatePostData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    detail: Option<String>,
}

impl XApiClient {
    /// Create a client with the default provider hosts and timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction only fails on invalid TLS config");

        Self {
            http,
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override both provider hosts. Used by tests to target a stub server.
    pub fn with_base_urls(
        mut self,
        upload_base: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.upload_base = upload_base.into().trim_end_matches('/').to_string();
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Map a non-success provider response to a [`ProviderError`].
    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let detail = response
            .json::<ProviderErrorBody>()
            .await
            .ok()
            .and_then(|b| b.detail);

        match status.as_u16() {
            401 => ProviderError::Unauthorized,
            403 => ProviderError::Forbidden(
                detail.unwrap_or_else(|| "write permission denied".to_string()),
            ),
            429 => ProviderError::RateLimited,
            code => ProviderError::Unavailable(
                detail.unwrap_or_else(|| format!("provider returned status {}", code)),
            ),
        }
    }
}

impl Default for XApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostClient for XApiClient {
    async fn upload_media(
        &self,
        access_token: &str,
        data: Bytes,
        filename: &str,
    ) -> Result<MediaId, ProviderError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .http
            .post(format!("{}/1.1/media/upload.json", self.upload_base))
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.media_id_string
            .map(MediaId::new)
            .ok_or_else(|| ProviderError::InvalidResponse("missing media_id_string".to_string()))
    }

    async fn create_post(
        &self,
        access_token: &str,
        text: &str,
        media_ids: &[MediaId],
    ) -> Result<PostId, ProviderError> {
        let ids: Vec<&str> = media_ids.iter().map(MediaId::as_str).collect();
        let payload = serde_json::json!({
            "text": text,
            "media": { "media_ids": ids },
        });

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body: CreatePostResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        body.data
            .map(|d| PostId::new(d.id))
            .ok_or_else(|| ProviderError::InvalidResponse("missing post id".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
