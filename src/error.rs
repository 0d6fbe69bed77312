use thiserror::Error;

/// Errors from grid computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Grid dimensions outside the supported range
    #[error("Invalid grid dimensions: {rows}x{cols} (rows and cols must be between 1 and {max})")]
    InvalidGrid { rows: i64, cols: i64, max: u32 },

    /// Image too small to yield usable tiles for the requested grid
    #[error(
        "Image too small for a {rows}x{cols} grid: tile would be {tile_width}x{tile_height} px \
         (minimum {min} px per side)"
    )]
    ImageTooSmall {
        rows: u32,
        cols: u32,
        tile_width: u32,
        tile_height: u32,
        min: u32,
    },
}

/// Errors from cropping and encoding a single tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Tile rectangle does not fit inside the source image
    #[error(
        "Tile ({row}, {col}) out of bounds: {left}+{width}x{top}+{height} exceeds {image_width}x{image_height}"
    )]
    OutOfBounds {
        row: u32,
        col: u32,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Image codec failed to decode
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Image codec failed to encode
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },
}

/// Errors from client-supplied request input (multipart form, upload)
#[derive(Debug, Clone, Error)]
pub enum InputError {
    /// No image file in the multipart form
    #[error("No file uploaded")]
    MissingImage,

    /// Uploaded file is not an image
    #[error("Only image files are allowed (got {content_type})")]
    NotAnImage { content_type: String },

    /// Upload exceeds the size limit
    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    /// A form field could not be parsed
    #[error("Invalid form field '{name}': {message}")]
    InvalidField { name: &'static str, message: String },

    /// Uploaded bytes could not be decoded as an image
    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    /// Grid parameters rejected
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Errors from the archive export pipeline
#[derive(Debug, Error)]
pub enum ExportError {
    /// Crop or encode failed for one tile; the whole export aborts
    #[error("Failed to process tile ({row}, {col}): {source}")]
    TileProcessing {
        row: u32,
        col: u32,
        #[source]
        source: TileError,
    },

    /// ZIP container could not be written
    #[error("Failed to write archive: {0}")]
    Archive(String),
}

/// Errors returned by the social media provider
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Token missing, expired, or rejected (HTTP 401)
    #[error("Provider rejected the access token")]
    Unauthorized,

    /// Token valid but operation not allowed (HTTP 403)
    #[error("Provider denied the operation: {0}")]
    Forbidden(String),

    /// Provider rate limit hit (HTTP 429); never retried
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// Network failure or 5xx from the provider
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Provider returned a success status with an unusable body
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// HTTP status this error maps to when surfaced to the caller.
    pub fn provider_status(&self) -> u16 {
        match self {
            ProviderError::Unauthorized => 401,
            ProviderError::Forbidden(_) => 403,
            ProviderError::RateLimited => 429,
            ProviderError::Unavailable(_) | ProviderError::InvalidResponse(_) => 502,
        }
    }
}

/// Errors from the publish pipeline
#[derive(Debug, Error)]
pub enum PublishError {
    /// More tiles than the platform allows in one post
    #[error("Too many tiles for one post: {tiles} (platform limit is {max})")]
    TooManyTiles { tiles: usize, max: usize },

    /// Caption exceeds the platform character limit
    #[error("Caption too long: {chars} characters (maximum {max})")]
    CaptionTooLong { chars: usize, max: usize },

    /// Crop or encode failed for one tile before upload
    #[error("Failed to process tile ({row}, {col}): {source}")]
    Tile {
        row: u32,
        col: u32,
        #[source]
        source: TileError,
    },

    /// Upload failed for one tile; publishing aborts before post creation
    #[error("Failed to upload tile ({row}, {col}): {source}")]
    MediaUpload {
        row: u32,
        col: u32,
        #[source]
        source: ProviderError,
    },

    /// All uploads succeeded but the post-creation call failed
    #[error("Post creation failed (provider status {status}): {detail}")]
    PostCreation { status: u16, detail: String },
}

/// Errors from the OAuth handshake
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Provider redirected back with an error instead of a code
    #[error("Provider denied authorization: {0}")]
    ProviderDenied(String),

    /// The `state` query parameter did not match the session
    #[error("State mismatch in authorization callback")]
    StateMismatch,

    /// Token exchange request failed
    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    /// Token endpoint returned a success status with an unusable body
    #[error("Unexpected token response: {0}")]
    InvalidResponse(String),

    /// No session or no code verifier to complete the exchange
    #[error("No pending authorization for this session")]
    NoPendingAuthorization,
}

/// Errors from the session store
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The backing store failed
    #[error("Session store error: {0}")]
    Store(String),
}
