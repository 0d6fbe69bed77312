//! Tile encoders.
//!
//! Two codecs, one per workflow:
//!
//! - **PNG** (lossless, best compression) for archive export, so the
//!   downloaded pieces are pixel-identical to the source crop.
//! - **JPEG** (lossy, configurable quality) for posting, where upload
//!   size matters more than fidelity.
//!
//! JPEG has no alpha channel, so the JPEG encoder flattens to RGB8
//! before encoding; PNG keeps whatever color type the crop has.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use std::io::Cursor;

use crate::error::TileError;

/// Default JPEG quality for uploads (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// PNG Encoder
// =============================================================================

/// Lossless PNG encoder for archive tiles.
#[derive(Debug, Clone, Default)]
pub struct PngTileEncoder {
    // Stateless; struct mirrors the JPEG encoder so call sites line up
}

impl PngTileEncoder {
    /// Create a new PNG tile encoder.
    pub fn new() -> Self {
        Self {}
    }

    /// Encode a cropped tile as PNG at the best compression level.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Encode`] if the codec rejects the image.
    pub fn encode(&self, tile: &DynamicImage) -> Result<Bytes, TileError> {
        let mut output = Cursor::new(Vec::new());
        let encoder =
            PngEncoder::new_with_quality(&mut output, CompressionType::Best, FilterType::Adaptive);

        tile.write_with_encoder(encoder)
            .map_err(|e| TileError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output.into_inner()))
    }
}

// =============================================================================
// JPEG Encoder
// =============================================================================

/// Lossy JPEG encoder for upload tiles.
#[derive(Debug, Clone, Default)]
pub struct JpegTileEncoder {
    // Stateless; quality is passed per call
}

impl JpegTileEncoder {
    /// Create a new JPEG tile encoder.
    pub fn new() -> Self {
        Self {}
    }

    /// Encode a cropped tile as JPEG at the given quality.
    ///
    /// Quality is clamped to `[1, 100]`. The tile is flattened to RGB8
    /// first; JPEG cannot carry an alpha channel and the codec errors on
    /// RGBA input.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::Encode`] if the codec rejects the image.
    pub fn encode(&self, tile: &DynamicImage, quality: u8) -> Result<Bytes, TileError> {
        let quality = clamp_quality(quality);

        let rgb = tile.to_rgb8();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);

        encoder
            .encode_image(&rgb)
            .map_err(|e| TileError::Encode {
                message: e.to_string(),
            })?;

        Ok(Bytes::from(output))
    }

    /// Encode at the default upload quality.
    pub fn encode_default(&self, tile: &DynamicImage) -> Result<Bytes, TileError> {
        self.encode(tile, DEFAULT_JPEG_QUALITY)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    quality >= MIN_JPEG_QUALITY && quality <= MAX_JPEG_QUALITY
}

/// Clamp quality to valid range.
///
/// Values below 1 become 1, values above 100 become 100.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
