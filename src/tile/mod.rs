//! Tile processing: crop and encode.
//!
//! This module turns a grid cell into encoded image bytes:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Tile Pipeline               │
//! │                                          │
//! │  DynamicImage ──► crop_tile(rect)        │
//! │       │                                  │
//! │       ▼                                  │
//! │  PngTileEncoder (lossless, archive)      │
//! │  JpegTileEncoder (lossy, posting)        │
//! └──────────────────────────────────────────┘
//! ```
//!
//! The archive exporter uses PNG so pieces survive re-assembly without
//! generation loss; the publisher uses JPEG because the provider caps
//! upload sizes and re-compresses anyway.

mod crop;
mod encoder;

pub use crop::crop_tile;
pub use encoder::{
    clamp_quality, is_valid_quality, JpegTileEncoder, PngTileEncoder, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
