//! ZIP packaging of grid tiles.
//!
//! Each tile is cropped from the source image, encoded as PNG, and added
//! to a single deflate-compressed archive. Entries are named
//! `piece_{row:02}_{col:02}.png` with 1-based row/col so the filenames
//! read naturally when extracted; the [`TileRect`] indices stay 0-based.
//!
//! The export is all-or-nothing: the first tile that fails to crop or
//! encode aborts the whole archive.

use std::io::{Cursor, Write};

use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::grid::TileRect;
use crate::tile::{crop_tile, PngTileEncoder};

/// Download filename suggested in the Content-Disposition header.
pub const ARCHIVE_FILENAME: &str = "image-pieces.zip";

/// Entry name for one tile, 1-based and zero-padded.
fn entry_name(rect: &TileRect) -> String {
    format!("piece_{:02}_{:02}.png", rect.row + 1, rect.col + 1)
}

/// Export the tiles of a grid as one ZIP archive.
///
/// Tiles are processed in the order given (row-major from
/// [`crate::grid::compute_tiles`]). Entries are deflate-compressed at the
/// maximum effort level.
///
/// # Errors
///
/// - [`ExportError::TileProcessing`] if any single crop/encode fails;
///   no partial archive is returned.
/// - [`ExportError::Archive`] if the ZIP container itself cannot be
///   written.
pub fn export_archive(image: &DynamicImage, tiles: &[TileRect]) -> Result<Bytes, ExportError> {
    let encoder = PngTileEncoder::new();
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for rect in tiles {
        let tile = crop_tile(image, rect).map_err(|source| ExportError::TileProcessing {
            row: rect.row,
            col: rect.col,
            source,
        })?;

        let png = encoder
            .encode(&tile)
            .map_err(|source| ExportError::TileProcessing {
                row: rect.row,
                col: rect.col,
                source,
            })?;

        let name = entry_name(rect);
        writer
            .start_file(&name, options)
            .map_err(|e| ExportError::Archive(e.to_string()))?;
        writer
            .write_all(&png)
            .map_err(|e| ExportError::Archive(e.to_string()))?;

        debug!(entry = %name, bytes = png.len(), "Added tile to archive");
    }

    let cursor = writer
        .finish()
        .map_err(|e| ExportError::Archive(e.to_string()))?;

    Ok(Bytes::from(cursor.into_inner()))
}

// =============================================================================
// Tests
// =============================================================================
