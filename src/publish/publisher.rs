//! Grid publish orchestration.
//!
//! [`GridPublisher::publish`] runs the ordered pipeline for one request:
//! validate the preconditions, then for each tile in row-major order
//! crop, encode, and upload (each upload completing its network round
//! trip before the next tile starts), and finally create the post with
//! the collected media ids.
//!
//! The first failure aborts the pipeline. Media already uploaded when a
//! later step fails is not retracted; the provider expires orphaned
//! uploads on its own schedule.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info};

use crate::error::PublishError;
use crate::grid::TileRect;
use crate::tile::{crop_tile, JpegTileEncoder, DEFAULT_JPEG_QUALITY};

use super::client::{MediaId, PostClient, PostId};

/// Platform limit on media items per post.
pub const MAX_TILES_PER_POST: usize = 4;

/// Platform limit on caption length in characters.
pub const MAX_CAPTION_CHARS: usize = 280;

/// Publishes a sliced grid as one post.
pub struct GridPublisher<C: PostClient> {
    client: Arc<C>,
    encoder: JpegTileEncoder,
    quality: u8,
}

impl<C: PostClient> GridPublisher<C> {
    /// Create a publisher with the default upload quality.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_quality(client, DEFAULT_JPEG_QUALITY)
    }

    /// Create a publisher with a specific JPEG quality for uploads.
    pub fn with_quality(client: Arc<C>, quality: u8) -> Self {
        Self {
            client,
            encoder: JpegTileEncoder::new(),
            quality,
        }
    }

    /// Publish the tiles of a grid as one post.
    ///
    /// Preconditions are checked before any image processing or network
    /// call: at most [`MAX_TILES_PER_POST`] tiles and a caption of at
    /// most [`MAX_CAPTION_CHARS`] characters.
    ///
    /// # Errors
    ///
    /// - [`PublishError::TooManyTiles`] / [`PublishError::CaptionTooLong`]
    ///   before anything else runs.
    /// - [`PublishError::Tile`] if a crop/encode fails; aborts.
    /// - [`PublishError::MediaUpload`] on the first failing upload;
    ///   aborts before the post-creation call.
    /// - [`PublishError::PostCreation`] if the final call fails; never
    ///   retried.
    pub async fn publish(
        &self,
        image: &DynamicImage,
        tiles: &[TileRect],
        access_token: &str,
        caption: &str,
    ) -> Result<PostId, PublishError> {
        if tiles.len() > MAX_TILES_PER_POST {
            return Err(PublishError::TooManyTiles {
                tiles: tiles.len(),
                max: MAX_TILES_PER_POST,
            });
        }

        let caption_chars = caption.chars().count();
        if caption_chars > MAX_CAPTION_CHARS {
            return Err(PublishError::CaptionTooLong {
                chars: caption_chars,
                max: MAX_CAPTION_CHARS,
            });
        }

        let mut media_ids: Vec<MediaId> = Vec::with_capacity(tiles.len());

        for rect in tiles {
            let tile = crop_tile(image, rect).map_err(|source| PublishError::Tile {
                row: rect.row,
                col: rect.col,
                source,
            })?;

            let jpeg = self
                .encoder
                .encode(&tile, self.quality)
                .map_err(|source| PublishError::Tile {
                    row: rect.row,
                    col: rect.col,
                    source,
                })?;

            let filename = format!("piece_{}_{}.jpg", rect.row, rect.col);
            let media_id = self
                .client
                .upload_media(access_token, jpeg, &filename)
                .await
                .map_err(|source| PublishError::MediaUpload {
                    row: rect.row,
                    col: rect.col,
                    source,
                })?;

            debug!(
                row = rect.row,
                col = rect.col,
                media_id = %media_id,
                "Uploaded tile"
            );
            media_ids.push(media_id);
        }

        let post_id = self
            .client
            .create_post(access_token, caption, &media_ids)
            .await
            .map_err(|e| PublishError::PostCreation {
                status: e.provider_status(),
                detail: e.to_string(),
            })?;

        info!(post_id = %post_id, tiles = tiles.len(), "Post created");
        Ok(post_id)
    }
}

// =============================================================================
// Tests
// =============================================================================
