//! Tile cropping.

use image::DynamicImage;

use crate::error::TileError;
use crate::grid::TileRect;

/// Crop the source image to one tile rectangle.
///
/// The source is not consumed; `crop_imm` copies the pixel region so each
/// tile can be encoded independently.
///
/// # Errors
///
/// Returns [`TileError::OutOfBounds`] when the rect does not fit inside
/// the image. With rects from [`crate::grid::compute_tiles`] this cannot
/// happen; the check guards against hand-built rects.
pub fn crop_tile(image: &DynamicImage, rect: &TileRect) -> Result<DynamicImage, TileError> {
    let (image_width, image_height) = (image.width(), image.height());

    let fits = rect
        .left
        .checked_add(rect.width)
        .is_some_and(|right| right <= image_width)
        && rect
            .top
            .checked_add(rect.height)
            .is_some_and(|bottom| bottom <= image_height);

    if !fits || rect.width == 0 || rect.height == 0 {
        return Err(TileError::OutOfBounds {
            row: rect.row,
            col: rect.col,
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
            image_width,
            image_height,
        });
    }

    Ok(image.crop_imm(rect.left, rect.top, rect.width, rect.height))
}
