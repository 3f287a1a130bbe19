//! src/services/thumbnails.rs
//!
//! Thumbnail derivation: decode, scale to fit the configured bounds, and
//! re-encode. Pure bytes-in/bytes-out, so callers decide where results live
//! and on which thread pool the work runs.

use crate::errors::{MediaResult, MediaStoreError};
use crate::models::media::{ContentKind, ThumbnailFormat};
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, io::Reader as ImageReader};
use std::io::Cursor;

/// Bound applied to both axes when the configuration provides neither.
pub const DEFAULT_MAX_DIMENSION: u32 = 512;

const JPEG_QUALITY: u8 = 85;

/// Derive a thumbnail from raw content bytes.
///
/// `Other` content has no visual form and is rejected before any decoding.
/// Animated containers (GIF) decode to their first frame. The result keeps
/// the source aspect ratio and fits inside `max_width` x `max_height`; a
/// `None` axis is unbounded, and both `None` fall back to
/// [`DEFAULT_MAX_DIMENSION`] on each axis.
///
/// Identical input bytes, bounds, and format produce identical output
/// bytes.
pub fn derive(
    raw: &[u8],
    max_width: Option<u32>,
    max_height: Option<u32>,
    kind: ContentKind,
    format: ThumbnailFormat,
) -> MediaResult<Bytes> {
    if !kind.supports_thumbnails() {
        return Err(MediaStoreError::UnsupportedMediaKind(kind));
    }

    let img = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    let (bound_w, bound_h) = match (max_width, max_height) {
        (None, None) => (DEFAULT_MAX_DIMENSION, DEFAULT_MAX_DIMENSION),
        (w, h) => (w.unwrap_or(u32::MAX), h.unwrap_or(u32::MAX)),
    };
    let scaled = img.thumbnail(bound_w, bound_h);

    let mut encoded = Cursor::new(Vec::new());
    match format {
        ThumbnailFormat::Png => scaled.write_to(&mut encoded, ImageOutputFormat::Png)?,
        ThumbnailFormat::Jpeg => {
            // The JPEG encoder rejects alpha channels.
            let opaque = DynamicImage::ImageRgb8(scaled.to_rgb8());
            opaque.write_to(&mut encoded, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
        }
    }

    Ok(Bytes::from(encoded.into_inner()))
}
