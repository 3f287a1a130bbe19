//! src/config.rs
//!
//! Engine configuration. `MediaConfig` is plain data handed to the service
//! at construction; loading it from files, environment variables, or CLI
//! flags belongs to the embedding application, not the engine.

use crate::models::media::ThumbnailFormat;
use serde::{Deserialize, Serialize};

/// Behavior switches for the storage and derivation engine.
///
/// All fields are plain values with serde defaults, so callers can
/// deserialize the struct from whatever configuration source they own and
/// pass it in whole.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct MediaConfig {
    /// Accept uploads classified as images.
    pub allow_images: bool,

    /// Accept uploads classified as videos.
    pub allow_videos: bool,

    /// Accept uploads of unclassified kinds.
    pub allow_other: bool,

    /// Run content through the lossless codec before storing. Inputs that
    /// are tiny or that do not shrink are stored verbatim either way.
    pub compression: bool,

    /// Codec effort: 0 selects the fast mode, 1..=12 select the
    /// high-compression mode at that level.
    pub compression_level: u32,

    /// Master switch for thumbnail derivation and serving.
    pub thumbnails: bool,

    /// Derive thumbnails at upload time instead of on first access.
    /// Eager failures are logged and do not fail the upload.
    pub precompute_thumbnails: bool,

    /// Maximum thumbnail width. `None` leaves the axis unbounded; when
    /// both axes are `None` a built-in default bound applies.
    pub thumbnail_width: Option<u32>,

    /// Maximum thumbnail height. Same `None` semantics as the width.
    pub thumbnail_height: Option<u32>,

    /// Encoding for derived thumbnails.
    pub thumbnail_format: ThumbnailFormat,

    /// Length of generated media identifiers.
    pub id_length: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            allow_images: true,
            allow_videos: true,
            allow_other: true,
            compression: true,
            compression_level: 0,
            thumbnails: true,
            precompute_thumbnails: false,
            thumbnail_width: None,
            thumbnail_height: None,
            thumbnail_format: ThumbnailFormat::Png,
            id_length: 12,
        }
    }
}
