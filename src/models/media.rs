//! Represents a stored media item and its classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Extensions classified as still images.
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "bmp"];

/// Extensions classified as videos. GIF lives here: it is an animated
/// container, and thumbnail derivation extracts its first frame the same
/// way it would for any other video source.
const VIDEO_EXTENSIONS: [&str; 6] = ["gif", "mp4", "webm", "mov", "mkv", "avi"];

/// Broad classification of uploaded content, derived from its extension.
///
/// Classification is total: anything outside the image and video tables is
/// `Other`. The kind decides upload policy, the placement subtree, and
/// whether thumbnail derivation can ever apply.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Still image content (PNG, JPEG, WebP, ...).
    Image,
    /// Video or animated content (GIF, MP4, WebM, ...).
    Video,
    /// Everything else: documents, audio, archives, arbitrary blobs.
    Other,
}

impl ContentKind {
    /// Classify a file extension. Case-insensitive; a leading dot is
    /// tolerated. Never fails.
    pub fn from_extension(extension: &str) -> Self {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&normalized.as_str()) {
            ContentKind::Image
        } else if VIDEO_EXTENSIONS.contains(&normalized.as_str()) {
            ContentKind::Video
        } else {
            ContentKind::Other
        }
    }

    /// String form used for directory names and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Other => "other",
        }
    }

    /// Whether a thumbnail can ever be derived for this kind.
    /// `Other` content has no visual form, so the answer is permanent.
    pub fn supports_thumbnails(&self) -> bool {
        matches!(self, ContentKind::Image | ContentKind::Video)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encoding used for derived thumbnails.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    /// Lossless, alpha-capable. The default.
    #[default]
    Png,
    /// Lossy; alpha is flattened before encoding.
    Jpeg,
}

impl ThumbnailFormat {
    /// File extension for thumbnails in this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Png => "png",
            ThumbnailFormat::Jpeg => "jpg",
        }
    }

    /// MIME type to serve thumbnails in this format under.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ThumbnailFormat::Png => "image/png",
            ThumbnailFormat::Jpeg => "image/jpeg",
        }
    }
}

/// A stored media item.
///
/// Produced by uploads and mutated in place when lazy derivation fills the
/// thumbnail cache. The engine does not persist records between calls; that
/// is the caller's concern. Every path held here is reconstructible from
/// `id`, `name`, and the classification alone.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MediaRecord {
    /// Engine-generated identifier, unique per stored item.
    pub id: String,

    /// Display name supplied at upload. Not unique on its own.
    pub name: String,

    /// Original file extension, stored without the leading dot.
    pub extension: String,

    /// Classification derived from the extension at upload time.
    pub kind: ContentKind,

    /// Placement of the stored (possibly compressed) content bytes.
    pub content_path: PathBuf,

    /// Placement of the cached thumbnail, set on first successful
    /// derivation and never cleared while the record lives.
    pub thumbnail_path: Option<PathBuf>,

    /// Whether the stored bytes went through the compression codec.
    pub content_compressed: bool,

    /// Stored byte length, after compression when it was applied.
    pub content_size: i64,

    /// Whether the item appears in public listings.
    pub public: bool,

    /// Creation timestamp. Never updated afterwards.
    pub upload_date: DateTime<Utc>,
}

impl MediaRecord {
    /// Filename to serve the original content under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    /// Filename to serve a thumbnail under.
    pub fn thumbnail_file_name(&self, format: ThumbnailFormat) -> String {
        format!("{}.{}", self.name, format.extension())
    }

    /// MIME type for the original content, with a generic binary fallback
    /// for extensions outside the table.
    pub fn mime_type(&self) -> &'static str {
        mime_for_extension(&self.extension)
    }
}

/// Static extension-to-MIME lookup for serving stored content.
pub fn mime_for_extension(extension: &str) -> &'static str {
    let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
    match normalized.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
